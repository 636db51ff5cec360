use log::{info, trace};
use crate::drivers::{RecorderError, Sample};
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}
/// One accepted reading of a single channel.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    /// Seconds since the channel's first entry of the current run.
    pub elapsed_s: f64,
    pub value: f64,
    pub wall_clock: String,
}
/// Append-only log of one channel's current (or last) run.
#[derive(Clone, Debug, Default)]
pub struct ChannelLog {
    origin: Option<f64>,
    entries: Vec<LogEntry>,
}
impl ChannelLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Timestamp of the first entry, if any.
    pub fn origin(&self) -> Option<f64> {
        self.origin
    }
    fn clear(&mut self) {
        self.origin = None;
        self.entries.clear();
    }
    fn append(&mut self, timestamp: f64, value: f64) {
        let origin = *self.origin.get_or_insert(timestamp);
        self.entries.push(LogEntry {
            elapsed_s: timestamp - origin,
            value,
            wall_clock: crate::drivers::sample::wall_clock_string(timestamp),
        });
    }
}
#[derive(Clone, Debug)]
struct ChannelRecorder {
    state: RecordingState,
    period_s: f64,
    max_duration_s: f64,
    last_accepted: Option<f64>,
    log: ChannelLog,
}
impl ChannelRecorder {
    fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            period_s: 0.0,
            max_duration_s: 0.0,
            last_accepted: None,
            log: ChannelLog::default(),
        }
    }
    fn start(&mut self, period_s: f64, max_duration_s: f64) {
        self.state = RecordingState::Recording;
        self.period_s = period_s;
        self.max_duration_s = max_duration_s;
        self.last_accepted = None;
        self.log.clear();
    }
    /// Returns true when this sample ended the run.
    fn ingest(&mut self, timestamp: f64, value: f64) -> bool {
        if self.state != RecordingState::Recording {
            return false;
        }
        // Minimum gap since the last accepted sample, not a fixed-phase clock.
        let due = match self.last_accepted {
            None => true,
            Some(_) if self.period_s <= 0.0 => true,
            Some(last) => timestamp - last >= self.period_s,
        };
        if due {
            self.log.append(timestamp, value);
            self.last_accepted = Some(timestamp);
        }
        let expired = self.max_duration_s > 0.0
            && self
                .log
                .origin()
                .map_or(false, |origin| timestamp - origin >= self.max_duration_s);
        if expired {
            self.state = RecordingState::Idle;
        }
        expired
    }
}
/// Per-channel sampling recorder. Channels are fully independent.
#[derive(Clone, Debug)]
pub struct Recorder {
    channels: Vec<ChannelRecorder>,
}
impl Recorder {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| ChannelRecorder::new()).collect(),
        }
    }
    fn channel_mut(&mut self, channel: usize) -> Result<&mut ChannelRecorder, RecorderError> {
        let count = self.channels.len();
        self.channels
            .get_mut(channel)
            .ok_or(RecorderError::UnknownChannel { channel, count })
    }
    /// Clears the channel's log and begins a fresh run. Restarting a channel
    /// that is already recording is the same as starting it from idle.
    ///
    /// `period_s <= 0` accepts every sample; `max_duration_s <= 0` disables
    /// the automatic stop.
    pub fn start(
        &mut self,
        channel: usize,
        period_s: f64,
        max_duration_s: f64,
    ) -> Result<(), RecorderError> {
        self.channel_mut(channel)?.start(period_s, max_duration_s);
        info!(
            "channel {} recording (period {}s, max {}s)",
            channel + 1,
            period_s,
            max_duration_s
        );
        Ok(())
    }
    /// Stops the channel, keeping its log for export.
    pub fn stop(&mut self, channel: usize) -> Result<(), RecorderError> {
        let recorder = self.channel_mut(channel)?;
        if recorder.state == RecordingState::Recording {
            info!("channel {} stopped with {} entries", channel + 1, recorder.log.len());
        }
        recorder.state = RecordingState::Idle;
        Ok(())
    }
    pub fn stop_all(&mut self) {
        for (index, recorder) in self.channels.iter_mut().enumerate() {
            if recorder.state == RecordingState::Recording {
                info!("channel {} stopped with {} entries", index + 1, recorder.log.len());
            }
            recorder.state = RecordingState::Idle;
        }
    }
    /// Offers a sample to every recording channel. Returns the channels
    /// that reached their max duration on this sample.
    pub fn ingest(&mut self, sample: &Sample) -> Vec<usize> {
        let mut finished = Vec::new();
        for (index, recorder) in self.channels.iter_mut().enumerate() {
            let Some(value) = sample.value(index) else {
                continue;
            };
            if recorder.ingest(sample.timestamp, value) {
                info!(
                    "channel {} reached its max duration with {} entries",
                    index + 1,
                    recorder.log.len()
                );
                finished.push(index);
            }
        }
        trace!("sample at {:.3} offered to recorder", sample.timestamp);
        finished
    }
    pub fn state(&self, channel: usize) -> Option<RecordingState> {
        self.channels.get(channel).map(|c| c.state)
    }
    pub fn is_recording(&self, channel: usize) -> bool {
        self.state(channel) == Some(RecordingState::Recording)
    }
    pub fn log(&self, channel: usize) -> Option<&ChannelLog> {
        self.channels.get(channel).map(|c| &c.log)
    }
    pub fn logs(&self) -> impl Iterator<Item = &ChannelLog> {
        self.channels.iter().map(|c| &c.log)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn feed(recorder: &mut Recorder, from: u32, to: u32, values: &[f64]) -> Vec<usize> {
        let mut finished = Vec::new();
        for t in from..to {
            finished.extend(recorder.ingest(&Sample::new(t as f64, values.to_vec())));
        }
        finished
    }
    fn elapsed(recorder: &Recorder, channel: usize) -> Vec<f64> {
        recorder
            .log(channel)
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.elapsed_s)
            .collect()
    }
    #[test]
    fn idle_channels_ignore_samples() {
        let mut recorder = Recorder::new(2);
        feed(&mut recorder, 0, 10, &[1.0, 2.0]);
        assert!(recorder.logs().all(ChannelLog::is_empty));
    }
    #[test]
    fn decimation_keeps_minimum_gap() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 10.0, 0.0).unwrap();
        feed(&mut recorder, 3, 45, &[20.0]);
        assert_eq!(elapsed(&recorder, 0), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }
    #[test]
    fn first_sample_after_start_is_always_accepted() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 10.0, 0.0).unwrap();
        feed(&mut recorder, 0, 5, &[1.0]);
        recorder.start(0, 10.0, 0.0).unwrap();
        feed(&mut recorder, 5, 6, &[2.0]);
        let log = recorder.log(0).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].value, 2.0);
        assert_eq!(log.origin(), Some(5.0));
    }
    #[test]
    fn non_positive_period_accepts_everything() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 0.0, 0.0).unwrap();
        feed(&mut recorder, 0, 7, &[1.0]);
        assert_eq!(recorder.log(0).unwrap().len(), 7);
    }
    #[test]
    fn auto_stop_at_max_duration() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 1.0, 60.0).unwrap();
        let finished = feed(&mut recorder, 0, 100, &[1.0]);
        assert_eq!(finished, vec![0]);
        assert_eq!(recorder.state(0), Some(RecordingState::Idle));
        let log = recorder.log(0).unwrap();
        assert_eq!(log.entries().last().map(|e| e.elapsed_s), Some(60.0));
        assert_eq!(log.len(), 61);
    }
    #[test]
    fn auto_stop_fires_between_accepted_samples() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 7.0, 60.0).unwrap();
        feed(&mut recorder, 0, 100, &[1.0]);
        assert!(!recorder.is_recording(0));
        assert!(elapsed(&recorder, 0).iter().all(|t| *t < 60.0));
        assert_eq!(elapsed(&recorder, 0).last(), Some(&56.0));
    }
    #[test]
    fn non_positive_max_duration_never_stops() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 0.0, -1.0).unwrap();
        assert!(feed(&mut recorder, 0, 10_000, &[1.0]).is_empty());
        assert!(recorder.is_recording(0));
    }
    #[test]
    fn double_start_equals_single_start() {
        let mut twice = Recorder::new(1);
        twice.start(0, 5.0, 0.0).unwrap();
        feed(&mut twice, 0, 12, &[3.0]);
        twice.start(0, 5.0, 0.0).unwrap();
        twice.start(0, 5.0, 0.0).unwrap();
        feed(&mut twice, 12, 30, &[3.0]);
        let mut once = Recorder::new(1);
        feed(&mut once, 0, 12, &[3.0]);
        once.start(0, 5.0, 0.0).unwrap();
        feed(&mut once, 12, 30, &[3.0]);
        assert_eq!(twice.log(0).unwrap().entries(), once.log(0).unwrap().entries());
        assert_eq!(elapsed(&twice, 0), vec![0.0, 5.0, 10.0, 15.0]);
    }
    #[test]
    fn stop_keeps_log_until_next_start() {
        let mut recorder = Recorder::new(1);
        recorder.start(0, 0.0, 0.0).unwrap();
        feed(&mut recorder, 0, 3, &[1.0]);
        recorder.stop(0).unwrap();
        feed(&mut recorder, 3, 6, &[1.0]);
        assert_eq!(recorder.log(0).unwrap().len(), 3);
        recorder.start(0, 0.0, 0.0).unwrap();
        assert!(recorder.log(0).unwrap().is_empty());
    }
    #[test]
    fn stop_all_idles_every_channel_and_keeps_logs() {
        let mut recorder = Recorder::new(3);
        recorder.start(0, 0.0, 0.0).unwrap();
        recorder.start(2, 0.0, 0.0).unwrap();
        feed(&mut recorder, 0, 4, &[1.0, 2.0, 3.0]);
        recorder.stop_all();
        recorder.stop_all();
        feed(&mut recorder, 4, 8, &[1.0, 2.0, 3.0]);
        assert!((0..3).all(|c| recorder.state(c) == Some(RecordingState::Idle)));
        assert_eq!(recorder.log(0).unwrap().len(), 4);
        assert!(recorder.log(1).unwrap().is_empty());
        assert_eq!(recorder.log(2).unwrap().len(), 4);
    }
    #[test]
    fn channels_are_independent() {
        let mut recorder = Recorder::new(3);
        recorder.start(0, 2.0, 0.0).unwrap();
        recorder.start(2, 0.0, 5.0).unwrap();
        feed(&mut recorder, 0, 10, &[1.0, 2.0, 3.0]);
        assert_eq!(recorder.log(0).unwrap().len(), 5);
        assert!(recorder.log(1).unwrap().is_empty());
        assert_eq!(recorder.log(2).unwrap().len(), 6);
        assert!(recorder.is_recording(0));
        assert!(!recorder.is_recording(2));
        assert_eq!(recorder.log(2).unwrap().entries()[0].value, 3.0);
    }
    #[test]
    fn unknown_channel_is_rejected() {
        let mut recorder = Recorder::new(4);
        assert_eq!(
            recorder.start(4, 1.0, 1.0),
            Err(RecorderError::UnknownChannel { channel: 4, count: 4 })
        );
        assert!(recorder.stop(9).is_err());
    }
}
