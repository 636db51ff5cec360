use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use log::{debug, info, trace, warn};
use crate::drivers::{parse_frame, AcquisitionError, LineSource, Sample, SampleQueue};
/// Counters reported by a reader once it exits cleanly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub accepted: u64,
    pub dropped: u64,
}
/// Reads lines from `source` until `stop` is raised, pushing every
/// well-formed frame into `queue`. Malformed frames are dropped.
///
/// A read error ends the loop and is returned to whoever joins the task.
pub fn read_loop<S: LineSource>(
    source: &mut S,
    channels: usize,
    queue: &SampleQueue,
    stop: &AtomicBool,
) -> Result<ReaderStats, AcquisitionError> {
    let mut stats = ReaderStats::default();
    while !stop.load(Ordering::Acquire) {
        let Some(line) = source.read_line()? else {
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_frame(line, channels) {
            Ok(values) => {
                trace!("frame {:?}", values);
                queue.push(Sample::now(values));
                stats.accepted += 1;
            }
            Err(e) => {
                debug!("dropping frame {:?}: {}", line, e);
                stats.dropped += 1;
            }
        }
    }
    Ok(stats)
}
/// Owner of a running reader thread.
pub struct ReaderHandle {
    source_name: String,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<ReaderStats, AcquisitionError>>>,
}
impl ReaderHandle {
    pub fn spawn<S: LineSource + 'static>(
        mut source: S,
        channels: usize,
        queue: SampleQueue,
    ) -> Result<Self, AcquisitionError> {
        let source_name = source.describe();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("line-reader".into())
            .spawn(move || {
                let result = read_loop(&mut source, channels, &queue, &thread_stop);
                match &result {
                    Ok(stats) => info!(
                        "reader for {} stopped ({} frames, {} dropped)",
                        source.describe(),
                        stats.accepted,
                        stats.dropped
                    ),
                    Err(e) => warn!("reader for {} failed: {}", source.describe(), e),
                }
                result
            })
            .map_err(|e| AcquisitionError::Spawn(e.to_string()))?;
        info!("reader started on {}", source_name);
        Ok(Self {
            source_name,
            stop,
            thread: Some(thread),
        })
    }
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
    /// Asks the thread to exit after its current read attempt. Never blocks.
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }
    /// Stops the thread and waits for it; the wait is bounded by the
    /// source's read timeout.
    pub fn join(mut self) -> Result<ReaderStats, AcquisitionError> {
        self.signal_stop();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| AcquisitionError::ReaderPanicked)?,
            None => Ok(ReaderStats::default()),
        }
    }
}
impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ManualSource;
    use std::time::{Duration, Instant};
    /// Raises the stop flag once the script is exhausted.
    struct StopAtEnd {
        inner: ManualSource,
        remaining: usize,
        stop: Arc<AtomicBool>,
    }
    impl LineSource for StopAtEnd {
        fn read_line(&mut self) -> Result<Option<String>, AcquisitionError> {
            if self.remaining == 0 {
                self.stop.store(true, Ordering::Release);
                return Ok(None);
            }
            self.remaining -= 1;
            self.inner.read_line()
        }
        fn describe(&self) -> String {
            "script".into()
        }
    }
    fn run_script(lines: &[&str], channels: usize) -> (Vec<Sample>, ReaderStats) {
        let queue = SampleQueue::new();
        let stop = Arc::new(AtomicBool::new(false));
        let mut source = StopAtEnd {
            inner: ManualSource::new(lines.iter().copied()),
            remaining: lines.len(),
            stop: Arc::clone(&stop),
        };
        let stats = read_loop(&mut source, channels, &queue, &stop).unwrap();
        (queue.drain_all(), stats)
    }
    #[test]
    fn valid_lines_become_samples_in_field_order() {
        let (samples, stats) = run_script(&["23.50,24.10,22.90,25.00\r\n", "1,2,3,4\n"], 4);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].values, vec![23.5, 24.1, 22.9, 25.0]);
        assert_eq!(samples[1].values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(stats, ReaderStats { accepted: 2, dropped: 0 });
    }
    #[test]
    fn malformed_lines_are_dropped_and_reading_continues() {
        let (samples, stats) = run_script(
            &["1,2,3\n", "boot: ok\n", "1,2,x,4\n", "\n", "5,6,7,8\n", "1,2,3,4,5\n"],
            4,
        );
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].values, vec![5.0, 6.0, 7.0, 8.0]);
        assert_eq!(stats.dropped, 4);
    }
    #[test]
    fn read_error_ends_the_loop() {
        let queue = SampleQueue::new();
        let stop = AtomicBool::new(false);
        let mut source = ManualSource::new(["1,2\n"]).then_fail();
        let result = read_loop(&mut source, 2, &queue, &stop);
        assert!(matches!(result, Err(AcquisitionError::Read(_))));
        assert_eq!(queue.drain_all().len(), 1);
    }
    #[test]
    fn spawned_reader_stops_promptly_on_signal() {
        let queue = SampleQueue::new();
        let handle = ReaderHandle::spawn(ManualSource::new(["7,8\n"]), 2, queue.clone()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while queue.latest().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        handle.signal_stop();
        let stats = handle.join().unwrap();
        assert_eq!(stats.accepted, 1);
        assert_eq!(queue.latest().map(|s| s.values), Some(vec![7.0, 8.0]));
    }
}
