use std::collections::VecDeque;
use crate::drivers::Sample;
/// Rolling per-channel history used by the live view.
///
/// Points older than `window_secs` relative to the newest sample are pruned.
/// Times are reported relative to the first sample ever pushed so the plot
/// x axis starts at zero.
pub struct LiveHistory {
    per_channel: Vec<VecDeque<[f64; 2]>>,
    window_secs: f64,
    origin: Option<f64>,
}
impl LiveHistory {
    pub fn new(channels: usize, window_secs: f64) -> Self {
        Self {
            per_channel: (0..channels).map(|_| VecDeque::new()).collect(),
            window_secs: window_secs.max(1.0),
            origin: None,
        }
    }
    pub fn num_channels(&self) -> usize {
        self.per_channel.len()
    }
    pub fn push(&mut self, sample: &Sample) {
        let origin = *self.origin.get_or_insert(sample.timestamp);
        let t = sample.timestamp - origin;
        for (queue, value) in self.per_channel.iter_mut().zip(&sample.values) {
            queue.push_back([t, *value]);
        }
        self.prune(t);
    }
    pub fn extend<'a>(&mut self, samples: impl IntoIterator<Item = &'a Sample>) {
        for sample in samples {
            self.push(sample);
        }
    }
    pub fn channel(&self, index: usize) -> Vec<[f64; 2]> {
        self.per_channel
            .get(index)
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }
    pub fn clear(&mut self) {
        for queue in &mut self.per_channel {
            queue.clear();
        }
        self.origin = None;
    }
    fn prune(&mut self, newest: f64) {
        let threshold = newest - self.window_secs;
        for queue in &mut self.per_channel {
            while let Some(front) = queue.front() {
                if front[0] < threshold {
                    queue.pop_front();
                } else {
                    break;
                }
            }
        }
    }
}
