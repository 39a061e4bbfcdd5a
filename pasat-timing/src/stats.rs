use std::collections::VecDeque;
use std::time::Duration;

/// Render-latency summary reported by the pacer when a run ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacingStats {
    /// Stimuli actually presented, the terminal padding excluded.
    pub presented: usize,
    /// Stimuli whose rendering took longer than the interval.
    pub overruns: usize,
    pub mean_render_ns: f64,
    pub jitter_ns: f64,
    pub min_render_ns: f64,
    pub max_render_ns: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct RenderSamples {
    durations: VecDeque<Duration>,
    max_samples: usize,
    presented: usize,
    overruns: usize,
}

impl RenderSamples {
    pub(crate) fn new(max_samples: usize) -> Self {
        Self {
            durations: VecDeque::with_capacity(max_samples.min(1000)),
            max_samples: max_samples.max(1),
            presented: 0,
            overruns: 0,
        }
    }

    pub(crate) fn record(&mut self, d: Duration) {
        if self.durations.len() >= self.max_samples {
            self.durations.pop_front();
        }
        self.durations.push_back(d);
        self.presented += 1;
    }

    pub(crate) fn overrun(&mut self) {
        self.overruns += 1;
    }

    pub(crate) fn stats(&self) -> PacingStats {
        let times: Vec<f64> = self
            .durations
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return PacingStats {
                presented: self.presented,
                overruns: self.overruns,
                ..PacingStats::default()
            };
        }
        let sum: f64 = times.iter().sum();
        let avg = sum / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        PacingStats {
            presented: self.presented,
            overruns: self.overruns,
            mean_render_ns: avg,
            jitter_ns: var.sqrt(),
            min_render_ns: min,
            max_render_ns: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_samples_report_zeroes() {
        let stats = RenderSamples::new(10).stats();
        assert_eq!(stats, PacingStats::default());
    }

    #[test]
    fn buffer_is_bounded_but_counts_everything() {
        let mut samples = RenderSamples::new(2);
        samples.record(Duration::from_millis(100));
        samples.record(Duration::from_millis(200));
        samples.record(Duration::from_millis(400));
        let stats = samples.stats();
        assert_eq!(stats.presented, 3);
        assert_eq!(stats.min_render_ns, 200_000_000.0);
        assert_eq!(stats.max_render_ns, 400_000_000.0);
        assert_eq!(stats.mean_render_ns, 300_000_000.0);
        assert_eq!(stats.jitter_ns, 100_000_000.0);
    }
}
