use std::time::Duration;

use crate::clock::Clock;

/// Aggregate tick statistics for a run.
#[derive(Debug, Clone)]
pub struct TickStats {
    pub average_tick_ns: f64,
    pub jitter_ns: f64,
    pub min_tick_ns: f64,
    pub max_tick_ns: f64,
    pub effective_hz: f64,
}

/// Fixed-period pacing for the driver loop.
///
/// `wait` sleeps up to the next tick boundary and returns the measured `dt`
/// since the previous tick, so the loop body always sees real elapsed time
/// even when a tick overruns its period.
#[derive(Debug, Clone)]
pub struct TickPacer {
    period: Duration,
    last: Option<Duration>,
    samples: Vec<Duration>,
    max_samples: usize,
}

impl TickPacer {
    pub fn new(hz: f64) -> Self {
        let hz = if hz > 0.0 { hz } else { 90.0 };
        Self {
            period: Duration::from_secs_f64(1.0 / hz),
            last: None,
            samples: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn wait(&mut self, clock: &impl Clock) -> Duration {
        match self.last {
            None => {
                // First tick has no previous boundary; report the nominal period.
                self.last = Some(clock.now());
                self.period
            }
            Some(last) => {
                let target = last + self.period;
                let now = clock.now();
                if now < target {
                    clock.sleep(target - now);
                }
                let now = clock.now();
                let dt = now.saturating_sub(last);
                self.record(dt);
                self.last = Some(now);
                dt
            }
        }
    }

    fn record(&mut self, dt: Duration) {
        if self.samples.len() >= self.max_samples {
            self.samples.remove(0);
        }
        self.samples.push(dt);
    }

    pub fn stats(&self) -> TickStats {
        let times: Vec<f64> = self.samples.iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return TickStats {
                average_tick_ns: 0.0,
                jitter_ns: 0.0,
                min_tick_ns: 0.0,
                max_tick_ns: 0.0,
                effective_hz: 0.0,
            };
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(0.0f64, f64::max);
        TickStats {
            average_tick_ns: avg,
            jitter_ns: var.sqrt(),
            min_tick_ns: min,
            max_tick_ns: max,
            effective_hz: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}
