//! Round timer with four named phases and warm-up exclusion.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    HostCompute,
    HostToDevice,
    DeviceExecution,
    DeviceToHost,
}

impl Phase {
    pub const ALL: [Phase; 4] =
        [Phase::HostCompute, Phase::HostToDevice, Phase::DeviceExecution, Phase::DeviceToHost];

    pub const fn label(self) -> &'static str {
        match self {
            Phase::HostCompute => "CPU",
            Phase::HostToDevice => "CPU-DPU",
            Phase::DeviceExecution => "DPU Kernel",
            Phase::DeviceToHost => "DPU-CPU",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Accumulates phase durations over the rounds after `warmup`.
#[derive(Debug, Clone)]
pub struct RoundTimer {
    warmup: usize,
    round: usize,
    totals: [Duration; 4],
}

impl RoundTimer {
    pub fn new(warmup: usize) -> Self {
        Self { warmup, round: 0, totals: [Duration::ZERO; 4] }
    }

    pub fn begin_round(&mut self, round: usize) {
        self.round = round;
    }

    pub fn is_warmup(&self) -> bool {
        self.round < self.warmup
    }

    /// Run `f`, charging its wall time to `phase` unless this is a warm-up round.
    pub fn measure<R>(&mut self, phase: Phase, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.record(phase, start.elapsed());
        out
    }

    pub fn record(&mut self, phase: Phase, elapsed: Duration) {
        if !self.is_warmup() {
            self.totals[phase.slot()] += elapsed;
        }
    }

    /// Averages over `timed_rounds` rounds.
    pub fn report(&self, timed_rounds: usize) -> TimingReport {
        let divisor = timed_rounds.max(1) as u32;
        TimingReport {
            rounds: timed_rounds,
            averages: Phase::ALL.map(|phase| (phase, self.totals[phase.slot()] / divisor)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingReport {
    pub rounds: usize,
    pub averages: [(Phase, Duration); 4],
}

impl TimingReport {
    pub fn average(&self, phase: Phase) -> Duration {
        self.averages[phase.slot()].1
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (phase, avg)) in self.averages.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}: {:.3} ms", phase.label(), avg.as_secs_f64() * 1e3)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_rounds_are_excluded() {
        let mut timer = RoundTimer::new(2);
        for round in 0..5 {
            timer.begin_round(round);
            timer.record(Phase::DeviceExecution, Duration::from_millis(10 * (round as u64 + 1)));
        }
        // rounds 2, 3, 4 -> 30 + 40 + 50
        let report = timer.report(3);
        assert_eq!(report.average(Phase::DeviceExecution), Duration::from_millis(40));
        assert_eq!(report.average(Phase::HostCompute), Duration::ZERO);
    }

    #[test]
    fn test_measure_returns_value() {
        let mut timer = RoundTimer::new(0);
        assert_eq!(timer.measure(Phase::HostCompute, || 7), 7);
    }

    #[test]
    fn test_report_labels() {
        let text = RoundTimer::new(0).report(1).to_string();
        assert!(text.starts_with("CPU: 0.000 ms\tCPU-DPU:"), "{text}");
        assert!(text.contains("DPU Kernel:") && text.ends_with("ms"), "{text}");
    }
}
