//! Command-line logger
use super::{LogError, LogValue, StatsLogger};
use crate::utils::stats::OnlineMeanVariance;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use yansi::Paint;

/// Logger that periodically displays summaries to standard output.
///
/// Scalars are summarized by their mean and standard deviation since the last display.
/// Counters show their total and the increment since the last display.
/// Pending summaries are displayed when the logger is dropped.
#[derive(Debug, Clone)]
pub struct DisplayLogger {
    interval: Duration,
    last_display: Instant,
    entries: BTreeMap<String, Entry>,
    pending: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Scalar(OnlineMeanVariance<f64>),
    Counter { total: u64, increment: u64 },
}

impl Entry {
    fn new(value: LogValue) -> Self {
        match value {
            LogValue::Scalar(_) => Self::Scalar(OnlineMeanVariance::default()),
            LogValue::CounterIncrement(_) => Self::Counter {
                total: 0,
                increment: 0,
            },
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Counter { .. } => "counter",
        }
    }

    /// Start a new summary period.
    fn rollover(&mut self) {
        match self {
            Self::Scalar(stats) => *stats = OnlineMeanVariance::default(),
            Self::Counter { increment, .. } => *increment = 0,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Scalar(stats) => {
                if stats.count() > 0 {
                    write!(f, "{:.3}", stats.mean())?;
                    if stats.count() > 1 {
                        write!(
                            f,
                            " {}",
                            Paint::fixed(8, format!("(σ {:.3})", stats.stddev()))
                        )?;
                    }
                }
                Ok(())
            }
            Self::Counter { total, increment } => {
                write!(f, "{}  (+{})", total, Paint::fixed(253, increment))
            }
        }
    }
}

impl DisplayLogger {
    /// Display summaries at most once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_display: Instant::now(),
            entries: BTreeMap::new(),
            pending: false,
        }
    }

    /// Mean of the scalar logged under `name` since the last display.
    pub fn scalar_mean(&self, name: &str) -> Option<f64> {
        match self.entries.get(name) {
            Some(Entry::Scalar(stats)) if stats.count() > 0 => Some(stats.mean()),
            _ => None,
        }
    }

    /// Total of the counter logged under `name`.
    pub fn counter_total(&self, name: &str) -> Option<u64> {
        match self.entries.get(name) {
            Some(Entry::Counter { total, .. }) => Some(*total),
            _ => None,
        }
    }

    fn display(&mut self) {
        println!();
        for (name, entry) in &self.entries {
            println!("{:<24} {}", Paint::fixed(35, name), entry);
        }
        for entry in self.entries.values_mut() {
            entry.rollover();
        }
        self.last_display = Instant::now();
        self.pending = false;
    }
}

impl Default for DisplayLogger {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl StatsLogger for DisplayLogger {
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError> {
        let entry = self
            .entries
            .entry(name.to_owned())
            .or_insert_with(|| Entry::new(value));
        match (entry, value) {
            (Entry::Scalar(stats), LogValue::Scalar(x)) => stats.push(x),
            (Entry::Counter { total, increment }, LogValue::CounterIncrement(n)) => {
                *total += n;
                *increment += n;
            }
            (entry, value) => {
                return Err(LogError::IncompatibleValue {
                    name: name.to_owned(),
                    found: value.kind(),
                    expected: entry.kind(),
                })
            }
        }
        self.pending = true;
        if self.last_display.elapsed() >= self.interval {
            self.display();
        }
        Ok(())
    }

    fn flush(&mut self) {
        if self.pending {
            self.display();
        }
    }
}

impl Drop for DisplayLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() -> DisplayLogger {
        DisplayLogger::new(Duration::from_secs(3600))
    }

    #[test]
    fn scalar_mean() {
        let mut logger = logger();
        logger.log_scalar("reward", 1.0).unwrap();
        logger.log_scalar("reward", 3.0).unwrap();
        assert_eq!(logger.scalar_mean("reward"), Some(2.0));
        assert_eq!(logger.scalar_mean("missing"), None);
    }

    #[test]
    fn counter_total_survives_display() {
        let mut logger = logger();
        logger.log_counter_increment("episodes", 2).unwrap();
        logger.log_counter_increment("episodes", 3).unwrap();
        logger.flush();
        logger.log_counter_increment("episodes", 1).unwrap();
        assert_eq!(logger.counter_total("episodes"), Some(6));
    }

    #[test]
    fn display_resets_scalars() {
        let mut logger = logger();
        logger.log_scalar("steps", 10.0).unwrap();
        logger.flush();
        assert_eq!(logger.scalar_mean("steps"), None);
    }

    #[test]
    fn incompatible_value() {
        let mut logger = logger();
        logger.log_scalar("x", 1.0).unwrap();
        assert_eq!(
            logger.log_counter_increment("x", 1),
            Err(LogError::IncompatibleValue {
                name: "x".into(),
                found: "counter",
                expected: "scalar"
            })
        );
    }
}
