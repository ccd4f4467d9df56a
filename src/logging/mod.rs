//! Logging statistics from simulation runs
mod display;

pub use display::DisplayLogger;

use thiserror::Error;

/// A value that can be logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogValue {
    /// A scalar value. Aggregated by mean and standard deviation.
    Scalar(f64),
    /// An increment to a counter. Aggregated by sum.
    CounterIncrement(u64),
}

impl LogValue {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::CounterIncrement(_) => "counter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("\"{name}\": incompatible value type {found}, expected {expected}")]
    IncompatibleValue {
        name: String,
        found: &'static str,
        expected: &'static str,
    },
}

/// Log statistics from a simulation run.
pub trait StatsLogger {
    /// Log a value.
    ///
    /// # Returns
    /// An error if the value is structurally incompatible with previous values logged
    /// under the same name.
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError>;

    /// Write any pending summaries.
    fn flush(&mut self);

    fn log_scalar(&mut self, name: &str, value: f64) -> Result<(), LogError> {
        self.log(name, LogValue::Scalar(value))
    }

    fn log_counter_increment(&mut self, name: &str, increment: u64) -> Result<(), LogError> {
        self.log(name, LogValue::CounterIncrement(increment))
    }
}

/// Logger that does nothing
impl StatsLogger for () {
    fn log(&mut self, _: &str, _: LogValue) -> Result<(), LogError> {
        Ok(())
    }

    fn flush(&mut self) {}
}

impl<T: StatsLogger + ?Sized> StatsLogger for &'_ mut T {
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError> {
        T::log(self, name, value)
    }
    fn flush(&mut self) {
        T::flush(self)
    }
}

impl<T: StatsLogger + ?Sized> StatsLogger for Box<T> {
    fn log(&mut self, name: &str, value: LogValue) -> Result<(), LogError> {
        T::log(self, name, value)
    }
    fn flush(&mut self) {
        T::flush(self)
    }
}
