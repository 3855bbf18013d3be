use thiserror::Error;

/// Failures raised by the library itself rather than by user futures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// `reduce` was applied to an empty payload without an initial value.
    #[error("reduce of empty payload with no initial value")]
    EmptyReduce,
    /// An event loop call ran more tasks than its configured budget.
    #[error("event loop exceeded its turn limit of {limit}")]
    TurnLimit { limit: usize },
    /// Virtual time was advanced on a loop backed by the system clock.
    #[error("advancing time requires a manual clock")]
    ManualClockRequired,
    /// A configuration value could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
}
