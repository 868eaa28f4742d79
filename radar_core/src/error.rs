use thiserror::Error;

/// Errors surfaced while assembling a radar controller. The control
/// loop itself has no fatal path: once built, `step()` degrades on
/// hardware faults instead of returning errors.
#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing range sensor")]
    MissingSensor,
    #[error("missing sweep servo")]
    MissingServo,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
