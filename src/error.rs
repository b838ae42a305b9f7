use thiserror::Error;

/// Error raised inside an engine backend.
///
/// Backends report failures as plain messages; the calculator decides at
/// its boundary whether they surface as input errors, calculation
/// failures, or are swallowed (the geometry-update fallback).
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        EngineError(msg.into())
    }
}

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller handed us something we cannot build a calculation from:
    /// bad geometry, an unknown damping family or method, missing damping
    /// parameters, or a malformed structure file.
    #[error("invalid input: {0}")]
    Input(String),

    /// The engine accepted the model but could not evaluate the given
    /// input and parameters.
    #[error("dispersion calculation failed: {0}")]
    CalculationFailed(String),
}

impl Error {
    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }
}
