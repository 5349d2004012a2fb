use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while resolving, sampling or firing transitions, and while
/// post-processing trajectories.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Every transition has an empty mode list: the net is in a dead state.
    #[error("no transition is enabled")]
    NoEnabledTransition,

    /// Some transitions are enabled, but the sum of their rates is zero.
    #[error("all enabled transitions have a rate of zero")]
    ZeroRateDeadlock,

    #[error("cumulative probability {cumulative} exceeds 1")]
    InvalidProbability { cumulative: f64 },

    #[error("transition `{transition}` has invalid rate {rate}")]
    InvalidRate { transition: String, rate: f64 },

    #[error("could not evaluate rate of transition `{transition}`: {message}")]
    RateEvaluation { transition: String, message: String },

    #[error("binding is not feasible for transition `{transition}`")]
    InfeasibleBinding { transition: String },

    #[error("got {timestamps} timestamps but {measurements} measurements")]
    LengthMismatch {
        timestamps: usize,
        measurements: usize,
    },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
}

/// Place names that would collide in the series of a trajectory log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("the place name `{0}` is reserved for timestamps")]
    ReservedName(String),

    #[error("two places are named `{0}`")]
    DuplicateName(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed log: {0}")]
    MalformedLog(#[from] serde_json::Error),

    #[error("expected a `.json` file, got {0}")]
    InvalidExtension(PathBuf),
}
