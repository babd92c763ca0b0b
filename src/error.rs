//! Error type shared by the modelling layer, the instance facade and the
//! network builder.
//!
//! Every variant is fatal for the model being built: construction aborts and
//! no partially built model is handed back. Solving outcomes (infeasible,
//! timeout) are not errors; see [`SolverStatus`](crate::cp::SolverStatus).

use thiserror::Error;

/// Errors raised while validating inputs or composing a model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    #[error("malformed location code '{0}'")]
    MalformedCode(String),

    #[error("attribute out of range ({field}): {message}")]
    OutOfRange { field: String, message: String },

    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("variable '{0}' declared twice")]
    DuplicateVariable(String),

    #[error("unknown variable handle #{0}")]
    UnknownVariable(usize),

    #[error("unknown table handle #{0}")]
    UnknownTable(usize),

    #[error("empty domain for variable '{0}'")]
    EmptyDomain(String),

    #[error("clause over {0} literals, expected 1 to {max}", max = crate::cp::MAX_CLAUSE_ARITY)]
    ClauseArity(usize),

    #[error("table arity mismatch: expected {expected} columns, got {actual}")]
    TableArity { expected: usize, actual: usize },

    #[error("variable '{0}' has no value in the assignment")]
    Unassigned(String),

    #[error("no table row matches the inputs of '{0}'")]
    NoMatchingRow(String),

    #[error("cannot evaluate definition of '{name}': {message}")]
    Evaluation { name: String, message: String },
}

impl ModelError {
    pub(crate) fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::OutOfRange {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;
