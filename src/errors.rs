use alloc::string::String;
use core::fmt;

/// Crate-wide error type.
///
/// Three families: configuration errors (malformed construction arguments,
/// caught once at build time), numerical precondition failures (fatal, abort
/// the whole run), and user model failures (carried through untouched).
#[derive(Debug, Clone, PartialEq)]
pub enum YabfError {
    /// Malformed construction argument.
    ConfigErr(&'static str),

    /// Inconsistent vector/matrix sizes across construction arguments.
    DimensionMismatchErr(&'static str),

    /// A covariance that must be symmetric positive definite failed its
    /// Cholesky factorization at setup, before any propagation ran.
    NotPositiveDefiniteErr { matrix: &'static str },

    /// A matrix that must be invertible came out singular while processing
    /// the named sample. The run is invalid as a whole; history entries past
    /// `sample` are left unset.
    SingularErr {
        matrix: &'static str,
        sample: usize,
    },

    /// Failure raised by a user-supplied model callable, uninterpreted.
    ModelErr(String),
}

impl fmt::Display for YabfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YabfError::ConfigErr(what) => write!(f, "configuration error: {}", what),
            YabfError::DimensionMismatchErr(what) => {
                write!(f, "dimension mismatch: {}", what)
            }
            YabfError::NotPositiveDefiniteErr { matrix } => {
                write!(f, "{} is not symmetric positive definite", matrix)
            }
            YabfError::SingularErr { matrix, sample } => {
                write!(f, "{} is singular at sample {}", matrix, sample)
            }
            YabfError::ModelErr(what) => write!(f, "model evaluation failed: {}", what),
        }
    }
}
