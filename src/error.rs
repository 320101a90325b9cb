use thiserror::Error;

use crate::manager::FlightPlanIndex;

/// Coarse classification of a [`FlightPlanError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PreconditionViolation,
    InvariantRisk,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlightPlanError {
    #[error("[FMS/FPM] Can't find {kind} '{ident}'")]
    NotFound { kind: &'static str, ident: String },

    #[error("[FMS/FPM] {0}")]
    Precondition(String),

    #[error("[FMS/FPM] Index {index} is out of range for a plan with {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("[FMS/FPM] Tried to access absent flight plan at index {0}")]
    PlanAbsent(FlightPlanIndex),

    #[error("[FMS/FPM] Tried to create existing flight plan at index {0}")]
    PlanExists(FlightPlanIndex),

    #[error("[FMS/FPM] Invalid constraint: {0}")]
    InvalidConstraint(String),
}

impl FlightPlanError {
    pub fn not_found(kind: &'static str, ident: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            ident: ident.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Precondition(_) | Self::PlanAbsent(_) | Self::PlanExists(_) => {
                ErrorKind::PreconditionViolation
            }
            Self::IndexOutOfRange { .. } | Self::InvalidConstraint(_) => {
                ErrorKind::InvariantRisk
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FlightPlanError>;
