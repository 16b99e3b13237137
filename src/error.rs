//! Error types for the planner pipeline.

use std::fmt;

use crate::optimizer::SolverStatus;

/// Malformed input, rejected before any search starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NoEndDepots,
    NoAgents,
    MatrixDimension { expected: usize, rows: usize },
    MatrixNotSquare { row: usize, len: usize },
    NegativeTravelTime { from: usize, to: usize, value: i64 },
    NegativeDuration { request: String, value: i64 },
    InvertedWindow { entity: String, start: i64, end: i64 },
    NegativeTime { entity: String, value: i64 },
    InvalidPrice { request: String, value: f64 },
    InvalidCapacity { agent: String, value: i64 },
    InvalidRating { agent: String, value: f64, scale: f64 },
    InvalidOptions(String),
    CostOverflow(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoEndDepots => write!(f, "at least one end depot is required"),
            ValidationError::NoAgents => write!(f, "at least one agent is required"),
            ValidationError::MatrixDimension { expected, rows } => write!(
                f,
                "travel matrix has {} rows, expected {}",
                rows, expected
            ),
            ValidationError::MatrixNotSquare { row, len } => {
                write!(f, "travel matrix row {} has {} columns", row, len)
            }
            ValidationError::NegativeTravelTime { from, to, value } => {
                write!(f, "negative travel time {} from {} to {}", value, from, to)
            }
            ValidationError::NegativeDuration { request, value } => {
                write!(f, "request {} has negative duration {}", request, value)
            }
            ValidationError::InvertedWindow { entity, start, end } => {
                write!(f, "{} has window end {} before start {}", entity, end, start)
            }
            ValidationError::NegativeTime { entity, value } => {
                write!(f, "{} has negative time value {}", entity, value)
            }
            ValidationError::InvalidPrice { request, value } => {
                write!(f, "request {} has invalid price {}", request, value)
            }
            ValidationError::InvalidCapacity { agent, value } => {
                write!(f, "agent {} has invalid capacity {}", agent, value)
            }
            ValidationError::InvalidRating { agent, value, scale } => write!(
                f,
                "agent {} has rating {} outside [0, {}]",
                agent, value, scale
            ),
            ValidationError::InvalidOptions(msg) => write!(f, "invalid options: {}", msg),
            ValidationError::CostOverflow(msg) => write!(f, "cost overflow: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of the external travel-time source.
#[derive(Debug)]
pub enum ProviderError {
    Http(reqwest::Error),
    Status(String),
    Malformed(String),
    Shape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Http(err) => write!(f, "travel-time request failed: {}", err),
            ProviderError::Status(status) => write!(f, "provider returned status {}", status),
            ProviderError::Malformed(msg) => write!(f, "malformed provider response: {}", msg),
            ProviderError::Shape { expected, actual } => write!(
                f,
                "provider returned {}x{} block, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err)
    }
}

/// The search produced no feasible incumbent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfeasibleError {
    pub status: SolverStatus,
}

impl fmt::Display for InfeasibleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no feasible solution (status {:?})", self.status)
    }
}

impl std::error::Error for InfeasibleError {}

#[derive(Debug)]
pub enum PlannerError {
    Validation(ValidationError),
    Infeasible(InfeasibleError),
    Provider(ProviderError),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::Validation(err) => err.fmt(f),
            PlannerError::Infeasible(err) => err.fmt(f),
            PlannerError::Provider(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Validation(err) => Some(err),
            PlannerError::Infeasible(err) => Some(err),
            PlannerError::Provider(err) => Some(err),
        }
    }
}

impl From<ValidationError> for PlannerError {
    fn from(err: ValidationError) -> Self {
        PlannerError::Validation(err)
    }
}

impl From<InfeasibleError> for PlannerError {
    fn from(err: InfeasibleError) -> Self {
        PlannerError::Infeasible(err)
    }
}

impl From<ProviderError> for PlannerError {
    fn from(err: ProviderError) -> Self {
        PlannerError::Provider(err)
    }
}
