use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Variable '{0}' not found in dataset")]
    MissingVariable(String),

    #[error("Coordinate '{0}' not found in dataset")]
    MissingCoordinate(String),

    #[error("Dimension '{dim}' has length {left} on one operand and {right} on the other")]
    DimensionMismatch {
        dim: String,
        left: usize,
        right: usize,
    },

    #[error("Variable with dimensions {from:?} cannot be broadcast to {to:?}")]
    NotBroadcastable { from: Vec<String>, to: Vec<String> },

    #[error("Expected dimensions {expected:?}, found {found:?}")]
    UnexpectedDimensions {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Array shape does not match its dimension names")]
    ShapeMismatch(#[from] ndarray::ShapeError),

    #[error("Time axes cannot be combined: {0}")]
    IncompatibleTimeAxes(String),

    #[error("Dataset has no time axis")]
    MissingTimeAxis,

    #[error("Time axis uses the '{0}' calendar; a standard calendar is required here")]
    NonStandardTime(String),

    #[error("Unknown calendar '{0}'")]
    UnknownCalendar(String),

    #[error("Unsupported time units '{0}'")]
    InvalidTimeUnits(String),
}
