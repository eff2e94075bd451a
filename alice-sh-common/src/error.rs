use compact_str::CompactString;

/// A value was rejected by the domain of the descriptor it was meant for.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("wrong type for {instance}: expected {expected}, got {got}")]
    WrongType { instance: CompactString, expected: &'static str, got: &'static str },
    #[error("{value} is outside of {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },
    #[error("{value} is not a multiple of {precision} from {min}")]
    OffStep { value: f64, min: f64, precision: f64 },
    #[error("{value:?} is not one of the allowed values")]
    NotAllowed { value: CompactString },
    #[error("unknown instance {0:?}")]
    UnknownInstance(CompactString),
    #[error("unsupported payload: {0}")]
    Payload(CompactString),
}
