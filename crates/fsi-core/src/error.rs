use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown {what}: '{value}'")]
    UnknownTag { what: &'static str, value: String },

    #[error("Order level out of range: {value} (expected 0, 1 or 2)")]
    OrderOutOfRange { value: u64 },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}
