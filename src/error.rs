use thiserror::Error;

/// Errors produced while configuring or driving an [`crate::Engine`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown mutator `{0}`")]
    UnknownMutator(String),

    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),

    #[error("selection string did not name anything")]
    EmptySelection,

    #[error("invalid priority `{value}` for `{id}`")]
    InvalidPriority { id: String, value: String },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("`{0}` must not be null")]
    NullPointer(&'static str),

    #[error("failed to parse options: {0}")]
    Options(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
