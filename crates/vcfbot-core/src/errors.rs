/// Core error type for the converter.
///
/// Adapter crates map their specific errors into this type so the
/// conversation layer can decide what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no valid contacts found")]
    NoContactsFound,

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("no active session")]
    SessionMissing,

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("file is not valid utf-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Errors caused by what the user sent, as opposed to infrastructure failures.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NoContactsFound
                | Error::InvalidChunkSize(_)
                | Error::SessionMissing
                | Error::UnsupportedFile(_)
                | Error::FileTooLarge { .. }
                | Error::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
