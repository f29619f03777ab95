pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unreadable XMind archive: {message}")]
    Archive { message: String },

    #[error("Unsupported XMind format: {message}")]
    UnsupportedFormat { message: String },

    #[error("Empty XMind document: {message}")]
    EmptyDocument { message: String },
}
