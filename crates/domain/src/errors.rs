use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("filter with this name or URL already exists: {0}")]
    DuplicateFilter(String),

    #[error("no filter with URL: {0}")]
    FilterNotFound(String),

    #[error("invalid filter list: {0}")]
    InvalidFilterList(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status code: {0}")]
    HttpStatus(u16),

    #[error("data contains non-printable characters")]
    NotPlainText,

    #[error("data is HTML, not plain text")]
    HtmlContent,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}
