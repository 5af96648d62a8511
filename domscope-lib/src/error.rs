use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("stylesheet parse error: {0}")]
    Css(String),

    #[error("no element is currently selected")]
    NoSelection,

    #[error("screenshot capture failed: {0}")]
    Capture(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("invalid page url: {0}")]
    Url(#[from] url::ParseError),
}
