use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintSheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid dimensions: {width}x{height} (both must be non-zero)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "Request {request}: item {width}x{height} can never fit the usable page area {usable_width}x{usable_height}"
    )]
    ItemTooLarge {
        request: usize,
        width: u32,
        height: u32,
        usable_width: u32,
        usable_height: u32,
    },
    #[error("Nothing to lay out")]
    Empty,
    #[error("Layout run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PrintSheetError>;
