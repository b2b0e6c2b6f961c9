//! Error types for frais

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed, missing or invalid fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Unsupported attachment type: {0}")]
    UnsupportedAttachment(String),

    #[error("PDF parse error: {0}")]
    PdfParse(#[from] lopdf::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Merge error: {0}")]
    Merge(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
