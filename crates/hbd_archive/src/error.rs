//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`serde_json::Error`]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// Transparent wrapper for the codec library's error
    #[error(transparent)]
    Codec(#[from] hbd_huffman::error::Error),

    /// a text chunk whose inner structure does not hold together
    #[error("text chunk structure is malformed: {0}")]
    MalformedChunk(&'static str),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
