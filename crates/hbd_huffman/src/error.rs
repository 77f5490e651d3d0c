//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::symbol::Symbol;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// prefix tree has no encodable leaves
    #[error("prefix tree has no encodable leaves")]
    EmptyTree,

    /// the byte layout has no word for a missing child
    #[error("prefix tree has a branch with a null child")]
    NullChild,

    /// tree exceeds the node limit of the index-biased layout
    #[error("prefix tree has more than {0} internal nodes")]
    TreeTooLarge(usize),

    /// the supplied tree has no code path for a required symbol
    #[error("no code path for symbol {0} in the supplied tree")]
    MissingSymbol(Symbol),

    /// a character cannot be expressed in the legacy codepoint space
    #[error("character {0:?} has no legacy codepoint mapping")]
    UnmappableCharacter(char),

    /// a control token tag that the tree layout cannot represent
    #[error("control token {0:#06x} is outside the 0x7exx/0x7fxx range")]
    InvalidControlToken(u16),

    /// the encoded form does not fit the caller's byte budget
    #[error("encoded form needs {needed} bytes but only {budget} are available")]
    SizeExceeded { needed: usize, budget: usize },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
