//! Packing symbol sequences back into compressed byte runs.

use tracing::debug;

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use crate::tree::PrefixTree;

/// Result of a fresh-tree encode: the packed code bytes plus the serialized tree that
/// decodes them.
///
/// The container places the tree at a different address than the code, so the two parts
/// are returned separately for the caller to write (and, if relocated, to fix pointers
/// up for).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshEncoded {
    /// Bit-packed code stream, terminator included.
    pub payload: Vec<u8>,
    /// Serialized tree in the index-biased layout, trailing terminator bytes included.
    pub tree: Vec<u8>,
}

impl FreshEncoded {
    /// Combined byte count of payload and tree.
    pub fn len(&self) -> usize {
        self.payload.len() + self.tree.len()
    }

    /// Whether both parts are empty. Never true for a successful encode.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty() && self.tree.is_empty()
    }
}

/// Encode `symbols` against an existing tree.
///
/// A terminator is appended to the input. Fails with [`Error::MissingSymbol`] when the
/// tree has no leaf for a required symbol, and with [`Error::SizeExceeded`] when the
/// packed bytes outgrow `budget`; nothing is produced on failure.
pub fn encode_with_tree(tree: &PrefixTree, symbols: &[Symbol], budget: usize) -> Result<Vec<u8>> {
    let payload = pack(tree, symbols)?;
    if payload.len() > budget {
        return Err(Error::SizeExceeded {
            needed: payload.len(),
            budget,
        });
    }
    Ok(payload)
}

/// Encode `symbols` against a freshly built, string-local tree.
///
/// A terminator is appended to the input and a balanced tree is built over exactly the
/// symbols present. Succeeds only when payload plus serialized tree fit `budget`;
/// otherwise fails with [`Error::SizeExceeded`] and produces nothing.
pub fn encode_fresh(symbols: &[Symbol], budget: usize) -> Result<FreshEncoded> {
    let mut terminated: Vec<Symbol> = Vec::with_capacity(symbols.len() + 1);
    terminated.extend_from_slice(symbols);
    terminated.push(Symbol::Terminator);

    let tree = PrefixTree::from_symbols(&terminated);
    let tree_bytes = tree.to_bytes()?;
    let payload = pack(&tree, symbols)?;

    let needed = payload.len() + tree_bytes.len();
    if needed > budget {
        debug!(needed, budget, "fresh-tree encode over budget");
        return Err(Error::SizeExceeded { needed, budget });
    }

    Ok(FreshEncoded {
        payload,
        tree: tree_bytes,
    })
}

/// Pack `symbols` plus a trailing terminator, least-significant bit first.
fn pack(tree: &PrefixTree, symbols: &[Symbol]) -> Result<Vec<u8>> {
    let paths = tree.paths();

    let mut bytes: Vec<u8> = Vec::new();
    let mut bit = 0u8;
    for symbol in symbols.iter().chain(std::iter::once(&Symbol::Terminator)) {
        let path = paths.get(symbol).ok_or(Error::MissingSymbol(*symbol))?;
        for &direction in path {
            if bit == 0 {
                bytes.push(0);
            }
            if direction {
                *bytes.last_mut().expect("pushed above") |= 1 << bit;
            }
            bit = (bit + 1) % 8;
        }
    }

    Ok(bytes)
}
