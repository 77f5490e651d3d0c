//! This library decodes and encodes the per-string Huffman text streams stored inside
//! the **HBD** archives used by Heartbeat's PlayStation titles.
//!
//! # Compressed Text Format Documentation
//!
//! Every text chunk in an HBD archive carries its own serialized prefix tree followed by a
//! bit-packed code stream. Neither part is a general-purpose compression format: the tree is
//! only required to be prefix-unique, not weighted for minimal code length.
//!
//! ## Tree Byte Layout
//!
//! The tree is stored as a flat arena of 2-byte little-endian words. The last 2 bytes of the
//! on-disk range are a terminator convention and are dropped before parsing; the 2 bytes right
//! before them hold the root word, from which the root node index is computed as
//! `1 + word - 0x8000`.
//!
//! A node at index `i` stores its left child word at byte position `i * 2` and its right child
//! word at `i * 2 + half`, where `half` is half the trimmed arena length. Each word is
//! interpreted by its high byte:
//!
//! | High byte      | Meaning                                                             |
//! |----------------|---------------------------------------------------------------------|
//! | `0x80`..`0x8F` | Internal node; child index is `word - 0x8000`                       |
//! | `0x7E`, `0x7F` | Control token leaf; the raw word is the token tag                   |
//! | `0x00` (l=0)   | Terminator leaf (`0x0000`)                                          |
//! | anything else  | Character leaf; `word + 0x8000` is a big-endian Shift-JIS codepoint |
//!
//! A word whose index arithmetic lands outside the arena resolves to a null child; an arena
//! with fewer than 2 usable bytes yields an empty tree.
//!
//! ## Code Stream
//!
//! The code stream is walked bit by bit, least-significant bit first within each byte. Each
//! bit selects a child starting from the root; reaching a leaf emits its symbol and resets the
//! walk. A terminator leaf closes the current string. Any fragment still open when the bytes
//! run out is discarded: strings are always terminator-closed by construction.
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all stored words
//! - **Character space**: double-byte Shift-JIS, biased by `0x8000`
//! - **Control tokens**: opaque 2-byte tags with a `0x7E` or `0x7F` high byte
//!

pub mod charset;
pub mod decode;
pub mod encode;
pub mod error;
pub mod symbol;
pub mod tree;

pub use decode::decode_stream;
pub use encode::{encode_fresh, encode_with_tree, FreshEncoded};
pub use symbol::{DecodedString, Symbol};
pub use tree::PrefixTree;
