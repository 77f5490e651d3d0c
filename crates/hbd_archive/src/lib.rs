//! This library handles scanning, indexing and patching the **HBD** container format used
//! by Heartbeat's PlayStation titles.
//!
//! # HBD Container Format Documentation
//!
//! An HBD archive is a single flat binary file, sector-aligned in 2048-byte units. It holds
//! a sequence of blocks, each introduced by a fixed 8-byte magic marker. Between and around
//! blocks there may be arbitrary sector-aligned data; scanning steps one sector at a time
//! and validates headers rather than trusting any global table.
//!
//! ## Block Layout
//!
//! | Offset (bytes) | Field            | Description                                        |
//! |----------------|------------------|----------------------------------------------------|
//! | 0x0000         | Magic            | 8 bytes: `00 00 08 00 00 00 08 00`                 |
//! | 0x0008         | Sub-block count  | 4 bytes: number of sub-blocks, valid range 1..=20  |
//! | 0x000C         | Section count    | 4 bytes: sectors this block spans, range 1..=200   |
//! | 0x0010         | Total length     | 4 bytes: payload length, must be non-zero          |
//! | 0x0014         | Reserved         | 4 bytes: zero                                      |
//!
//! The block occupies exactly `section count * 2048` bytes. After the block header come
//! `sub-block count` 16-byte sub-block headers, then the sub-block bodies in the same
//! order.
//!
//! ## Sub-Block Header
//!
//! | Offset (bytes) | Field               | Description                                     |
//! |----------------|---------------------|-------------------------------------------------|
//! | 0x0000         | Data length         | 4 bytes: body length in the file                |
//! | 0x0004         | Uncompressed length | 4 bytes: body length after expansion            |
//! | 0x0008         | Reserved            | 4 bytes                                         |
//! | 0x000C         | Compression flag    | 2 bytes                                         |
//! | 0x000E         | Type                | 2 bytes: 40 and 42 carry compressed text        |
//!
//! ## Text Sub-Block Body
//!
//! Bodies of type 40/42 start with a 24-byte inner header:
//!
//! | Offset (bytes) | Field            | Description                                        |
//! |----------------|------------------|----------------------------------------------------|
//! | 0x0000         | Alt offset       | 4 bytes: end of the tree region in older chunks    |
//! | 0x0004         | UUID             | 4 bytes: chunk identity                            |
//! | 0x0008         | Code start       | 4 bytes: always 0x18                               |
//! | 0x000C         | Code end         | 4 bytes: end of the compressed code bytes          |
//! | 0x0010         | E-section offset | 4 bytes: where the tree descriptor lives           |
//! | 0x0014         | Reserved         | 4 bytes                                            |
//!
//! The compressed code bytes span `[code start, code end)`. At the E-section offset sits a
//! 10-byte descriptor (`tree offset: u32`, `tree length: u32`, `node count: u16`), and the
//! serialized prefix tree bytes follow it. The tree byte layout and the code stream itself
//! are documented in the `hbd_huffman` crate.
//!
//! ## Additional Information
//!
//! - **Sector size**: 2048 bytes; scanning advances in whole sectors
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Recovery**: an invalid block header is skipped one sector forward, never fatal
//!

pub mod error;
pub mod index;
pub mod patch;
pub mod scan;
pub mod types;

pub use index::{AddressIndex, AddressRecord};
pub use patch::{PatchReport, Patcher};
pub use scan::{extract, ArchiveScanner, ExtractedString, TextChunk};
