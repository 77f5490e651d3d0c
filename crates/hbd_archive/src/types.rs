//! Base types for the structure of HBD containers.

use binrw::{BinRead, BinWrite};

/// Archives are aligned and scanned in sectors of this many bytes.
pub const SECTOR_SIZE: usize = 2048;

/// The 8-byte sentinel preceding every block header.
pub const BLOCK_MAGIC: [u8; 8] = [0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x08, 0x00];

/// Bytes of magic plus serialized [`BlockHeader`].
pub const BLOCK_HEAD_LEN: usize = 24;

/// Fixed value of [`TextHeader::code_start`] in well-formed chunks.
pub const CODE_START: u32 = 0x18;

/// Byte length of the serialized [`TextHeader`].
pub const TEXT_HEADER_LEN: usize = 24;

/// Byte length of the serialized [`ESection`].
pub const E_SECTION_LEN: usize = 10;

/// Bodies larger than this are treated as a scan artifact, not a real sub-block.
pub const MAX_BODY_LEN: u32 = 10 * 1024 * 1024;

/// Block header, preceded by the 8-byte magic.
///
/// All data is stored in little endian format.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(magic = b"\x00\x00\x08\x00\x00\x00\x08\x00", little)]
pub struct BlockHeader {
    /// Number of sub-block headers that follow
    pub sub_block_count: u32,

    /// Number of 2048-byte sectors the whole block spans
    pub section_count: u32,

    /// Payload length of the block
    pub total_length: u32,

    /// Always zero
    pub reserved: u32,
}

impl BlockHeader {
    /// Whether the header fields fall inside the ranges a real block uses.
    pub fn is_valid(&self) -> bool {
        (1..=20).contains(&self.sub_block_count)
            && (1..=200).contains(&self.section_count)
            && self.total_length > 0
    }

    /// Bytes the block occupies, magic and header included.
    pub fn span(&self) -> usize {
        self.section_count as usize * SECTOR_SIZE
    }
}

/// Header of one sub-block inside a block.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct SubBlockHeader {
    /// Length of the body as stored
    pub data_length: u32,

    /// Length of the body after expansion
    pub uncompressed_length: u32,

    /// Reserved
    pub reserved: u32,

    /// Compression flag
    pub comp_flag: u16,

    /// Payload type; 40 and 42 carry compressed text
    pub kind: u16,
}

impl SubBlockHeader {
    /// Whether this sub-block carries compressed text.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, 40 | 42)
    }
}

/// The 24-byte inner header at the start of a text sub-block body.
///
/// All offsets are relative to the body start.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct TextHeader {
    /// End of the tree region in chunks that predate the E-section length field
    pub alt_offset: u32,

    /// Chunk identity carried through to the address index
    pub uuid: u32,

    /// Start of the compressed code bytes; always 0x18
    pub code_start: u32,

    /// End of the compressed code bytes
    pub code_end: u32,

    /// Position of the 10-byte E-section
    pub e_section_offset: u32,

    /// Reserved
    pub reserved: u32,
}

/// The 10-byte tree descriptor following the code bytes.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct ESection {
    /// Position of the tree bytes, relative to the body start
    pub tree_offset: u32,

    /// Length of the tree bytes
    pub tree_length: u32,

    /// Node count recorded by the original packer; informational only
    pub node_count: u16,
}
