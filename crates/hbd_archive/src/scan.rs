//! Scanning an archive for blocks, sub-blocks and text chunks.

use std::collections::VecDeque;
use std::io::Cursor;
use std::ops::Range;

use binrw::BinRead;
use tracing::{instrument, trace};

use hbd_huffman::{decode_stream, DecodedString, PrefixTree};

use crate::error::{Error, Result};
use crate::index::AddressRecord;
use crate::types::{
    BlockHeader, ESection, SubBlockHeader, TextHeader, BLOCK_HEAD_LEN, BLOCK_MAGIC, CODE_START,
    E_SECTION_LEN, MAX_BODY_LEN, SECTOR_SIZE, TEXT_HEADER_LEN,
};

/// One text-bearing sub-block body located by the scanner.
#[derive(Debug, Clone, Copy)]
pub struct TextChunk<'a> {
    /// Absolute offset of the block's magic marker
    pub block_start: usize,

    /// Absolute offset of this sub-block's 16-byte header
    pub header_offset: usize,

    /// Absolute offset of this sub-block's body
    pub body_offset: usize,

    /// Sub-block type (40 or 42)
    pub kind: u16,

    /// The body bytes
    pub body: &'a [u8],
}

/// Structural offsets of one text chunk, resolved against its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkLayout {
    /// The 24-byte inner header
    pub header: TextHeader,

    /// The 10-byte tree descriptor
    pub e_section: ESection,

    /// Compressed code bytes, body-relative
    pub code: Range<usize>,

    /// Serialized tree bytes, body-relative
    pub tree: Range<usize>,
}

impl<'a> TextChunk<'a> {
    /// Resolve the inner header and E-section into byte ranges.
    ///
    /// The tree region ends at `tree_offset + tree_length` from the E-section; chunks that
    /// predate the length field fall back to the inner header's alt offset, then to the end
    /// of the body.
    #[instrument(skip(self), fields(offset = self.body_offset), err)]
    pub fn layout(&self) -> Result<ChunkLayout> {
        let len = self.body.len();
        if len < TEXT_HEADER_LEN {
            return Err(Error::MalformedChunk("body shorter than inner header"));
        }

        let header = TextHeader::read(&mut Cursor::new(self.body))?;
        if header.code_start != CODE_START {
            return Err(Error::MalformedChunk("code start is not 0x18"));
        }

        let code_start = header.code_start as usize;
        let code_end = header.code_end as usize;
        if code_end < code_start || code_end > len {
            return Err(Error::MalformedChunk("code range out of bounds"));
        }

        let e_offset = header.e_section_offset as usize;
        if e_offset.saturating_add(E_SECTION_LEN) > len {
            return Err(Error::MalformedChunk("e-section out of bounds"));
        }
        let e_section = ESection::read(&mut Cursor::new(&self.body[e_offset..]))?;

        let tree_start = e_offset + E_SECTION_LEN;
        let tree_end = if e_section.tree_length > 0 {
            tree_start.saturating_add(e_section.tree_length as usize)
        } else if header.alt_offset != 0 {
            header.alt_offset as usize
        } else {
            len
        };
        let tree_end = tree_end.min(len).max(tree_start);

        Ok(ChunkLayout {
            header,
            e_section,
            code: code_start..code_end,
            tree: tree_start..tree_end,
        })
    }

    /// Decode every terminator-closed string stored in this chunk.
    ///
    /// A chunk whose tree region yields no leaves decodes to zero strings.
    pub fn decode(&self) -> Result<Vec<DecodedString>> {
        let layout = self.layout()?;
        let tree = PrefixTree::from_bytes(&self.body[layout.tree.clone()]);
        if tree.is_empty() {
            return Ok(Vec::new());
        }
        Ok(decode_stream(&self.body[layout.code.clone()], &tree))
    }
}

/// Lazy scanner over the raw archive bytes.
///
/// Walks the archive one 2048-byte sector at a time looking for the block magic. A header
/// that fails validation is skipped one sector forward and never aborts the scan; a valid
/// block is consumed whole by advancing `section count` sectors, which bounds the scan to
/// one probe per sector. Scanning the same bytes twice yields identical chunks.
pub struct ArchiveScanner<'a> {
    data: &'a [u8],
    cursor: usize,
    pending: VecDeque<TextChunk<'a>>,
}

impl<'a> ArchiveScanner<'a> {
    /// Start a scan at offset 0.
    pub fn new(data: &'a [u8]) -> ArchiveScanner<'a> {
        ArchiveScanner {
            data,
            cursor: 0,
            pending: VecDeque::new(),
        }
    }

    /// Probe the current sector, queueing text chunks from a valid block.
    fn advance(&mut self) {
        let at = self.cursor;
        let Some(head) = self.data.get(at..at + BLOCK_HEAD_LEN) else {
            self.cursor = self.data.len();
            return;
        };

        if head[..8] != BLOCK_MAGIC {
            self.cursor = at + SECTOR_SIZE;
            return;
        }

        let header = match BlockHeader::read(&mut Cursor::new(head)) {
            Ok(header) if header.is_valid() => header,
            _ => {
                self.cursor = at + SECTOR_SIZE;
                return;
            }
        };

        trace!(
            offset = at,
            sub_blocks = header.sub_block_count,
            sections = header.section_count,
            "block"
        );

        let count = header.sub_block_count as usize;
        let headers_start = at + BLOCK_HEAD_LEN;
        let mut body_offset = headers_start + count * 16;

        for i in 0..count {
            let header_offset = headers_start + i * 16;
            let Some(bytes) = self.data.get(header_offset..header_offset + 16) else {
                break;
            };
            let Ok(sub) = SubBlockHeader::read(&mut Cursor::new(bytes)) else {
                break;
            };

            if sub.data_length == 0 || sub.data_length >= MAX_BODY_LEN {
                continue;
            }
            let data_length = sub.data_length as usize;
            let Some(body) = self.data.get(body_offset..body_offset + data_length) else {
                break;
            };

            if sub.is_text() {
                self.pending.push_back(TextChunk {
                    block_start: at,
                    header_offset,
                    body_offset,
                    kind: sub.kind,
                    body,
                });
            }
            body_offset += data_length;
        }

        self.cursor = at + header.span();
    }
}

impl<'a> Iterator for ArchiveScanner<'a> {
    type Item = TextChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(chunk);
            }
            if self.cursor >= self.data.len() {
                return None;
            }
            self.advance();
        }
    }
}

/// One string extracted by a scan pass, with the address record that locates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedString {
    /// Sequential hex identifier (`0001`, `0002`, ...)
    pub identifier: String,

    /// Rendered plaintext with `{hhll}` control-token markers
    pub text: String,

    /// Where the string lives in the archive
    pub record: AddressRecord,
}

/// Run a full scan pass: locate every text chunk, decode it, and assign identifiers.
///
/// Strings carrying nothing but their terminator are dropped. Chunks whose inner
/// structure is malformed or whose tree has no leaves yield no strings; the scan
/// continues at the next sub-block either way.
pub fn extract(data: &[u8]) -> Vec<ExtractedString> {
    let mut out: Vec<ExtractedString> = Vec::new();

    for chunk in ArchiveScanner::new(data) {
        let layout = match chunk.layout() {
            Ok(layout) => layout,
            Err(e) => {
                trace!(offset = chunk.body_offset, error = %e, "skipping malformed chunk");
                continue;
            }
        };

        let tree = PrefixTree::from_bytes(&chunk.body[layout.tree.clone()]);
        if tree.is_empty() {
            continue;
        }

        for string in decode_stream(&chunk.body[layout.code.clone()], &tree) {
            if string.is_blank() {
                continue;
            }

            let identifier = format!("{:04X}", out.len() + 1);
            let absolute = chunk.body_offset + layout.code.start + string.bit_offset / 8;
            out.push(ExtractedString {
                identifier: identifier.clone(),
                text: string.text(),
                record: AddressRecord {
                    identifier,
                    block_start: chunk.block_start as u64,
                    sub_block_header_offset: chunk.header_offset as u64,
                    sub_block_body_offset: chunk.body_offset as u64,
                    absolute_text_offset: absolute as u64,
                    uuid: layout.header.uuid,
                },
            });
        }
    }

    out
}
