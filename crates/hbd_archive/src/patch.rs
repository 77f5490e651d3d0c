//! In-place rewriting of re-encoded strings under strict size budgets.

use std::fmt;
use std::io::Cursor;

use binrw::BinRead;
use byteorder::{ByteOrder, LittleEndian};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument};

use hbd_huffman::error::Error as CodecError;
use hbd_huffman::{encode_fresh, Symbol};

use crate::index::{AddressIndex, AddressRecord};
use crate::types::{TextHeader, TEXT_HEADER_LEN};

/// How far past a string's offset the budget probe looks for a structural terminator.
pub const BUDGET_WINDOW: usize = 1024;

/// How far past a sub-block header the pointer fixup searches for the old value.
pub const FIXUP_WINDOW: usize = 512;

/// Terminal state of one patched string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatchStatus {
    /// New payload (and tree) written at the recorded offsets
    Written,
    /// Original bytes untouched
    Skipped,
}

/// Why a string was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Encoded payload plus tree outgrew the available span
    SizeExceeded { needed: usize, budget: usize },
    /// The plaintext could not be encoded at all
    Encode(String),
    /// Relocation could not locate the old pointer near the sub-block header
    PointerFixupNotFound,
    /// The record does not fit the loaded archive
    BadRecord(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::SizeExceeded { needed, budget } => {
                write!(f, "needs {needed} bytes but only {budget} are free")
            }
            SkipReason::Encode(msg) => write!(f, "encode failed: {msg}"),
            SkipReason::PointerFixupNotFound => {
                write!(f, "old code-end pointer not found near sub-block header")
            }
            SkipReason::BadRecord(msg) => write!(f, "bad address record: {msg}"),
        }
    }
}

/// Outcome of one string in a patch pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOutcome {
    /// Identifier from the address index
    pub identifier: String,

    /// Terminal state
    pub status: PatchStatus,

    /// Present when the string was skipped
    pub reason: Option<SkipReason>,
}

/// Accumulated per-string outcomes of a patch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    /// Outcomes in the order strings were attempted
    pub outcomes: Vec<PatchOutcome>,
}

impl PatchReport {
    /// Number of strings written.
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == PatchStatus::Written)
            .count()
    }

    /// Number of strings skipped.
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// In-place patcher over a loaded archive buffer.
///
/// Each string follows the state machine `Located -> Encode -> {EncodedOK |
/// EncodeFailed} -> Written | Skipped`; both end states are terminal and a skipped
/// string leaves its bytes untouched. Only the fresh-tree encode strategy is used.
pub struct Patcher<'a> {
    data: &'a mut [u8],
}

impl<'a> Patcher<'a> {
    /// Wrap a mutable archive buffer.
    pub fn new(data: &'a mut [u8]) -> Patcher<'a> {
        Patcher { data }
    }

    /// Re-encode `text` and write it over the string addressed by `record`.
    ///
    /// The byte budget is the span from the recorded offset to the next 2-byte zero
    /// terminator (capped by [`BUDGET_WINDOW`]). The new payload lands at the recorded
    /// offset with the fresh tree right behind it; when that moves the code end, the old
    /// code-end word near the sub-block header is rewritten to the new value. A fixup
    /// that cannot find the old word aborts before anything is written.
    #[instrument(skip_all, fields(identifier = %record.identifier))]
    pub fn apply(&mut self, record: &AddressRecord, text: &str) -> PatchOutcome {
        let offset = record.absolute_text_offset as usize;
        let body = record.sub_block_body_offset as usize;

        if offset >= self.data.len() || body + TEXT_HEADER_LEN > self.data.len() {
            return skipped(record, SkipReason::BadRecord("offset beyond archive".into()));
        }
        if offset < body + TEXT_HEADER_LEN {
            return skipped(
                record,
                SkipReason::BadRecord("text offset inside its inner header".into()),
            );
        }

        let budget = free_span(self.data, offset);
        let encoded = match encode_fresh(&Symbol::parse_text(text), budget) {
            Ok(encoded) => encoded,
            Err(CodecError::SizeExceeded { needed, budget }) => {
                return skipped(record, SkipReason::SizeExceeded { needed, budget });
            }
            Err(e) => return skipped(record, SkipReason::Encode(e.to_string())),
        };

        // The fixup reads the current header value, never a cached one: earlier patches
        // in the same pass may already have moved this chunk's code end.
        let header = match TextHeader::read(&mut Cursor::new(&self.data[body..])) {
            Ok(header) => header,
            Err(_) => return skipped(record, SkipReason::BadRecord("unreadable inner header".into())),
        };
        let old_code_end = header.code_end;
        let new_code_end = (offset - body + encoded.payload.len()) as u32;

        let fixup = if new_code_end != old_code_end {
            match find_pointer(
                self.data,
                record.sub_block_header_offset as usize,
                old_code_end,
            ) {
                Some(position) => Some(position),
                None => return skipped(record, SkipReason::PointerFixupNotFound),
            }
        } else {
            None
        };

        let payload_end = offset + encoded.payload.len();
        self.data[offset..payload_end].copy_from_slice(&encoded.payload);
        self.data[payload_end..payload_end + encoded.tree.len()].copy_from_slice(&encoded.tree);
        if let Some(position) = fixup {
            LittleEndian::write_u32(&mut self.data[position..position + 4], new_code_end);
        }

        debug!(
            identifier = %record.identifier,
            offset,
            bytes = encoded.len(),
            relocated = fixup.is_some(),
            "written"
        );

        PatchOutcome {
            identifier: record.identifier.clone(),
            status: PatchStatus::Written,
            reason: None,
        }
    }

    /// Patch every translated string, accumulating per-string outcomes.
    ///
    /// Failures never abort the pass; a translation with no address record is reported
    /// as skipped.
    pub fn apply_all(
        &mut self,
        index: &AddressIndex,
        translations: &IndexMap<String, String>,
    ) -> PatchReport {
        let mut report = PatchReport::default();
        for (identifier, text) in translations {
            let outcome = match index.get(identifier) {
                Some(record) => self.apply(record, text),
                None => PatchOutcome {
                    identifier: identifier.clone(),
                    status: PatchStatus::Skipped,
                    reason: Some(SkipReason::BadRecord("no address record".into())),
                },
            };
            report.outcomes.push(outcome);
        }
        report
    }
}

fn skipped(record: &AddressRecord, reason: SkipReason) -> PatchOutcome {
    debug!(identifier = %record.identifier, reason = %reason, "skipped");
    PatchOutcome {
        identifier: record.identifier.clone(),
        status: PatchStatus::Skipped,
        reason: Some(reason),
    }
}

/// Bytes available at `offset`: the span up to and including the next 2-byte zero
/// terminator, else the whole probe window.
fn free_span(data: &[u8], offset: usize) -> usize {
    let window = BUDGET_WINDOW.min(data.len() - offset);
    data[offset..offset + window]
        .windows(2)
        .position(|pair| pair == [0, 0])
        .map(|i| i + 2)
        .unwrap_or(window)
}

/// Search near a sub-block header for a little-endian word equal to `value`.
fn find_pointer(data: &[u8], header_offset: usize, value: u32) -> Option<usize> {
    let needle = value.to_le_bytes();
    let start = header_offset.saturating_sub(8);
    let end = (header_offset + FIXUP_WINDOW).min(data.len().saturating_sub(3));
    (start..end).find(|&i| data[i..i + 4] == needle)
}
