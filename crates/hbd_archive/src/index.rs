//! The persisted address index produced by a scan pass.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::Result;
use crate::scan::ExtractedString;

/// Structural offsets locating one extracted string in the archive.
///
/// Records stay valid only while the archive's sub-block layout is unchanged between the
/// scan that produced them and any patch pass that consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Sequential hex identifier assigned by the scan pass
    pub identifier: String,

    /// Absolute offset of the containing block's magic marker
    pub block_start: u64,

    /// Absolute offset of the containing sub-block's 16-byte header
    pub sub_block_header_offset: u64,

    /// Absolute offset of the containing sub-block's body
    pub sub_block_body_offset: u64,

    /// Absolute offset of the byte holding the string's first code bit
    pub absolute_text_offset: u64,

    /// UUID of the containing text chunk
    pub uuid: u32,
}

/// Durable mapping from string identifier to [`AddressRecord`], in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressIndex {
    records: IndexMap<String, AddressRecord>,
}

impl AddressIndex {
    /// An empty index.
    pub fn new() -> AddressIndex {
        AddressIndex::default()
    }

    /// Build an index from a scan pass's extraction output.
    pub fn from_extraction(entries: &[ExtractedString]) -> AddressIndex {
        let mut index = AddressIndex::new();
        for entry in entries {
            index.insert(entry.record.clone());
        }
        index
    }

    /// Insert a record under its identifier.
    pub fn insert(&mut self, record: AddressRecord) {
        self.records.insert(record.identifier.clone(), record);
    }

    /// Look a record up by identifier.
    pub fn get(&self, identifier: &str) -> Option<&AddressRecord> {
        self.records.get(identifier)
    }

    /// Number of records in the index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = &AddressRecord> {
        self.records.values()
    }

    /// Persist the index as JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load an index persisted with [`AddressIndex::to_writer`].
    pub fn from_reader<R: Read>(reader: R) -> Result<AddressIndex> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{AddressIndex, AddressRecord};

    fn record(identifier: &str, offset: u64) -> AddressRecord {
        AddressRecord {
            identifier: identifier.into(),
            block_start: 0,
            sub_block_header_offset: 24,
            sub_block_body_offset: 40,
            absolute_text_offset: offset,
            uuid: 0xfeed,
        }
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = AddressIndex::new();
        index.insert(record("0001", 64));
        index.insert(record("0002", 96));

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("0002").map(|r| r.absolute_text_offset), Some(96));
        assert_eq!(index.get("00FF"), None);
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let mut index = AddressIndex::new();
        index.insert(record("0001", 64));
        index.insert(record("0002", 96));
        index.insert(record("0003", 128));

        let mut buf = Vec::new();
        index.to_writer(&mut buf).unwrap();
        let loaded = AddressIndex::from_reader(buf.as_slice()).unwrap();

        assert_eq!(loaded, index);
        let ids: Vec<&str> = loaded.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["0001", "0002", "0003"]);
    }
}
