use std::io::{Cursor, Write};

use binrw::BinWrite;
use byteorder::{ByteOrder, LittleEndian};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use hbd_archive::patch::{PatchStatus, SkipReason};
use hbd_archive::types::{BlockHeader, ESection, SubBlockHeader, TextHeader, SECTOR_SIZE};
use hbd_archive::{extract, AddressIndex, ArchiveScanner, Patcher};
use hbd_huffman::{decode_stream, encode_fresh, PrefixTree, Symbol};

/// Build a text sub-block body: inner header, payload, `slack` filler bytes,
/// E-section, tree. Real chunks have no slack; tests use it to widen the patch
/// budget past the structural terminator inside the E-section.
fn text_body(uuid: u32, text: &str, slack: usize) -> Vec<u8> {
    let encoded = encode_fresh(&Symbol::parse_text(text), 4096).unwrap();
    let code_end = 0x18 + encoded.payload.len();
    let e_offset = code_end + slack;

    let header = TextHeader {
        alt_offset: 0,
        uuid,
        code_start: 0x18,
        code_end: code_end as u32,
        e_section_offset: e_offset as u32,
        reserved: 0,
    };
    let e_section = ESection {
        tree_offset: (e_offset + 10) as u32,
        tree_length: encoded.tree.len() as u32,
        node_count: 0,
    };

    let mut cursor = Cursor::new(Vec::new());
    header.write(&mut cursor).unwrap();
    cursor.write_all(&encoded.payload).unwrap();
    cursor.write_all(&vec![0xff; slack]).unwrap();
    e_section.write(&mut cursor).unwrap();
    cursor.write_all(&encoded.tree).unwrap();
    cursor.into_inner()
}

/// Build one block holding the given sub-blocks, padded to a whole number of sectors.
fn block(subs: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let total = 24 + subs.len() * 16 + subs.iter().map(|(_, b)| b.len()).sum::<usize>();
    let sections = total.div_ceil(SECTOR_SIZE);

    let header = BlockHeader {
        sub_block_count: subs.len() as u32,
        section_count: sections as u32,
        total_length: total as u32,
        reserved: 0,
    };

    let mut cursor = Cursor::new(Vec::new());
    header.write(&mut cursor).unwrap();
    for (kind, body) in subs {
        let sub = SubBlockHeader {
            data_length: body.len() as u32,
            uncompressed_length: body.len() as u32,
            reserved: 0,
            comp_flag: 0,
            kind: *kind,
        };
        sub.write(&mut cursor).unwrap();
    }
    for (_, body) in subs {
        cursor.write_all(body).unwrap();
    }

    let mut out = cursor.into_inner();
    out.resize(sections * SECTOR_SIZE, 0);
    out
}

#[test]
fn extract_single_string() {
    let archive = block(&[(40, text_body(0x11223344, "はい", 64))]);
    let strings = extract(&archive);

    assert_eq!(strings.len(), 1);
    assert_eq!(strings[0].identifier, "0001");
    assert_eq!(strings[0].text, "はい");
    assert_eq!(strings[0].record.block_start, 0);
    assert_eq!(strings[0].record.sub_block_header_offset, 24);
    assert_eq!(strings[0].record.sub_block_body_offset, 40);
    // First string starts at the first code byte, 0x18 into the body.
    assert_eq!(strings[0].record.absolute_text_offset, 40 + 0x18);
    assert_eq!(strings[0].record.uuid, 0x11223344);
}

#[test]
fn extract_renders_control_tokens() {
    let archive = block(&[(40, text_body(1, "はい{7f02}いいえ", 64))]);
    let strings = extract(&archive);

    assert_eq!(strings.len(), 1);
    assert_eq!(strings[0].text, "はい{7f02}いいえ");
}

#[test]
fn non_text_sub_blocks_are_skipped() {
    let archive = block(&[
        (41, vec![0x55; 128]),
        (40, text_body(2, "こんにちは", 64)),
    ]);
    let strings = extract(&archive);

    assert_eq!(strings.len(), 1);
    assert_eq!(strings[0].text, "こんにちは");
    // The text body sits after the skipped sub-block's 128 bytes.
    assert_eq!(strings[0].record.sub_block_body_offset, 24 + 2 * 16 + 128);
}

#[test]
fn scan_skips_garbage_sectors() {
    let mut archive = vec![0xaa; SECTOR_SIZE];
    archive.extend(block(&[(40, text_body(3, "はい", 64))]));

    let strings = extract(&archive);
    assert_eq!(strings.len(), 1);
    assert_eq!(strings[0].record.block_start, SECTOR_SIZE as u64);
}

#[test]
fn scanning_twice_yields_identical_results() {
    let mut archive = block(&[(40, text_body(4, "はい", 64))]);
    archive.extend(block(&[(42, text_body(5, "いいえ", 64))]));

    let first = extract(&archive);
    let second = extract(&archive);
    assert_eq!(first, second);
    assert_eq!(ArchiveScanner::new(&archive).count(), 2);
}

#[test]
fn patch_in_place_without_relocation() {
    let mut archive = block(&[(40, text_body(6, "はい", 64))]);
    let index = AddressIndex::from_extraction(&extract(&archive));
    let record = index.get("0001").unwrap().clone();

    // Same payload length as the original, so the code end stays put.
    let outcome = Patcher::new(&mut archive).apply(&record, "Yes");
    assert_eq!(outcome.status, PatchStatus::Written);
    assert_eq!(outcome.reason, None);

    let offset = record.absolute_text_offset as usize;
    let expected = encode_fresh(&Symbol::parse_text("Yes"), 4096).unwrap();
    assert_eq!(&archive[offset..offset + expected.payload.len()], &expected.payload[..]);

    // The written region decodes back to the replacement text.
    let tree = PrefixTree::from_bytes(&expected.tree);
    let decoded = decode_stream(&expected.payload, &tree);
    assert_eq!(decoded[0].text(), "Ｙｅｓ");
}

#[test]
fn patch_relocates_the_code_end_pointer() {
    let mut archive = block(&[(40, text_body(7, "はい", 64))]);
    let index = AddressIndex::from_extraction(&extract(&archive));
    let record = index.get("0001").unwrap().clone();

    let outcome = Patcher::new(&mut archive).apply(&record, "ＹｅｓＹｅｓＹｅｓ");
    assert_eq!(outcome.status, PatchStatus::Written);

    let offset = record.absolute_text_offset as usize;
    let body = record.sub_block_body_offset as usize;
    let expected = encode_fresh(&Symbol::parse_text("ＹｅｓＹｅｓＹｅｓ"), 4096).unwrap();

    assert_eq!(&archive[offset..offset + expected.payload.len()], &expected.payload[..]);
    let tree_at = offset + expected.payload.len();
    assert_eq!(&archive[tree_at..tree_at + expected.tree.len()], &expected.tree[..]);

    // Inner header's code end rewritten to the new payload end.
    let new_code_end = LittleEndian::read_u32(&archive[body + 12..body + 16]);
    assert_eq!(new_code_end as usize, 0x18 + expected.payload.len());
}

#[test]
fn patch_skips_when_budget_is_too_small() {
    // No slack: the structural terminator sits just past the one-byte payload.
    let mut archive = block(&[(40, text_body(8, "はい", 0))]);
    let index = AddressIndex::from_extraction(&extract(&archive));
    let record = index.get("0001").unwrap().clone();
    let before = archive.clone();

    let outcome = Patcher::new(&mut archive).apply(&record, "ＡＢＣＤＥＦＧＨ");
    assert_eq!(outcome.status, PatchStatus::Skipped);
    assert!(matches!(
        outcome.reason,
        Some(SkipReason::SizeExceeded { .. })
    ));
    assert_eq!(archive, before);
}

#[test]
fn patch_skips_when_pointer_fixup_misses() {
    // A large leading sub-block pushes the text body past the fixup search window.
    let mut archive = block(&[
        (1, vec![0x55; 600]),
        (40, text_body(9, "はい", 64)),
    ]);
    let index = AddressIndex::from_extraction(&extract(&archive));
    let record = index.get("0001").unwrap().clone();
    assert!(record.sub_block_body_offset > record.sub_block_header_offset + 512);
    let before = archive.clone();

    let outcome = Patcher::new(&mut archive).apply(&record, "ＹｅｓＹｅｓＹｅｓ");
    assert_eq!(outcome.status, PatchStatus::Skipped);
    assert_eq!(outcome.reason, Some(SkipReason::PointerFixupNotFound));
    assert_eq!(archive, before);
}

#[test]
fn apply_all_reports_every_translation() {
    let mut archive = block(&[(40, text_body(10, "はい", 64))]);
    archive.extend(block(&[(40, text_body(11, "いいえ", 0))]));
    let index = AddressIndex::from_extraction(&extract(&archive));

    let mut translations = IndexMap::new();
    translations.insert("0001".to_string(), "Yes".to_string());
    translations.insert("0002".to_string(), "ＡＢＣＤＥＦＧＨ".to_string());
    translations.insert("ffff".to_string(), "orphan".to_string());

    let report = Patcher::new(&mut archive).apply_all(&index, &translations);
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.written(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.outcomes[0].status, PatchStatus::Written);
    assert!(matches!(
        report.outcomes[2].reason,
        Some(SkipReason::BadRecord(_))
    ));
}
