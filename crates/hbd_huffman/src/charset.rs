//! Translation between the archive's legacy double-byte codepoints and characters.
//!
//! Stored tree words are biased by `0x8000` relative to the raw Shift-JIS value. The game
//! text is set entirely in double-byte (full-width) glyphs, so ASCII input is first mapped
//! onto the corresponding zenkaku codepoints before falling back to the stock Shift-JIS
//! encoder.

use encoding_rs::SHIFT_JIS;

/// Punctuation with no computable zenkaku offset.
const ZENKAKU_PUNCT: &[(char, u16)] = &[
    (' ', 0x8140),
    (',', 0x8141),
    ('.', 0x8142),
    ('?', 0x8148),
    ('!', 0x8149),
    ('\'', 0x8166),
    ('{', 0x816f),
    ('}', 0x8170),
];

/// Translate a stored tree word into a character.
///
/// Returns `None` when `word + 0x8000` is not a valid double-byte Shift-JIS codepoint.
pub fn decode_codepoint(word: u16) -> Option<char> {
    let bytes = word.wrapping_add(0x8000).to_be_bytes();
    let (text, _, had_errors) = SHIFT_JIS.decode(&bytes);
    if had_errors {
        return None;
    }

    let mut chars = text.chars();
    let ch = chars.next()?;
    // Two bytes decoding as two separate characters means the lead byte was not
    // a double-byte lead at all.
    if chars.next().is_some() {
        return None;
    }
    Some(ch)
}

/// Translate a character into a stored tree word.
///
/// ASCII letters, digits and common punctuation map onto their full-width codepoints;
/// everything else goes through the Shift-JIS encoder and must produce a double-byte
/// sequence. Returns `None` for characters outside the legacy space.
pub fn encode_codepoint(ch: char) -> Option<u16> {
    let code = match ch {
        'A'..='Z' => 0x8260 + (ch as u16 - 'A' as u16),
        'a'..='z' => 0x8281 + (ch as u16 - 'a' as u16),
        '0'..='9' => 0x824f + (ch as u16 - '0' as u16),
        _ => {
            if let Some((_, code)) = ZENKAKU_PUNCT.iter().find(|(p, _)| *p == ch) {
                *code
            } else {
                let mut buf = [0u8; 4];
                let (bytes, _, had_errors) = SHIFT_JIS.encode(ch.encode_utf8(&mut buf));
                if had_errors || bytes.len() != 2 {
                    return None;
                }
                u16::from_be_bytes([bytes[0], bytes[1]])
            }
        }
    };
    Some(code.wrapping_sub(0x8000))
}

/// Map a character onto the one it will decode back as, where a mapping exists.
///
/// ASCII normalizes to its full-width form; characters with no legacy codepoint are
/// returned unchanged and will surface as an encode failure later.
pub fn canonical(ch: char) -> char {
    encode_codepoint(ch).and_then(decode_codepoint).unwrap_or(ch)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{canonical, decode_codepoint, encode_codepoint};

    #[test]
    fn ascii_maps_to_zenkaku() {
        assert_eq!(encode_codepoint('A'), Some(0x0260));
        assert_eq!(encode_codepoint('z'), Some(0x029a));
        assert_eq!(encode_codepoint('0'), Some(0x024f));
        assert_eq!(encode_codepoint(' '), Some(0x0140));
    }

    #[test]
    fn decode_bias_matches_shift_jis() {
        // 0x82A0 is hiragana あ; stored words drop the 0x8000 bias.
        assert_eq!(decode_codepoint(0x02a0), Some('あ'));
        assert_eq!(decode_codepoint(0x0260), Some('Ａ'));
    }

    #[test]
    fn invalid_codepoints_are_rejected() {
        // 0x8000 + 0x2000 = 0xA000: lead byte 0xA0 is single-byte katakana territory.
        assert_eq!(decode_codepoint(0x2000), None);
        assert_eq!(encode_codepoint('€'), None);
    }

    #[test]
    fn japanese_round_trips() {
        for ch in "こんにちは勇者様、ドラゴン".chars() {
            let word = encode_codepoint(ch).expect("double-byte codepoint");
            assert_eq!(decode_codepoint(word), Some(ch));
        }
    }

    #[test]
    fn canonical_full_width() {
        assert_eq!(canonical('A'), 'Ａ');
        assert_eq!(canonical('あ'), 'あ');
        assert_eq!(canonical('€'), '€');
    }
}
