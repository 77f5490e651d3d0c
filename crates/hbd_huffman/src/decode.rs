//! Walking a prefix tree against a compressed byte run.

use tracing::trace;

use crate::symbol::{DecodedString, Symbol};
use crate::tree::{Node, PrefixTree};

/// Decode a compressed byte run against a prefix tree.
///
/// Bits are consumed least-significant first within each byte. A terminator leaf closes the
/// current string and records the bit offset where it started; the walk then resumes at the
/// root. A fragment still open when the bytes run out is discarded, not emitted: every
/// stored string is terminator-closed by construction, so a trailing fragment is padding.
///
/// Walking into a null child abandons the current fragment and resumes at the root, so the
/// decoder consumes all input bits for any tree without looping.
pub fn decode_stream(code: &[u8], tree: &PrefixTree) -> Vec<DecodedString> {
    let mut strings = Vec::new();
    if tree.is_empty() {
        return strings;
    }

    // `None` means the walk is at the root.
    let mut position: Option<&Node> = None;
    let mut symbols: Vec<Symbol> = Vec::new();
    let mut start_byte = 0usize;
    let mut start_bit = 0usize;

    for (byte_index, byte) in code.iter().enumerate() {
        for bit in 0..8 {
            let direction = (byte >> bit) & 1;
            let next = match position {
                None => tree.child(direction),
                Some(node) => node.child(direction),
            };

            match next {
                Some(Node::Branch(..)) => {
                    position = next;
                }
                Some(Node::Leaf(symbol)) => {
                    symbols.push(*symbol);
                    if *symbol == Symbol::Terminator {
                        strings.push(DecodedString {
                            symbols: std::mem::take(&mut symbols),
                            bit_offset: start_byte * 8 + start_bit,
                        });
                        start_byte = byte_index;
                        start_bit = bit + 1;
                    }
                    position = None;
                }
                None => {
                    // Null child: the code run does not fit this tree here. Drop the
                    // fragment and resynchronize at the next bit.
                    symbols.clear();
                    position = None;
                    start_byte = byte_index;
                    start_bit = bit + 1;
                }
            }
        }
    }

    if !symbols.is_empty() {
        trace!(
            dropped = symbols.len(),
            "discarding unterminated trailing fragment"
        );
    }

    strings
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::decode_stream;
    use crate::symbol::Symbol;
    use crate::tree::PrefixTree;

    fn two_leaf_tree() -> PrefixTree {
        PrefixTree::from_symbols(&[Symbol::Character('Ａ'), Symbol::Terminator])
    }

    #[test]
    fn decode_single_string() {
        // Bits LSB-first: 0 (Ａ), 0 (Ａ), 1 (terminator), then zero fill that never
        // reaches another terminator.
        let strings = decode_stream(&[0b0000_0100], &two_leaf_tree());

        assert_eq!(strings.len(), 1);
        assert_eq!(
            strings[0].symbols,
            vec![
                Symbol::Character('Ａ'),
                Symbol::Character('Ａ'),
                Symbol::Terminator,
            ]
        );
        assert_eq!(strings[0].bit_offset, 0);
    }

    #[test]
    fn trailing_fragment_is_discarded() {
        // One closed string, then five leaf symbols with no terminator.
        let strings = decode_stream(&[0b0000_0100], &two_leaf_tree());
        assert_eq!(strings.len(), 1);
        assert!(strings.iter().all(|s| s.symbols.last() == Some(&Symbol::Terminator)));
    }

    #[test]
    fn bit_offsets_track_string_starts() {
        // Terminator at bit 0 closes an empty string; the next starts at bit 1.
        let strings = decode_stream(&[0b0000_0011], &two_leaf_tree());

        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].bit_offset, 0);
        assert_eq!(strings[0].symbols, vec![Symbol::Terminator]);
        assert_eq!(strings[1].bit_offset, 1);
        assert_eq!(
            strings[1].symbols,
            vec![Symbol::Terminator]
        );
    }

    #[test]
    fn empty_tree_decodes_nothing() {
        let tree = PrefixTree::from_bytes(&[]);
        assert!(decode_stream(&[0xff, 0x00, 0xa5], &tree).is_empty());
    }

    #[test]
    fn all_input_consumed_for_arbitrary_bytes() {
        // Deeper tree, pseudo-random input: every emitted string must be closed.
        let symbols = Symbol::parse_text("あいうえおかきくけこ");
        let tree = PrefixTree::from_symbols(&[symbols.as_slice(), &[Symbol::Terminator]].concat());

        let code: Vec<u8> = (0u16..512).map(|i| (i.wrapping_mul(197) >> 3) as u8).collect();
        let strings = decode_stream(&code, &tree);
        for s in &strings {
            assert_eq!(s.symbols.last(), Some(&Symbol::Terminator));
            assert_eq!(
                s.symbols.iter().filter(|x| **x == Symbol::Terminator).count(),
                1
            );
        }
    }
}
