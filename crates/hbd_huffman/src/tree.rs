//! Building and serializing the index-biased prefix tree layout.

use byteorder::{ByteOrder, LittleEndian};
use std::collections::HashMap;

use crate::charset;
use crate::error::{Error, Result};
use crate::symbol::Symbol;

/// Highest internal node index the `0x8nnn` child words can address.
const NODE_INDEX_LIMIT: usize = 0x0fff;

/// One node of a [`PrefixTree`].
///
/// Children are optional: the raw layout can address positions outside the arena, which
/// resolve to null children rather than aborting the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Internal branch with a child per bit direction.
    Branch(Option<Box<Node>>, Option<Box<Node>>),
    /// Leaf holding one decodable symbol.
    Leaf(Symbol),
}

impl Node {
    /// The child in bit direction `bit`, or `None` for a leaf or a null child.
    pub fn child(&self, bit: u8) -> Option<&Node> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(left, right) => match bit {
                0 => left.as_deref(),
                _ => right.as_deref(),
            },
        }
    }
}

/// An in-memory prefix tree, materialized from (or serializable to) the archive's
/// index-biased byte layout.
///
/// A tree with N leaves has exactly N-1 internal nodes and no code is a prefix of
/// another. Trees live only for the duration of one decode or encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTree {
    root: Node,
}

impl PrefixTree {
    /// Build a tree from its raw byte range.
    ///
    /// The range ends right before the archive's 2-byte terminator convention: the trailing
    /// 2 bytes are dropped, and the word right before them selects the root node as
    /// `1 + word - 0x8000`. Fewer than 2 usable bytes yields an empty tree.
    pub fn from_bytes(raw: &[u8]) -> PrefixTree {
        if raw.len() < 4 {
            return PrefixTree {
                root: Node::Branch(None, None),
            };
        }

        let arena = &raw[..raw.len() - 2];
        let half = arena.len() / 2;
        let word = LittleEndian::read_u16(&arena[arena.len() - 2..]);
        let root_index = 1 + i64::from(word) - 0x8000;

        let mut path = vec![root_index];
        let mut budget = arena.len();
        PrefixTree {
            root: Node::Branch(
                resolve(arena, half, root_index, 0, &mut path, &mut budget).map(Box::new),
                resolve(arena, half, root_index, 1, &mut path, &mut budget).map(Box::new),
            ),
        }
    }

    /// Whether the tree holds no leaves at all.
    pub fn is_empty(&self) -> bool {
        matches!(self.root, Node::Branch(None, None))
    }

    /// The root's child in bit direction `bit`.
    pub fn child(&self, bit: u8) -> Option<&Node> {
        self.root.child(bit)
    }

    /// Build a fresh tree over exactly the distinct symbols of `symbols`, in order of
    /// first appearance.
    ///
    /// The shape is balanced by splitting the leaf list in half; no frequency weighting is
    /// applied, only prefix uniqueness. A single-symbol input gets that leaf on both
    /// branches so the root is still a proper internal node.
    pub fn from_symbols(symbols: &[Symbol]) -> PrefixTree {
        let mut leaves: Vec<Symbol> = Vec::new();
        for sym in symbols {
            if !leaves.contains(sym) {
                leaves.push(*sym);
            }
        }
        if leaves.is_empty() {
            leaves.push(Symbol::Terminator);
        }
        if leaves.len() == 1 {
            leaves.push(leaves[0]);
        }

        fn split(leaves: &[Symbol]) -> Node {
            if leaves.len() == 1 {
                return Node::Leaf(leaves[0]);
            }
            let mid = leaves.len().div_ceil(2);
            Node::Branch(
                Some(Box::new(split(&leaves[..mid]))),
                Some(Box::new(split(&leaves[mid..]))),
            )
        }

        PrefixTree {
            root: split(&leaves),
        }
    }

    /// Serialize into the index-biased byte layout, trailing terminator included, so that
    /// [`PrefixTree::from_bytes`] reconstructs an identical tree.
    ///
    /// The layout has no word for a missing child, so a branch with a null child fails
    /// with [`Error::NullChild`]. Freshly built trees always have both children.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let Node::Branch(left, right) = &self.root else {
            return Err(Error::EmptyTree);
        };
        if self.is_empty() {
            return Err(Error::EmptyTree);
        }

        // Slot words per internal node, indexed from 1; the root is node 1.
        let mut words: Vec<[u16; 2]> = vec![[0, 0]];
        let left_word = match left {
            Some(node) => child_word(node, &mut words)?,
            None => return Err(Error::NullChild),
        };
        let right_word = match right {
            Some(node) => child_word(node, &mut words)?,
            None => return Err(Error::NullChild),
        };
        words[0] = [left_word, right_word];

        let internal_count = words.len();
        let half = 2 * internal_count + 4;
        let arena_len = 2 * half;

        let mut buf = vec![0u8; arena_len + 2];
        for (slot, [left_word, right_word]) in words.iter().enumerate() {
            let index = slot + 1;
            LittleEndian::write_u16(&mut buf[index * 2..], *left_word);
            LittleEndian::write_u16(&mut buf[index * 2 + half..], *right_word);
        }
        // Root word: 0x8000 + root index - 1, with the root fixed at index 1.
        LittleEndian::write_u16(&mut buf[arena_len - 2..arena_len], 0x8000);

        Ok(buf)
    }

    /// Bit paths to every reachable leaf, keyed by symbol.
    ///
    /// When a symbol appears on more than one leaf the first path in traversal order wins.
    pub fn paths(&self) -> HashMap<Symbol, Vec<bool>> {
        fn walk(node: &Node, prefix: &mut Vec<bool>, map: &mut HashMap<Symbol, Vec<bool>>) {
            match node {
                Node::Leaf(sym) => {
                    map.entry(*sym).or_insert_with(|| prefix.clone());
                }
                Node::Branch(left, right) => {
                    for (bit, child) in [(false, left), (true, right)] {
                        if let Some(child) = child {
                            prefix.push(bit);
                            walk(child, prefix, map);
                            prefix.pop();
                        }
                    }
                }
            }
        }

        let mut map = HashMap::new();
        let mut prefix = Vec::new();
        walk(&self.root, &mut prefix, &mut map);
        map
    }
}

/// Resolve the node reached from `node` in direction `direction` against the arena.
///
/// `path` holds the node indices already descended into on this branch; a child word
/// that points back at one of them is a cycle and resolves to a null child. `budget`
/// caps total materialized nodes at the arena's own capacity, so aliased arenas that
/// share subtrees cannot blow the build up past linear work. A well-formed arena
/// visits every node once and never touches either limit.
fn resolve(
    arena: &[u8],
    half: usize,
    node: i64,
    direction: u8,
    path: &mut Vec<i64>,
    budget: &mut usize,
) -> Option<Node> {
    if *budget == 0 {
        return None;
    }
    *budget -= 1;

    let position = node * 2 + if direction == 1 { half as i64 } else { 0 };
    if position < 0 || position + 1 >= arena.len() as i64 {
        return None;
    }

    let low = arena[position as usize];
    let high = arena[position as usize + 1];

    if high & 0xf0 == 0x80 {
        let child = (i64::from(high) << 8 | i64::from(low)) - 0x8000;
        if path.contains(&child) {
            return None;
        }
        path.push(child);
        let branch = Node::Branch(
            resolve(arena, half, child, 0, path, budget).map(Box::new),
            resolve(arena, half, child, 1, path, budget).map(Box::new),
        );
        path.pop();
        return Some(branch);
    }

    let word = u16::from(high) << 8 | u16::from(low);
    let symbol = match (high, low) {
        (0x7e | 0x7f, _) => Symbol::ControlToken(word),
        (0, 0) => Symbol::Terminator,
        _ => Symbol::Character(
            charset::decode_codepoint(word).unwrap_or(char::REPLACEMENT_CHARACTER),
        ),
    };
    Some(Node::Leaf(symbol))
}

/// Emit the child word for `node`, appending internal node slots to `words` in preorder.
fn child_word(node: &Node, words: &mut Vec<[u16; 2]>) -> Result<u16> {
    match node {
        Node::Leaf(sym) => leaf_word(sym),
        Node::Branch(left, right) => {
            let index = words.len() + 1;
            if index > NODE_INDEX_LIMIT {
                return Err(Error::TreeTooLarge(NODE_INDEX_LIMIT));
            }
            words.push([0, 0]);
            let slot = index - 1;

            let left_word = match left {
                Some(node) => child_word(node, words)?,
                None => return Err(Error::NullChild),
            };
            let right_word = match right {
                Some(node) => child_word(node, words)?,
                None => return Err(Error::NullChild),
            };
            words[slot] = [left_word, right_word];
            Ok(0x8000 + index as u16)
        }
    }
}

fn leaf_word(sym: &Symbol) -> Result<u16> {
    match sym {
        Symbol::Terminator => Ok(0),
        Symbol::ControlToken(tag) => match tag >> 8 {
            0x7e | 0x7f => Ok(*tag),
            _ => Err(Error::InvalidControlToken(*tag)),
        },
        Symbol::Character(ch) => {
            charset::encode_codepoint(*ch).ok_or(Error::UnmappableCharacter(*ch))
        }
    }
}
