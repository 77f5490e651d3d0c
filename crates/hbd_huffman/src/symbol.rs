//! Symbols emitted by the decoder and accepted by the encoder.

use std::fmt;

use crate::charset;

/// A single decoded unit from a compressed text stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A printable character, translated from the archive's legacy codepoint space.
    Character(char),

    /// An opaque 2-byte in-stream marker with a `0x7E` or `0x7F` high byte.
    ///
    /// Tokens carry formatting or placeholder meaning to the game engine; this library
    /// passes them through without interpreting them.
    ControlToken(u16),

    /// End-of-string marker, stored as the word `0x0000`.
    Terminator,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Symbol::Character(c) => write!(f, "{c}"),
            Symbol::ControlToken(tag) => write!(f, "{{{tag:04x}}}"),
            Symbol::Terminator => write!(f, "{{0000}}"),
        }
    }
}

impl Symbol {
    /// Parse a plaintext string into a symbol sequence.
    ///
    /// `{hhll}` brace markers become [`Symbol::ControlToken`]s (`{0000}` becomes a
    /// [`Symbol::Terminator`]); everything else becomes one [`Symbol::Character`] per char.
    /// Characters are canonicalized into the legacy codepoint space where a mapping exists,
    /// so ASCII letters come back as their full-width forms. No terminator is appended; the
    /// encoder adds its own.
    pub fn parse_text(text: &str) -> Vec<Symbol> {
        let mut out = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('{') {
                let tag = tail
                    .get(..4)
                    .filter(|_| tail.as_bytes().get(4) == Some(&b'}'))
                    .and_then(|hex| u16::from_str_radix(hex, 16).ok());
                if let Some(tag) = tag {
                    out.push(match tag {
                        0 => Symbol::Terminator,
                        tag => Symbol::ControlToken(tag),
                    });
                    rest = &tail[5..];
                    continue;
                }
            }

            let ch = rest.chars().next().expect("rest is non-empty");
            out.push(Symbol::Character(charset::canonical(ch)));
            rest = &rest[ch.len_utf8()..];
        }

        out
    }
}

/// One terminator-closed string decoded from a code stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedString {
    /// The decoded symbols, ending in exactly one [`Symbol::Terminator`].
    pub symbols: Vec<Symbol>,

    /// Bit position of the string's first code bit, relative to the start of the code run.
    pub bit_offset: usize,
}

impl DecodedString {
    /// Render the string as plaintext, with control tokens as `{hhll}` markers.
    ///
    /// The closing terminator is not rendered; [`Symbol::parse_text`] of the result gives
    /// back the same symbols minus that terminator.
    pub fn text(&self) -> String {
        let mut s = String::new();
        for sym in &self.symbols {
            match sym {
                Symbol::Terminator => {}
                other => s.push_str(&other.to_string()),
            }
        }
        s
    }

    /// Whether the string carries no symbols besides its terminator.
    pub fn is_blank(&self) -> bool {
        self.symbols.iter().all(|s| *s == Symbol::Terminator)
    }
}
