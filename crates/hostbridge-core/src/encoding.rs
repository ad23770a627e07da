//! Byte encodings for null-terminated strings

use crate::error::{MarshalError, MarshalResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Replacement byte written for characters an encoding cannot represent
pub const REPLACEMENT_BYTE: u8 = b'?';

/// Encoding of the bytes in a native string
///
/// - `Utf8`: standard UTF-8
/// - `Ansi`: single-byte ISO-8859-1; one byte per character, characters above
///   U+00FF are replaced with `?` on encode, and every byte decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Ansi,
}

impl Encoding {
    /// Encoded byte length of `text`, excluding the terminator
    pub fn encoded_len(&self, text: &str) -> usize {
        match self {
            Encoding::Utf8 => text.len(),
            Encoding::Ansi => text.chars().count(),
        }
    }

    /// Encode `text` into bytes (no terminator)
    ///
    /// UTF-8 borrows the input; ANSI allocates one byte per character.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        match self {
            Encoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            Encoding::Ansi => Cow::Owned(text.chars().map(ansi_byte).collect()),
        }
    }

    /// Longest encoded prefix of `text` that fits in `max_bytes`
    ///
    /// UTF-8 prefixes end on a character boundary, so a multi-byte sequence is
    /// never split.
    pub fn fitting_prefix<'a>(&self, text: &'a str, max_bytes: usize) -> Cow<'a, [u8]> {
        match self {
            Encoding::Utf8 => {
                let mut end = max_bytes.min(text.len());
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                Cow::Borrowed(&text.as_bytes()[..end])
            }
            Encoding::Ansi => Cow::Owned(text.chars().take(max_bytes).map(ansi_byte).collect()),
        }
    }

    /// Decode bytes (no terminator) into a `String`
    pub fn decode(&self, bytes: &[u8]) -> MarshalResult<String> {
        match self {
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_owned()),
                Err(e) => Err(MarshalError::InvalidEncoding {
                    encoding: *self,
                    position: e.valid_up_to(),
                }),
            },
            Encoding::Ansi => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Check whether every character of `text` survives an encode/decode cycle
    pub fn can_represent(&self, text: &str) -> bool {
        match self {
            Encoding::Utf8 => true,
            Encoding::Ansi => text.chars().all(|c| u32::from(c) <= 0xFF),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf8"),
            Encoding::Ansi => write!(f, "ansi"),
        }
    }
}

fn ansi_byte(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(REPLACEMENT_BYTE)
}
