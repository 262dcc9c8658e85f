//! Mapping relational column names onto engine-safe names.
//!
//! `[0-9A-Za-z_]` is kept as is, except a leading `_` (the engine reserves it). Every other character
//! becomes `@` followed by its code point as five lowercase hex digits: `name` stays `name`,
//! `_id` becomes `@0005fid`, `タイトル` becomes `@030bf@030a4@030c8@030eb`.

use crate::config::DatabaseEncoding;
use crate::error::{ScanError, ScanResult};
use lexscan_engine::TABLE_MAX_KEY_SIZE;

const ENCODED_CHARACTER_LENGTH: usize = 6;

fn is_usable_ascii(c: char) -> bool { c == '_' || c.is_ascii_alphanumeric() }

fn check_size(size: usize, tag: &str) -> ScanResult<()> {
    // the engine also stores a terminator
    if size + 1 >= TABLE_MAX_KEY_SIZE {
        return Err(ScanError::InvalidArgument(format!("{tag} encoded column name >= {TABLE_MAX_KEY_SIZE}")));
    }
    Ok(())
}

pub fn encode(name: &str, encoding: DatabaseEncoding) -> ScanResult<String> {
    let tag = if encoding.is_utf8() { "[column-name][encode][utf8]" } else { "[column-name][encode]" };
    let mut encoded = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if !encoding.is_utf8() && encoding.char_len(c) != 1 {
            return Err(ScanError::Unsupported(format!(
                "{tag} multibyte character isn't supported for column name except UTF-8 encoding: <{name}>({encoding:?})"
            )));
        }
        if is_usable_ascii(c) && !(c == '_' && i == 0) {
            check_size(encoded.len() + 1, tag)?;
            encoded.push(c);
        } else {
            let codepoint = c as u32;
            if codepoint > 0xfffff {
                return Err(ScanError::Unsupported(format!("{tag} character U+{codepoint:X} does not fit the encoded form: <{name}>")));
            }
            check_size(encoded.len() + ENCODED_CHARACTER_LENGTH, tag)?;
            encoded.push_str(&format!("@{codepoint:05x}"));
        }
    }
    Ok(encoded)
}

pub fn decode(encoded: &str) -> ScanResult<String> {
    let tag = "[column-name][decode]";
    let mut name = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(c) = rest.chars().next() {
        if c != '@' {
            name.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }
        let hex = rest
            .get(1..ENCODED_CHARACTER_LENGTH)
            .ok_or_else(|| ScanError::InvalidArgument(format!("{tag} truncated escape: <{encoded}>")))?;
        let decoded = u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)))
            .and_then(char::from_u32)
            .ok_or_else(|| ScanError::InvalidArgument(format!("{tag} invalid escape @{hex}: <{encoded}>")))?;
        name.push(decoded);
        rest = &rest[ENCODED_CHARACTER_LENGTH..];
    }
    Ok(name)
}
