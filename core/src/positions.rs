//! Where keywords occur in a text, as byte ranges of the original text. Matching happens on
//! normalized text; with an index the normalizer of its first lexicon is used, so positions agree
//! with what a search through that index matches.

use crate::catalog::IndexRelation;
use crate::error::{ErrorLevel, ScanError, ScanResult};
use crate::lookup::lookup_lexicon;
use lexscan_engine::{Context, Normalizer};
use tracing::trace;

fn normalizer_of(ctx: &Context, index: Option<&IndexRelation>) -> ScanResult<Normalizer> {
    let Some(index) = index else {
        return Ok(Normalizer::Auto);
    };
    for key in 0..index.key_columns.len() {
        if let Some(lexicon) = lookup_lexicon(ctx, index, key, ErrorLevel::Silent)? {
            return Ok(lexicon.normalizer());
        }
    }
    Ok(Normalizer::Auto)
}

/// Normalize one character at a time so every normalized byte maps back to one source character
fn normalize_chars(normalizer: Normalizer, text: &str) -> String {
    let mut buf = [0; 4];
    text.chars().map(|c| normalizer.normalize(c.encode_utf8(&mut buf))).collect()
}

fn to_u32(n: usize) -> ScanResult<u32> {
    u32::try_from(n).map_err(|_| ScanError::InvalidArgument(format!("[match-positions-byte] offset {n} does not fit in 32 bits")))
}

/// `(offset, length)` in bytes of every keyword hit in `target`. Hits do not overlap: scanning
/// left to right, the longest keyword starting at a character wins and scanning resumes after it.
/// Empty keywords never match.
pub fn match_positions_byte(ctx: &Context, target: &str, keywords: &[&str], index: Option<&IndexRelation>) -> ScanResult<Vec<(u32, u32)>> {
    let normalizer = normalizer_of(ctx, index)?;
    let keywords: Vec<String> = keywords.iter().map(|k| normalize_chars(normalizer, k)).filter(|k| !k.is_empty()).collect();

    // (normalized offset, original offset) of each character, closed by both lengths
    let mut normalized = String::with_capacity(target.len());
    let mut boundaries = Vec::with_capacity(target.len() + 1);
    let mut buf = [0; 4];
    for (offset, c) in target.char_indices() {
        boundaries.push((normalized.len(), offset));
        normalized.push_str(&normalizer.normalize(c.encode_utf8(&mut buf)));
    }
    boundaries.push((normalized.len(), target.len()));

    let mut positions = Vec::new();
    let mut i = 0;
    while i + 1 < boundaries.len() {
        let (start, original_start) = boundaries[i];
        let rest = &normalized[start..];
        let hit = keywords
            .iter()
            .filter(|k| rest.starts_with(k.as_str()))
            .filter_map(|k| boundaries[i..].binary_search_by_key(&(start + k.len()), |(n, _)| *n).ok())
            .max();
        match hit {
            Some(end) if end > 0 => {
                let original_end = boundaries[i + end].1;
                positions.push((to_u32(original_start)?, to_u32(original_end - original_start)?));
                i += end;
            }
            _ => i += 1,
        }
    }
    trace!("[match-positions-byte] {} keywords, {} hits", keywords.len(), positions.len());
    Ok(positions)
}
