//! Address normalization ahead of geocoding.
//!
//! Addresses typed into the dashboard are free text: sometimes a full
//! street address, sometimes a street address with directions or notes
//! pasted after it. The geocoding API rejects queries with more than 20
//! tokens, so long inputs are cut down to their first 20 tokens before
//! they are sent. Truncation is lossy but not fatal: the leading tokens
//! usually carry the street, city, and zip.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of characters accepted before truncating.
pub const MAX_ADDRESS_CHARS: usize = 256;

/// Maximum number of comma/whitespace separated tokens accepted before
/// truncating.
pub const MAX_ADDRESS_TOKENS: usize = 20;

/// Splits on runs of commas and whitespace.
static TOKEN_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("valid regex"));

/// An address ready to be used as a geocoding query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAddress {
    /// The query string to send.
    pub query: String,
    /// Whether tokens were dropped to fit the provider's limits.
    pub truncated: bool,
}

/// Reasons an address cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The address was empty or whitespace only.
    #[error("address is empty")]
    Empty,
}

/// Normalizes a free-text address into a bounded geocoding query.
///
/// The input is trimmed. If it has more than [`MAX_ADDRESS_TOKENS`] tokens
/// or more than [`MAX_ADDRESS_CHARS`] characters, it is replaced by its
/// first [`MAX_ADDRESS_TOKENS`] tokens joined with single spaces and
/// [`NormalizedAddress::truncated`] is set. Otherwise the trimmed input is
/// returned unchanged, commas included.
///
/// # Errors
///
/// Returns [`AddressError::Empty`] if the address is empty or whitespace
/// only.
pub fn normalize_address(raw: &str) -> Result<NormalizedAddress, AddressError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }

    let tokens: Vec<&str> = TOKEN_SEPARATOR_RE
        .split(trimmed)
        .filter(|t| !t.is_empty())
        .collect();
    let char_count = trimmed.chars().count();

    if tokens.len() <= MAX_ADDRESS_TOKENS && char_count <= MAX_ADDRESS_CHARS {
        return Ok(NormalizedAddress {
            query: trimmed.to_string(),
            truncated: false,
        });
    }

    let query = tokens
        .iter()
        .take(MAX_ADDRESS_TOKENS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    log::warn!(
        "Address too long ({} tokens / {char_count} chars), truncated to '{query}' (original: '{trimmed}')",
        tokens.len()
    );

    Ok(NormalizedAddress {
        query,
        truncated: true,
    })
}
