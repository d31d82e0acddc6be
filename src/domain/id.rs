//! Identifier generation
//!
//! Generated IDs use the format: `{6-char-hex}-{kind}-{slug}`
//! Example: `019430-session-payment-gateway`

/// Maximum slug length kept in generated IDs
const MAX_SLUG_LEN: usize = 40;

/// Generate an ID from a kind and a human title
pub fn generate_id(kind: &str, title: &str) -> String {
    // Tail of a v7 UUID is random; the head is a timestamp and repeats within a millisecond
    let hex = uuid::Uuid::now_v7().simple().to_string();
    let hex_prefix = &hex[hex.len() - 6..];
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{}-{}", hex_prefix, kind)
    } else {
        format!("{}-{}-{}", hex_prefix, kind, slug)
    }
}

/// Slugify a title for use in IDs
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let truncated: String = slug.chars().take(MAX_SLUG_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}
