//! Tolerant extraction of URLs from computed CSS values.

/// First `url(...)` in a `background-image` value.
///
/// Accepts quoted and unquoted forms and ignores gradients and `none`.
/// Malformed values give `None`.
pub fn background_image_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return None;
    }

    let lower = value.to_ascii_lowercase();
    let start = lower.find("url(")? + 4;
    let rest = &value[start..];
    let end = rest.find(')')?;
    let inner = rest[..end].trim();

    let inner = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner)
        .trim();

    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}
