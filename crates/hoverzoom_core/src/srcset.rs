//! `srcset` attribute parsing.

/// One comma-separated entry of a `srcset` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SrcsetEntry<'a> {
    pub url: &'a str,
    pub descriptor: Descriptor,
}

/// Size descriptor following the URL of a `srcset` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Descriptor {
    /// `640w`
    Width(u32),
    /// `2x`
    Density(f32),
    /// Missing or unrecognised.
    None,
}

/// Parse a `srcset` value into its entries. Empty parts are skipped.
pub fn parse(srcset: &str) -> Vec<SrcsetEntry<'_>> {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let mut tokens = part.split_whitespace();
            let url = tokens.next()?;
            let descriptor = match (tokens.next(), tokens.next()) {
                (Some(desc), None) => parse_descriptor(desc),
                _ => Descriptor::None,
            };
            Some(SrcsetEntry { url, descriptor })
        })
        .collect()
}

fn parse_descriptor(desc: &str) -> Descriptor {
    if let Some(width) = desc.strip_suffix('w') {
        if let Ok(width) = width.parse::<u32>() {
            return Descriptor::Width(width);
        }
    }
    if let Some(density) = desc.strip_suffix('x') {
        if let Ok(density) = density.parse::<f32>() {
            if density.is_finite() {
                return Descriptor::Density(density);
            }
        }
    }
    Descriptor::None
}

/// Pick the entry most likely to be the largest.
///
/// Width descriptors compete by numeric width. An entry without a width
/// descriptor replaces the running pick, so it wins if it comes last.
pub fn pick_largest(srcset: &str) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut best_width: Option<u32> = None;

    for entry in parse(srcset) {
        match entry.descriptor {
            Descriptor::Width(width) => {
                if best_width.is_none_or(|current| width > current) {
                    best_width = Some(width);
                    best = Some(entry.url);
                }
            }
            Descriptor::Density(_) | Descriptor::None => best = Some(entry.url),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widest_entry_wins() {
        assert_eq!(pick_largest("a.jpg 320w, b.jpg 1024w"), Some("b.jpg"));
        assert_eq!(pick_largest("b.jpg 1024w, a.jpg 320w"), Some("b.jpg"));
    }

    #[test]
    fn test_entry_without_width_is_last_seen() {
        assert_eq!(pick_largest("a.jpg 320w, b.jpg"), Some("b.jpg"));
        assert_eq!(pick_largest("b.jpg, a.jpg 320w"), Some("a.jpg"));
        assert_eq!(pick_largest("a.jpg 1x, b.jpg 2x"), Some("b.jpg"));
    }

    #[test]
    fn test_equal_widths_keep_first() {
        assert_eq!(pick_largest("a.jpg 640w, b.jpg 640w"), Some("a.jpg"));
    }

    #[test]
    fn test_empty_and_malformed() {
        assert_eq!(pick_largest(""), None);
        assert_eq!(pick_largest(" , ,"), None);
        assert_eq!(pick_largest("a.jpg 12qw"), Some("a.jpg"));
    }

    #[test]
    fn test_parse_descriptors() {
        let entries = parse("a.jpg 320w, b.jpg 1.5x, c.jpg, d.jpg 1w 2x");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].descriptor, Descriptor::Width(320));
        assert_eq!(entries[1].descriptor, Descriptor::Density(1.5));
        assert_eq!(entries[2].descriptor, Descriptor::None);
        assert_eq!(entries[3].descriptor, Descriptor::None);
    }
}
