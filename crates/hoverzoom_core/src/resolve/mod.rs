//! Media URL resolution.
//!
//! Turns a raw URL hint taken from the page into an ordered list of candidate
//! URLs, trying site-specific rewrites that usually point at a larger version
//! of the same asset. Every rewrite is speculative, so the original URL always
//! stays in the list as the last candidate.

mod hosts;

use url::Url;

use crate::media::{self, MediaType, ResolvedMedia};

pub use hosts::HostRule;

/// Resolves raw URL hints relative to the page they were found on.
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    base: Option<Url>,
}

impl MediaResolver {
    /// Resolver for absolute URLs only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that joins relative hints against `base`. An unparsable base
    /// is logged and ignored, see [`MediaResolver::try_with_base`].
    pub fn with_base(base: &str) -> Self {
        Self::try_with_base(base).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid base URL {:?}: {}", base, e);
            Self::new()
        })
    }

    pub fn try_with_base(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Some(Url::parse(base)?),
        })
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Resolve a raw URL hint into candidates, or `None` if it is not media.
    pub fn resolve(&self, raw: &str) -> Option<ResolvedMedia> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(media_type) = data_url_type(raw) {
            return ResolvedMedia::new(media_type, [raw]);
        }

        let url = self.parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            log::trace!("Declining non-http URL {}", raw);
            return None;
        }

        // Keep the caller's own spelling when it was already absolute.
        let original = if Url::parse(raw).is_ok() {
            raw.to_string()
        } else {
            url.as_str().to_string()
        };

        let resolved = hosts::resolve_for_host(&url, &original).or_else(|| generic(&url, &original));
        match &resolved {
            Some(media) => log::debug!(
                "Resolved {} to {} {} candidate(s)",
                raw,
                media.candidates().len(),
                media.media_type.name()
            ),
            None => log::trace!("No media found for {}", raw),
        }
        resolved
    }

    fn parse(&self, raw: &str) -> Option<Url> {
        match &self.base {
            Some(base) => base.join(raw).ok(),
            None => Url::parse(raw).ok(),
        }
    }
}

/// Media type of an inline `data:` URL, if it carries image or video data.
fn data_url_type(raw: &str) -> Option<MediaType> {
    let lower = raw.get(..11)?.to_ascii_lowercase();
    if lower.starts_with("data:image/") {
        Some(MediaType::Image)
    } else if lower.starts_with("data:video/") {
        Some(MediaType::Video)
    } else {
        None
    }
}

/// Whether the URL looks like a direct image asset.
pub fn looks_like_image(url: &Url) -> bool {
    media::is_image_path(url.path()) || url.path().to_ascii_lowercase().contains("/media/")
}

/// Whether the URL looks like a direct video asset.
pub fn looks_like_video(url: &Url) -> bool {
    media::is_video_path(url.path()) || url.host_str().is_some_and(|h| h.contains("video"))
}

fn generic(url: &Url, original: &str) -> Option<ResolvedMedia> {
    if looks_like_video(url) {
        ResolvedMedia::new(MediaType::Video, [original])
    } else if looks_like_image(url) {
        ResolvedMedia::new(MediaType::Image, [original])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolve(raw: &str) -> Option<ResolvedMedia> {
        MediaResolver::with_base("https://example.com/page/index.html").resolve(raw)
    }

    #[test]
    fn test_invalid_base_is_reported() {
        assert!(MediaResolver::try_with_base("not a url").is_err());
        assert!(MediaResolver::try_with_base("").is_err());

        let resolver = MediaResolver::try_with_base("https://example.com/a/").unwrap();
        assert_eq!(resolver.base().map(Url::as_str), Some("https://example.com/a/"));
        assert!(MediaResolver::with_base("not a url").base().is_none());
    }

    #[test]
    fn test_unparseable_input_declines() {
        let resolver = MediaResolver::new();
        assert!(resolver.resolve("").is_none());
        assert!(resolver.resolve("   ").is_none());
        assert!(resolver.resolve("not a url").is_none());
        assert!(resolver.resolve("http://[::1").is_none());
    }

    #[test]
    fn test_non_http_schemes_decline() {
        assert!(resolve("javascript:alert(1)").is_none());
        assert!(resolve("mailto:someone@example.com").is_none());
        assert!(resolve("blob:https://example.com/1234-5678").is_none());
        assert!(resolve("data:text/plain,hello").is_none());
    }

    #[test]
    fn test_data_urls_pass_through() {
        let media = resolve("data:image/png;base64,AAAA").unwrap();
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.candidates(), ["data:image/png;base64,AAAA"]);

        let media = resolve("data:video/mp4;base64,AAAA").unwrap();
        assert_eq!(media.media_type, MediaType::Video);
    }

    #[test]
    fn test_relative_hint_joins_base() {
        let media = resolve("../img/photo.jpg").unwrap();
        assert_eq!(media.candidates(), ["https://example.com/img/photo.jpg"]);
    }

    #[test]
    fn test_generic_image_and_video() {
        let media = resolve("https://cdn.example.org/a/b/pic.webp?x=1").unwrap();
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.candidates(), ["https://cdn.example.org/a/b/pic.webp?x=1"]);

        let media = resolve("https://cdn.example.org/clip.MP4").unwrap();
        assert_eq!(media.media_type, MediaType::Video);

        let media = resolve("https://video.example.org/stream/123").unwrap();
        assert_eq!(media.media_type, MediaType::Video);

        let media = resolve("https://example.org/media/abc").unwrap();
        assert_eq!(media.media_type, MediaType::Image);
    }

    #[test]
    fn test_article_links_decline() {
        assert!(resolve("https://news.example.org/2024/05/some-article").is_none());
        assert!(resolve("https://x.com/someone/status/1234567890").is_none());
        assert!(resolve("/about").is_none());
    }

    proptest! {
        #[test]
        fn prop_garbage_never_panics(raw in "\\PC{0,40}") {
            let _ = MediaResolver::new().resolve(&raw);
            let _ = resolve(&raw);
        }

        #[test]
        fn prop_candidates_unique_and_end_with_original(
            id in "[A-Za-z0-9]{6,12}",
            fmt in prop::sample::select(vec!["jpg", "png", "webp"]),
            name in prop::sample::select(vec!["small", "medium", "large", "900x900"]),
        ) {
            let raw = format!("https://pbs.twimg.com/media/{id}?format={fmt}&name={name}");
            let media = MediaResolver::new().resolve(&raw).unwrap();
            let candidates = media.candidates();
            prop_assert_eq!(candidates.last().map(String::as_str), Some(raw.as_str()));
            for (i, c) in candidates.iter().enumerate() {
                prop_assert!(!candidates[i + 1..].contains(c));
            }
        }

        #[test]
        fn prop_reresolving_primary_stays_bounded(
            id in "[A-Za-z0-9]{6,12}",
            fmt in prop::sample::select(vec!["jpg", "png", "webp"]),
        ) {
            let resolver = MediaResolver::new();
            let raw = format!("https://pbs.twimg.com/media/{id}?format={fmt}&name=small");
            let first = resolver.resolve(&raw).unwrap();
            let mut current = first.primary().to_string();
            let mut sizes = Vec::new();
            for _ in 0..4 {
                let next = resolver.resolve(&current).unwrap();
                sizes.push(next.candidates().len());
                current = next.primary().to_string();
            }
            // Resolving the maximum-size candidate is a fixed point.
            prop_assert!(sizes.windows(2).all(|w| w[0] == w[1]));
            prop_assert!(sizes[0] <= first.candidates().len());
        }
    }
}
