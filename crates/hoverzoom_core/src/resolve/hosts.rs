//! Site-specific candidate rewrites.

use url::Url;

use super::{looks_like_image, looks_like_video};
use crate::media::{MediaType, ResolvedMedia};

/// Image formats the Twitter CDN serves, in the order they are tried.
const TWITTER_FORMATS: &[&str] = &["jpg", "png", "webp"];

/// Size tokens appended to Twitter profile image file names.
const PROFILE_SIZE_TOKENS: &[&str] = &["_normal", "_bigger", "_mini"];

/// Legacy `:size` suffixes on Twitter media URLs.
const LEGACY_SIZE_SUFFIXES: &[&str] = &[":small", ":medium", ":large"];

/// Size letters imgur appends to an image id for scaled copies.
const IMGUR_SIZE_LETTERS: &[char] = &['s', 'b', 't', 'm', 'l', 'h'];
const IMGUR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Instagram paths that are pages, not assets.
const INSTAGRAM_PAGE_PREFIXES: &[&str] = &["/p/", "/reel/", "/reels/", "/tv/", "/stories/"];

/// Host conventions with a dedicated rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRule {
    /// `pbs.twimg.com`: size and format live in the query string.
    TwitterImage,
    /// `preview.redd.it`: a resized mirror of `i.redd.it`.
    RedditPreview,
    /// `imgur.com`: a trailing letter on the id selects a scaled copy.
    ImgurSuffix,
    /// Instagram and Facebook CDNs: signed query strings must be kept.
    SocialCdn,
}

impl HostRule {
    /// Rule that applies to `host`, if any.
    pub fn for_host(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        if host == "pbs.twimg.com" {
            Some(HostRule::TwitterImage)
        } else if host == "preview.redd.it" {
            Some(HostRule::RedditPreview)
        } else if host.ends_with("imgur.com") {
            Some(HostRule::ImgurSuffix)
        } else if host.contains("cdninstagram") || host.contains("fbcdn") || host.contains("instagram") {
            Some(HostRule::SocialCdn)
        } else {
            None
        }
    }
}

/// Apply the host rule for `url`. `None` means no rule produced a result and
/// the generic checks should decide.
pub(super) fn resolve_for_host(url: &Url, original: &str) -> Option<ResolvedMedia> {
    let rule = HostRule::for_host(url.host_str()?)?;
    match rule {
        HostRule::TwitterImage => twitter(url, original),
        HostRule::RedditPreview => reddit_preview(url, original),
        HostRule::ImgurSuffix => imgur(url, original),
        HostRule::SocialCdn => social_cdn(url, original),
    }
}

fn twitter(url: &Url, original: &str) -> Option<ResolvedMedia> {
    if url.path().starts_with("/profile_images/") {
        let mut base = url.clone();
        if let Some(path) = strip_profile_size_token(url.path()) {
            base.set_path(&path);
        }
        return ResolvedMedia::new(MediaType::Image, [base.to_string(), original.to_string()]);
    }

    if let Some(rewritten) = legacy_orig_suffix(original) {
        return ResolvedMedia::new(MediaType::Image, [rewritten, original.to_string()]);
    }

    let existing_format = query_value(url, "format");
    let existing_name = query_value(url, "name");
    let inferred = crate::media::path_extension(url.path()).and_then(|ext| match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg".to_string()),
        "png" | "webp" | "gif" => Some(ext),
        _ => None,
    });

    let first_format = existing_format
        .clone()
        .or(inferred)
        .unwrap_or_else(|| "jpg".to_string());
    let formats = crate::media::dedup(
        std::iter::once(first_format).chain(TWITTER_FORMATS.iter().map(|f| f.to_string())),
    );

    let base = with_query(url, "name", "orig");
    let mut candidates: Vec<String> = formats
        .iter()
        .map(|format| with_query(&base, "format", format).to_string())
        .collect();

    if existing_name.as_deref().is_some_and(is_dimension_name) {
        candidates.insert(0, with_query(url, "name", "orig").to_string());
    } else {
        let mut large = with_query(url, "name", "4096x4096");
        if let Some(format) = &existing_format {
            large = with_query(&large, "format", format);
        }
        candidates.push(large.to_string());
    }

    candidates.push(original.to_string());
    ResolvedMedia::new(MediaType::Image, candidates)
}

fn reddit_preview(url: &Url, original: &str) -> Option<ResolvedMedia> {
    let mut no_query = url.clone();
    no_query.set_query(None);
    no_query.set_fragment(None);

    let mut direct = no_query.clone();
    direct.set_host(Some("i.redd.it")).ok()?;

    ResolvedMedia::new(
        MediaType::Image,
        [direct.to_string(), no_query.to_string(), original.to_string()],
    )
}

fn imgur(url: &Url, original: &str) -> Option<ResolvedMedia> {
    let path = strip_imgur_size_letter(url.path())?;
    let mut rewritten = url.clone();
    rewritten.set_path(&path);
    let rewritten = rewritten.to_string();
    if rewritten == original || rewritten == url.as_str() {
        return None;
    }
    ResolvedMedia::new(MediaType::Image, [rewritten, original.to_string()])
}

fn social_cdn(url: &Url, original: &str) -> Option<ResolvedMedia> {
    let host = url.host_str()?.to_ascii_lowercase();
    let is_asset_host = host.contains("cdninstagram") || host.contains("fbcdn");
    if !is_asset_host {
        let path = url.path().to_ascii_lowercase();
        let is_page = INSTAGRAM_PAGE_PREFIXES.iter().any(|p| path.starts_with(p));
        if is_page || !(looks_like_image(url) || looks_like_video(url)) {
            log::debug!("Declining Instagram page URL {}", url);
            return None;
        }
    }

    let media_type = if looks_like_video(url) {
        MediaType::Video
    } else {
        MediaType::Image
    };
    ResolvedMedia::new(media_type, [url.to_string(), original.to_string()])
}

/// Remove a `_normal`/`_bigger`/`_mini` token placed right before the extension.
fn strip_profile_size_token(path: &str) -> Option<String> {
    let (dir, file) = path.rsplit_once('/')?;
    let (stem, ext) = file.rsplit_once('.')?;
    let lower = stem.to_ascii_lowercase();
    let token = PROFILE_SIZE_TOKENS.iter().find(|t| lower.ends_with(*t))?;
    let stem = &stem[..stem.len() - token.len()];
    Some(format!("{dir}/{stem}.{ext}"))
}

/// Rewrite a trailing `:small`/`:medium`/`:large` to `:orig`.
fn legacy_orig_suffix(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();
    let suffix = LEGACY_SIZE_SUFFIXES.iter().find(|s| lower.ends_with(*s))?;
    Some(format!("{}:orig", &raw[..raw.len() - suffix.len()]))
}

/// Drop the imgur size letter from `<id><letter>.<ext>`.
fn strip_imgur_size_letter(path: &str) -> Option<String> {
    let (dir, file) = path.rsplit_once('/')?;
    let (stem, ext) = file.rsplit_once('.')?;
    if !IMGUR_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
        return None;
    }
    let mut chars = stem.chars();
    let letter = chars.next_back()?;
    let id = chars.as_str();
    if !IMGUR_SIZE_LETTERS.contains(&letter.to_ascii_lowercase()) {
        return None;
    }
    if !id.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!("{dir}/{id}.{ext}"))
}

/// `WxH` values such as `900x900` used by the Twitter CDN `name` parameter.
fn is_dimension_name(name: &str) -> bool {
    let Some((w, h)) = name.split_once(['x', 'X']) else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(w) && digits(h)
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Copy of `url` with `key` set to `value`: the first occurrence is replaced
/// and later ones dropped, or the pair is appended when missing.
fn with_query(url: &Url, key: &str, value: &str) -> Url {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (k, v) in url.query_pairs() {
        if k == key {
            if !replaced {
                pairs.push((k.into_owned(), value.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    if !replaced {
        pairs.push((key.to_string(), value.to_string()));
    }

    let mut out = url.clone();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::MediaResolver;

    fn candidates(raw: &str) -> Vec<String> {
        MediaResolver::new()
            .resolve(raw)
            .map(|m| m.candidates().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_host_rule_lookup() {
        assert_eq!(HostRule::for_host("pbs.twimg.com"), Some(HostRule::TwitterImage));
        assert_eq!(HostRule::for_host("preview.redd.it"), Some(HostRule::RedditPreview));
        assert_eq!(HostRule::for_host("i.imgur.com"), Some(HostRule::ImgurSuffix));
        assert_eq!(HostRule::for_host("scontent.cdninstagram.com"), Some(HostRule::SocialCdn));
        assert_eq!(HostRule::for_host("example.com"), None);
    }

    #[test]
    fn test_twitter_profile_image_strips_size_token() {
        let raw = "https://pbs.twimg.com/profile_images/123/avatar_normal.jpg";
        let out = candidates(raw);
        assert_eq!(out.first().unwrap(), "https://pbs.twimg.com/profile_images/123/avatar.jpg");
        assert_eq!(out.last().unwrap(), raw);
        assert_eq!(out.len(), 2);
        assert!(!out[0].contains("_normal"));
    }

    #[test]
    fn test_twitter_profile_image_tokens_case_insensitive() {
        for token in ["_bigger", "_mini", "_NORMAL"] {
            let raw = format!("https://pbs.twimg.com/profile_images/9/me{token}.png");
            let out = candidates(&raw);
            assert_eq!(out[0], "https://pbs.twimg.com/profile_images/9/me.png");
            assert_eq!(out.last().unwrap(), &raw);
        }
    }

    #[test]
    fn test_twitter_profile_image_without_token() {
        let raw = "https://pbs.twimg.com/profile_images/9/me.png";
        assert_eq!(candidates(raw), vec![raw.to_string()]);
    }

    #[test]
    fn test_twitter_legacy_colon_suffix() {
        for suffix in [":small", ":medium", ":large"] {
            let raw = format!("https://pbs.twimg.com/media/ABC.jpg{suffix}");
            let out = candidates(&raw);
            assert_eq!(out, vec!["https://pbs.twimg.com/media/ABC.jpg:orig".to_string(), raw]);
        }
    }

    #[test]
    fn test_twitter_query_style_orders_formats() {
        let raw = "https://pbs.twimg.com/media/XYZ?format=png&name=small";
        let out = candidates(raw);
        assert_eq!(
            out,
            vec![
                "https://pbs.twimg.com/media/XYZ?format=png&name=orig",
                "https://pbs.twimg.com/media/XYZ?format=jpg&name=orig",
                "https://pbs.twimg.com/media/XYZ?format=webp&name=orig",
                "https://pbs.twimg.com/media/XYZ?format=png&name=4096x4096",
                raw,
            ]
        );
    }

    #[test]
    fn test_twitter_infers_format_from_extension() {
        let out = candidates("https://pbs.twimg.com/media/XYZ.jpeg");
        assert_eq!(out[0], "https://pbs.twimg.com/media/XYZ.jpeg?name=orig&format=jpg");
        assert_eq!(out[1], "https://pbs.twimg.com/media/XYZ.jpeg?name=orig&format=png");
        assert_eq!(out[2], "https://pbs.twimg.com/media/XYZ.jpeg?name=orig&format=webp");
        assert_eq!(out[3], "https://pbs.twimg.com/media/XYZ.jpeg?name=4096x4096");
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_twitter_dimension_name_puts_orig_first() {
        let raw = "https://pbs.twimg.com/media/XYZ?format=jpg&name=900x900";
        let out = candidates(raw);
        assert_eq!(out[0], "https://pbs.twimg.com/media/XYZ?format=jpg&name=orig");
        assert!(!out.iter().any(|c| c.contains("4096x4096")));
        assert_eq!(out.last().unwrap(), raw);
    }

    #[test]
    fn test_reddit_preview_prefers_direct_host() {
        let raw = "https://preview.redd.it/abc123.jpg?width=640&crop=smart&s=deadbeef";
        let out = candidates(raw);
        assert_eq!(
            out,
            vec![
                "https://i.redd.it/abc123.jpg",
                "https://preview.redd.it/abc123.jpg",
                raw,
            ]
        );
    }

    #[test]
    fn test_imgur_strips_size_letter() {
        let out = candidates("https://i.imgur.com/abcdefh.jpg");
        assert_eq!(out, vec!["https://i.imgur.com/abcdef.jpg", "https://i.imgur.com/abcdefh.jpg"]);
    }

    #[test]
    fn test_imgur_keeps_query() {
        let out = candidates("https://i.imgur.com/abcdefl.png?1");
        assert_eq!(out[0], "https://i.imgur.com/abcdef.png?1");
    }

    #[test]
    fn test_imgur_without_size_letter_falls_back_to_generic() {
        let out = candidates("https://i.imgur.com/abcdefg.jpg");
        assert_eq!(out, vec!["https://i.imgur.com/abcdefg.jpg"]);
        assert!(candidates("https://imgur.com/gallery/abcdef").is_empty());
    }

    #[test]
    fn test_instagram_keeps_signed_query() {
        let raw = "https://scontent-lhr8-1.cdninstagram.com/v/t51/123_n.jpg?stp=dst-jpg&_nc_ht=x&oh=sig&oe=65";
        let media = MediaResolver::new().resolve(raw).unwrap();
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.primary(), raw);
    }

    #[test]
    fn test_instagram_video_asset() {
        let raw = "https://scontent.cdninstagram.com/o1/v/t16/f1/clip.mp4?efg=abc";
        let media = MediaResolver::new().resolve(raw).unwrap();
        assert_eq!(media.media_type, MediaType::Video);
    }

    #[test]
    fn test_instagram_post_pages_decline() {
        assert!(candidates("https://www.instagram.com/p/Cxyz123/").is_empty());
        assert!(candidates("https://www.instagram.com/reel/Cxyz123/").is_empty());
        assert!(candidates("https://www.instagram.com/someone/").is_empty());
    }

    #[test]
    fn test_dimension_name() {
        assert!(is_dimension_name("900x900"));
        assert!(is_dimension_name("4096X4096"));
        assert!(!is_dimension_name("orig"));
        assert!(!is_dimension_name("x900"));
        assert!(!is_dimension_name("12x"));
    }

    #[test]
    fn test_with_query_replaces_first_and_drops_rest() {
        let url = Url::parse("https://h/p?a=1&name=x&b=2&name=y").unwrap();
        let out = with_query(&url, "name", "orig");
        assert_eq!(out.as_str(), "https://h/p?a=1&name=orig&b=2");
    }
}
