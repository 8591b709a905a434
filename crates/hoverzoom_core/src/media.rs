//! Media classification and the resolved candidate list.

use serde::{Deserialize, Serialize};

/// Image file extensions recognised in URL paths.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "avif", "apng", "bmp", "svg", "ico", "tif", "tiff",
];

/// Video file extensions recognised in URL paths.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv", "m3u8"];

/// Kind of media a preview shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn name(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

/// Ordered candidate URLs for one piece of media.
///
/// Candidates go from most to least likely to be the highest resolution.
/// The list is never empty and holds no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMedia {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    candidates: Vec<String>,
}

impl ResolvedMedia {
    /// Build from a candidate list, dropping empty entries and duplicates.
    /// Returns `None` when nothing is left.
    pub fn new<I, S>(media_type: MediaType, candidates: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = dedup(candidates);
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            media_type,
            candidates,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The first candidate, used as the identity key of a preview.
    pub fn primary(&self) -> &str {
        &self.candidates[0]
    }

    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }
}

/// Remove empty strings and repeated entries, keeping first occurrences.
pub fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if item.is_empty() || out.contains(&item) {
            continue;
        }
        out.push(item);
    }
    out
}

/// Lowercase extension of the last path segment, if any.
pub fn path_extension(path: &str) -> Option<String> {
    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether a URL path ends in a known image extension.
pub fn is_image_path(path: &str) -> bool {
    path_extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a URL path ends in a known video extension.
pub fn is_video_path(path: &str) -> bool {
    path_extension(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let out = dedup(["b", "a", "", "b", "c", "a"]);
        assert_eq!(out, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_resolved_media_rejects_empty() {
        assert!(ResolvedMedia::new(MediaType::Image, Vec::<String>::new()).is_none());
        assert!(ResolvedMedia::new(MediaType::Image, [""]).is_none());
    }

    #[test]
    fn test_primary_is_first_candidate() {
        let media = ResolvedMedia::new(MediaType::Video, ["x.mp4", "y.mp4", "x.mp4"]).unwrap();
        assert_eq!(media.primary(), "x.mp4");
        assert_eq!(media.candidates().len(), 2);
        assert!(media.is_video());
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("/a/b/photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(path_extension("/a/b/photo"), None);
        assert_eq!(path_extension("/a/b.dir/photo"), None);
        assert_eq!(path_extension("/.hidden"), None);
        assert!(is_image_path("/x/y.webp"));
        assert!(is_video_path("/clip.m3u8"));
        assert!(!is_image_path("/status/12345"));
    }
}
