//! File names for saved media.
//!
//! Names look like `hz_<host>_<yyyy-mm-dd>_<hh-mm-ss>.<ext>`. The extension
//! comes from the response content type when there is one, then from the
//! URL, and is `bin` when neither is recognised.

use std::fmt;

use url::Url;

const EXT_BY_CONTENT_TYPE: &[(&str, &str)] = &[
    ("image/jpeg", "jpeg"),
    ("image/jpg", "jpeg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/gif", "gif"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
];

const KNOWN_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp", "avif", "gif", "mp4", "webm"];

/// Query parameters some CDNs use to name the served format.
const FORMAT_QUERY_KEYS: &[&str] = &["format", "ext", "extension", "mime"];

const FALLBACK_EXTENSION: &str = "bin";

/// Local wall-clock time a download was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadStamp {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl fmt::Display for DownloadStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}_{:02}-{:02}-{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn known_extension(ext: &str) -> Option<&'static str> {
    let ext = KNOWN_EXTENSIONS.iter().copied().find(|known| *known == ext)?;
    Some(if ext == "jpg" { "jpeg" } else { ext })
}

/// Extension for a `Content-Type` header value, parameters ignored.
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    EXT_BY_CONTENT_TYPE
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Extension guessed from the URL path, or from a format-like query value.
pub fn extension_from_url(url: &Url) -> Option<&'static str> {
    let path = url.path().to_ascii_lowercase();
    let from_path = path
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| (2..=5).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_alphanumeric()))
        .and_then(known_extension);
    if from_path.is_some() {
        return from_path;
    }

    FORMAT_QUERY_KEYS.iter().find_map(|key| {
        let (_, value) = url.query_pairs().find(|(k, _)| k == key)?;
        let value = value.to_ascii_lowercase();
        let value = value
            .strip_prefix("image/")
            .or_else(|| value.strip_prefix("video/"))
            .unwrap_or(&value);
        known_extension(value)
    })
}

/// Page host reduced to characters safe in a file name.
pub fn sanitize_host(host: &str) -> String {
    if host.is_empty() {
        return "site".to_string();
    }
    let mut out = String::with_capacity(host.len());
    let mut in_run = false;
    for c in host.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// File name for saving `media_url` found on a page served from `page_host`.
pub fn download_filename(
    page_host: &str,
    stamp: DownloadStamp,
    media_url: &str,
    content_type: Option<&str>,
) -> String {
    let ext = content_type
        .and_then(extension_from_content_type)
        .or_else(|| Url::parse(media_url).ok().as_ref().and_then(extension_from_url))
        .unwrap_or(FALLBACK_EXTENSION);
    format!("hz_{}_{}.{}", sanitize_host(page_host), stamp, ext)
}
