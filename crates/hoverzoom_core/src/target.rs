//! Finding the media behind an arbitrary event target.
//!
//! The page markup is untrusted, so every lookup here treats missing or odd
//! data as "nothing found". The traversal only needs the handful of element
//! capabilities in [`DomElement`], which keeps it testable without a browser.

use std::collections::VecDeque;

use crate::constants::DESCENDANT_SCAN_LIMIT;
use crate::css;
use crate::geometry::Size;
use crate::media::MediaType;
use crate::resolve::MediaResolver;
use crate::srcset;

/// Lazy-loading attributes, in the order they are consulted.
pub const LAZY_IMAGE_ATTRS: &[&str] = &[
    "data-src",
    "data-original",
    "data-url",
    "data-lazy-src",
    "data-zoom-src",
    "data-hires",
    "data-full",
    "data-large",
];

/// Attributes on `<source>` elements that may carry a quality label.
const QUALITY_ATTRS: &[&str] = &["size", "label", "res", "data-quality", "title"];

/// Tags that may carry a background image worth previewing.
const BACKGROUND_CONTAINER_TAGS: &[&str] = &["div", "span", "a", "button", "figure", "section"];

/// Element kinds with their own hint extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Image,
    Video,
    Anchor,
    Generic,
}

impl ElementKind {
    /// Kind for a lowercase tag name.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "img" => ElementKind::Image,
            "video" => ElementKind::Video,
            "a" => ElementKind::Anchor,
            _ => ElementKind::Generic,
        }
    }
}

/// Read-only view of a page element.
pub trait DomElement: Clone + PartialEq {
    /// Lowercase tag name.
    fn tag_name(&self) -> String;

    fn parent(&self) -> Option<Self>;

    /// Element children in document order.
    fn children(&self) -> Vec<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Source picked by the browser (`currentSrc`), if any.
    fn current_src(&self) -> Option<String> {
        None
    }

    /// Computed `background-image` value.
    fn computed_background(&self) -> Option<String> {
        None
    }

    /// Whether the element accepts typed text.
    fn is_editable(&self) -> bool {
        false
    }

    /// Rendered width and height in CSS pixels.
    fn rendered_size(&self) -> Option<Size> {
        None
    }

    fn kind(&self) -> ElementKind {
        ElementKind::from_tag(&self.tag_name())
    }

    /// First `<img>` or `<video>` below this element in document order.
    fn first_media_descendant(&self) -> Option<Self> {
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            if matches!(el.kind(), ElementKind::Image | ElementKind::Video) {
                return Some(el);
            }
            stack.extend(el.children().into_iter().rev());
        }
        None
    }
}

/// Where a hint was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintSource {
    CurrentSrc,
    Srcset,
    Attribute(&'static str),
    Background,
    Href,
    Poster,
    VideoSource,
}

/// Raw URL found on an element, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHint {
    pub url: String,
    pub source: HintSource,
}

impl MediaHint {
    fn new(url: impl Into<String>, source: HintSource) -> Option<Self> {
        let url = url.into();
        let url = url.trim();
        if url.is_empty() {
            None
        } else {
            Some(Self {
                url: url.to_string(),
                source,
            })
        }
    }
}

/// Nearest enclosing element matching `pred`, starting at `el` itself.
pub fn closest<E: DomElement>(el: &E, pred: impl Fn(&E) -> bool) -> Option<E> {
    let mut current = Some(el.clone());
    while let Some(node) = current {
        if pred(&node) {
            return Some(node);
        }
        current = node.parent();
    }
    None
}

fn is_anchor_with_href<E: DomElement>(el: &E) -> bool {
    el.kind() == ElementKind::Anchor && el.attribute("href").is_some_and(|h| !h.trim().is_empty())
}

/// The element whose media a hover over `el` refers to.
///
/// Enclosing image first, then enclosing video, then enclosing link, else
/// the element itself.
pub fn closest_interesting<E: DomElement>(el: &E) -> E {
    closest(el, |e| e.kind() == ElementKind::Image)
        .or_else(|| closest(el, |e| e.kind() == ElementKind::Video))
        .or_else(|| closest(el, is_anchor_with_href))
        .unwrap_or_else(|| el.clone())
}

/// Extract a raw media URL from `el`, dispatching on its kind.
pub fn media_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    match el.kind() {
        ElementKind::Image => image_hint(el),
        ElementKind::Video => video_hint(el),
        ElementKind::Anchor => anchor_hint(el),
        ElementKind::Generic => generic_hint(el),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn lazy_attribute_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    LAZY_IMAGE_ATTRS.iter().find_map(|name| {
        non_empty(el.attribute(name)).and_then(|v| MediaHint::new(v, HintSource::Attribute(name)))
    })
}

fn srcset_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    let srcset = el.attribute("srcset")?;
    srcset::pick_largest(&srcset).and_then(|url| MediaHint::new(url, HintSource::Srcset))
}

fn background_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    let value = el.computed_background()?;
    css::background_image_url(&value).and_then(|url| MediaHint::new(url, HintSource::Background))
}

fn image_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    non_empty(el.current_src())
        .and_then(|url| MediaHint::new(url, HintSource::CurrentSrc))
        .or_else(|| srcset_hint(el))
        .or_else(|| non_empty(el.attribute("src")).and_then(|url| MediaHint::new(url, HintSource::Attribute("src"))))
        .or_else(|| lazy_attribute_hint(el))
}

/// Image hint preferring the declared `srcset` over what the browser picked,
/// used when saving rather than previewing.
fn image_download_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    srcset_hint(el)
        .or_else(|| non_empty(el.current_src()).and_then(|url| MediaHint::new(url, HintSource::CurrentSrc)))
        .or_else(|| lazy_attribute_hint(el))
        .or_else(|| non_empty(el.attribute("src")).and_then(|url| MediaHint::new(url, HintSource::Attribute("src"))))
}

/// Whether a video URL is an in-memory handle with no stable address.
pub fn is_ephemeral_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("blob:"))
}

/// Vertical resolution mentioned in a label such as `1080p` or `720`.
pub fn quality_score(value: &str) -> u32 {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let len = i - start;
            if (3..=4).contains(&len) {
                if let Ok(score) = value[start..i].parse() {
                    return score;
                }
            }
        } else {
            i += 1;
        }
    }
    0
}

fn best_video_source<E: DomElement>(video: &E) -> Option<(String, u32)> {
    let mut best: Option<(String, u32)> = None;
    for source in video.children() {
        if source.tag_name() != "source" {
            continue;
        }
        let Some(url) = non_empty(source.attribute("src")) else {
            continue;
        };
        if is_ephemeral_url(&url) {
            continue;
        }
        let score = QUALITY_ATTRS
            .iter()
            .filter_map(|name| source.attribute(name))
            .map(|v| quality_score(&v))
            .chain(std::iter::once(quality_score(&url)))
            .max()
            .unwrap_or(0);
        if best.as_ref().is_none_or(|(_, s)| score > *s) {
            best = Some((url, score));
        }
    }
    best
}

fn video_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    let current = non_empty(el.current_src()).or_else(|| non_empty(el.attribute("src")));
    let best_source = best_video_source(el);

    match current {
        Some(current) if !is_ephemeral_url(&current) => {
            if let Some((url, score)) = best_source {
                if score > quality_score(&current) {
                    return MediaHint::new(url, HintSource::VideoSource);
                }
            }
            MediaHint::new(current, HintSource::CurrentSrc)
        }
        _ => best_source
            .and_then(|(url, _)| MediaHint::new(url, HintSource::VideoSource))
            .or_else(|| non_empty(el.attribute("poster")).and_then(|url| MediaHint::new(url, HintSource::Poster))),
    }
}

/// Breadth-first search of `root` and its descendants for a background image,
/// visiting at most `limit` elements.
pub fn scan_background<E: DomElement>(root: &E, limit: usize) -> Option<MediaHint> {
    let mut queue = VecDeque::from([root.clone()]);
    let mut visited = 0;
    while let Some(el) = queue.pop_front() {
        if visited >= limit {
            break;
        }
        visited += 1;
        if let Some(hint) = background_hint(&el) {
            return Some(hint);
        }
        queue.extend(el.children());
    }
    None
}

fn anchor_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    el.first_media_descendant()
        .and_then(|media| media_hint(&media))
        .or_else(|| scan_background(el, DESCENDANT_SCAN_LIMIT))
        .or_else(|| non_empty(el.attribute("href")).and_then(|url| MediaHint::new(url, HintSource::Href)))
}

fn generic_hint<E: DomElement>(el: &E) -> Option<MediaHint> {
    background_hint(el).or_else(|| lazy_attribute_hint(el))
}

/// Media picked for the popout window after an explicit click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopoutMedia {
    pub media_type: MediaType,
    pub url: String,
}

/// Media an alt-click on `el` should open in the popout.
///
/// Videos win over images; an image wrapped in a link to an image file opens
/// the linked file; bare links open when they point at media; otherwise the
/// nearest container with a background image is used.
pub fn popout_media<E: DomElement>(el: &E, resolver: &MediaResolver) -> Option<PopoutMedia> {
    let linked_media = |anchor: &E| -> Option<PopoutMedia> {
        let href = non_empty(anchor.attribute("href"))?;
        let resolved = resolver.resolve(&href)?;
        Some(PopoutMedia {
            media_type: resolved.media_type,
            url: href,
        })
    };

    if let Some(video) = closest(el, |e| e.kind() == ElementKind::Video) {
        if let Some(hint) = video_hint(&video) {
            return Some(PopoutMedia {
                media_type: MediaType::Video,
                url: hint.url,
            });
        }
    }

    if let Some(img) = closest(el, |e| e.kind() == ElementKind::Image) {
        if let Some(media) = closest(&img, is_anchor_with_href)
            .and_then(|a| linked_media(&a))
            .filter(|m| m.media_type == MediaType::Image)
        {
            return Some(media);
        }
        return image_download_hint(&img).map(|hint| PopoutMedia {
            media_type: MediaType::Image,
            url: hint.url,
        });
    }

    if let Some(media) = closest(el, is_anchor_with_href).and_then(|a| linked_media(&a)) {
        return Some(media);
    }

    let container = closest(el, |e| BACKGROUND_CONTAINER_TAGS.contains(&e.tag_name().as_str()))?;
    background_hint(&container).map(|hint| PopoutMedia {
        media_type: MediaType::Image,
        url: hint.url,
    })
}
