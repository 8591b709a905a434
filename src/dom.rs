//! [`DomElement`] for live page elements.

use hoverzoom_core::geometry::Size;
use hoverzoom_core::target::DomElement;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlImageElement, HtmlMediaElement};

/// A page element seen through the extractor's read-only interface.
///
/// Every accessor swallows exceptions from the page and reports "no data".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement(Element);

impl PageElement {
    pub fn new(element: Element) -> Self {
        Self(element)
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &web_sys::Node) -> bool {
        self.0.contains(Some(other))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

impl DomElement for PageElement {
    fn tag_name(&self) -> String {
        self.0.tag_name().to_ascii_lowercase()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent_element().map(Self)
    }

    fn children(&self) -> Vec<Self> {
        let children = self.0.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(Self)
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn current_src(&self) -> Option<String> {
        if let Some(img) = self.0.dyn_ref::<HtmlImageElement>() {
            return non_empty(img.current_src());
        }
        if let Some(media) = self.0.dyn_ref::<HtmlMediaElement>() {
            return non_empty(media.current_src());
        }
        None
    }

    fn computed_background(&self) -> Option<String> {
        let window = web_sys::window()?;
        let style = window.get_computed_style(&self.0).ok()??;
        style
            .get_property_value("background-image")
            .ok()
            .and_then(non_empty)
    }

    fn is_editable(&self) -> bool {
        matches!(self.tag_name().as_str(), "input" | "textarea" | "select")
            || self
                .0
                .dyn_ref::<HtmlElement>()
                .is_some_and(HtmlElement::is_content_editable)
    }

    fn rendered_size(&self) -> Option<Size> {
        let rect = self.0.get_bounding_client_rect();
        Some(Size::new(rect.width(), rect.height()))
    }

    fn first_media_descendant(&self) -> Option<Self> {
        self.0.query_selector("img, video").ok().flatten().map(Self)
    }
}
