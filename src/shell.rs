//! Page-level host element. All overlay UI lives in its shadow root so page
//! styles and scripts that walk the light DOM leave it alone.

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, Node, ShadowRoot, ShadowRootInit, ShadowRootMode};

use crate::error::{HostError, Result};

const STYLE: &str = r#"
:host { all: initial; }
.hz-overlay {
    position: fixed; left: 0; top: 0; z-index: 2147483646;
    display: none; box-sizing: border-box;
    padding: 10px; border: 1px solid rgba(255, 255, 255, 0.15); border-radius: 8px;
    background: rgba(20, 20, 20, 0.92); box-shadow: 0 8px 28px rgba(0, 0, 0, 0.45);
    pointer-events: none; will-change: transform; overflow: hidden;
}
.hz-overlay.hz-visible { display: block; }
.hz-clip { position: relative; overflow: hidden; }
.hz-overlay img, .hz-overlay video {
    display: block; max-width: none; max-height: none; transform-origin: 0 0;
}
.hz-overlay.hz-loading img, .hz-overlay.hz-loading video { visibility: hidden; }
.hz-hud, .hz-badge {
    position: absolute; font: 11px/1.4 system-ui, sans-serif; color: #eee;
    background: rgba(0, 0, 0, 0.6); padding: 1px 6px; border-radius: 4px;
}
.hz-hud { left: 12px; bottom: 12px; }
.hz-badge { right: 12px; top: 12px; display: none; }
.hz-overlay.hz-pinned .hz-badge { display: block; }
.hz-backdrop {
    position: fixed; inset: 0; z-index: 2147483646; display: none;
    background: rgba(0, 0, 0, 0.55);
}
.hz-backdrop.hz-visible, .hz-frame.hz-visible { display: flex; }
.hz-frame {
    position: fixed; left: 0; top: 0; z-index: 2147483647; display: none;
    flex-direction: column; box-sizing: border-box; overflow: hidden;
    background: #141414; border: 1px solid #333; border-radius: 8px;
}
.hz-titlebar {
    display: flex; align-items: center; gap: 6px; padding: 6px 8px;
    background: #202020; cursor: move; user-select: none; touch-action: none;
}
.hz-titlebar .hz-title {
    flex: 1; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;
    font: 12px system-ui, sans-serif; color: #ccc;
}
.hz-titlebar button {
    font: 12px system-ui, sans-serif; color: #eee; background: #333;
    border: 0; border-radius: 4px; padding: 3px 8px; cursor: pointer;
}
.hz-body { flex: 1; display: flex; align-items: center; justify-content: center; min-height: 0; }
.hz-body img, .hz-body video { max-width: 100%; max-height: 100%; object-fit: contain; }
.hz-resize {
    position: absolute; right: 0; bottom: 0; width: 16px; height: 16px;
    cursor: nwse-resize; touch-action: none;
}
.hz-toast {
    position: fixed; left: 50%; bottom: 24px; transform: translateX(-50%);
    z-index: 2147483647; display: none; pointer-events: none;
    font: 13px system-ui, sans-serif; color: #fff;
    background: rgba(0, 0, 0, 0.8); padding: 6px 12px; border-radius: 6px;
}
.hz-toast.hz-visible { display: block; }
"#;

/// Create a `tag` element with `class`, typed as `T`.
pub fn create<T: JsCast>(document: &Document, tag: &'static str, class: &str) -> Result<T> {
    let element = document.create_element(tag)?;
    if !class.is_empty() {
        element.set_class_name(class);
    }
    element.dyn_into::<T>().map_err(|_| HostError::Missing(tag))
}

/// Toggle `class` on `element`.
pub fn set_class(element: &HtmlElement, class: &str, on: bool) {
    let list = element.class_name();
    let has = list.split_whitespace().any(|c| c == class);
    if has == on {
        return;
    }
    let next = if on {
        format!("{} {}", list, class)
    } else {
        list.split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ")
    };
    element.set_class_name(next.trim());
}

/// The shadow host attached to `<html>`.
#[derive(Debug, Clone)]
pub struct Shell {
    document: Document,
    host: HtmlElement,
    root: ShadowRoot,
}

impl Shell {
    pub fn mount(document: &Document) -> Result<Self> {
        let host: HtmlElement = create(document, "div", "")?;
        host.set_attribute("data-hoverzoom", "")?;
        let root = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open))?;

        let style = document.create_element("style")?;
        style.set_text_content(Some(STYLE));
        root.append_child(&style)?;

        document
            .document_element()
            .ok_or(HostError::Missing("documentElement"))?
            .append_child(&host)?;
        log::debug!("Overlay host mounted");

        Ok(Self {
            document: document.clone(),
            host,
            root,
        })
    }

    pub fn create<T: JsCast>(&self, tag: &'static str, class: &str) -> Result<T> {
        create(&self.document, tag, class)
    }

    pub fn append(&self, node: &Node) -> Result<()> {
        self.root.append_child(node)?;
        Ok(())
    }

    /// Whether an event target belongs to the overlay UI. Events from inside
    /// the shadow root are retargeted to the host.
    pub fn contains(&self, node: &Node) -> bool {
        self.host.contains(Some(node))
    }
}
