//! The hover preview box.

use hoverzoom_core::hover::{LOADING_LABEL, OverlayLayout};
use hoverzoom_core::media::MediaType;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlElement, HtmlImageElement, HtmlVideoElement};

use crate::error::Result;
use crate::shell::{Shell, set_class};

/// Preview DOM: one image and one video element, only one visible at a time.
#[derive(Debug, Clone)]
pub struct OverlayView {
    wrap: HtmlElement,
    clip: HtmlElement,
    image: HtmlImageElement,
    video: HtmlVideoElement,
    hud: HtmlElement,
}

impl OverlayView {
    pub fn new(shell: &Shell) -> Result<Self> {
        let wrap: HtmlElement = shell.create("div", "hz-overlay")?;
        let clip: HtmlElement = shell.create("div", "hz-clip")?;
        let image: HtmlImageElement = shell.create("img", "")?;
        image.set_decoding("async");
        image.set_alt("");
        let video: HtmlVideoElement = shell.create("video", "")?;
        video.set_muted(true);
        video.set_loop(true);
        video.set_plays_inline(true);
        let hud: HtmlElement = shell.create("div", "hz-hud")?;
        let badge: HtmlElement = shell.create("div", "hz-badge")?;
        badge.set_text_content(Some("Pinned"));

        clip.append_child(&image)?;
        clip.append_child(&video)?;
        wrap.append_child(&clip)?;
        wrap.append_child(&hud)?;
        wrap.append_child(&badge)?;
        shell.append(&wrap)?;

        Ok(Self {
            wrap,
            clip,
            image,
            video,
            hud,
        })
    }

    pub fn image(&self) -> &HtmlImageElement {
        &self.image
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    fn set_display(element: &HtmlElement, shown: bool) {
        let value = if shown { "block" } else { "none" };
        if let Err(e) = element.style().set_property("display", value) {
            log::debug!("Cannot set display: {:?}", e);
        }
    }

    fn stop_video(&self) {
        if let Err(e) = self.video.pause() {
            log::debug!("Video pause failed: {:?}", e);
        }
        self.video.remove_attribute("src").ok();
        self.video.load();
    }

    pub fn show_loading(&self, media_type: MediaType) {
        let video = media_type == MediaType::Video;
        Self::set_display(&self.video, video);
        Self::set_display(&self.image, !video);
        self.hud.set_text_content(Some(LOADING_LABEL));
        set_class(&self.wrap, "hz-loading", true);
        set_class(&self.wrap, "hz-visible", true);
    }

    /// Put `url` into the matching media element.
    pub fn apply(&self, media_type: MediaType, url: &str, label: &str) {
        self.hud.set_text_content(Some(label));
        set_class(&self.wrap, "hz-loading", false);
        match media_type {
            MediaType::Image => {
                self.stop_video();
                Self::set_display(&self.video, false);
                Self::set_display(&self.image, true);
                self.image.set_src(url);
            }
            MediaType::Video => {
                self.image.remove_attribute("src").ok();
                Self::set_display(&self.image, false);
                Self::set_display(&self.video, true);
                self.video.set_src(url);
                // Autoplay can be refused by the page's policy.
                if let Ok(promise) = self.video.play() {
                    wasm_bindgen_futures::spawn_local(async move {
                        if let Err(e) = JsFuture::from(promise).await {
                            log::debug!("Video autoplay refused: {:?}", e);
                        }
                    });
                }
            }
        }
    }

    pub fn show_error(&self, label: &str) {
        set_class(&self.wrap, "hz-loading", true);
        self.hud.set_text_content(Some(label));
    }

    /// Position the box at `layout.rect`. Zoomed media is scaled with a
    /// transform inside a clipping box, so it never grows past the rect.
    pub fn set_layout(&self, layout: &OverlayLayout) {
        let rect = layout.rect;
        let visible = layout.visible_media();
        let offset = layout.media_offset();

        let wrap = self.wrap.style();
        let clip = self.clip.style();
        let result = wrap
            .set_property(
                "transform",
                &format!("translate3d({}px, {}px, 0)", rect.left.round(), rect.top.round()),
            )
            .and_then(|_| wrap.set_property("width", &format!("{}px", rect.width)))
            .and_then(|_| wrap.set_property("height", &format!("{}px", rect.height)))
            .and_then(|_| clip.set_property("width", &format!("{}px", visible.width)))
            .and_then(|_| clip.set_property("height", &format!("{}px", visible.height)));
        if let Err(e) = result {
            log::debug!("Cannot position overlay: {:?}", e);
        }

        let (width, height) = (layout.media.width.round() as u32, layout.media.height.round() as u32);
        let transform = format!(
            "translate({}px, {}px) scale({})",
            offset.x, offset.y, layout.zoom
        );
        self.image.set_width(width);
        self.image.set_height(height);
        self.video.set_width(width);
        self.video.set_height(height);
        let elements: [&HtmlElement; 2] = [&self.image, &self.video];
        for element in elements {
            if let Err(e) = element.style().set_property("transform", &transform) {
                log::debug!("Cannot zoom media: {:?}", e);
            }
        }
    }

    pub fn hide(&self) {
        set_class(&self.wrap, "hz-visible", false);
        set_class(&self.wrap, "hz-loading", false);
        self.stop_video();
        self.image.remove_attribute("src").ok();
    }

    pub fn set_pinned(&self, pinned: bool) {
        set_class(&self.wrap, "hz-pinned", pinned);
    }
}
