//! The popout window opened by alt-click.

use hoverzoom_core::geometry::Rect;
use hoverzoom_core::media::MediaType;
use hoverzoom_core::target::PopoutMedia;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlElement, HtmlImageElement, HtmlVideoElement};

use crate::error::Result;
use crate::shell::{Shell, set_class};

/// Title bar buttons, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoutButton {
    Open,
    Copy,
    Download,
    Close,
}

impl PopoutButton {
    pub fn all() -> &'static [PopoutButton] {
        &[Self::Open, Self::Copy, Self::Download, Self::Close]
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Copy => "Copy URL",
            Self::Download => "Download",
            Self::Close => "✕",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PopoutView {
    backdrop: HtmlElement,
    frame: HtmlElement,
    title_bar: HtmlElement,
    title: HtmlElement,
    buttons: Vec<(PopoutButton, HtmlElement)>,
    image: HtmlImageElement,
    video: HtmlVideoElement,
    resize_handle: HtmlElement,
}

impl PopoutView {
    pub fn new(shell: &Shell) -> Result<Self> {
        let backdrop: HtmlElement = shell.create("div", "hz-backdrop")?;
        let frame: HtmlElement = shell.create("div", "hz-frame")?;

        let title_bar: HtmlElement = shell.create("div", "hz-titlebar")?;
        let title: HtmlElement = shell.create("span", "hz-title")?;
        title_bar.append_child(&title)?;
        let mut buttons = Vec::new();
        for &button in PopoutButton::all() {
            let element: HtmlElement = shell.create("button", "")?;
            element.set_attribute("type", "button")?;
            element.set_text_content(Some(button.label()));
            title_bar.append_child(&element)?;
            buttons.push((button, element));
        }

        let body: HtmlElement = shell.create("div", "hz-body")?;
        let image: HtmlImageElement = shell.create("img", "")?;
        image.set_alt("");
        let video: HtmlVideoElement = shell.create("video", "")?;
        video.set_controls(true);
        video.set_loop(true);
        video.set_plays_inline(true);
        body.append_child(&image)?;
        body.append_child(&video)?;

        let resize_handle: HtmlElement = shell.create("div", "hz-resize")?;

        frame.append_child(&title_bar)?;
        frame.append_child(&body)?;
        frame.append_child(&resize_handle)?;
        shell.append(&backdrop)?;
        shell.append(&frame)?;

        Ok(Self {
            backdrop,
            frame,
            title_bar,
            title,
            buttons,
            image,
            video,
            resize_handle,
        })
    }

    pub fn backdrop(&self) -> &HtmlElement {
        &self.backdrop
    }

    pub fn title_bar(&self) -> &HtmlElement {
        &self.title_bar
    }

    pub fn resize_handle(&self) -> &HtmlElement {
        &self.resize_handle
    }

    pub fn buttons(&self) -> &[(PopoutButton, HtmlElement)] {
        &self.buttons
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

    pub fn show(&self, media: &PopoutMedia) {
        self.title.set_text_content(Some(&media.url));
        self.title.set_title(&media.url);
        match media.media_type {
            MediaType::Image => {
                self.stop_video();
                Self::set_display(&self.video, false);
                Self::set_display(&self.image, true);
                self.image.set_src(&media.url);
            }
            MediaType::Video => {
                self.image.remove_attribute("src").ok();
                Self::set_display(&self.image, false);
                Self::set_display(&self.video, true);
                self.video.set_src(&media.url);
                if let Ok(promise) = self.video.play() {
                    wasm_bindgen_futures::spawn_local(async move {
                        if let Err(e) = JsFuture::from(promise).await {
                            log::debug!("Popout autoplay refused: {:?}", e);
                        }
                    });
                }
            }
        }
        set_class(&self.backdrop, "hz-visible", true);
        set_class(&self.frame, "hz-visible", true);
    }

    pub fn set_rect(&self, rect: Rect) {
        let style = self.frame.style();
        let result = style
            .set_property("left", &format!("{}px", rect.left))
            .and_then(|_| style.set_property("top", &format!("{}px", rect.top)))
            .and_then(|_| style.set_property("width", &format!("{}px", rect.width)))
            .and_then(|_| style.set_property("height", &format!("{}px", rect.height)));
        if let Err(e) = result {
            log::debug!("Cannot position popout: {:?}", e);
        }
    }

    pub fn capture(&self, pointer_id: i32) {
        if let Err(e) = self.frame.set_pointer_capture(pointer_id) {
            log::debug!("Pointer capture failed: {:?}", e);
        }
    }

    pub fn release(&self, pointer_id: i32) {
        if self.frame.has_pointer_capture(pointer_id) {
            self.frame.release_pointer_capture(pointer_id).ok();
        }
    }

    pub fn close(&self) {
        set_class(&self.backdrop, "hz-visible", false);
        set_class(&self.frame, "hz-visible", false);
        self.stop_video();
        self.image.remove_attribute("src").ok();
    }
}
