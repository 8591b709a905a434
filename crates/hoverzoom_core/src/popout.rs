//! The movable, resizable popout window.
//!
//! Independent of the hover overlay. Opening maximizes the window inside the
//! padded viewport and marks it auto-fit; the first drag or resize hands
//! geometry over to the user. One gesture runs at a time and holds pointer
//! capture for its pointer id until that pointer is released.

use crate::config::HoverConfig;
use crate::geometry::{clamp, Point, Rect, Size};
use crate::media::MediaType;
use crate::target::PopoutMedia;

/// Part of the window a pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoutRegion {
    TitleBar,
    ResizeHandle,
}

/// Side effects requested by [`PopoutWindowState`].
#[derive(Debug, Clone, PartialEq)]
pub enum PopoutCommand {
    /// Show the window with this media, replacing whatever was loaded.
    Show(PopoutMedia),
    SetRect(Rect),
    AcquireCapture(i32),
    ReleaseCapture(i32),
    /// Hide the window and pause any playing video.
    Close,
    Toast(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureKind {
    Drag,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Gesture {
    kind: GestureKind,
    pointer_id: i32,
    start: Point,
    origin: Rect,
}

/// Geometry and lifecycle of the popout window.
#[derive(Debug, Clone)]
pub struct PopoutWindowState {
    open: bool,
    rect: Rect,
    auto_fit: bool,
    media: Option<PopoutMedia>,
    gesture: Option<Gesture>,
    viewport: Size,
    padding: f64,
    min_size: Size,
}

impl PopoutWindowState {
    pub fn new(config: &HoverConfig) -> Self {
        Self {
            open: false,
            rect: Rect::default(),
            auto_fit: true,
            media: None,
            gesture: None,
            viewport: Size::default(),
            padding: config.popout_padding,
            min_size: Size::new(config.popout_min_width, config.popout_min_height),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_auto_fit(&self) -> bool {
        self.auto_fit
    }

    /// Last opened media. Kept after close until the next open.
    pub fn media(&self) -> Option<&PopoutMedia> {
        self.media.as_ref()
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    fn maximized(&self) -> Rect {
        let width = (self.viewport.width - self.padding * 2.0).floor().max(1.0);
        let height = (self.viewport.height - self.padding * 2.0).floor().max(1.0);
        Rect::new(self.padding, self.padding, width, height)
    }

    /// Open `media`, maximized and auto-fit.
    pub fn open(&mut self, media: PopoutMedia, viewport: Size) -> Vec<PopoutCommand> {
        let mut cmds = self.end_gesture();
        log::info!("Opening popout for {} {}", media.media_type.name(), media.url);
        self.viewport = viewport;
        self.open = true;
        self.auto_fit = true;
        self.rect = self.maximized();
        self.media = Some(media.clone());
        cmds.push(PopoutCommand::Show(media));
        cmds.push(PopoutCommand::SetRect(self.rect));
        cmds
    }

    pub fn close(&mut self) -> Vec<PopoutCommand> {
        let mut cmds = self.end_gesture();
        if self.open {
            self.open = false;
            cmds.push(PopoutCommand::Close);
        }
        cmds
    }

    fn end_gesture(&mut self) -> Vec<PopoutCommand> {
        match self.gesture.take() {
            Some(gesture) => vec![PopoutCommand::ReleaseCapture(gesture.pointer_id)],
            None => Vec::new(),
        }
    }

    /// Primary-button pointer-down on the title bar or resize handle.
    ///
    /// Ignored while closed, for other buttons, and while another gesture
    /// holds capture.
    pub fn pointer_down(&mut self, region: PopoutRegion, pointer_id: i32, button: i16, at: Point) -> Vec<PopoutCommand> {
        if !self.open || button != 0 || self.gesture.is_some() {
            return Vec::new();
        }
        let kind = match region {
            PopoutRegion::TitleBar => GestureKind::Drag,
            PopoutRegion::ResizeHandle => GestureKind::Resize,
        };
        self.auto_fit = false;
        self.gesture = Some(Gesture {
            kind,
            pointer_id,
            start: at,
            origin: self.rect,
        });
        vec![PopoutCommand::AcquireCapture(pointer_id)]
    }

    pub fn pointer_move(&mut self, pointer_id: i32, at: Point) -> Vec<PopoutCommand> {
        let Some(gesture) = self.gesture.filter(|g| g.pointer_id == pointer_id) else {
            return Vec::new();
        };
        let dx = at.x - gesture.start.x;
        let dy = at.y - gesture.start.y;
        let origin = gesture.origin;
        let pad = self.padding;
        let (vw, vh) = (self.viewport.width, self.viewport.height);

        match gesture.kind {
            GestureKind::Drag => {
                self.rect.left = clamp(origin.left + dx, pad, (vw - self.rect.width - pad).max(pad));
                self.rect.top = clamp(origin.top + dy, pad, (vh - self.rect.height - pad).max(pad));
            }
            GestureKind::Resize => {
                let max_w = (vw - origin.left - pad).max(1.0);
                let max_h = (vh - origin.top - pad).max(1.0);
                let min_w = if max_w >= self.min_size.width { self.min_size.width } else { 1.0 };
                let min_h = if max_h >= self.min_size.height { self.min_size.height } else { 1.0 };
                self.rect.width = clamp(origin.width + dx, min_w, max_w).floor();
                self.rect.height = clamp(origin.height + dy, min_h, max_h).floor();
            }
        }
        vec![PopoutCommand::SetRect(self.rect)]
    }

    /// Pointer-up or pointer-cancel. Only the capturing pointer ends the gesture.
    pub fn pointer_up(&mut self, pointer_id: i32) -> Vec<PopoutCommand> {
        if self.gesture.is_some_and(|g| g.pointer_id == pointer_id) {
            self.end_gesture()
        } else {
            Vec::new()
        }
    }

    /// Re-maximize while auto-fit, otherwise pull the window back on screen.
    pub fn viewport_resized(&mut self, viewport: Size) -> Vec<PopoutCommand> {
        self.viewport = viewport;
        if !self.open {
            return Vec::new();
        }
        self.rect = if self.auto_fit {
            self.maximized()
        } else {
            self.clamped()
        };
        vec![PopoutCommand::SetRect(self.rect)]
    }

    /// The loaded media reported its size; keep the window on screen.
    pub fn media_loaded(&mut self) -> Vec<PopoutCommand> {
        if !self.open {
            return Vec::new();
        }
        self.rect = self.clamped();
        vec![PopoutCommand::SetRect(self.rect)]
    }

    pub fn media_failed(&self) -> Vec<PopoutCommand> {
        match self.media.as_ref().map(|m| m.media_type) {
            Some(MediaType::Video) => vec![PopoutCommand::Toast("Failed to load video")],
            Some(MediaType::Image) => vec![PopoutCommand::Toast("Failed to load image")],
            None => Vec::new(),
        }
    }

    fn clamped(&self) -> Rect {
        let pad = self.padding;
        let max_w = (self.viewport.width - pad * 2.0).floor().max(1.0);
        let max_h = (self.viewport.height - pad * 2.0).floor().max(1.0);
        let width = clamp(self.rect.width, 1.0, max_w);
        let height = clamp(self.rect.height, 1.0, max_h);
        let left = clamp(self.rect.left, pad, (self.viewport.width - width - pad).max(pad));
        let top = clamp(self.rect.top, pad, (self.viewport.height - height - pad).max(pad));
        Rect::new(left.floor(), top.floor(), width.floor(), height.floor())
    }
}
