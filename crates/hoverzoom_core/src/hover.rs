//! Hover preview lifecycle.
//!
//! [`HoverController`] is a synchronous state machine. The browser side feeds
//! it pointer, timer and probe events and executes the [`HoverCommand`]s it
//! returns. Timers and probes are identified by handles and session tokens
//! minted here, so a stale callback can always be recognised and dropped.
//!
//! ```text
//! Idle -> Pending (show timer) -> Loading (probing) -> Shown
//!   ^--------------------- hide / force hide ----------'
//! ```
//!
//! Pinning is orthogonal: while pinned, leaving the element and hide timers
//! do nothing and only a force hide closes the overlay.

use crate::config::{ConfigUpdate, HoverConfig, PersistedFlags};
use crate::constants::OVERLAY_CHROME;
use crate::geometry::{fit_size, overlay_box, place_overlay, Point, Rect, Size, ZoomState};
use crate::media::{MediaType, ResolvedMedia};

/// Label shown when every image candidate failed to load.
pub const NO_PREVIEW_LABEL: &str = "No preview (blocked/404)";

/// Label shown while candidates are being probed.
pub const LOADING_LABEL: &str = "Loading…";

/// Identifies one timer started by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Identifies one preview session and all probes started for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Coarse lifecycle state, derived from the controller's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverPhase {
    Idle,
    Pending,
    Loading,
    Shown,
}

/// Facts about a pointer-over event that the controller cannot see itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerContext {
    pub pointer: Point,
    pub alt_held: bool,
    /// Any mouse button is held (drag or selection in progress).
    pub buttons_held: bool,
    pub editable: bool,
    /// The event target belongs to the overlay or popout itself.
    pub in_overlay: bool,
    /// Rendered size of the target, when known.
    pub target_size: Option<Size>,
}

/// Where the overlay goes and how big the media is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    /// Fitted media size before zoom.
    pub media: Size,
    pub zoom: f64,
    /// Outer overlay box, zoom and chrome included.
    pub rect: Rect,
}

impl OverlayLayout {
    /// Part of the zoomed media that fits inside `rect`. Anything beyond it
    /// is clipped.
    pub fn visible_media(&self) -> Size {
        let scaled = self.media.scaled(self.zoom);
        Size::new(
            scaled.width.min((self.rect.width - OVERLAY_CHROME).max(0.0)),
            scaled.height.min((self.rect.height - OVERLAY_CHROME).max(0.0)),
        )
    }

    /// Where the zoomed media's top-left corner sits inside the visible
    /// area. Negative when clipped, so the media stays centred.
    pub fn media_offset(&self) -> Point {
        let scaled = self.media.scaled(self.zoom);
        let visible = self.visible_media();
        Point::new(
            (visible.width - scaled.width) / 2.0,
            (visible.height - scaled.height) / 2.0,
        )
    }
}

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverCommand {
    StartTimer { handle: TimerHandle, delay_ms: u32 },
    CancelTimer(TimerHandle),
    /// Show the overlay with a spinner, ready for media of this type.
    ShowLoading { media_type: MediaType },
    /// Decode-probe one image candidate and report back with the token.
    Probe { token: SessionToken, url: String },
    /// Display `url`. Videos should start playing.
    Apply {
        token: SessionToken,
        media_type: MediaType,
        url: String,
        label: String,
    },
    ShowError { label: &'static str },
    Layout(OverlayLayout),
    Hide,
    SetPinned(bool),
    PersistFlags(PersistedFlags),
    Toast(&'static str),
}

/// The element under the pointer and what it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTarget<T> {
    pub element: T,
    pub media: ResolvedMedia,
    pub pointer: Point,
}

impl<T> ActiveTarget<T> {
    /// First candidate, used to recognise the same media across elements.
    pub fn key(&self) -> &str {
        self.media.primary()
    }
}

#[derive(Debug, Clone)]
struct PreviewSession<T> {
    token: SessionToken,
    element: T,
    media: ResolvedMedia,
    /// Candidate currently being probed.
    index: usize,
    applied: Option<String>,
    failed: bool,
    natural: Option<Size>,
    /// A load result was dropped because the target changed, so returning
    /// to this media starts the load over.
    retargeted: bool,
}

impl<T> PreviewSession<T> {
    fn key(&self) -> &str {
        self.media.primary()
    }

    fn is_loading(&self) -> bool {
        self.applied.is_none() && !self.failed
    }
}

/// Debounced hover/pin state machine, generic over the host's element type.
#[derive(Debug)]
pub struct HoverController<T> {
    config: HoverConfig,
    pinned: bool,
    visible: bool,
    target: Option<ActiveTarget<T>>,
    show_timer: Option<TimerHandle>,
    hide_timer: Option<TimerHandle>,
    session: Option<PreviewSession<T>>,
    zoom: ZoomState,
    pointer: Point,
    viewport: Size,
    next_timer: u64,
    next_token: u64,
}

impl<T: Clone + PartialEq> HoverController<T> {
    pub fn new(config: HoverConfig, flags: PersistedFlags) -> Self {
        let mut config = config;
        config.enabled = flags.enabled;
        Self {
            config,
            pinned: flags.pinned,
            visible: false,
            target: None,
            show_timer: None,
            hide_timer: None,
            session: None,
            zoom: ZoomState::identity(),
            pointer: Point::default(),
            viewport: Size::default(),
            next_timer: 1,
            next_token: 1,
        }
    }

    pub fn config(&self) -> &HoverConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn zoom(&self) -> f64 {
        self.zoom.factor()
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn active_target(&self) -> Option<&ActiveTarget<T>> {
        self.target.as_ref()
    }

    /// Media of the visible preview, used by open/copy/download shortcuts.
    pub fn displayed_media(&self) -> Option<&ResolvedMedia> {
        self.session.as_ref().filter(|_| self.visible).map(|s| &s.media)
    }

    /// The element whose media is on screen.
    pub fn displayed_element(&self) -> Option<&T> {
        self.session.as_ref().filter(|_| self.visible).map(|s| &s.element)
    }

    pub fn live_session(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn phase(&self) -> HoverPhase {
        if self.show_timer.is_some() {
            HoverPhase::Pending
        } else if self.session.as_ref().is_some_and(PreviewSession::is_loading) {
            HoverPhase::Loading
        } else if self.visible {
            HoverPhase::Shown
        } else {
            HoverPhase::Idle
        }
    }

    pub fn flags(&self) -> PersistedFlags {
        PersistedFlags {
            enabled: self.config.enabled,
            pinned: self.pinned,
        }
    }

    /// Apply a configuration change. Disabling through here hides like the
    /// toggle shortcut does.
    pub fn update_config(&mut self, update: ConfigUpdate) -> Vec<HoverCommand> {
        let was_enabled = self.config.enabled;
        self.config.update(update);
        if was_enabled != self.config.enabled {
            self.enabled_changed()
        } else {
            Vec::new()
        }
    }

    fn alloc_timer(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_timer);
        self.next_timer += 1;
        handle
    }

    fn alloc_token(&mut self) -> SessionToken {
        let token = SessionToken(self.next_token);
        self.next_token += 1;
        token
    }

    fn cancel_show(&mut self, cmds: &mut Vec<HoverCommand>) {
        if let Some(handle) = self.show_timer.take() {
            cmds.push(HoverCommand::CancelTimer(handle));
        }
    }

    fn cancel_hide(&mut self, cmds: &mut Vec<HoverCommand>) {
        if let Some(handle) = self.hide_timer.take() {
            cmds.push(HoverCommand::CancelTimer(handle));
        }
    }

    fn layout(&self) -> Option<OverlayLayout> {
        let session = self.session.as_ref()?;
        let media = fit_size(session.natural, self.viewport, &self.config);
        let zoom = self.zoom.factor();
        let rect = place_overlay(
            self.pointer,
            overlay_box(media, zoom),
            self.viewport,
            self.config.offset,
            self.config.margin,
        );
        Some(OverlayLayout { media, zoom, rect })
    }

    fn push_layout(&self, cmds: &mut Vec<HoverCommand>) {
        if let Some(layout) = self.layout() {
            cmds.push(HoverCommand::Layout(layout));
        }
    }

    /// The pointer entered `element`, whose hint resolved to `media`.
    pub fn pointer_over(
        &mut self,
        element: T,
        media: Option<ResolvedMedia>,
        ctx: PointerContext,
    ) -> Vec<HoverCommand> {
        self.pointer = ctx.pointer;
        let mut cmds = Vec::new();

        if !self.config.enabled
            || ctx.in_overlay
            || ctx.buttons_held
            || (self.config.ignore_while_typing && ctx.editable)
            || (self.config.alt_only && !ctx.alt_held)
        {
            return cmds;
        }
        if self.pinned && self.visible {
            // Keep track of the pinned element so unpinning over it keeps it open.
            if self.displayed_element() == Some(&element) {
                if let Some(media) = media {
                    self.target = Some(ActiveTarget {
                        element,
                        media,
                        pointer: ctx.pointer,
                    });
                }
            }
            return cmds;
        }
        if let Some(size) = ctx.target_size {
            let min = self.config.min_target_side;
            if size.width < min || size.height < min {
                return cmds;
            }
        }
        let Some(media) = media else {
            return cmds;
        };
        if self.target.as_ref().is_some_and(|t| t.element == element) {
            return cmds;
        }

        self.cancel_show(&mut cmds);
        self.cancel_hide(&mut cmds);

        let handle = self.alloc_timer();
        self.show_timer = Some(handle);
        cmds.push(HoverCommand::StartTimer {
            handle,
            delay_ms: self.config.hover_delay_ms,
        });
        log::trace!("Pending preview for {}", media.primary());
        self.target = Some(ActiveTarget {
            element,
            media,
            pointer: ctx.pointer,
        });
        cmds
    }

    /// The pointer left `element`.
    ///
    /// `still_inside` is set when it only moved to a descendant of the
    /// element, which does not count as leaving. While pinned the target is
    /// forgotten but no hide is scheduled.
    pub fn pointer_out(&mut self, element: &T, still_inside: bool) -> Vec<HoverCommand> {
        let mut cmds = Vec::new();
        if still_inside || !self.target.as_ref().is_some_and(|t| &t.element == element) {
            return cmds;
        }

        self.target = None;
        self.cancel_show(&mut cmds);
        if !self.pinned {
            self.schedule_hide(&mut cmds);
        }
        cmds
    }

    fn schedule_hide(&mut self, cmds: &mut Vec<HoverCommand>) {
        self.cancel_hide(cmds);
        let handle = self.alloc_timer();
        self.hide_timer = Some(handle);
        cmds.push(HoverCommand::StartTimer {
            handle,
            delay_ms: self.config.hide_delay_ms,
        });
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Vec<HoverCommand> {
        self.pointer = pointer;
        if let Some(target) = self.target.as_mut() {
            target.pointer = pointer;
        }
        let mut cmds = Vec::new();
        if self.visible && !self.pinned {
            self.push_layout(&mut cmds);
        }
        cmds
    }

    /// A timer started by this controller fired. Unknown handles are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle) -> Vec<HoverCommand> {
        if self.show_timer == Some(handle) {
            self.show_timer = None;
            self.begin_session()
        } else if self.hide_timer == Some(handle) {
            self.hide_timer = None;
            if self.pinned || self.target.is_some() {
                Vec::new()
            } else {
                self.hide()
            }
        } else {
            log::trace!("Ignoring stale timer {}", handle.0);
            Vec::new()
        }
    }

    fn begin_session(&mut self) -> Vec<HoverCommand> {
        let mut cmds = Vec::new();
        let Some(target) = self.target.clone() else {
            return cmds;
        };

        if let Some(session) = self.session.as_mut() {
            if self.visible && session.key() == target.key() && !session.retargeted {
                session.element = target.element;
                return cmds;
            }
        }

        let token = self.alloc_token();
        let media_type = target.media.media_type;
        let first = target.media.primary().to_string();
        log::debug!("Starting preview session {} for {}", token.0, first);

        self.session = Some(PreviewSession {
            token,
            element: target.element,
            media: target.media,
            index: 0,
            applied: None,
            failed: false,
            natural: None,
            retargeted: false,
        });
        self.zoom.reset();
        self.visible = true;
        cmds.push(HoverCommand::ShowLoading { media_type });
        self.push_layout(&mut cmds);

        match media_type {
            MediaType::Video => {
                if let Some(session) = self.session.as_mut() {
                    session.applied = Some(first.clone());
                }
                cmds.push(HoverCommand::Apply {
                    token,
                    media_type,
                    label: hud_label(&first),
                    url: first,
                });
            }
            MediaType::Image => cmds.push(HoverCommand::Probe { token, url: first }),
        }
        cmds
    }

    /// Result of a [`HoverCommand::Probe`].
    ///
    /// Results for any session but the live one are dropped without a command.
    pub fn on_probe_result(&mut self, token: SessionToken, ok: bool) -> Vec<HoverCommand> {
        let mut cmds = Vec::new();
        let Some(session) = self.session.as_mut().filter(|s| s.token == token) else {
            log::debug!("Discarding probe result for stale session {}", token.0);
            return cmds;
        };
        if !session.is_loading() {
            return cmds;
        }
        if self.target.as_ref().is_some_and(|t| t.key() != session.key()) {
            // The pointer moved on to other media before this load finished.
            log::debug!("Discarding load result for retargeted session {}", token.0);
            session.retargeted = true;
            return cmds;
        }

        let candidates = session.media.candidates();
        if ok {
            let url = candidates[session.index].clone();
            log::debug!("Session {} loaded {}", token.0, url);
            session.applied = Some(url.clone());
            cmds.push(HoverCommand::Apply {
                token,
                media_type: session.media.media_type,
                label: hud_label(&url),
                url,
            });
            self.push_layout(&mut cmds);
        } else if session.index + 1 < candidates.len() {
            session.index += 1;
            cmds.push(HoverCommand::Probe {
                token,
                url: candidates[session.index].clone(),
            });
        } else {
            log::info!("No candidate loaded for {}", session.media.primary());
            session.failed = true;
            cmds.push(HoverCommand::ShowError {
                label: NO_PREVIEW_LABEL,
            });
        }
        cmds
    }

    /// The displayed media reported its natural size.
    pub fn media_loaded(&mut self, token: SessionToken, natural: Size) -> Vec<HoverCommand> {
        let mut cmds = Vec::new();
        match self.session.as_mut() {
            Some(session) if session.token == token && natural.is_known() => {
                session.natural = Some(natural);
                self.push_layout(&mut cmds);
            }
            _ => {}
        }
        cmds
    }

    pub fn viewport_resized(&mut self, viewport: Size) -> Vec<HoverCommand> {
        self.viewport = viewport;
        let mut cmds = Vec::new();
        if self.visible {
            self.push_layout(&mut cmds);
        }
        cmds
    }

    /// Wheel over the page. Returns `None` when the event should be left
    /// to the page.
    pub fn wheel(&mut self, delta_y: f64) -> Option<Vec<HoverCommand>> {
        if !self.visible {
            return None;
        }
        let mut cmds = Vec::new();
        if self.zoom.apply_wheel(delta_y, &self.config) {
            self.push_layout(&mut cmds);
        }
        Some(cmds)
    }

    /// Flip the pin flag. Does nothing while no preview is visible.
    pub fn toggle_pin(&mut self) -> Vec<HoverCommand> {
        let mut cmds = Vec::new();
        if !self.visible {
            return cmds;
        }
        self.pinned = !self.pinned;
        log::info!("Preview {}", if self.pinned { "pinned" } else { "unpinned" });
        cmds.push(HoverCommand::SetPinned(self.pinned));
        cmds.push(HoverCommand::PersistFlags(self.flags()));
        cmds.push(HoverCommand::Toast(if self.pinned {
            "Pinned preview"
        } else {
            "Unpinned"
        }));
        if !self.pinned && self.target.is_none() {
            self.schedule_hide(&mut cmds);
        }
        cmds
    }

    /// A plain click. Clicking the previewed element toggles the pin.
    pub fn click(&mut self, element: &T) -> Vec<HoverCommand> {
        if self.displayed_element() == Some(element) {
            self.toggle_pin()
        } else {
            Vec::new()
        }
    }

    fn hide(&mut self) -> Vec<HoverCommand> {
        let mut cmds = Vec::new();
        self.cancel_show(&mut cmds);
        self.cancel_hide(&mut cmds);
        self.session = None;
        self.zoom.reset();
        if self.visible {
            self.visible = false;
            cmds.push(HoverCommand::Hide);
        }
        cmds
    }

    /// Hide regardless of pin state, and unpin.
    pub fn force_hide(&mut self) -> Vec<HoverCommand> {
        self.target = None;
        let mut cmds = self.hide();
        if self.pinned {
            self.pinned = false;
            cmds.push(HoverCommand::SetPinned(false));
            cmds.push(HoverCommand::PersistFlags(self.flags()));
        }
        cmds
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Vec<HoverCommand> {
        self.update_config(ConfigUpdate::SetEnabled(enabled))
    }

    pub fn toggle_enabled(&mut self) -> Vec<HoverCommand> {
        self.update_config(ConfigUpdate::ToggleEnabled)
    }

    fn enabled_changed(&mut self) -> Vec<HoverCommand> {
        log::info!("Hover preview {}", if self.config.enabled { "enabled" } else { "disabled" });
        let mut cmds = if self.config.enabled {
            Vec::new()
        } else {
            self.force_hide()
        };
        cmds.push(HoverCommand::PersistFlags(self.flags()));
        cmds.push(HoverCommand::Toast(if self.config.enabled {
            "Image preview: ON"
        } else {
            "Image preview: OFF"
        }));
        cmds
    }
}

/// Text for the overlay HUD: the host name of the shown URL.
pub fn hud_label(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_string(),
            None => parsed.scheme().to_string(),
        },
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::MediaResolver;

    type Controller = HoverController<u32>;

    fn controller() -> Controller {
        let mut c = Controller::new(HoverConfig::default(), PersistedFlags::default());
        c.viewport_resized(Size::new(1280.0, 800.0));
        c
    }

    fn media(url: &str) -> Option<ResolvedMedia> {
        MediaResolver::new().resolve(url)
    }

    fn ctx() -> PointerContext {
        PointerContext {
            pointer: Point::new(100.0, 100.0),
            ..Default::default()
        }
    }

    fn started_timer(cmds: &[HoverCommand]) -> TimerHandle {
        cmds.iter()
            .find_map(|c| match c {
                HoverCommand::StartTimer { handle, .. } => Some(*handle),
                _ => None,
            })
            .expect("no timer started")
    }

    fn probe(cmds: &[HoverCommand]) -> Option<(SessionToken, String)> {
        cmds.iter().find_map(|c| match c {
            HoverCommand::Probe { token, url } => Some((*token, url.clone())),
            _ => None,
        })
    }

    fn applied(cmds: &[HoverCommand]) -> Option<String> {
        cmds.iter().find_map(|c| match c {
            HoverCommand::Apply { url, .. } => Some(url.clone()),
            _ => None,
        })
    }

    /// Hover element 1 showing `url` and let the show timer fire.
    fn show(c: &mut Controller, element: u32, url: &str) -> Vec<HoverCommand> {
        let cmds = c.pointer_over(element, media(url), ctx());
        let handle = started_timer(&cmds);
        c.on_timer(handle)
    }

    #[test]
    fn test_show_after_delay_probes_first_candidate() {
        let mut c = controller();
        let cmds = c.pointer_over(1, media("https://x.test/a.jpg"), ctx());
        assert_eq!(c.phase(), HoverPhase::Pending);
        assert!(matches!(
            cmds[0],
            HoverCommand::StartTimer { delay_ms: 140, .. }
        ));

        let cmds = c.on_timer(started_timer(&cmds));
        assert!(cmds.contains(&HoverCommand::ShowLoading {
            media_type: MediaType::Image
        }));
        let (token, url) = probe(&cmds).unwrap();
        assert_eq!(url, "https://x.test/a.jpg");
        assert_eq!(c.phase(), HoverPhase::Loading);

        let cmds = c.on_probe_result(token, true);
        assert_eq!(applied(&cmds).as_deref(), Some("https://x.test/a.jpg"));
        assert!(cmds.iter().any(|cmd| matches!(cmd, HoverCommand::Apply { label, .. } if label == "x.test")));
        assert_eq!(c.phase(), HoverPhase::Shown);
    }

    #[test]
    fn test_retarget_within_debounce_never_loads_abandoned_target() {
        let mut c = controller();
        let first = c.pointer_over(1, media("https://x.test/one.jpg"), ctx());
        let first_timer = started_timer(&first);

        let second = c.pointer_over(2, media("https://x.test/two.jpg"), ctx());
        assert!(second.contains(&HoverCommand::CancelTimer(first_timer)));
        let second_timer = started_timer(&second);

        assert!(c.on_timer(first_timer).is_empty());

        let cmds = c.on_timer(second_timer);
        assert_eq!(probe(&cmds).unwrap().1, "https://x.test/two.jpg");
        assert!(!cmds.iter().any(|cmd| matches!(cmd, HoverCommand::Probe { url, .. } if url.contains("one"))));
    }

    #[test]
    fn test_stale_probe_result_is_discarded() {
        let mut c = controller();
        let (old_token, _) = probe(&show(&mut c, 1, "https://x.test/one.jpg")).unwrap();

        c.pointer_out(&1, false);
        let (new_token, _) = probe(&show(&mut c, 2, "https://x.test/two.jpg")).unwrap();
        assert!(new_token > old_token);

        assert!(c.on_probe_result(old_token, true).is_empty());
        assert_eq!(c.phase(), HoverPhase::Loading);

        let cmds = c.on_probe_result(new_token, true);
        assert_eq!(applied(&cmds).as_deref(), Some("https://x.test/two.jpg"));

        c.force_hide();
        assert!(c.on_probe_result(new_token, true).is_empty());
    }

    #[test]
    fn test_result_arriving_during_retarget_debounce_is_dropped() {
        let mut c = controller();
        let (old_token, _) = probe(&show(&mut c, 1, "https://x.test/one.jpg")).unwrap();

        // Leave one.jpg and start hovering two.jpg; its show timer has not fired yet.
        c.pointer_out(&1, false);
        let cmds = c.pointer_over(2, media("https://x.test/two.jpg"), ctx());
        assert_eq!(c.live_session(), Some(old_token));

        assert!(c.on_probe_result(old_token, true).is_empty());
        assert_eq!(c.phase(), HoverPhase::Pending);

        let cmds = c.on_timer(started_timer(&cmds));
        let (new_token, url) = probe(&cmds).unwrap();
        assert_eq!(url, "https://x.test/two.jpg");
        let cmds = c.on_probe_result(new_token, true);
        assert_eq!(applied(&cmds).as_deref(), Some("https://x.test/two.jpg"));
    }

    #[test]
    fn test_returning_to_dropped_media_loads_it_again() {
        let mut c = controller();
        let (old_token, _) = probe(&show(&mut c, 1, "https://x.test/one.jpg")).unwrap();

        c.pointer_out(&1, false);
        c.pointer_over(2, media("https://x.test/two.jpg"), ctx());
        assert!(c.on_probe_result(old_token, true).is_empty());

        c.pointer_out(&2, false);
        let (token, url) = probe(&show(&mut c, 1, "https://x.test/one.jpg")).unwrap();
        assert!(token > old_token);
        assert_eq!(url, "https://x.test/one.jpg");
    }

    #[test]
    fn test_failed_candidates_fall_through_then_label() {
        let mut c = controller();
        let cmds = show(&mut c, 1, "https://pbs.twimg.com/media/abc?format=jpg&name=small");
        let (token, mut url) = probe(&cmds).unwrap();
        let total = c.displayed_media().unwrap().candidates().len();

        for _ in 1..total {
            let cmds = c.on_probe_result(token, false);
            let (_, next) = probe(&cmds).unwrap();
            assert_ne!(next, url);
            url = next;
        }
        assert_eq!(url, "https://pbs.twimg.com/media/abc?format=jpg&name=small");

        let cmds = c.on_probe_result(token, false);
        assert_eq!(cmds, vec![HoverCommand::ShowError { label: NO_PREVIEW_LABEL }]);
        assert!(c.is_visible());
        assert_eq!(c.phase(), HoverPhase::Shown);
    }

    #[test]
    fn test_video_is_applied_without_probe() {
        let mut c = controller();
        let cmds = show(&mut c, 1, "https://v.test/clip.mp4");
        assert!(probe(&cmds).is_none());
        assert_eq!(applied(&cmds).as_deref(), Some("https://v.test/clip.mp4"));
        assert_eq!(c.phase(), HoverPhase::Shown);
    }

    #[test]
    fn test_same_key_does_not_reload() {
        let mut c = controller();
        let (token, _) = probe(&show(&mut c, 1, "https://x.test/a.jpg")).unwrap();
        c.on_probe_result(token, true);

        c.pointer_out(&1, false);
        let cmds = show(&mut c, 2, "https://x.test/a.jpg");
        assert!(cmds.is_empty());
        assert_eq!(c.live_session(), Some(token));
        assert_eq!(c.displayed_element(), Some(&2));
    }

    #[test]
    fn test_leave_hides_after_delay_unless_reentered() {
        let mut c = controller();
        let (token, _) = probe(&show(&mut c, 1, "https://x.test/a.jpg")).unwrap();
        c.on_probe_result(token, true);

        let cmds = c.pointer_out(&1, false);
        let hide_timer = started_timer(&cmds);
        assert!(matches!(cmds.last(), Some(HoverCommand::StartTimer { delay_ms: 60, .. })));

        // Re-entering cancels the pending hide.
        let cmds = c.pointer_over(1, media("https://x.test/a.jpg"), ctx());
        assert!(cmds.contains(&HoverCommand::CancelTimer(hide_timer)));
        assert!(c.on_timer(hide_timer).is_empty());
        assert!(c.is_visible());

        let cmds = c.pointer_out(&1, false);
        let cmds = c.on_timer(started_timer(&cmds));
        assert!(cmds.contains(&HoverCommand::Hide));
        assert_eq!(c.phase(), HoverPhase::Idle);
    }

    #[test]
    fn test_moving_into_descendant_is_not_leaving() {
        let mut c = controller();
        show(&mut c, 1, "https://x.test/a.jpg");
        assert!(c.pointer_out(&1, true).is_empty());
        assert!(c.pointer_out(&7, false).is_empty());
    }

    #[test]
    fn test_pin_suppresses_leave_until_force_hide() {
        let mut c = controller();
        let (token, _) = probe(&show(&mut c, 1, "https://x.test/a.jpg")).unwrap();
        c.on_probe_result(token, true);

        let cmds = c.click(&1);
        assert!(cmds.contains(&HoverCommand::SetPinned(true)));
        assert!(cmds.contains(&HoverCommand::Toast("Pinned preview")));
        assert!(cmds.contains(&HoverCommand::PersistFlags(PersistedFlags {
            enabled: true,
            pinned: true
        })));

        assert!(c.pointer_out(&1, false).is_empty());
        assert!(c.pointer_over(2, media("https://x.test/b.jpg"), ctx()).is_empty());
        assert!(c.is_visible());

        let cmds = c.force_hide();
        assert!(cmds.contains(&HoverCommand::Hide));
        assert!(cmds.contains(&HoverCommand::SetPinned(false)));
        assert!(!c.is_pinned());
    }

    #[test]
    fn test_unpin_away_from_target_schedules_hide() {
        let mut c = controller();
        show(&mut c, 1, "https://x.test/a.jpg");
        c.toggle_pin();
        c.pointer_out(&1, false);
        c.pointer_move(Point::new(600.0, 600.0));

        let cmds = c.toggle_pin();
        assert!(cmds.contains(&HoverCommand::Toast("Unpinned")));
        let cmds = c.on_timer(started_timer(&cmds));
        assert!(cmds.contains(&HoverCommand::Hide));
    }

    #[test]
    fn test_pin_requires_visible_preview() {
        let mut c = controller();
        assert!(c.toggle_pin().is_empty());
        assert!(!c.is_pinned());
    }

    #[test]
    fn test_disabled_ignores_hover_and_disabling_hides() {
        let mut c = controller();
        show(&mut c, 1, "https://x.test/a.jpg");

        let cmds = c.toggle_enabled();
        assert!(cmds.contains(&HoverCommand::Hide));
        assert!(cmds.contains(&HoverCommand::Toast("Image preview: OFF")));
        assert!(c.pointer_over(2, media("https://x.test/b.jpg"), ctx()).is_empty());

        let cmds = c.set_enabled(true);
        assert!(cmds.contains(&HoverCommand::Toast("Image preview: ON")));
        assert!(!c.pointer_over(2, media("https://x.test/b.jpg"), ctx()).is_empty());
    }

    #[test]
    fn test_qualification_filters() {
        let mut c = controller();
        let url = "https://x.test/a.jpg";
        let cases = [
            PointerContext { in_overlay: true, ..ctx() },
            PointerContext { buttons_held: true, ..ctx() },
            PointerContext { editable: true, ..ctx() },
            PointerContext {
                target_size: Some(Size::new(47.0, 300.0)),
                ..ctx()
            },
        ];
        for case in cases {
            assert!(c.pointer_over(1, media(url), case).is_empty(), "{:?}", case);
        }
        assert!(c.pointer_over(1, None, ctx()).is_empty());

        c.update_config(ConfigUpdate::SetAltOnly(true));
        assert!(c.pointer_over(1, media(url), ctx()).is_empty());
        let alt = PointerContext { alt_held: true, ..ctx() };
        assert!(!c.pointer_over(1, media(url), alt).is_empty());
    }

    #[test]
    fn test_wheel_zoom_and_reset_on_new_session() {
        let mut c = controller();
        assert!(c.wheel(-100.0).is_none());

        show(&mut c, 1, "https://x.test/a.jpg");
        let cmds = c.wheel(-100.0).unwrap();
        assert!(matches!(cmds.as_slice(), [HoverCommand::Layout(l)] if (l.zoom - 1.12).abs() < 1e-9));
        assert!(c.wheel(0.0).unwrap().is_empty());

        c.pointer_out(&1, false);
        show(&mut c, 2, "https://x.test/b.jpg");
        assert_eq!(c.zoom(), 1.0);
    }

    #[test]
    fn test_zoomed_media_is_clipped_to_overlay() {
        let mut c = controller();
        let (token, _) = probe(&show(&mut c, 1, "https://x.test/a.jpg")).unwrap();
        c.on_probe_result(token, true);
        c.media_loaded(token, Size::new(800.0, 600.0));

        let mut last = None;
        for _ in 0..20 {
            for cmd in c.wheel(-100.0).unwrap() {
                if let HoverCommand::Layout(layout) = cmd {
                    last = Some(layout);
                }
            }
        }
        let layout = last.expect("zooming produced no layout");
        assert_eq!(layout.zoom, 5.0);

        let visible = layout.visible_media();
        assert!(visible.width + OVERLAY_CHROME <= layout.rect.width + 1e-9);
        assert!(visible.height + OVERLAY_CHROME <= layout.rect.height + 1e-9);
        assert!(layout.rect.left >= 8.0 && layout.rect.right() <= 1272.0);
        assert!(layout.rect.top >= 8.0 && layout.rect.bottom() <= 792.0);

        let offset = layout.media_offset();
        assert!(offset.x < 0.0 && offset.y < 0.0);
    }

    #[test]
    fn test_unzoomed_media_is_not_clipped() {
        let layout = OverlayLayout {
            media: Size::new(400.0, 300.0),
            zoom: 1.0,
            rect: Rect::new(10.0, 10.0, 422.0, 322.0),
        };
        assert_eq!(layout.visible_media(), Size::new(400.0, 300.0));
        assert_eq!(layout.media_offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_layout_stays_in_viewport() {
        let mut c = controller();
        let (token, _) = probe(&show(&mut c, 1, "https://x.test/a.jpg")).unwrap();
        c.on_probe_result(token, true);
        let cmds = c.media_loaded(token, Size::new(4000.0, 3000.0));
        let HoverCommand::Layout(layout) = &cmds[0] else {
            panic!("expected layout");
        };
        assert!(layout.rect.left >= 8.0 && layout.rect.right() <= 1272.0);
        assert!(layout.rect.top >= 8.0 && layout.rect.bottom() <= 792.0);

        let cmds = c.pointer_move(Point::new(1200.0, 700.0));
        assert!(matches!(cmds.as_slice(), [HoverCommand::Layout(_)]));
    }

    #[test]
    fn test_restored_pin_does_not_block_hover() {
        let flags = PersistedFlags {
            enabled: true,
            pinned: true,
        };
        let mut c = Controller::new(HoverConfig::default(), flags);
        assert!(!c.pointer_over(1, media("https://x.test/a.jpg"), ctx()).is_empty());
    }

    #[test]
    fn test_hud_label() {
        assert_eq!(hud_label("https://pbs.twimg.com/media/x.jpg"), "pbs.twimg.com");
        assert_eq!(hud_label("data:image/png;base64,AA"), "data");
        assert_eq!(hud_label("nope"), "");
    }
}
