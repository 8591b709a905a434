//! Event wiring between the page and the hover/popout state machines.
//!
//! Browser events are turned into controller calls, and the commands the
//! controllers return are executed against the overlay and popout views.
//! Everything runs on the page's single thread; the app is shared between
//! listeners through `Rc<RefCell<_>>` and never borrowed across an await.

use std::cell::RefCell;
use std::rc::Rc;

use hoverzoom_core::config::{ConfigUpdate, HoverConfig, PersistedFlags};
use hoverzoom_core::constants::{HOVER_TOAST_MS, POPOUT_TOAST_MS};
use hoverzoom_core::geometry::{Point, Size};
use hoverzoom_core::hover::{HoverCommand, HoverController, PointerContext, SessionToken};
use hoverzoom_core::keys::{KeyAction, Modifiers};
use hoverzoom_core::popout::{PopoutCommand, PopoutRegion, PopoutWindowState};
use hoverzoom_core::resolve::MediaResolver;
use hoverzoom_core::target::{DomElement, closest_interesting, media_hint, popout_media};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, KeyboardEvent, MouseEvent, Node,
    PointerEvent, WheelEvent, Window,
};

use crate::actions::{self, Copied};
use crate::dom::PageElement;
use crate::error::{HostError, Result};
use crate::overlay::OverlayView;
use crate::popout_view::{PopoutButton, PopoutView};
use crate::shell::Shell;
use crate::timers::Timers;
use crate::toast::ToastView;
use crate::{host, probe, storage};

pub type SharedApp = Rc<RefCell<App>>;

/// Everything the listeners share.
pub struct App {
    window: Window,
    document: Document,
    shell: Shell,
    controller: HoverController<PageElement>,
    popout: PopoutWindowState,
    overlay: OverlayView,
    popout_view: PopoutView,
    timers: Timers,
    toast: ToastView,
    /// Session whose media currently sits in the overlay's media element.
    applied: Option<SessionToken>,
}

/// Listener registration flags.
#[derive(Debug, Clone, Copy, Default)]
struct Listen {
    capture: bool,
    passive: bool,
}

const CAPTURE: Listen = Listen {
    capture: true,
    passive: false,
};
const CAPTURE_PASSIVE: Listen = Listen {
    capture: true,
    passive: true,
};
const BUBBLE: Listen = Listen {
    capture: false,
    passive: false,
};

fn listen<E>(
    target: &EventTarget,
    kind: &str,
    options: Listen,
    app: &SharedApp,
    handler: impl Fn(&SharedApp, E) + 'static,
) -> Result<()>
where
    E: JsCast + 'static,
{
    let app = Rc::clone(app);
    let kind_name = kind.to_string();
    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| match event.dyn_into::<E>() {
        Ok(event) => handler(&app, event),
        Err(_) => log::trace!("Unexpected event type for {}", kind_name),
    });

    let opts = AddEventListenerOptions::new();
    opts.set_capture(options.capture);
    opts.set_passive(options.passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        closure.as_ref().unchecked_ref(),
        &opts,
    )?;
    // Listeners stay installed for the life of the page.
    closure.forget();
    Ok(())
}

fn viewport_of(window: &Window) -> Size {
    let read = |value: std::result::Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    Size::new(read(window.inner_width()), read(window.inner_height()))
}

fn event_point(event: &MouseEvent) -> Point {
    Point::new(f64::from(event.client_x()), f64::from(event.client_y()))
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Run `f` against the app unless a listener further up the stack holds it.
fn with_app<R>(app: &SharedApp, f: impl FnOnce(&mut App) -> R) -> Option<R> {
    match app.try_borrow_mut() {
        Ok(mut app) => Some(f(&mut app)),
        Err(_) => {
            log::warn!("Re-entrant event dropped");
            None
        }
    }
}

impl App {
    fn resolver(&self) -> MediaResolver {
        match self.window.location().href() {
            Ok(href) => MediaResolver::with_base(&href),
            Err(_) => MediaResolver::new(),
        }
    }

    fn drive_hover(&mut self, shared: &SharedApp, f: impl FnOnce(&mut HoverController<PageElement>) -> Vec<HoverCommand>) {
        let cmds = f(&mut self.controller);
        self.run_hover(shared, cmds);
    }

    fn drive_popout(&mut self, f: impl FnOnce(&mut PopoutWindowState) -> Vec<PopoutCommand>) {
        let cmds = f(&mut self.popout);
        self.run_popout(cmds);
    }

    fn run_hover(&mut self, shared: &SharedApp, cmds: Vec<HoverCommand>) {
        for cmd in cmds {
            match cmd {
                HoverCommand::StartTimer { handle, delay_ms } => {
                    let app = Rc::clone(shared);
                    let started = self.timers.start(handle, delay_ms, move || {
                        with_app(&app, |this| {
                            this.timers.fired(handle);
                            this.drive_hover(&app, |c| c.on_timer(handle));
                        });
                    });
                    if let Err(e) = started {
                        log::error!("Cannot start timer: {}", e);
                    }
                }
                HoverCommand::CancelTimer(handle) => self.timers.cancel(handle),
                HoverCommand::ShowLoading { media_type } => {
                    self.applied = None;
                    self.overlay.show_loading(media_type);
                }
                HoverCommand::Probe { token, url } => {
                    let app = Rc::clone(shared);
                    wasm_bindgen_futures::spawn_local(async move {
                        let ok = probe::decode(&url).await;
                        with_app(&app, |this| this.drive_hover(&app, |c| c.on_probe_result(token, ok)));
                    });
                }
                HoverCommand::Apply {
                    token,
                    media_type,
                    url,
                    label,
                } => {
                    self.applied = Some(token);
                    self.overlay.apply(media_type, &url, &label);
                }
                HoverCommand::ShowError { label } => self.overlay.show_error(label),
                HoverCommand::Layout(layout) => self.overlay.set_layout(&layout),
                HoverCommand::Hide => {
                    self.applied = None;
                    self.overlay.hide();
                }
                HoverCommand::SetPinned(pinned) => self.overlay.set_pinned(pinned),
                HoverCommand::PersistFlags(flags) => {
                    if let Err(e) = storage::save_flags(&flags) {
                        log::warn!("{}", e);
                    }
                }
                HoverCommand::Toast(text) => self.toast.show(text, HOVER_TOAST_MS),
            }
        }
    }

    fn run_popout(&mut self, cmds: Vec<PopoutCommand>) {
        for cmd in cmds {
            match cmd {
                PopoutCommand::Show(media) => self.popout_view.show(&media),
                PopoutCommand::SetRect(rect) => self.popout_view.set_rect(rect),
                PopoutCommand::AcquireCapture(id) => self.popout_view.capture(id),
                PopoutCommand::ReleaseCapture(id) => self.popout_view.release(id),
                PopoutCommand::Close => self.popout_view.close(),
                PopoutCommand::Toast(text) => self.toast.show(text, POPOUT_TOAST_MS),
            }
        }
    }

    /// URL the open/copy/download actions work on: the popout's media while
    /// it is open, otherwise the previewed media.
    fn action_url(&self) -> Option<(String, u32)> {
        if self.popout.is_open() {
            return self.popout.media().map(|m| (m.url.clone(), POPOUT_TOAST_MS));
        }
        if !self.controller.is_visible() {
            return None;
        }
        self.controller
            .displayed_media()
            .map(|m| (m.primary().to_string(), HOVER_TOAST_MS))
    }

    fn run_action(&mut self, shared: &SharedApp, action: KeyAction) -> bool {
        match action {
            KeyAction::Cancel => {
                if !self.controller.is_visible() && !self.popout.is_open() {
                    return false;
                }
                self.drive_hover(shared, HoverController::force_hide);
                self.drive_popout(PopoutWindowState::close);
                true
            }
            KeyAction::ToggleEnabled => {
                self.drive_hover(shared, HoverController::toggle_enabled);
                true
            }
            KeyAction::TogglePin => {
                if !self.controller.is_visible() {
                    return false;
                }
                self.drive_hover(shared, HoverController::toggle_pin);
                true
            }
            KeyAction::OpenInTab | KeyAction::CopyUrl | KeyAction::Download => {
                let Some((url, toast_ms)) = self.action_url() else {
                    return false;
                };
                self.url_action(shared, action, url, toast_ms);
                true
            }
        }
    }

    fn url_action(&mut self, shared: &SharedApp, action: KeyAction, url: String, toast_ms: u32) {
        let window = self.window.clone();
        let app = Rc::clone(shared);
        match action {
            KeyAction::OpenInTab => {
                if let Err(e) = actions::open_in_tab(&window, &url) {
                    log::warn!("Open in tab failed: {}", e);
                }
            }
            KeyAction::CopyUrl => wasm_bindgen_futures::spawn_local(async move {
                match actions::copy_url(&window, &url).await {
                    Ok(Copied::Clipboard) => {
                        with_app(&app, |this| this.toast.show("Copied URL", toast_ms));
                    }
                    Ok(Copied::Prompted) => {}
                    Err(e) => log::warn!("Copy failed: {}", e),
                }
            }),
            KeyAction::Download => {
                self.toast.show("Download started", toast_ms);
                wasm_bindgen_futures::spawn_local(async move {
                    let text = match actions::download(&window, &url).await {
                        Ok(()) => "Downloaded",
                        Err(e) => {
                            log::warn!("Download of {} failed: {}", url, e);
                            "Download failed"
                        }
                    };
                    with_app(&app, |this| this.toast.show(text, toast_ms));
                });
            }
            KeyAction::Cancel | KeyAction::ToggleEnabled | KeyAction::TogglePin => {}
        }
    }

    fn on_pointer_over(&mut self, shared: &SharedApp, event: &PointerEvent) {
        let Some(target) = event_element(event) else {
            return;
        };
        let in_overlay = self.shell.contains(&target);
        let element = PageElement::new(target);
        let interesting = closest_interesting(&element);

        let media = if in_overlay || !self.controller.is_enabled() {
            None
        } else {
            let resolver = self.resolver();
            media_hint(&interesting).and_then(|hint| resolver.resolve(&hint.url))
        };
        let ctx = PointerContext {
            pointer: event_point(event),
            alt_held: event.alt_key(),
            buttons_held: event.buttons() != 0,
            editable: element.is_editable(),
            in_overlay,
            target_size: interesting.rendered_size(),
        };
        self.drive_hover(shared, |c| c.pointer_over(interesting, media, ctx));
    }

    fn on_pointer_out(&mut self, shared: &SharedApp, event: &PointerEvent) {
        let Some(target) = event_element(event) else {
            return;
        };
        let element = closest_interesting(&PageElement::new(target));
        let still_inside = event
            .related_target()
            .and_then(|t| t.dyn_into::<Node>().ok())
            .is_some_and(|node| element.contains(&node));
        self.drive_hover(shared, |c| c.pointer_out(&element, still_inside));
    }

    fn on_pointer_move(&mut self, shared: &SharedApp, event: &PointerEvent) {
        let at = event_point(event);
        if self.popout.is_gesture_active() {
            let id = event.pointer_id();
            self.drive_popout(|p| p.pointer_move(id, at));
        } else {
            self.drive_hover(shared, |c| c.pointer_move(at));
        }
    }

    fn on_click(&mut self, shared: &SharedApp, event: &MouseEvent) {
        let Some(target) = event_element(event) else {
            return;
        };
        if self.shell.contains(&target) {
            return;
        }
        let element = PageElement::new(target);

        if event.alt_key() {
            let Some(media) = popout_media(&element, &self.resolver()) else {
                return;
            };
            event.prevent_default();
            event.stop_propagation();
            self.drive_hover(shared, HoverController::force_hide);
            let viewport = viewport_of(&self.window);
            self.drive_popout(|p| p.open(media, viewport));
            return;
        }

        let interesting = closest_interesting(&element);
        let cmds = self.controller.click(&interesting);
        if !cmds.is_empty() {
            // Pinning a linked image must not follow the link.
            event.prevent_default();
        }
        self.run_hover(shared, cmds);
    }

    fn on_key_down(&mut self, shared: &SharedApp, event: &KeyboardEvent) {
        let modifiers = Modifiers {
            ctrl: event.ctrl_key(),
            meta: event.meta_key(),
            alt: event.alt_key(),
            shift: event.shift_key(),
        };
        let typing = self.controller.config().ignore_while_typing
            && self
                .document
                .active_element()
                .is_some_and(|e| PageElement::new(e).is_editable());
        let Some(action) = self
            .controller
            .config()
            .keybindings
            .action_for_event(&event.key(), modifiers, typing)
        else {
            return;
        };
        log::trace!("Key {:?} -> {}", event.key(), action.name());
        if self.run_action(shared, action) {
            event.prevent_default();
            event.stop_propagation();
        }
    }

    fn on_wheel(&mut self, shared: &SharedApp, event: &WheelEvent) {
        if self.popout.is_open() {
            return;
        }
        if let Some(cmds) = self.controller.wheel(event.delta_y()) {
            event.prevent_default();
            self.run_hover(shared, cmds);
        }
    }

    fn on_resize(&mut self, shared: &SharedApp) {
        let viewport = viewport_of(&self.window);
        self.drive_hover(shared, |c| c.viewport_resized(viewport));
        self.drive_popout(|p| p.viewport_resized(viewport));
    }

    fn on_overlay_media_loaded(&mut self, shared: &SharedApp, natural: Size) {
        if let Some(token) = self.applied {
            self.drive_hover(shared, |c| c.media_loaded(token, natural));
        }
    }

    fn on_popout_pointer_down(&mut self, region: PopoutRegion, event: &PointerEvent) {
        if region == PopoutRegion::TitleBar
            && event_element(event).is_some_and(|e| e.closest("button").ok().flatten().is_some())
        {
            return;
        }
        let id = event.pointer_id();
        let at = event_point(event);
        let button = event.button();
        let cmds = self.popout.pointer_down(region, id, button, at);
        if !cmds.is_empty() {
            event.prevent_default();
        }
        self.run_popout(cmds);
    }

    fn on_popout_button(&mut self, shared: &SharedApp, button: PopoutButton) {
        let Some(url) = self.popout.media().map(|m| m.url.clone()) else {
            return;
        };
        match button {
            PopoutButton::Open => self.url_action(shared, KeyAction::OpenInTab, url, POPOUT_TOAST_MS),
            PopoutButton::Copy => self.url_action(shared, KeyAction::CopyUrl, url, POPOUT_TOAST_MS),
            PopoutButton::Download => self.url_action(shared, KeyAction::Download, url, POPOUT_TOAST_MS),
            PopoutButton::Close => self.drive_popout(PopoutWindowState::close),
        }
    }

    fn toggle_alt_only(&mut self, shared: &SharedApp) {
        self.drive_hover(shared, |c| c.update_config(ConfigUpdate::ToggleAltOnly));
        let text = if self.controller.config().alt_only {
            "Alt-only mode: ON"
        } else {
            "Alt-only mode: OFF"
        };
        self.toast.show(text, HOVER_TOAST_MS);
    }
}

/// Build the overlay UI and hook it into the page.
pub fn install(window: Window, config: HoverConfig, flags: PersistedFlags) -> Result<SharedApp> {
    let document = window.document().ok_or(HostError::Missing("document"))?;
    let shell = Shell::mount(&document)?;
    let overlay = OverlayView::new(&shell)?;
    let popout_view = PopoutView::new(&shell)?;
    let toast = ToastView::new(window.clone(), &shell)?;

    let mut controller = HoverController::new(config, flags);
    overlay.set_pinned(controller.is_pinned());
    let mut popout = PopoutWindowState::new(controller.config());
    let viewport = viewport_of(&window);
    controller.viewport_resized(viewport);
    popout.viewport_resized(viewport);

    let app = Rc::new(RefCell::new(App {
        timers: Timers::new(window.clone()),
        window: window.clone(),
        document: document.clone(),
        shell,
        controller,
        popout,
        overlay: overlay.clone(),
        popout_view: popout_view.clone(),
        toast,
        applied: None,
    }));

    let doc: &EventTarget = &document;
    listen(doc, "pointerover", CAPTURE_PASSIVE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.on_pointer_over(app, &e));
    })?;
    listen(doc, "pointerout", CAPTURE_PASSIVE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.on_pointer_out(app, &e));
    })?;
    listen(doc, "pointermove", CAPTURE_PASSIVE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.on_pointer_move(app, &e));
    })?;
    listen(doc, "pointerup", CAPTURE_PASSIVE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.drive_popout(|p| p.pointer_up(e.pointer_id())));
    })?;
    listen(doc, "pointercancel", CAPTURE_PASSIVE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.drive_popout(|p| p.pointer_up(e.pointer_id())));
    })?;
    listen(doc, "click", CAPTURE, &app, |app, e: MouseEvent| {
        with_app(app, |this| this.on_click(app, &e));
    })?;
    listen(doc, "keydown", CAPTURE, &app, |app, e: KeyboardEvent| {
        with_app(app, |this| this.on_key_down(app, &e));
    })?;
    listen(doc, "wheel", CAPTURE, &app, |app, e: WheelEvent| {
        with_app(app, |this| this.on_wheel(app, &e));
    })?;
    listen(&window, "resize", BUBBLE, &app, |app, _: Event| {
        with_app(app, |this| this.on_resize(app));
    })?;

    listen(overlay.image(), "load", BUBBLE, &app, |app, _: Event| {
        with_app(app, |this| {
            let image = this.overlay.image();
            let natural = Size::new(f64::from(image.natural_width()), f64::from(image.natural_height()));
            this.on_overlay_media_loaded(app, natural);
        });
    })?;
    listen(overlay.video(), "loadedmetadata", BUBBLE, &app, |app, _: Event| {
        with_app(app, |this| {
            let video = this.overlay.video();
            let natural = Size::new(f64::from(video.video_width()), f64::from(video.video_height()));
            this.on_overlay_media_loaded(app, natural);
        });
    })?;

    listen(popout_view.title_bar(), "pointerdown", BUBBLE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.on_popout_pointer_down(PopoutRegion::TitleBar, &e));
    })?;
    listen(popout_view.resize_handle(), "pointerdown", BUBBLE, &app, |app, e: PointerEvent| {
        with_app(app, |this| this.on_popout_pointer_down(PopoutRegion::ResizeHandle, &e));
    })?;
    listen(popout_view.backdrop(), "click", BUBBLE, &app, |app, _: MouseEvent| {
        with_app(app, |this| this.drive_popout(PopoutWindowState::close));
    })?;
    for (button, element) in popout_view.buttons() {
        let button = *button;
        listen(element, "click", BUBBLE, &app, move |app, e: MouseEvent| {
            e.stop_propagation();
            with_app(app, |this| this.on_popout_button(app, button));
        })?;
    }
    let image_target: &EventTarget = popout_view.image();
    let video_target: &EventTarget = popout_view.video();
    for (target, kind) in [(image_target, "load"), (video_target, "loadedmetadata")] {
        listen(target, kind, BUBBLE, &app, |app, _: Event| {
            with_app(app, |this| this.drive_popout(PopoutWindowState::media_loaded));
        })?;
        listen(target, "error", BUBBLE, &app, |app, _: Event| {
            with_app(app, |this| {
                if this.popout.is_open() {
                    let cmds = this.popout.media_failed();
                    this.run_popout(cmds);
                }
            });
        })?;
    }

    register_menu(&app);
    log::info!("Hover preview installed (enabled: {})", flags.enabled);
    Ok(app)
}

fn register_menu(app: &SharedApp) {
    let toggle = Rc::clone(app);
    let registered = host::register_menu_command("Toggle image preview", move || {
        with_app(&toggle, |this| this.drive_hover(&toggle, HoverController::toggle_enabled));
    });
    if !registered {
        log::debug!("Userscript menu not available");
        return;
    }
    let alt_only = Rc::clone(app);
    host::register_menu_command("Toggle alt-only mode", move || {
        with_app(&alt_only, |this| this.toggle_alt_only(&alt_only));
    });
}
