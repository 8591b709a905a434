use wasm_bindgen::prelude::*;

use hoverzoom_core::config::HoverConfig;

use crate::{app, storage};

fn in_top_frame(window: &web_sys::Window) -> bool {
    match window.top() {
        Ok(Some(top)) => js_sys::Object::is(&top, window),
        // Cross-origin or detached frames report errors or no top.
        _ => false,
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = HoverConfig::default();
    if let Err(e) = console_log::init_with_level(config.log_level.to_level()) {
        web_sys::console::warn_1(&format!("Logger already initialized: {}", e).into());
    }

    let Some(window) = web_sys::window() else {
        return;
    };
    if !in_top_frame(&window) {
        log::debug!("Not installing inside a frame");
        return;
    }

    let flags = storage::load_flags();
    match app::install(window, config, flags) {
        // The listeners keep the app alive.
        Ok(_app) => {}
        Err(e) => log::error!("Hover preview failed to start: {}", e),
    }
}
