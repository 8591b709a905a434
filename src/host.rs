//! Optional userscript manager functions.
//!
//! When the overlay runs as a userscript the loader exposes the granted
//! `GM_*` functions on the global object. Each is looked up at call time and
//! treated as missing if it is not a function.

use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{HostError, Result};

fn global_function(name: &str) -> Option<Function> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

pub fn has_download() -> bool {
    global_function("GM_download").is_some()
}

/// Add an entry to the userscript manager's menu. Returns `false` when
/// menus are not supported.
pub fn register_menu_command(label: &str, callback: impl FnMut() + 'static) -> bool {
    let Some(register) = global_function("GM_registerMenuCommand") else {
        return false;
    };
    let callback = Closure::<dyn FnMut()>::new(callback);
    let result = register.call2(&JsValue::NULL, &JsValue::from_str(label), callback.as_ref());
    // The menu entry lives as long as the page.
    callback.forget();
    match result {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Registering menu command {:?} failed: {}", label, HostError::from(e));
            false
        }
    }
}

/// Copy through `GM_setClipboard`.
pub fn set_clipboard(text: &str) -> Result<()> {
    let set = global_function("GM_setClipboard").ok_or(HostError::Unavailable("GM_setClipboard"))?;
    set.call1(&JsValue::NULL, &JsValue::from_str(text))?;
    Ok(())
}

/// Save `url` as `name` through `GM_download`, resolving when the manager
/// reports completion.
pub async fn download(url: &str, name: &str) -> Result<()> {
    let download = global_function("GM_download").ok_or(HostError::Unavailable("GM_download"))?;

    let details = Object::new();
    Reflect::set(&details, &"url".into(), &JsValue::from_str(url))?;
    Reflect::set(&details, &"name".into(), &JsValue::from_str(name))?;
    Reflect::set(&details, &"saveAs".into(), &JsValue::FALSE)?;

    let mut start = |resolve: Function, reject: Function| {
        let wired = Reflect::set(&details, &"onload".into(), &resolve)
            .and_then(|_| Reflect::set(&details, &"onerror".into(), &reject))
            .and_then(|_| Reflect::set(&details, &"ontimeout".into(), &reject))
            .and_then(|_| download.call1(&JsValue::NULL, &details));
        if let Err(e) = wired {
            // A throwing call still has to settle the promise.
            let _ = reject.call1(&JsValue::NULL, &e);
        }
    };
    JsFuture::from(Promise::new(&mut start)).await?;
    Ok(())
}
