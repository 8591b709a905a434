//! Open, copy and download for the current media URL.

use hoverzoom_core::download::{DownloadStamp, download_filename};
use js_sys::{Date, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, HtmlAnchorElement, Response, Url, Window};

use crate::error::{HostError, Result};
use crate::{host, shell, timers};

/// Object URLs for fetched downloads are released after this long.
const REVOKE_DELAY_MS: u32 = 1000;

pub fn open_in_tab(window: &Window, url: &str) -> Result<()> {
    window.open_with_url_and_target_and_features(url, "_blank", "noopener,noreferrer")?;
    Ok(())
}

/// How a copy request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Copied {
    Clipboard,
    /// No clipboard access; the URL was shown in a prompt for manual copying.
    Prompted,
}

async fn write_clipboard(window: &Window, text: &str) -> Result<()> {
    let clipboard = Reflect::get(&window.navigator(), &JsValue::from_str("clipboard"))?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err(HostError::Unavailable("navigator.clipboard"));
    }
    let write = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?
        .dyn_into::<Function>()
        .map_err(|_| HostError::Unavailable("navigator.clipboard.writeText"))?;
    let promise = write
        .call1(&clipboard, &JsValue::from_str(text))?
        .dyn_into::<Promise>()
        .map_err(|_| HostError::Unavailable("navigator.clipboard.writeText"))?;
    JsFuture::from(promise).await?;
    Ok(())
}

/// Copy `url` through the userscript manager, then the async clipboard API,
/// then a prompt.
pub async fn copy_url(window: &Window, url: &str) -> Result<Copied> {
    match host::set_clipboard(url) {
        Ok(()) => return Ok(Copied::Clipboard),
        Err(e) => log::debug!("GM_setClipboard: {}", e),
    }
    match write_clipboard(window, url).await {
        Ok(()) => return Ok(Copied::Clipboard),
        Err(e) => log::debug!("Clipboard API: {}", e),
    }
    window.prompt_with_message_and_default("Copy image URL:", url)?;
    Ok(Copied::Prompted)
}

fn local_stamp() -> DownloadStamp {
    let now = Date::new_0();
    DownloadStamp {
        year: now.get_full_year(),
        month: now.get_month() + 1,
        day: now.get_date(),
        hour: now.get_hours(),
        minute: now.get_minutes(),
        second: now.get_seconds(),
    }
}

/// Save `url` to disk under a generated name.
///
/// Uses `GM_download` when granted, since it can bypass CORS; otherwise
/// fetches the bytes and saves them through an object URL.
pub async fn download(window: &Window, url: &str) -> Result<()> {
    let page_host = window.location().hostname().unwrap_or_default();

    if host::has_download() {
        let name = download_filename(&page_host, local_stamp(), url, None);
        match host::download(url, &name).await {
            Ok(()) => {
                log::info!("Saved {} as {} via GM_download", url, name);
                return Ok(());
            }
            Err(e) => log::warn!("GM_download failed, falling back to fetch: {}", e),
        }
    }

    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()
        .map_err(|_| HostError::Js("fetch did not return a Response".to_string()))?;
    if !response.ok() {
        return Err(HostError::Status(response.status()));
    }
    let content_type = response.headers().get("content-type").ok().flatten();
    let blob: Blob = JsFuture::from(response.blob()?)
        .await?
        .dyn_into()
        .map_err(|_| HostError::Js("body is not a Blob".to_string()))?;

    let name = download_filename(&page_host, local_stamp(), url, content_type.as_deref());
    save_blob(window, &blob, &name)?;
    log::info!("Saved {} as {} via fetch", url, name);
    Ok(())
}

fn save_blob(window: &Window, blob: &Blob, name: &str) -> Result<()> {
    let document = window.document().ok_or(HostError::Missing("document"))?;
    let object_url = Url::create_object_url_with_blob(blob)?;

    let anchor: HtmlAnchorElement = shell::create(&document, "a", "")?;
    anchor.set_href(&object_url);
    anchor.set_download(name);
    let parent = document.body().ok_or(HostError::Missing("body"))?;
    parent.append_child(&anchor)?;
    anchor.click();
    anchor.remove();

    timers::after(window, REVOKE_DELAY_MS, move || {
        if let Err(e) = Url::revoke_object_url(&object_url) {
            log::debug!("Revoking {} failed: {:?}", object_url, e);
        }
    })?;
    Ok(())
}
