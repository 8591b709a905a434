//! Image decode probes.

use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;
use web_time::Instant;

/// Load and decode `url` off-screen. Any failure, including a missing
/// `Image` constructor, counts as "not loadable".
pub async fn decode(url: &str) -> bool {
    let started = Instant::now();
    let image = match HtmlImageElement::new() {
        Ok(image) => image,
        Err(e) => {
            log::warn!("Cannot create probe image: {:?}", e);
            return false;
        }
    };
    image.set_decoding("async");
    image.set_src(url);

    let ok = JsFuture::from(image.decode()).await.is_ok();
    log::debug!(
        "Probe {} for {} after {:?}",
        if ok { "succeeded" } else { "failed" },
        url,
        started.elapsed()
    );
    ok
}
