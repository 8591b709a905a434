//! Errors from browser collaborators.

/// A browser API or userscript function failed or is missing.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A global object such as `window` or `document` is missing
    #[error("No {0} object available")]
    Missing(&'static str),

    /// An optional userscript or browser function is not provided
    #[error("{0} is not available")]
    Unavailable(&'static str),

    /// A request completed with a non-success HTTP status
    #[error("Request failed with status {0}")]
    Status(u16),

    /// A JavaScript exception, stringified
    #[error("JavaScript error: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for HostError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        use wasm_bindgen::JsCast;

        let message = match value.dyn_ref::<js_sys::Error>() {
            Some(error) => String::from(error.message()),
            None => value.as_string().unwrap_or_else(|| format!("{:?}", value)),
        };
        HostError::Js(message)
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
