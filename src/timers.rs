//! Maps controller timer handles onto `setTimeout` ids.

use std::collections::HashMap;

use hoverzoom_core::hover::TimerHandle;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

use crate::error::Result;

/// Live browser timeouts keyed by controller handle.
#[derive(Debug)]
pub struct Timers {
    window: Window,
    live: HashMap<TimerHandle, i32>,
}

impl Timers {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            live: HashMap::new(),
        }
    }

    /// Run `callback` once after `delay_ms`, replacing any timeout already
    /// registered for `handle`.
    pub fn start(&mut self, handle: TimerHandle, delay_ms: u32, callback: impl FnOnce() + 'static) -> Result<()> {
        self.cancel(handle);
        let callback = Closure::once_into_js(callback);
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)?;
        self.live.insert(handle, id);
        Ok(())
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        if let Some(id) = self.live.remove(&handle) {
            self.window.clear_timeout_with_handle(id);
        }
    }

    /// Forget a timeout that has fired.
    pub fn fired(&mut self, handle: TimerHandle) {
        self.live.remove(&handle);
    }
}

/// Fire-and-forget timeout for UI chores such as dismissing a toast.
pub fn after(window: &Window, delay_ms: u32, callback: impl FnOnce() + 'static) -> Result<i32> {
    let callback = Closure::once_into_js(callback);
    let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
    Ok(window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)?)
}
