//! Short-lived status messages.

use std::cell::Cell;
use std::rc::Rc;

use web_sys::{HtmlElement, Window};

use crate::error::Result;
use crate::shell::{Shell, set_class};
use crate::timers;

/// A single toast line. A newer message replaces the current one and
/// restarts its dismissal.
#[derive(Debug)]
pub struct ToastView {
    window: Window,
    element: HtmlElement,
    generation: Rc<Cell<u64>>,
}

impl ToastView {
    pub fn new(window: Window, shell: &Shell) -> Result<Self> {
        let element: HtmlElement = shell.create("div", "hz-toast")?;
        shell.append(&element)?;
        Ok(Self {
            window,
            element,
            generation: Rc::new(Cell::new(0)),
        })
    }

    pub fn show(&self, text: &str, duration_ms: u32) {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        self.element.set_text_content(Some(text));
        set_class(&self.element, "hz-visible", true);

        let element = self.element.clone();
        let current = Rc::clone(&self.generation);
        let dismissed = timers::after(&self.window, duration_ms, move || {
            if current.get() == generation {
                set_class(&element, "hz-visible", false);
            }
        });
        if let Err(e) = dismissed {
            log::warn!("Toast dismissal not scheduled: {}", e);
        }
    }
}
