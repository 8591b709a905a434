//! Platform-independent core of the hoverzoom overlay.
//!
//! Resolves media URLs found on arbitrary pages into full-resolution
//! candidates and drives the hover preview and popout window as plain state
//! machines. The browser glue lives in the `hoverzoom` crate.

pub mod config;
pub mod constants;
pub mod css;
pub mod download;
pub mod geometry;
pub mod hover;
pub mod keys;
pub mod media;
pub mod popout;
pub mod resolve;
pub mod srcset;
pub mod target;

pub use config::{ConfigError, ConfigUpdate, HoverConfig, LogLevel, PersistedFlags};
pub use geometry::{Point, Rect, Size, ZoomState};
pub use hover::{
    HoverCommand, HoverController, HoverPhase, OverlayLayout, PointerContext, SessionToken, TimerHandle,
};
pub use keys::{KeyAction, KeyBindings, Modifiers};
pub use media::{MediaType, ResolvedMedia};
pub use popout::{PopoutCommand, PopoutRegion, PopoutWindowState};
pub use resolve::MediaResolver;
pub use target::{DomElement, ElementKind, HintSource, MediaHint, PopoutMedia};
