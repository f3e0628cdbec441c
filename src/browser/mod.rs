pub mod pacing;
pub mod surface;
pub mod wait;

pub use pacing::Pacer;
pub use surface::{BrowserError, BrowserPage, Cookie, NodeRef, FORCE_CLICK_SCRIPT};
