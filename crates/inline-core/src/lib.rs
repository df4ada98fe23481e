mod autolink;
mod config;
mod display;
mod editor;
mod emoji;
mod error;
mod event;
mod format;
mod history;
mod markup;
mod mention;
mod pattern;
mod serialize;
mod shortcut;
mod surface;
mod tree;

pub use crate::autolink::*;
pub use crate::config::*;
pub use crate::display::*;
pub use crate::editor::*;
pub use crate::emoji::*;
pub use crate::error::*;
pub use crate::event::*;
pub use crate::format::*;
pub use crate::history::*;
pub use crate::markup::*;
pub use crate::mention::*;
pub use crate::pattern::*;
pub use crate::serialize::*;
pub use crate::shortcut::*;
pub use crate::surface::*;
pub use crate::tree::*;
