//! Ready-made display transitions.
//!
//! Schedule one of the statics below (or a `const` of your own) with
//! `Dmd::schedule_transition` before showing a new image.

#![cfg_attr(not(test), no_std)]

mod fade;
mod scroll;

pub use fade::BoxFade;
pub use scroll::{Direction, Scroll};

pub static SCROLL_UP: Scroll = Scroll::new(Direction::Up, 2, 1);
pub static SCROLL_DOWN: Scroll = Scroll::new(Direction::Down, 2, 1);
pub static SCROLL_LEFT: Scroll = Scroll::new(Direction::Left, 1, 2);
pub static SCROLL_RIGHT: Scroll = Scroll::new(Direction::Right, 1, 2);
pub static BOX_FADE: BoxFade = BoxFade::new(4, 2, 11181981);
