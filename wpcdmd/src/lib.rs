//! Driver for the dot-matrix display on WPC pinball control boards.
//!
//! The display is 128x32 pixels, 1 bit per pixel, scanned out of one of
//! sixteen pages of display RAM. Software reaches that RAM through two
//! mapping windows, "low" and "high", and picks the page to scan out with a
//! third register. All three are write-only.
//!
//! The pieces:
//!
//! - `Dmd`, owned by task code, allocates pages, maps them, draws into them,
//!   and decides which pair of pages is visible.
//! - `flicker::Flicker`, driven by the refresh interrupt, alternates between
//!   the visible pair's dark and bright pages to produce four shades.
//! - `transition` animates the change from one visible image to the next.
//!
//! Drawing itself lives in the architecture-independent `gfx` crate; `Dmd`
//! just applies it to whatever is mapped.

#![cfg_attr(not(test), no_std)]

pub mod flicker;
pub mod hw;
pub mod mapping;
pub mod priority;
pub mod sched;
pub mod transition;
pub mod util;

pub use gfx::Page;

use gfx::PAGE_BYTES;

use crate::flicker::Visible;
use crate::hw::Asic;
use crate::mapping::Mapper;
use crate::priority::Thread;
use crate::sched::{Sleep, Ticks, Wake};
use crate::transition::Transition;

/// Number of pages of display RAM.
pub const PAGE_COUNT: usize = 16;

/// Scanline on which the refresh interrupt fires.
pub const FIRQ_ROW: u8 = 30;

/// Index of a page in display RAM, in `0..PAGE_COUNT`.
pub type PageNum = u8;

/// All of display RAM.
pub type PageRam = [Page; PAGE_COUNT];

/// One of the two mapping windows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Window {
    Low,
    High,
}

/// The display, as seen from task context.
///
/// There should be exactly one of these, sharing its `Visible` with the
/// `Flicker` that runs the refresh interrupt.
pub struct Dmd<'a, A, S> {
    map: Mapper<A>,
    pages: &'a mut PageRam,
    visible: &'a Visible,
    sched: S,
    transition: Option<&'static dyn Transition>,
    composite: Option<PageNum>,
    thread: Thread,
}

impl<'a, A: Asic, S: Sleep> Dmd<'a, A, S> {
    /// Takes control of the display.
    ///
    /// Page 0 is mapped into both windows and shown as a mono image, and the
    /// allocator starts at page 2.
    pub fn new(
        asic: A,
        sched: S,
        pages: &'a mut PageRam,
        visible: &'a Visible,
        thread: Thread,
    ) -> Self {
        visible.reset(&thread);
        Dmd {
            map: Mapper::new(asic),
            pages,
            visible,
            sched,
            transition: None,
            composite: None,
            thread,
        }
    }

    /// Suspends the calling task for at least `ticks` refreshes.
    pub fn sleep(&mut self, ticks: Ticks) -> Wake {
        self.sched.sleep(ticks, self.pages)
    }

    /// The scheduler this display sleeps through.
    pub fn sched(&self) -> &S {
        &self.sched
    }

    /// Mutable access to the scheduler.
    pub fn sched_mut(&mut self) -> &mut S {
        &mut self.sched
    }

    /// Read-only view of all of display RAM.
    pub fn pages(&self) -> &PageRam {
        &*self.pages
    }

    /// The `(dark, bright)` pair currently being scanned out.
    pub fn visible(&self) -> (PageNum, PageNum) {
        self.visible.pair()
    }

    /// Releases the display, returning the mapping hardware.
    pub fn into_inner(self) -> A {
        self.map.into_inner()
    }

    ////////////////////////////////////////////////////////////////////////
    // Allocation and mapping

    /// Allocates a page for a mono image and maps it into both windows.
    pub fn alloc_low(&mut self) {
        self.map.alloc_low()
    }

    /// Allocates a page into the high window, leaving the low window alone.
    pub fn alloc_high(&mut self) {
        self.map.alloc_high()
    }

    /// Allocates a pair of pages for a 4-shade image: dark in the low
    /// window, bright in the high window.
    pub fn alloc_low_high(&mut self) {
        self.map.alloc_low_high()
    }

    /// Reserves a pair of pages without mapping them, returning the first.
    pub fn alloc_pair(&mut self) -> PageNum {
        self.map.alloc_pair()
    }

    /// Like `alloc_low`, then clears the page.
    pub fn alloc_low_clean(&mut self) {
        self.alloc_low();
        self.clean_low();
    }

    /// Like `alloc_high`, then clears the page.
    pub fn alloc_high_clean(&mut self) {
        self.alloc_high();
        self.clean_high();
    }

    /// Maps `page` into the low window.
    pub fn map_low(&mut self, page: PageNum) {
        self.map.map_low(page)
    }

    /// Maps `page` into the high window.
    pub fn map_high(&mut self, page: PageNum) {
        self.map.map_high(page)
    }

    /// Page currently mapped into the low window.
    pub fn low_page(&self) -> PageNum {
        self.map.low()
    }

    /// Page currently mapped into the high window.
    pub fn high_page(&self) -> PageNum {
        self.map.high()
    }

    /// Swaps the pages mapped into the two windows.
    pub fn flip_low_high(&mut self) {
        self.map.flip_low_high()
    }

    ////////////////////////////////////////////////////////////////////////
    // Showing

    /// Shows the page in `window` as a mono image, running the pending
    /// transition if there is one.
    ///
    /// A transition started here ends on that one page for both halves, not
    /// on whatever the low and high windows hold between them.
    pub fn show_mono(&mut self, window: Window) {
        let page = match window {
            Window::Low => self.map.low(),
            Window::High => self.map.high(),
        };
        self.show(page, page)
    }

    /// Shows the low window as a mono image.
    pub fn show_low(&mut self) {
        self.show_mono(Window::Low)
    }

    /// Shows the high window as a mono image.
    pub fn show_high(&mut self) {
        self.show_mono(Window::High)
    }

    /// Shows the low window as the dark page and the high window as the
    /// bright page of a 4-shade image, running the pending transition if
    /// there is one.
    pub fn show_color(&mut self) {
        let (low, high) = (self.map.low(), self.map.high());
        self.show(low, high)
    }

    /// Shows whichever window isn't currently visible, as a mono image.
    pub fn show_other(&mut self) {
        if self.visible.dark() == self.map.low() {
            self.show_high()
        } else {
            self.show_low()
        }
    }

    fn show(&mut self, dark: PageNum, bright: PageNum) {
        match self.transition {
            Some(t) => self.run_transition(t, (dark, bright)),
            None => self.visible.publish(dark, bright, &self.thread),
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Drawing

    /// The page in the low window.
    pub fn low(&self) -> &Page {
        &self.pages[self.map.low() as usize]
    }

    /// The page in the high window.
    pub fn high(&self) -> &Page {
        &self.pages[self.map.high() as usize]
    }

    pub fn low_mut(&mut self) -> &mut Page {
        &mut self.pages[self.map.low() as usize]
    }

    pub fn high_mut(&mut self) -> &mut Page {
        &mut self.pages[self.map.high() as usize]
    }

    /// Borrows both windows at once, as `(low, high)`. Returns `None` if
    /// they have the same page mapped.
    pub fn windows_mut(&mut self) -> Option<(&mut Page, &mut Page)> {
        let (low, high) = (self.map.low() as usize, self.map.high() as usize);
        if low < high {
            let (head, tail) = self.pages.split_at_mut(high);
            Some((&mut head[low], &mut tail[0]))
        } else if high < low {
            let (head, tail) = self.pages.split_at_mut(low);
            Some((&mut tail[0], &mut head[high]))
        } else {
            None
        }
    }

    /// Turns off every pixel in the low window.
    pub fn clean_low(&mut self) {
        gfx::clear(self.low_mut())
    }

    pub fn clean_high(&mut self) {
        gfx::clear(self.high_mut())
    }

    /// Copies the low window into the high window. Does nothing if they are
    /// the same page.
    pub fn copy_low_to_high(&mut self) {
        if let Some((low, high)) = self.windows_mut() {
            gfx::copy(low, high)
        }
    }

    /// Inverts every pixel in the low window.
    pub fn invert_low(&mut self) {
        gfx::invert(self.low_mut())
    }

    /// Draws a bitmap into the low window. See `gfx::blit`.
    pub fn draw_bitmap(
        &mut self,
        bits: &[u8],
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        gfx::blit(self.low_mut(), bits, x, y, width, height)
    }

    /// Clears a region of the low window. See `gfx::erase`.
    pub fn erase_region(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) {
        gfx::erase(self.low_mut(), x, y, width, height)
    }

    /// Draws a border around the low window. See `gfx::draw_border`.
    pub fn draw_border(&mut self) {
        gfx::draw_border(self.low_mut())
    }

    pub fn draw_hline(&mut self, y: usize) {
        gfx::draw_hline(self.low_mut(), y)
    }

    /// Copies a full-page image into the low window.
    pub fn draw_image(&mut self, image: &[u8; PAGE_BYTES]) {
        self.low_mut().copy_from_slice(image)
    }

    /// Copies a 4-shade image, stored as dark page then bright page, into
    /// the low and high windows.
    pub fn draw_image2(&mut self, image: &[[u8; PAGE_BYTES]; 2]) {
        self.low_mut().copy_from_slice(&image[0]);
        self.high_mut().copy_from_slice(&image[1]);
    }
}
