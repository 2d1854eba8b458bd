//! Page buffers and drawing primitives for the 128x32 dot-matrix display.
//!
//! This module is deliberately architecture-independent to allow for testing on
//! the host.
//!
//! A page is one bit per pixel, packed row-major, sixteen bytes per row. Within
//! each byte the least significant bit is the leftmost pixel, which is the order
//! the display controller scans out.
//!
//! Region operations (`blit`, `erase`) work on whole bytes. Their coordinates
//! and sizes are expected to be multiples of 8 pixels; other values are rounded
//! down to a byte boundary, which draws the wrong thing rather than failing.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

/// Width of the display in pixels.
pub const WIDTH: usize = 128;
/// Height of the display in pixels.
pub const HEIGHT: usize = 32;
/// Bytes in one row of pixels.
pub const STRIDE: usize = WIDTH / 8;
/// Bytes in one page.
pub const PAGE_BYTES: usize = STRIDE * HEIGHT;
/// Words in one page.
pub const PAGE_WORDS: usize = PAGE_BYTES / 4;

/// One frame buffer. This is word-aligned, so that whole-page operations can
/// run a word at a time, but we usually pun it as bytes.
#[derive(Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct Page([u32; PAGE_WORDS]);

impl Page {
    /// Creates a page with every pixel off.
    pub const fn blank() -> Self {
        Page([0; PAGE_WORDS])
    }

    /// Creates a page from a full-page image in display byte order.
    pub fn from_bytes(bytes: &[u8; PAGE_BYTES]) -> Self {
        let mut page = Page::blank();
        page.copy_from_slice(bytes);
        page
    }

    pub fn as_words(&self) -> &[u32; PAGE_WORDS] {
        &self.0
    }

    pub fn as_words_mut(&mut self) -> &mut [u32; PAGE_WORDS] {
        &mut self.0
    }

    /// Borrows the bytes of row `y`.
    ///
    /// # Panics
    ///
    /// If `y` is not a row on the display.
    pub fn row(&self, y: usize) -> &[u8] {
        &self[y * STRIDE..(y + 1) * STRIDE]
    }

    /// Mutably borrows the bytes of row `y`.
    ///
    /// # Panics
    ///
    /// If `y` is not a row on the display.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self[y * STRIDE..(y + 1) * STRIDE]
    }

    /// Reads the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self[y * STRIDE + x / 8] & (1u8 << (x % 8)) != 0
    }

    /// Turns the pixel at `(x, y)` on or off.
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let byte = &mut self[y * STRIDE + x / 8];
        let mask = 1u8 << (x % 8);
        if on {
            *byte |= mask
        } else {
            *byte &= !mask
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::blank()
    }
}

impl core::fmt::Debug for Page {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let lit = self.0.iter().map(|w| w.count_ones()).sum::<u32>();
        write!(f, "Page({} pixels lit)", lit)
    }
}

impl core::ops::Deref for Page {
    type Target = [u8; PAGE_BYTES];
    fn deref(&self) -> &Self::Target {
        // Safety: same size, and u8 has no alignment requirement.
        unsafe { core::mem::transmute(&self.0) }
    }
}

impl core::ops::DerefMut for Page {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: same size, and every bit pattern is a valid u32.
        unsafe { core::mem::transmute(&mut self.0) }
    }
}

/// Turns off every pixel in `page`.
pub fn clear(page: &mut Page) {
    for word in page.as_words_mut().iter_mut() {
        *word = 0;
    }
}

/// Copies the entire contents of `src` into `dst`.
pub fn copy(src: &Page, dst: &mut Page) {
    dst.as_words_mut().copy_from_slice(src.as_words());
}

/// Inverts every pixel in `page`.
pub fn invert(page: &mut Page) {
    for word in page.as_words_mut().iter_mut() {
        *word = !*word;
    }
}

/// Draws a `width` x `height` bitmap at `(x, y)`, replacing what was there.
///
/// `bits` holds `height` rows of `width / 8` bytes each, in display bit order.
///
/// # Panics
///
/// If the region runs off the bottom or right edge of the page, or `bits` is
/// shorter than the region.
pub fn blit(
    page: &mut Page,
    bits: &[u8],
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) {
    let col = x / 8;
    let span = width / 8;
    if span == 0 {
        return;
    }
    for (row, src) in (y..y + height).zip(bits.chunks(span)) {
        page.row_mut(row)[col..col + span].copy_from_slice(src);
    }
}

/// Turns off every pixel in the `width` x `height` region at `(x, y)`.
///
/// # Panics
///
/// If the region runs off the bottom or right edge of the page.
pub fn erase(page: &mut Page, x: usize, y: usize, width: usize, height: usize) {
    let col = x / 8;
    let span = width / 8;
    for row in y..y + height {
        for byte in &mut page.row_mut(row)[col..col + span] {
            *byte = 0;
        }
    }
}

/// Draws a frame two pixels thick around the edge of the page. The interior is
/// left alone.
pub fn draw_border(page: &mut Page) {
    for row in (0..2).chain(HEIGHT - 2..HEIGHT) {
        for byte in page.row_mut(row) {
            *byte = 0xFF;
        }
    }
    for row in 2..HEIGHT - 2 {
        let bytes = page.row_mut(row);
        bytes[0] = 0x03;
        bytes[STRIDE - 1] = 0xC0;
    }
}

/// Turns on every pixel in row `y`.
pub fn draw_hline(page: &mut Page, y: usize) {
    for byte in page.row_mut(y) {
        *byte = 0xFF;
    }
}
