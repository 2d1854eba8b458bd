//! Display effects for exercising the driver.

#![cfg_attr(not(test), no_std)]

use gfx::{PAGE_BYTES, STRIDE};
use wpcdmd::hw::Asic;
use wpcdmd::sched::{Sleep, Ticks, Wake};
use wpcdmd::{Dmd, Page};
use wpcdmd_fx_common::Deff;

/// Three vertical bars, one in each lit shade, to check that 4-shade
/// imaging works. From left: one-third (dark page only), two-thirds (bright
/// page only), full (both).
#[derive(Debug, Default)]
pub struct ColorTest;

/// Bar rows start at the top of the display.
const BAR_ROWS: usize = 16;
/// Each bar is four bytes (32 pixels) wide.
const BAR_BYTES: usize = 4;

fn draw_bar(page: &mut Page, col: usize) {
    for y in 0..BAR_ROWS {
        for b in &mut page.row_mut(y)[col..col + BAR_BYTES] {
            *b = 0xFF;
        }
    }
}

impl Deff for ColorTest {
    fn run<A: Asic, S: Sleep>(&mut self, dmd: &mut Dmd<'_, A, S>) {
        dmd.alloc_low_high();
        dmd.clean_low();

        // Full: lit in both pages.
        draw_bar(dmd.low_mut(), STRIDE - BAR_BYTES);
        dmd.copy_low_to_high();
        // Two-thirds: bright page only.
        draw_bar(dmd.high_mut(), STRIDE - 2 * BAR_BYTES);
        // One-third: dark page only.
        draw_bar(dmd.low_mut(), STRIDE - 3 * BAR_BYTES);

        dmd.show_color();
    }
}

/// Flashes part of an image by alternating between two mono pages: one with
/// the bitmap, one without.
#[derive(Debug)]
pub struct Flasher<'b> {
    pub bitmap: &'b [u8],
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Refreshes between flips.
    pub rate: Ticks,
    /// Number of flips before returning.
    pub flips: usize,
}

impl Deff for Flasher<'_> {
    fn run<A: Asic, S: Sleep>(&mut self, dmd: &mut Dmd<'_, A, S>) {
        dmd.alloc_low_high();
        dmd.clean_low();
        dmd.draw_border();
        dmd.draw_bitmap(self.bitmap, self.x, self.y, self.width, self.height);
        dmd.copy_low_to_high();

        // The drawing helpers only reach the low window.
        dmd.flip_low_high();
        dmd.erase_region(self.x, self.y, self.width, self.height);
        dmd.flip_low_high();

        dmd.show_low();
        for _ in 0..self.flips {
            if dmd.sleep(self.rate) == Wake::Cancel {
                log::debug!("flasher cancelled");
                return;
            }
            dmd.show_other();
        }
    }
}

/// Shows a full-screen 4-shade image, stored dark page first, for `hold`
/// refreshes. Schedule a transition first to bring it in gradually.
#[derive(Debug)]
pub struct Splash<'i> {
    pub image: &'i [[u8; PAGE_BYTES]; 2],
    pub hold: Ticks,
}

impl Deff for Splash<'_> {
    fn run<A: Asic, S: Sleep>(&mut self, dmd: &mut Dmd<'_, A, S>) {
        dmd.alloc_low_high();
        dmd.draw_image2(self.image);
        dmd.show_color();
        dmd.sleep(self.hold);
    }
}

/// A 32x16 diamond, for use with `Flasher`.
#[rustfmt::skip]
pub static DIAMOND: [u8; 64] = [
    0x00, 0xC0, 0x03, 0x00,
    0x00, 0xF0, 0x0F, 0x00,
    0x00, 0xFC, 0x3F, 0x00,
    0x00, 0xFF, 0xFF, 0x00,
    0xC0, 0xFF, 0xFF, 0x03,
    0xF0, 0xFF, 0xFF, 0x0F,
    0xFC, 0xFF, 0xFF, 0x3F,
    0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF,
    0xFC, 0xFF, 0xFF, 0x3F,
    0xF0, 0xFF, 0xFF, 0x0F,
    0xC0, 0xFF, 0xFF, 0x03,
    0x00, 0xFF, 0xFF, 0x00,
    0x00, 0xFC, 0x3F, 0x00,
    0x00, 0xF0, 0x0F, 0x00,
    0x00, 0xC0, 0x03, 0x00,
];
