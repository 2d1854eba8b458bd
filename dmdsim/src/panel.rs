//! What a person looking at the display would see.
//!
//! The real panel is too slow to show individual refreshes: the eye blends
//! the last few together. We approximate that by summing the last three
//! pages scanned out, one per refresh, which is exactly one flicker cycle.
//! Each pixel ends up with a shade from 0 (off) to 3 (lit every refresh).

use std::fmt;

use gfx::{HEIGHT, WIDTH};
use wpcdmd::{Page, PageNum, PageRam};

/// Refreshes blended into one frame.
pub const PHASES: usize = 3;

/// Characters for shades 0 through 3.
const SHADES: [char; PHASES + 1] = [' ', '.', '+', '#'];

/// A blended frame.
#[derive(Clone, Eq, PartialEq)]
pub struct Frame {
    shades: Box<[[u8; WIDTH]; HEIGHT]>,
}

impl Frame {
    fn dark() -> Self {
        Frame {
            shades: Box::new([[0; WIDTH]; HEIGHT]),
        }
    }

    /// Shade of the pixel at `(x, y)`, from 0 to 3.
    pub fn shade(&self, x: usize, y: usize) -> u8 {
        self.shades[y][x]
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.shades.iter() {
            let line: String =
                row.iter().map(|&s| SHADES[s as usize]).collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Frame:\n{}", self)
    }
}

/// Keeps the pages shown by the last three refreshes and blends them.
#[derive(Debug, Default)]
pub struct Compositor {
    /// Page number and a copy of its contents at the time it was shown,
    /// indexed by refresh count modulo `PHASES`.
    phases: [Option<(PageNum, Page)>; PHASES],
    next: usize,
    key: Option<[PageNum; PHASES]>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that one refresh showed `page`.
    ///
    /// Returns a new frame if the set of pages in the ring changed, and
    /// `None` if it didn't, or if there haven't yet been enough refreshes to
    /// fill the ring. Changes to the contents of a page that stays in the
    /// ring are not noticed.
    pub fn refresh(&mut self, page: PageNum, ram: &PageRam) -> Option<Frame> {
        self.phases[self.next] = Some((page, ram[page as usize].clone()));
        self.next = (self.next + 1) % PHASES;

        let mut key = [0; PHASES];
        for (k, phase) in key.iter_mut().zip(&self.phases) {
            *k = phase.as_ref()?.0;
        }
        if self.key == Some(key) {
            return None;
        }
        self.key = Some(key);

        let mut frame = Frame::dark();
        for (_, page) in self.phases.iter().flatten() {
            for (y, row) in frame.shades.iter_mut().enumerate() {
                for (x, shade) in row.iter_mut().enumerate() {
                    *shade += page.pixel(x, y) as u8;
                }
            }
        }
        Some(frame)
    }
}
