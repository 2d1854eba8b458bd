//! Page allocation and the two mapping windows.
//!
//! Software can only reach display memory through two windows, "low" and
//! "high", each showing one page selected by a write-only register. The
//! `Mapper` owns those registers and keeps shadows of them.
//!
//! Allocation is done very simply by iteration. Pages are always handed out
//! in pairs, in case the caller wants a 4-shade image, and are never freed:
//! the cursor just wraps around the store. No more than two pairs are ever
//! held at once, so wrapping never catches a page that is still in use.
//! Nothing checks that; holding a third pair gets it silently overwritten.

use crate::hw::{Asic, Port, Shadowed};
use crate::{PageNum, PAGE_COUNT};

/// Returns the page paired with `page`, i.e. the next page number up.
pub fn partner(page: PageNum) -> PageNum {
    (page + 1) % PAGE_COUNT as PageNum
}

/// Owner of the allocation cursor and the mapping registers.
#[derive(Debug)]
pub struct Mapper<A> {
    asic: A,
    low: Shadowed,
    high: Shadowed,
    free: PageNum,
}

impl<A: Asic> Mapper<A> {
    /// Takes control of the mapping registers, mapping page 0 into both
    /// windows. Page pair 0/1 is considered in use (it's what the display
    /// shows at startup) so the first allocation returns 2.
    pub fn new(asic: A) -> Self {
        let mut mapper = Mapper {
            asic,
            low: Shadowed::new(Port::LowPage),
            high: Shadowed::new(Port::HighPage),
            free: 2,
        };
        mapper.map_low(0);
        mapper.map_high(0);
        mapper
    }

    /// Reserves a pair of pages and returns the lower-numbered one. The pair
    /// always has consecutive numbers.
    ///
    /// This does not map anything.
    pub fn alloc_pair(&mut self) -> PageNum {
        let page = self.free;
        self.free = (self.free + 2) % PAGE_COUNT as PageNum;
        page
    }

    /// Allocates a page for a mono image and maps it into both windows.
    pub fn alloc_low(&mut self) {
        let page = self.alloc_pair();
        self.map_low(page);
        self.map_high(page);
    }

    /// Allocates a page and maps it into the high window only.
    pub fn alloc_high(&mut self) {
        let page = self.alloc_pair();
        self.map_high(page);
    }

    /// Allocates a pair for a 4-shade image: the dark page goes in the low
    /// window and the bright page in the high window.
    pub fn alloc_low_high(&mut self) {
        let page = self.alloc_pair();
        self.map_low(page);
        self.map_high(partner(page));
    }

    pub fn map_low(&mut self, page: PageNum) {
        debug_assert!((page as usize) < PAGE_COUNT);
        self.low.set(&mut self.asic, page)
    }

    pub fn map_high(&mut self, page: PageNum) {
        debug_assert!((page as usize) < PAGE_COUNT);
        self.high.set(&mut self.asic, page)
    }

    /// Page currently mapped into the low window.
    pub fn low(&self) -> PageNum {
        self.low.get()
    }

    /// Page currently mapped into the high window.
    pub fn high(&self) -> PageNum {
        self.high.get()
    }

    /// Exchanges the pages mapped into the two windows.
    pub fn flip_low_high(&mut self) {
        let (low, high) = (self.low(), self.high());
        self.map_low(high);
        self.map_high(low);
    }

    /// Gives up the mapping registers.
    pub fn into_inner(self) -> A {
        self.asic
    }
}
