//! Display controller registers.
//!
//! The controller's page registers are write-only. Everything above this
//! module talks to them through the `Asic` trait, and anything that needs to
//! know what was last written keeps a `Shadowed` copy.

use crate::PageNum;

/// Write-only registers on the display controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Port {
    /// Selects the page mapped into the low window.
    LowPage,
    /// Selects the page mapped into the high window.
    HighPage,
    /// Selects the page scanned out to the display.
    VisiblePage,
    /// Selects the scanline on which the next refresh interrupt fires.
    FirqRow,
}

/// Access to the controller's registers.
pub trait Asic {
    /// Performs a single write to a register.
    fn write_port(&mut self, port: Port, value: u8);

    /// Reprograms the refresh interrupt to fire when scanout reaches `row`.
    fn arm_interrupt(&mut self, row: u8) {
        self.write_port(Port::FirqRow, row)
    }
}

/// Software copy of a write-only register.
///
/// Writes go to the hardware and the copy in one call, so the copy is always
/// the last value written and callers never need to read the hardware.
#[derive(Debug)]
pub struct Shadowed {
    port: Port,
    value: u8,
}

impl Shadowed {
    pub const fn new(port: Port) -> Self {
        Shadowed { port, value: 0 }
    }

    pub fn set(&mut self, asic: &mut impl Asic, value: PageNum) {
        self.value = value;
        asic.write_port(self.port, value);
    }

    pub fn get(&self) -> PageNum {
        self.value
    }
}

/// The register block of the WPC display controller, accessed with volatile
/// byte writes.
///
/// Registers sit at consecutive addresses starting at `Wpc::BASE`: high page,
/// interrupt row, low page, visible page.
#[derive(Debug)]
pub struct Wpc {
    base: *mut u8,
}

// Safety: the register block is not tied to any thread; exclusive use is
// enforced by ownership of the `Wpc`.
unsafe impl Send for Wpc {}

impl Wpc {
    /// Address of the first register in the block.
    pub const BASE: usize = 0x3FBC;

    /// Takes the register block at its usual address.
    ///
    /// # Safety
    ///
    /// The caller must be running on WPC hardware, and must not create more
    /// than one `Wpc` per set of registers it intends to write. (One for the
    /// refresh interrupt and one for task context is fine: they never write
    /// the same register.)
    pub unsafe fn new() -> Self {
        Self::at(Self::BASE as *mut u8)
    }

    /// Uses a register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point at four writable bytes that remain valid for as long
    /// as this `Wpc` exists.
    pub unsafe fn at(base: *mut u8) -> Self {
        Wpc { base }
    }

    fn offset(port: Port) -> usize {
        match port {
            Port::HighPage => 0,
            Port::FirqRow => 1,
            Port::LowPage => 2,
            Port::VisiblePage => 3,
        }
    }
}

impl Asic for Wpc {
    fn write_port(&mut self, port: Port, value: u8) {
        // Safety: in-bounds by the contract of `at`.
        unsafe {
            core::ptr::write_volatile(self.base.add(Self::offset(port)), value)
        }
    }
}
