//! The refresh interrupt and the visible-page state it reads.
//!
//! The display itself is 1 bit per pixel. We fake four shades by showing a
//! "dark" page for one refresh out of every three and a "bright" page for the
//! other two: a pixel lit in both pages is full on, lit in the bright page
//! only is two-thirds, lit in the dark page only is one-third. Mono images
//! simply use the same page for both.
//!
//! Task code decides *which* pair is shown; the interrupt decides *when* each
//! half of the pair goes out. The pair is packed into one atomic word so that
//! the interrupt can never observe half of an update.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::hw::{Asic, Port};
use crate::priority::{Firq, InterruptPriority, Thread};
use crate::util::measurement;
use crate::util::spin_lock::{SpinLock, SpinLockGuard};
use crate::{PageNum, FIRQ_ROW};

/// Flip counter value that causes the next refresh to show the dark page.
const FLIP_DARK: usize = 2;

fn pack(dark: PageNum, bright: PageNum) -> usize {
    dark as usize | (bright as usize) << 8
}

fn unpack(word: usize) -> (PageNum, PageNum) {
    (word as PageNum, (word >> 8) as PageNum)
}

/// The pair of pages being scanned out, plus the flip counter that decides
/// which of them the next refresh shows.
#[derive(Debug)]
pub struct Visible {
    /// Dark page in bits 7:0, bright page in bits 15:8.
    pair: AtomicUsize,
    flip: AtomicUsize,
}

impl Visible {
    /// Both halves show page 0, and the first refresh shows the dark page.
    pub const fn new() -> Self {
        Visible {
            pair: AtomicUsize::new(0),
            flip: AtomicUsize::new(FLIP_DARK),
        }
    }

    /// Reads the current `(dark, bright)` pair.
    pub fn pair(&self) -> (PageNum, PageNum) {
        unpack(self.pair.load(Ordering::Acquire))
    }

    pub fn dark(&self) -> PageNum {
        self.pair().0
    }

    pub fn bright(&self) -> PageNum {
        self.pair().1
    }

    /// Replaces the visible pair. Both pages must be fully drawn: the next
    /// refresh may show either of them.
    pub(crate) fn publish(&self, dark: PageNum, bright: PageNum, _: &Thread) {
        self.pair.store(pack(dark, bright), Ordering::Release)
    }

    pub(crate) fn reset(&self, thread: &Thread) {
        self.publish(0, 0, thread);
        self.flip.store(FLIP_DARK, Ordering::Relaxed);
    }

    /// Advances the flip counter by one refresh and returns the page that
    /// refresh should show.
    ///
    /// Only the interrupt advances the counter, so the load/store pair below
    /// does not need to be atomic as a whole.
    pub fn select(&self, _: &impl InterruptPriority) -> PageNum {
        let (dark, bright) = self.pair();
        let flip = self.flip.load(Ordering::Relaxed);
        if flip >= FLIP_DARK {
            self.flip.store(0, Ordering::Relaxed);
            dark
        } else {
            self.flip.store(flip + 1, Ordering::Relaxed);
            bright
        }
    }
}

impl Default for Visible {
    fn default() -> Self {
        Visible::new()
    }
}

/// The refresh interrupt driver.
///
/// This is meant to live in a `static`, shared between the interrupt handler
/// and whoever owns the `Dmd`:
///
/// ```ignore
/// static FLICKER: Flicker<Wpc> = Flicker::new();
///
/// fn firq() {
///     FLICKER.isr()
/// }
/// ```
#[derive(Debug)]
pub struct Flicker<A> {
    visible: Visible,
    hw: SpinLock<Option<A>>,
}

impl<A> Flicker<A> {
    pub const fn new() -> Self {
        Flicker {
            visible: Visible::new(),
            hw: SpinLock::new(None),
        }
    }

    /// The visible-page state, for handing to `Dmd::new`.
    pub fn visible(&self) -> &Visible {
        &self.visible
    }
}

impl<A: Asic + Send> Flicker<A> {
    /// Loans the interrupt's hardware to the driver, shows the current dark
    /// page, and arms the first refresh interrupt.
    ///
    /// The refresh interrupt should be unmasked only after this returns.
    ///
    /// # Panics
    ///
    /// If the driver has already been started.
    pub fn start(&self, mut asic: A) {
        let mut slot = self.hw.lock();
        assert!(slot.is_none(), "flicker driver already started");
        asic.write_port(Port::VisiblePage, self.visible.dark());
        asic.arm_interrupt(FIRQ_ROW);
        *slot = Some(asic);
    }

    /// Takes the hardware back. The refresh interrupt should be masked
    /// first, or its next firing will panic.
    pub fn stop(&self) -> Option<A> {
        self.hw.lock().take()
    }

    /// Refresh interrupt handler: call this from the FIRQ vector.
    ///
    /// # Panics
    ///
    /// If the driver has not been started.
    pub fn isr(&self) {
        measurement::sig_a_set();
        scopeguard::defer! { measurement::sig_a_clear() }

        // Safety: this is the interrupt handler.
        let firq = unsafe { Firq::new() };

        let mut hw = acquire_hw(&self.hw);
        let page = self.visible.select(&firq);
        hw.write_port(Port::VisiblePage, page);
        hw.arm_interrupt(FIRQ_ROW);
    }
}

/// Locks a hardware slot from interrupt context. Interrupts cannot wait, so
/// contention is fatal, as is an empty slot.
fn acquire_hw<T: Send>(lock: &SpinLock<Option<T>>) -> SpinLockGuard<T> {
    SpinLockGuard::map(
        lock.try_lock().expect("HW lock held at ISR"),
        |o| o.as_mut().expect("ISR fired without HW available"),
    )
}
