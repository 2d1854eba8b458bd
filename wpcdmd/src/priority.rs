//! Type-level representation of execution contexts.
//!
//! All the priority types are zero-sized tokens. Code that must only run in a
//! given context takes a reference to the matching token, so that calling it
//! from the wrong place is a type error rather than a torn display.
//!
//! There are only two contexts on this board: the display refresh interrupt,
//! and the cooperative task scheduler (thread mode).

use core::marker::PhantomData;

// Marker type used to cause things to stop being Sync/Send.
type NotSyncOrSend = PhantomData<*mut ()>;

/// The display refresh interrupt (FIRQ), used for page flipping.
#[derive(Copy, Clone)]
pub struct Firq(NotSyncOrSend);
/// Thread mode execution occurs outside any interrupt handler. Cooperative
/// tasks, and therefore all drawing and transitions, run here.
#[derive(Copy, Clone)]
pub struct Thread(NotSyncOrSend);

impl Firq {
    /// Conjures a `Firq` token.
    ///
    /// # Safety
    ///
    /// Only the refresh interrupt handler may hold one of these.
    pub unsafe fn new() -> Self {
        Firq(PhantomData)
    }
}

impl Thread {
    /// Conjures a `Thread` token without checking.
    ///
    /// # Safety
    ///
    /// The caller must not be executing inside an interrupt handler.
    pub unsafe fn new() -> Self {
        Thread(PhantomData)
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        impl Thread {
            /// Returns a `Thread` token only if called from thread priority.
            pub fn new_checked() -> Option<Self> {
                // Safety: reads of the ICSR are safe.
                let icsr =
                    unsafe { &(*cortex_m::peripheral::SCB::ptr()).icsr }.read();
                if icsr & 0xFF == 0 {
                    Some(unsafe { Self::new() })
                } else {
                    None
                }
            }
        }
    } else {
        impl Thread {
            /// Returns a `Thread` token only if called from thread priority.
            ///
            /// Hosted builds have no interrupts, so this always succeeds.
            pub fn new_checked() -> Option<Self> {
                Some(unsafe { Self::new() })
            }
        }
    }
}

/// Indicates that a type represents an interrupt priority level.
pub trait InterruptPriority {}

impl InterruptPriority for Firq {}
