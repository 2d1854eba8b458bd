//! The seam between the display driver and the cooperative task scheduler.

use crate::PageRam;

/// Durations, measured in display refreshes.
pub type Ticks = u16;

/// What the scheduler had to say when a sleeping task resumed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Wake {
    /// Carry on.
    Resume,
    /// The task's current display effect has been superseded. A running
    /// transition stops where it is.
    Cancel,
}

/// Suspends the calling task.
///
/// This is the only place the display driver yields. While suspended, the
/// refresh interrupt keeps scanning out pages from `ram`, which is why it is
/// handed over (read-only) for the duration.
pub trait Sleep {
    /// Sleeps for at least `ticks` refreshes.
    fn sleep(&mut self, ticks: Ticks, ram: &PageRam) -> Wake;
}

impl<S: Sleep + ?Sized> Sleep for &mut S {
    fn sleep(&mut self, ticks: Ticks, ram: &PageRam) -> Wake {
        (**self).sleep(ticks, ram)
    }
}
