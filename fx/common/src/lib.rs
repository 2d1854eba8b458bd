#![no_std]

use wpcdmd::hw::Asic;
use wpcdmd::sched::Sleep;
use wpcdmd::Dmd;

/// A display effect: something that takes over the display for a while.
pub trait Deff {
    /// Draws and shows the effect, returning when it is done or the
    /// scheduler cancels it.
    fn run<A: Asic, S: Sleep>(&mut self, dmd: &mut Dmd<'_, A, S>);
}
