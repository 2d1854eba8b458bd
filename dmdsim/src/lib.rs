//! Host simulation of the display driver.
//!
//! The pieces that would be hardware on a real board are replaced here:
//!
//! - the mapping registers (`Ports`) just log what they're told,
//! - the visible-page register (`Scanout`) is latched for the panel to read,
//! - the scheduler (`Clock`) runs the refresh interrupt by hand, once per
//!   tick, and feeds what it shows into a `panel::Compositor`.
//!
//! Everything above that (the driver, transitions, effects) is the same
//! code that runs on the target.

pub mod panel;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use wpcdmd::flicker::Flicker;
use wpcdmd::hw::{Asic, Port};
use wpcdmd::priority::Thread;
use wpcdmd::sched::{Sleep, Ticks, Wake};
use wpcdmd::{Dmd, PageNum, PageRam};

use crate::panel::{Compositor, Frame};

/// Something that displays blended frames.
pub trait Screen {
    fn show(&mut self, frame: &Frame);
}

/// Collects every frame, for inspection after the fact.
impl Screen for Vec<Frame> {
    fn show(&mut self, frame: &Frame) {
        self.push(frame.clone())
    }
}

/// Task-side registers: the two mapping windows.
#[derive(Debug, Default)]
pub struct Ports;

impl Asic for Ports {
    fn write_port(&mut self, port: Port, value: u8) {
        log::trace!("{:?} <- {}", port, value);
    }
}

/// Interrupt-side registers: latches the visible page.
#[derive(Debug)]
pub struct Scanout {
    visible: Arc<AtomicU8>,
}

impl Asic for Scanout {
    fn write_port(&mut self, port: Port, value: u8) {
        match port {
            Port::VisiblePage => self.visible.store(value, Ordering::Relaxed),
            Port::FirqRow => (),
            _ => log::warn!("refresh wrote {:?} <- {}", port, value),
        }
    }
}

/// Scheduler that advances simulated time by running refreshes.
pub struct Clock<'s, S> {
    flicker: &'s Flicker<Scanout>,
    latch: &'s AtomicU8,
    compositor: Compositor,
    screen: &'s mut S,
    ticks: u64,
    cancel_after: Option<u64>,
}

impl<S> Clock<'_, S> {
    /// Refreshes run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl<S: Screen> Sleep for Clock<'_, S> {
    fn sleep(&mut self, ticks: Ticks, ram: &PageRam) -> Wake {
        for _ in 0..ticks {
            self.flicker.isr();
            let page: PageNum = self.latch.load(Ordering::Relaxed);
            if let Some(frame) = self.compositor.refresh(page, ram) {
                self.screen.show(&frame);
            }
            self.ticks += 1;
        }

        match self.cancel_after {
            Some(limit) if self.ticks >= limit => {
                log::info!("cancelling at refresh {}", self.ticks);
                self.cancel_after = None;
                Wake::Cancel
            }
            _ => Wake::Resume,
        }
    }
}

/// The controller type effects see in simulation.
pub type SimDmd<'s, S> = Dmd<'s, Ports, Clock<'s, S>>;

/// A simulated board: display RAM, the refresh interrupt, and a screen.
pub struct Sim<S> {
    pages: PageRam,
    flicker: Flicker<Scanout>,
    latch: Arc<AtomicU8>,
    screen: S,
    cancel_after: Option<u64>,
}

impl<S: Screen> Sim<S> {
    pub fn new(screen: S) -> Self {
        Sim {
            pages: PageRam::default(),
            flicker: Flicker::new(),
            latch: Arc::new(AtomicU8::new(0)),
            screen,
            cancel_after: None,
        }
    }

    /// Makes the first sleep at or after `ticks` refreshes report
    /// cancellation.
    pub fn cancel_after(mut self, ticks: Option<u64>) -> Self {
        self.cancel_after = ticks;
        self
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn into_screen(self) -> S {
        self.screen
    }

    /// Powers up the display and hands it to `body`.
    ///
    /// Each call starts from a freshly reset driver, but display RAM keeps
    /// its contents.
    pub fn run<R>(&mut self, body: impl FnOnce(&mut SimDmd<'_, S>) -> R) -> R {
        // Safety: there are no interrupts on the host; the "refresh
        // interrupt" runs on this thread, inside `Clock::sleep`.
        let thread = unsafe { Thread::new() };

        let clock = Clock {
            flicker: &self.flicker,
            latch: &self.latch,
            compositor: Compositor::new(),
            screen: &mut self.screen,
            ticks: 0,
            cancel_after: self.cancel_after,
        };
        let mut dmd = Dmd::new(
            Ports,
            clock,
            &mut self.pages,
            self.flicker.visible(),
            thread,
        );
        self.flicker.start(Scanout {
            visible: Arc::clone(&self.latch),
        });

        let result = body(&mut dmd);

        log::debug!("stopped after {} refreshes", dmd.sched().ticks());
        drop(dmd);
        self.flicker.stop();
        result
    }
}
