//! Animated transitions between two images.
//!
//! Normally a show operation is a cut: the new pages become visible on the
//! next refresh. If a transition has been scheduled, the show operation
//! instead runs the engine below, which repeatedly builds a *composite* page
//! from the outgoing and incoming images and displays it, until the
//! transition reports that the composite is entirely the new image.
//!
//! A transition is described by an implementation of `Transition`, normally
//! a `static` (see the `trans` effect crate). Each cycle, for each channel,
//! the engine calls `composite_old` to lay down the outgoing image and then
//! `composite_new` to overlay some portion of the incoming one. Progress is
//! kept in a per-channel cursor owned by the engine, so the descriptor itself
//! is immutable and may be reused.
//!
//! Color depths: both images may be mono (one page shown for both the dark
//! and bright halves) or 4-shade (two pages). When only one side is mono, its
//! single page stands in for both of its channels. When both are mono, only
//! the dark channel is composited at all.

use crate::hw::Asic;
use crate::mapping::{partner, Mapper};
use crate::sched::{Sleep, Ticks, Wake};
use crate::util::measurement;
use crate::{Dmd, Page, PageNum, PageRam};

/// Which half of a 4-shade image a cycle is working on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Channel {
    Dark,
    Bright,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Dark => 0,
            Channel::Bright => 1,
        }
    }
}

/// Result of a `composite_new` call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
    /// More cycles are needed.
    Continue,
    /// The composite now shows the whole new image. The engine publishes it
    /// and stops.
    Finished,
}

/// The pages involved in one channel of one cycle.
pub struct Cycle<'c> {
    pub channel: Channel,
    /// The outgoing image in `composite_old`, the incoming image in
    /// `composite_new`.
    pub src: &'c Page,
    /// The composite being built. It is freshly allocated each cycle and its
    /// contents on entry to `composite_old` are undefined.
    pub dst: &'c mut Page,
    /// This channel's progress. Zero at the start of every run, unless
    /// `Transition::init` says otherwise.
    pub cursor: &'c mut usize,
}

/// Description of an animated transition.
pub trait Transition {
    /// Refreshes to wait before building each composite.
    fn delay(&self) -> Ticks;

    /// Called once per run, before the first cycle, with both channel
    /// cursors zeroed.
    fn init(&self, _cursors: &mut [usize; 2]) {}

    /// Initializes `cx.dst` from the outgoing image.
    fn composite_old(&self, cx: &mut Cycle<'_>);

    /// Overlays the incoming image onto `cx.dst` and advances the cursor.
    fn composite_new(&self, cx: &mut Cycle<'_>) -> Step;
}

/// Runs `f` with a shared reference to page `src` and an exclusive reference
/// to page `dst`. If they're the same page, `f` sees a snapshot of `src`
/// taken before it started writing.
fn with_pair<R>(
    pages: &mut PageRam,
    src: PageNum,
    dst: PageNum,
    f: impl FnOnce(&Page, &mut Page) -> R,
) -> R {
    let (s, d) = (src as usize, dst as usize);
    if s == d {
        let snapshot = pages[s].clone();
        f(&snapshot, &mut pages[d])
    } else if s < d {
        let (head, tail) = pages.split_at_mut(d);
        f(&head[s], &mut tail[0])
    } else {
        let (head, tail) = pages.split_at_mut(s);
        f(&tail[0], &mut head[d])
    }
}

/// Builds one channel of a composite: the outgoing page with the incoming
/// page laid over it.
fn composite_channel<A: Asic>(
    map: &mut Mapper<A>,
    pages: &mut PageRam,
    t: &dyn Transition,
    channel: Channel,
    (old, new, composite): (PageNum, PageNum, PageNum),
    cursor: &mut usize,
) -> Step {
    // The windows are kept pointing at what the compositor is working on, so
    // that the mapping registers always reflect the page being written.
    map.map_high(composite);
    map.map_low(old);
    with_pair(pages, old, composite, |src, dst| {
        t.composite_old(&mut Cycle {
            channel,
            src,
            dst,
            cursor: &mut *cursor,
        })
    });

    map.map_low(new);
    with_pair(pages, new, composite, |src, dst| {
        t.composite_new(&mut Cycle {
            channel,
            src,
            dst,
            cursor: &mut *cursor,
        })
    })
}

/// Allocates the next composite pair, skipping any pair that holds a page of
/// either image.
fn alloc_composite<A: Asic>(
    map: &mut Mapper<A>,
    avoid: &[PageNum; 4],
) -> PageNum {
    loop {
        let page = map.alloc_pair();
        if !avoid.contains(&page) && !avoid.contains(&partner(page)) {
            return page;
        }
    }
}

impl<'a, A: Asic, S: Sleep> Dmd<'a, A, S> {
    /// Schedules `t` to run on the next show operation.
    ///
    /// Scheduling while a transition is already pending replaces it.
    pub fn schedule_transition(&mut self, t: &'static dyn Transition) {
        self.transition = Some(t);
    }

    /// Cancels any pending transition, so that the next show is a cut.
    /// Visible state is untouched.
    pub fn reset_transition(&mut self) {
        self.transition = None;
    }

    /// Checks whether a transition is pending.
    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// The most recently published composite page, or `None` if no
    /// transition has displayed anything yet.
    pub fn composite_page(&self) -> Option<PageNum> {
        self.composite
    }

    /// Runs `t` from the visible image to `(dark, bright)`.
    ///
    /// Returns when `t` finishes or the scheduler cancels the task. Either
    /// way the engine is idle afterwards, and the windows are mapped back
    /// onto the new image.
    pub(crate) fn run_transition(
        &mut self,
        t: &'static dyn Transition,
        (new_dark, new_bright): (PageNum, PageNum),
    ) {
        let (mut old_dark, mut old_bright) = self.visible.pair();
        let one_copy = old_dark == old_bright && new_dark == new_bright;
        let mut cursors = [0; 2];
        t.init(&mut cursors);

        log::debug!(
            "transition from ({}, {}) to ({}, {}){}",
            old_dark,
            old_bright,
            new_dark,
            new_bright,
            if one_copy { ", mono" } else { "" },
        );

        let mut cycles = 0usize;
        loop {
            if self.sched.sleep(t.delay(), self.pages) == Wake::Cancel {
                log::info!(
                    "transition cancelled after {} cycles, leaving ({}, {})",
                    cycles,
                    old_dark,
                    old_bright,
                );
                break;
            }

            measurement::sig_b_set();
            scopeguard::defer! { measurement::sig_b_clear() }

            let composite = alloc_composite(
                &mut self.map,
                &[new_dark, new_bright, old_dark, old_bright],
            );
            let [dark_cursor, bright_cursor] = &mut cursors;

            let mut step = composite_channel(
                &mut self.map,
                self.pages,
                t,
                Channel::Dark,
                (old_dark, new_dark, composite),
                dark_cursor,
            );

            let bright = if one_copy {
                composite
            } else {
                let b = partner(composite);
                let s = composite_channel(
                    &mut self.map,
                    self.pages,
                    t,
                    Channel::Bright,
                    (old_bright, new_bright, b),
                    bright_cursor,
                );
                if s == Step::Finished {
                    step = s;
                }
                b
            };

            self.visible.publish(composite, bright, &self.thread);
            self.composite = Some(composite);
            old_dark = composite;
            old_bright = bright;
            cycles += 1;

            log::trace!(
                "cycle {}: composite ({}, {}), cursors {:?}",
                cycles,
                composite,
                bright,
                cursors,
            );

            if step == Step::Finished {
                log::debug!("transition finished after {} cycles", cycles);
                break;
            }
        }

        self.transition = None;
        self.map.map_low(new_dark);
        self.map.map_high(new_bright);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flicker::Visible;
    use crate::hw::Port;
    use crate::priority::Thread;
    use crate::{Window, PAGE_COUNT};
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Log(Vec<(Port, u8)>);

    impl Asic for Log {
        fn write_port(&mut self, port: Port, value: u8) {
            self.0.push((port, value))
        }
    }

    /// Scheduler that records what was visible at each sleep, and cancels
    /// after a set number of sleeps.
    struct Script<'v> {
        visible: &'v Visible,
        seen: Vec<(PageNum, PageNum)>,
        cancel_at: Option<usize>,
    }

    impl<'v> Script<'v> {
        fn new(visible: &'v Visible) -> Self {
            Script {
                visible,
                seen: vec![],
                cancel_at: None,
            }
        }
    }

    impl Sleep for Script<'_> {
        fn sleep(&mut self, _ticks: Ticks, _ram: &PageRam) -> Wake {
            self.seen.push(self.visible.pair());
            if Some(self.seen.len()) == self.cancel_at {
                Wake::Cancel
            } else {
                Wake::Resume
            }
        }
    }

    /// Reveals the new image two rows per cycle, counting calls.
    struct Wipe {
        old_calls: [AtomicUsize; 2],
        new_calls: [AtomicUsize; 2],
        inits: AtomicUsize,
    }

    impl Wipe {
        const fn new() -> Self {
            Wipe {
                old_calls: [AtomicUsize::new(0), AtomicUsize::new(0)],
                new_calls: [AtomicUsize::new(0), AtomicUsize::new(0)],
                inits: AtomicUsize::new(0),
            }
        }

        fn calls(&self, channel: Channel) -> (usize, usize) {
            let i = channel.index();
            (
                self.old_calls[i].load(Ordering::Relaxed),
                self.new_calls[i].load(Ordering::Relaxed),
            )
        }
    }

    impl Transition for Wipe {
        fn delay(&self) -> Ticks {
            3
        }

        fn init(&self, cursors: &mut [usize; 2]) {
            assert_eq!(*cursors, [0, 0]);
            self.inits.fetch_add(1, Ordering::Relaxed);
        }

        fn composite_old(&self, cx: &mut Cycle<'_>) {
            self.old_calls[cx.channel.index()].fetch_add(1, Ordering::Relaxed);
            gfx::copy(cx.src, cx.dst);
        }

        fn composite_new(&self, cx: &mut Cycle<'_>) -> Step {
            self.new_calls[cx.channel.index()].fetch_add(1, Ordering::Relaxed);
            *cx.cursor += 2;
            let rows = *cx.cursor;
            for y in 0..rows {
                cx.dst.row_mut(y).copy_from_slice(cx.src.row(y));
            }
            if rows >= gfx::HEIGHT {
                Step::Finished
            } else {
                Step::Continue
            }
        }
    }

    fn fill(page: &mut Page, byte: u8) {
        for b in page.iter_mut() {
            *b = byte;
        }
    }

    fn controller<'p>(
        pages: &'p mut PageRam,
        visible: &'p Visible,
        script: Script<'p>,
    ) -> Dmd<'p, Log, Script<'p>> {
        let thread = Thread::new_checked().unwrap();
        Dmd::new(Log::default(), script, pages, visible, thread)
    }

    #[test]
    fn mono_to_mono_skips_bright_channel() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        dmd.alloc_low();
        fill(dmd.low_mut(), 0xFF);
        let new = dmd.low_page();
        dmd.schedule_transition(&WIPE);
        assert!(dmd.in_transition());
        dmd.show_low();

        assert!(!dmd.in_transition());
        assert_eq!(WIPE.calls(Channel::Dark), (16, 16));
        assert_eq!(WIPE.calls(Channel::Bright), (0, 0));
        assert_eq!(WIPE.inits.load(Ordering::Relaxed), 1);

        let (dark, bright) = visible.pair();
        assert_eq!(dark, bright);
        assert_eq!(Some(dark), dmd.composite_page());
        assert_ne!(dark, new);
        assert_eq!(dmd.pages()[dark as usize], dmd.pages()[new as usize]);
        // Windows go back to the new image.
        assert_eq!((dmd.low_page(), dmd.high_page()), (new, new));
    }

    #[test]
    fn every_cycle_publishes_a_complete_pair() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        dmd.alloc_low_high();
        let (new_dark, new_bright) = (dmd.low_page(), dmd.high_page());
        fill(dmd.low_mut(), 0x0F);
        fill(dmd.high_mut(), 0xF0);
        dmd.schedule_transition(&WIPE);
        dmd.show_color();

        let (dark, bright) = visible.pair();
        assert_eq!(bright, partner(dark));
        assert_eq!(dmd.pages()[dark as usize][0], 0x0F);
        assert_eq!(dmd.pages()[bright as usize][0], 0xF0);
        for page in &[dark, bright] {
            assert!(![new_dark, new_bright].contains(page));
        }
        assert_eq!(WIPE.calls(Channel::Dark), (16, 16));
        assert_eq!(WIPE.calls(Channel::Bright), (16, 16));

        // Before the first cycle the old image was showing; after that, each
        // sleep sees the previous cycle's composite.
        let seen = &dmd.sched().seen;
        assert_eq!(seen.len(), 16);
        assert_eq!(seen[0], (0, 0));
        for pair in &seen[1..] {
            assert_eq!(pair.1, partner(pair.0));
            assert!((pair.0 as usize) < PAGE_COUNT);
        }
    }

    #[test]
    fn cursors_are_per_channel() {
        // Dark channel finishes in one cycle, bright never would; the run
        // still stops after the first cycle.
        struct Lopsided;
        impl Transition for Lopsided {
            fn delay(&self) -> Ticks {
                1
            }
            fn composite_old(&self, cx: &mut Cycle<'_>) {
                gfx::copy(cx.src, cx.dst)
            }
            fn composite_new(&self, cx: &mut Cycle<'_>) -> Step {
                *cx.cursor += 1;
                match cx.channel {
                    Channel::Dark => Step::Finished,
                    Channel::Bright => {
                        assert_eq!(*cx.cursor, 1);
                        Step::Continue
                    }
                }
            }
        }
        static LOPSIDED: Lopsided = Lopsided;

        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));
        dmd.alloc_low_high();
        dmd.schedule_transition(&LOPSIDED);
        dmd.show_color();
        assert!(!dmd.in_transition());
        assert_eq!(dmd.sched().seen.len(), 1);
    }

    #[test]
    fn mono_to_color_reads_old_page_for_both_channels() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        // Old image: mono, all lit.
        dmd.alloc_low();
        let old = dmd.low_page();
        fill(dmd.low_mut(), 0xFF);
        dmd.show_low();
        assert_eq!(visible.pair(), (old, old));
        let untouched = dmd.pages()[partner(old) as usize].clone();

        dmd.alloc_low_high();
        dmd.schedule_transition(&WIPE);
        // Stop partway: first sleep resumes, second cancels.
        dmd.sched_mut().cancel_at = Some(2);
        dmd.show_color();

        let (dark, bright) = visible.pair();
        assert_eq!(bright, partner(dark));
        // Rows 0-1 are the new (blank) image, the rest still the old one on
        // both channels.
        for &page in &[dark, bright] {
            let page = &dmd.pages()[page as usize];
            assert!(page.row(1).iter().all(|&b| b == 0));
            assert!(page.row(2).iter().all(|&b| b == 0xFF));
        }
        // Nothing was written next to the old page.
        assert_eq!(dmd.pages()[partner(old) as usize], untouched);
    }

    #[test]
    fn color_to_color_reads_both_old_pages() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        dmd.alloc_low_high();
        let (old_dark, old_bright) = (dmd.low_page(), dmd.high_page());
        fill(dmd.low_mut(), 0x11);
        fill(dmd.high_mut(), 0x22);
        dmd.show_color();

        dmd.alloc_low_high();
        fill(dmd.low_mut(), 0x33);
        fill(dmd.high_mut(), 0x44);
        dmd.schedule_transition(&WIPE);
        // Stop after the first cycle, while the old pair is still the source.
        dmd.sched_mut().cancel_at = Some(2);
        dmd.show_color();

        assert!(dmd.pages()[old_dark as usize].iter().all(|&b| b == 0x11));
        assert!(dmd.pages()[old_bright as usize].iter().all(|&b| b == 0x22));
        let (dark, bright) = visible.pair();
        for &(page, old, new) in &[(dark, 0x11, 0x33), (bright, 0x22, 0x44)] {
            let page = &dmd.pages()[page as usize];
            assert!(page.row(1).iter().all(|&b| b == new));
            assert!(page.row(2).iter().all(|&b| b == old));
        }
    }

    #[test]
    fn color_to_mono() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        dmd.alloc_low_high();
        fill(dmd.low_mut(), 0x0F);
        fill(dmd.high_mut(), 0xF0);
        dmd.show_color();

        dmd.alloc_low();
        fill(dmd.low_mut(), 0x5A);
        dmd.schedule_transition(&WIPE);
        dmd.show_low();

        let (dark, bright) = visible.pair();
        assert_ne!(dark, bright);
        assert!(dmd.pages()[dark as usize].iter().all(|&b| b == 0x5A));
        assert!(dmd.pages()[bright as usize].iter().all(|&b| b == 0x5A));
        assert_eq!(WIPE.calls(Channel::Bright), (16, 16));
    }

    #[test]
    fn cancel_returns_to_idle() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        dmd.alloc_low();
        dmd.schedule_transition(&WIPE);
        dmd.sched_mut().cancel_at = Some(4);
        dmd.show_low();

        assert!(!dmd.in_transition());
        assert_eq!(WIPE.calls(Channel::Dark), (3, 3));
        // The third composite is still up.
        let composite = dmd.composite_page().unwrap();
        assert_eq!(visible.pair(), (composite, composite));
        assert_eq!(dmd.sched().seen[3], (composite, composite));

        // Cut works again, and so does another transition.
        dmd.show_low();
        let page = dmd.low_page();
        assert_eq!(visible.pair(), (page, page));
        dmd.sched_mut().cancel_at = None;
        dmd.schedule_transition(&WIPE);
        assert!(dmd.in_transition());
    }

    #[test]
    fn completion_allows_reschedule() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        for _ in 0..3 {
            dmd.alloc_low();
            dmd.schedule_transition(&WIPE);
            dmd.show_mono(Window::Low);
            assert!(!dmd.in_transition());
        }
        assert_eq!(WIPE.inits.load(Ordering::Relaxed), 3);
        assert_eq!(WIPE.calls(Channel::Dark), (48, 48));
    }

    #[test]
    fn scheduling_does_not_change_display() {
        static WIPE: Wipe = Wipe::new();
        let mut pages: PageRam = Default::default();
        let visible = Visible::new();
        let mut dmd = controller(&mut pages, &visible, Script::new(&visible));

        dmd.alloc_low();
        dmd.show_low();
        let before = visible.pair();
        dmd.alloc_low();
        dmd.schedule_transition(&WIPE);
        assert_eq!(visible.pair(), before);
        dmd.reset_transition();
        assert!(!dmd.in_transition());
        assert_eq!(visible.pair(), before);
        assert_eq!(WIPE.calls(Channel::Dark), (0, 0));
    }

    #[test]
    fn composite_may_overwrite_its_own_source() {
        let mut pages: PageRam = Default::default();
        fill(&mut pages[3], 0xAA);
        with_pair(&mut pages, 3, 3, |src, dst| {
            gfx::clear(dst);
            assert_eq!(src[0], 0xAA);
        });
        with_pair(&mut pages, 3, 1, |src, dst| gfx::copy(src, dst));
        with_pair(&mut pages, 1, 5, |src, dst| gfx::copy(src, dst));
        assert!(pages[5].iter().all(|&b| b == 0));
        assert!(pages[1].iter().all(|&b| b == 0));
    }
}
