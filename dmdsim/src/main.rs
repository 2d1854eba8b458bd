//! Runs a display effect on the simulated panel and prints what it shows.
//!
//! ```bash
//! # 4-shade color bars
//! dmdsim color-test
//!
//! # Flash a diamond, bringing it in with a box fade
//! dmdsim flasher --transition box-fade
//!
//! # Watch a scroll get interrupted partway, showing only the end result
//! dmdsim splash -t scroll-up --cancel-after 12 --quiet
//! ```

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use dmdsim::panel::Frame;
use dmdsim::{Screen, Sim, SimDmd};
use gfx::PAGE_BYTES;
use wpcdmd::transition::Transition;
use wpcdmd_fx_common::Deff;
use wpcdmd_fx_deffs::{ColorTest, Flasher, Splash, DIAMOND};

#[derive(Parser)]
#[command(name = "dmdsim")]
#[command(version)]
#[command(about = "Runs a display effect on a simulated WPC dot-matrix display")]
struct Cli {
    /// Effect to run
    #[arg(value_enum, default_value_t = Effect::ColorTest)]
    effect: Effect,

    /// Transition from the startup screen to the effect
    #[arg(short, long, value_enum)]
    transition: Option<Trans>,

    /// Cancel whatever is running once this many refreshes have passed
    #[arg(long, value_name = "REFRESHES")]
    cancel_after: Option<u64>,

    /// Print only the last frame
    #[arg(short, long)]
    quiet: bool,

    /// Log driver activity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Effect {
    ColorTest,
    Flasher,
    Splash,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Trans {
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    BoxFade,
}

impl Trans {
    fn descriptor(self) -> &'static dyn Transition {
        match self {
            Trans::ScrollUp => &wpcdmd_fx_trans::SCROLL_UP,
            Trans::ScrollDown => &wpcdmd_fx_trans::SCROLL_DOWN,
            Trans::ScrollLeft => &wpcdmd_fx_trans::SCROLL_LEFT,
            Trans::ScrollRight => &wpcdmd_fx_trans::SCROLL_RIGHT,
            Trans::BoxFade => &wpcdmd_fx_trans::BOX_FADE,
        }
    }
}

/// Prints frames to a terminal, separated by a rule.
struct Term<W> {
    out: W,
    quiet: bool,
    frames: usize,
    last: Option<Frame>,
    error: Option<io::Error>,
}

impl<W: Write> Term<W> {
    fn print(&mut self, frame: &Frame) -> io::Result<()> {
        writeln!(self.out, "{}", "-".repeat(gfx::WIDTH))?;
        write!(self.out, "{}", frame)?;
        self.out.flush()
    }

    /// Prints the final frame if it hasn't been already, and reports any
    /// error from along the way.
    fn finish(mut self) -> io::Result<usize> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if self.quiet {
            if let Some(frame) = self.last.take() {
                self.print(&frame)?;
            }
        }
        Ok(self.frames)
    }
}

impl<W: Write> Screen for Term<W> {
    fn show(&mut self, frame: &Frame) {
        self.frames += 1;
        if self.quiet {
            self.last = Some(frame.clone());
        } else if self.error.is_none() {
            self.error = self.print(frame).err();
        }
    }
}

/// A two-page image: dark page has a border, bright page has stripes, so
/// the overlap is full intensity.
fn splash_image() -> [[u8; PAGE_BYTES]; 2] {
    let mut dark = wpcdmd::Page::blank();
    gfx::draw_border(&mut dark);
    let mut bright = wpcdmd::Page::blank();
    for y in (0..gfx::HEIGHT).step_by(4) {
        gfx::draw_hline(&mut bright, y);
    }
    [*dark, *bright]
}

fn run_effect<S: Screen>(effect: Effect, dmd: &mut SimDmd<'_, S>) {
    match effect {
        Effect::ColorTest => {
            ColorTest.run(dmd);
            dmd.sleep(30);
        }
        Effect::Flasher => Flasher {
            bitmap: &DIAMOND,
            x: 48,
            y: 8,
            width: 32,
            height: 16,
            rate: 8,
            flips: 6,
        }
        .run(dmd),
        Effect::Splash => Splash {
            image: &splash_image(),
            hold: 30,
        }
        .run(dmd),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    )
    .init();

    let term = Term {
        out: io::stdout().lock(),
        quiet: cli.quiet,
        frames: 0,
        last: None,
        error: None,
    };
    let mut sim = Sim::new(term).cancel_after(cli.cancel_after);

    sim.run(|dmd| {
        // Something to transition away from.
        dmd.alloc_low_clean();
        dmd.draw_hline(gfx::HEIGHT / 2);
        dmd.show_low();
        dmd.sleep(3);

        if let Some(t) = cli.transition {
            log::info!("running {:?} with {:?}", cli.effect, t);
            dmd.schedule_transition(t.descriptor());
        }
        run_effect(cli.effect, dmd);
    });

    let frames = sim
        .into_screen()
        .finish()
        .context("writing frames to stdout")?;
    log::info!("{} frames", frames);
    Ok(())
}
