use gfx::{Page, HEIGHT, STRIDE};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use wpcdmd::sched::Ticks;
use wpcdmd::transition::{Cycle, Step, Transition};

/// Boxes are 8x8 pixels: one byte wide, eight rows tall.
const BOX_ROWS: usize = 8;
const BOXES: usize = STRIDE * (HEIGHT / BOX_ROWS);

/// Dissolves from the old image to the new one an 8x8 box at a time, in a
/// scrambled but repeatable order.
///
/// The cursor counts boxes revealed. Both channels reveal the same boxes in
/// the same order, so 4-shade images dissolve cleanly.
#[derive(Debug)]
pub struct BoxFade {
    per_cycle: usize,
    delay: Ticks,
    seed: u64,
}

impl BoxFade {
    pub const fn new(per_cycle: usize, delay: Ticks, seed: u64) -> Self {
        BoxFade {
            per_cycle,
            delay,
            seed,
        }
    }

    /// The order boxes are revealed in. Recomputed rather than stored, since
    /// the descriptor can't be mutated.
    fn order(&self) -> [u8; BOXES] {
        let mut order = [0u8; BOXES];
        for (i, b) in order.iter_mut().enumerate() {
            *b = i as u8;
        }
        order.shuffle(&mut SmallRng::seed_from_u64(self.seed));
        order
    }
}

fn copy_box(src: &Page, dst: &mut Page, b: usize) {
    let (col, top) = (b % STRIDE, (b / STRIDE) * BOX_ROWS);
    for y in top..top + BOX_ROWS {
        dst.row_mut(y)[col] = src.row(y)[col];
    }
}

impl Transition for BoxFade {
    fn delay(&self) -> Ticks {
        self.delay
    }

    fn composite_old(&self, cx: &mut Cycle<'_>) {
        gfx::copy(cx.src, cx.dst)
    }

    fn composite_new(&self, cx: &mut Cycle<'_>) -> Step {
        let shown = (*cx.cursor + self.per_cycle.max(1)).min(BOXES);
        *cx.cursor = shown;
        for &b in &self.order()[..shown] {
            copy_box(cx.src, cx.dst, b as usize);
        }
        if shown == BOXES {
            Step::Finished
        } else {
            Step::Continue
        }
    }
}
