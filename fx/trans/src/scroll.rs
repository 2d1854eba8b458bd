use gfx::{Page, HEIGHT, STRIDE};
use wpcdmd::sched::Ticks;
use wpcdmd::transition::{Cycle, Step, Transition};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// New image enters at the bottom edge.
    Up,
    /// New image enters at the top edge.
    Down,
    /// New image enters at the right edge.
    Left,
    /// New image enters at the left edge.
    Right,
}

/// Pushes the old image off one edge of the display while the new image
/// follows it in from the opposite edge.
///
/// The cursor counts how much of the new image is showing: rows for vertical
/// scrolls, bytes (8 pixels) for horizontal ones. Each cycle's source for the
/// old side is the previous composite, so `composite_old` only moves it by
/// the distance this cycle covers.
#[derive(Debug)]
pub struct Scroll {
    direction: Direction,
    step: usize,
    delay: Ticks,
}

impl Scroll {
    /// Moves `step` rows or bytes every `delay` refreshes.
    pub const fn new(direction: Direction, step: usize, delay: Ticks) -> Self {
        Scroll {
            direction,
            step,
            delay,
        }
    }

    fn limit(&self) -> usize {
        match self.direction {
            Direction::Up | Direction::Down => HEIGHT,
            Direction::Left | Direction::Right => STRIDE,
        }
    }

    /// How far this cycle gets, given how far the last one got.
    fn advance(&self, cursor: usize) -> usize {
        (cursor + self.step.max(1)).min(self.limit())
    }
}

/// Copies rows `src_rows` of `src` to rows starting at `dst_row` in `dst`.
fn move_rows(
    src: &Page,
    src_rows: core::ops::Range<usize>,
    dst: &mut Page,
    dst_row: usize,
) {
    let len = (src_rows.end - src_rows.start) * STRIDE;
    let from = src_rows.start * STRIDE;
    let to = dst_row * STRIDE;
    dst[to..to + len].copy_from_slice(&src[from..from + len]);
}

/// Like `move_rows`, but for a range of byte columns in every row.
fn move_columns(
    src: &Page,
    src_cols: core::ops::Range<usize>,
    dst: &mut Page,
    dst_col: usize,
) {
    let width = src_cols.end - src_cols.start;
    for y in 0..HEIGHT {
        dst.row_mut(y)[dst_col..dst_col + width]
            .copy_from_slice(&src.row(y)[src_cols.clone()]);
    }
}

impl Transition for Scroll {
    fn delay(&self) -> Ticks {
        self.delay
    }

    fn composite_old(&self, cx: &mut Cycle<'_>) {
        let d = self.advance(*cx.cursor) - *cx.cursor;
        let keep = self.limit() - d;
        match self.direction {
            Direction::Up => move_rows(cx.src, d..HEIGHT, cx.dst, 0),
            Direction::Down => move_rows(cx.src, 0..keep, cx.dst, d),
            Direction::Left => move_columns(cx.src, d..STRIDE, cx.dst, 0),
            Direction::Right => move_columns(cx.src, 0..keep, cx.dst, d),
        }
    }

    fn composite_new(&self, cx: &mut Cycle<'_>) -> Step {
        let n = self.advance(*cx.cursor);
        *cx.cursor = n;
        let keep = self.limit() - n;
        match self.direction {
            Direction::Up => move_rows(cx.src, 0..n, cx.dst, keep),
            Direction::Down => move_rows(cx.src, keep..HEIGHT, cx.dst, 0),
            Direction::Left => move_columns(cx.src, 0..n, cx.dst, keep),
            Direction::Right => move_columns(cx.src, keep..STRIDE, cx.dst, 0),
        }
        if n == self.limit() {
            Step::Finished
        } else {
            Step::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpcdmd::transition::Channel;

    /// Page whose every row (or column) holds its own index, so that moves
    /// are easy to spot.
    fn numbered(by_row: bool, base: u8) -> Page {
        let mut page = Page::blank();
        for y in 0..HEIGHT {
            for (x, b) in page.row_mut(y).iter_mut().enumerate() {
                *b = base + if by_row { y as u8 } else { x as u8 };
            }
        }
        page
    }

    /// Runs one cycle of `t` on a single channel.
    fn cycle(
        t: &Scroll,
        old: &Page,
        new: &Page,
        cursor: &mut usize,
    ) -> (Page, Step) {
        let mut dst = Page::blank();
        t.composite_old(&mut Cycle {
            channel: Channel::Dark,
            src: old,
            dst: &mut dst,
            cursor: &mut *cursor,
        });
        let step = t.composite_new(&mut Cycle {
            channel: Channel::Dark,
            src: new,
            dst: &mut dst,
            cursor: &mut *cursor,
        });
        (dst, step)
    }

    #[test]
    fn up_pushes_old_rows_off_the_top() {
        let t = Scroll::new(Direction::Up, 4, 1);
        let (old, new) = (numbered(true, 0), numbered(true, 100));
        let mut cursor = 0;
        let (dst, step) = cycle(&t, &old, &new, &mut cursor);
        assert_eq!(step, Step::Continue);
        assert_eq!(cursor, 4);
        assert_eq!(dst.row(0)[0], 4);
        assert_eq!(dst.row(27)[0], 31);
        assert_eq!(dst.row(28)[0], 100);
        assert_eq!(dst.row(31)[0], 103);
    }

    #[test]
    fn second_cycle_moves_previous_composite_one_step() {
        let t = Scroll::new(Direction::Up, 2, 1);
        let (old, new) = (numbered(true, 0), numbered(true, 100));
        let mut cursor = 0;
        let (first, _) = cycle(&t, &old, &new, &mut cursor);
        let (dst, step) = cycle(&t, &first, &new, &mut cursor);
        assert_eq!(step, Step::Continue);
        assert_eq!(cursor, 4);
        let rows: Vec<u8> = (0..HEIGHT).map(|y| dst.row(y)[0]).collect();
        let expected: Vec<u8> = (4..32).chain(100..104).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn down_brings_new_rows_from_the_top() {
        let t = Scroll::new(Direction::Down, 8, 1);
        let (old, new) = (numbered(true, 0), numbered(true, 100));
        let mut cursor = 0;
        let (dst, _) = cycle(&t, &old, &new, &mut cursor);
        assert_eq!(dst.row(0)[0], 124);
        assert_eq!(dst.row(7)[0], 131);
        assert_eq!(dst.row(8)[0], 0);
        assert_eq!(dst.row(31)[0], 23);
    }

    #[test]
    fn horizontal_scrolls_move_columns() {
        let (old, new) = (numbered(false, 0), numbered(false, 100));

        let mut cursor = 0;
        let t = Scroll::new(Direction::Left, 2, 1);
        let (dst, _) = cycle(&t, &old, &new, &mut cursor);
        assert_eq!(&dst.row(5)[..3], &[2, 3, 4]);
        assert_eq!(&dst.row(5)[13..], &[15, 100, 101]);

        let mut cursor = 0;
        let t = Scroll::new(Direction::Right, 2, 1);
        let (dst, _) = cycle(&t, &old, &new, &mut cursor);
        assert_eq!(&dst.row(5)[..3], &[114, 115, 0]);
        assert_eq!(dst.row(5)[15], 13);
    }

    #[test]
    fn every_direction_ends_on_the_new_image() {
        let (old, new) = (numbered(true, 0), numbered(false, 50));
        let all = [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ];
        for &dir in &all {
            // A step that doesn't divide the size evenly.
            let t = Scroll::new(dir, 3, 1);
            let mut cursor = 0;
            let mut cycles = 0;
            let mut shown = old.clone();
            loop {
                let (dst, step) = cycle(&t, &shown, &new, &mut cursor);
                cycles += 1;
                if step == Step::Finished {
                    assert_eq!(dst, new, "{:?}", dir);
                    break;
                }
                assert_ne!(dst, new, "{:?}", dir);
                shown = dst;
            }
            assert_eq!(cycles, (t.limit() + 2) / 3);
        }
    }
}
