//! Worklist propagation kernel
//!
//! One launch consumes the current seed list. Every block takes
//! [`PROPAGATION_BLOCK`] seeds, one per thread, and re-examines each seed's
//! neighbors. Neighbors that change are pushed on a block-local stack and
//! become the active set of the next micro-round inside the same launch,
//! a block-sized batch at a time, for up to [`MICRO_ROUNDS`] micro-rounds.
//! Whatever is left on the stack when the block stops is appended to the
//! next seed list.
//!
//! A block keeps going only while the stack can absorb a full micro-round of
//! worst-case growth (`PROPAGATION_BLOCK * fan_out` pushes) after the next
//! batch has been taken off it. The stack therefore never exceeds
//! [`local_stack_capacity`], and one block never appends more than that.

use tilemorph_core::{DeviceGrid, Grid1d};

use super::check_extent;
use crate::connectivity::Connectivity;
use crate::error::ReconResult;
use crate::seeds::{Seed, SeedCounter, SeedList, append_block};
use crate::stencil::{ExtremumOp, Neighborhood};

/// Threads (seeds) per propagation block
pub const PROPAGATION_BLOCK: usize = 64;

/// Micro-round cap of one propagation launch
pub const MICRO_ROUNDS: usize = 100;

/// Capacity of a block's local stack for a given fan-out.
///
/// Four block-sized batches of headroom on top of one micro-round of
/// worst-case growth; 512 entries for 4-connectivity, 768 for 8.
pub const fn local_stack_capacity(fan_out: usize) -> usize {
    PROPAGATION_BLOCK * (fan_out + 4)
}

/// What happens when a seed's neighbor is re-examined
pub trait PropagationRule: Sync {
    /// Neighbors of a seed to re-examine
    fn offsets(&self) -> &[(i32, i32)];

    /// Try to update `work` at (x, y).
    ///
    /// Returns true if this call changed the pixel, in which case the pixel
    /// is enqueued. The update must be atomic with respect to other threads
    /// updating the same pixel.
    fn update(&self, work: &DeviceGrid, mask: &DeviceGrid, x: u32, y: u32) -> bool;
}

/// Geodesic reconstruction step: recompute the pixel from its neighborhood
/// and clip it against the mask
#[derive(Debug, Clone, Copy)]
pub struct GeodesicRule<'a, O> {
    op: &'a O,
}

impl<'a, O: ExtremumOp> GeodesicRule<'a, O> {
    pub fn new(op: &'a O) -> Self {
        GeodesicRule { op }
    }
}

impl<O: ExtremumOp> PropagationRule for GeodesicRule<'_, O> {
    fn offsets(&self) -> &[(i32, i32)] {
        self.op.connectivity().offsets()
    }

    fn update(&self, work: &DeviceGrid, mask: &DeviceGrid, x: u32, y: u32) -> bool {
        let dir = self.op.direction();
        let n = Neighborhood::from_grid(work, x, y, dir.sentinel());
        let new = dir.clip(self.op.compute(&n), mask.load(x, y));
        dir.improves(new, n.center()) && dir.commit(work, x, y, new)
    }
}

/// Binary background fill: a pixel is entered once, if its mask value is 0
/// and it has not been reached yet
#[derive(Debug, Clone, Copy)]
pub struct FillRule {
    connectivity: Connectivity,
}

impl FillRule {
    /// Value written into reached pixels
    pub const FILL: f32 = 255.0;

    pub fn new(connectivity: Connectivity) -> Self {
        FillRule { connectivity }
    }
}

impl PropagationRule for FillRule {
    fn offsets(&self) -> &[(i32, i32)] {
        self.connectivity.offsets()
    }

    fn update(&self, work: &DeviceGrid, mask: &DeviceGrid, x: u32, y: u32) -> bool {
        mask.load(x, y) == 0.0 && work.compare_exchange(x, y, 0.0, Self::FILL).is_ok()
    }
}

/// One propagation round.
///
/// Reads the first `live` entries of `seeds`, updates `work` in place and
/// appends newly changed pixels to `next`. `next_counter` must be reset by
/// the caller. To be overflow-free, `next` needs
/// `div_up(live, PROPAGATION_BLOCK) * local_stack_capacity(fan_out)` entries;
/// a block whose reservation does not fit drops its seeds and latches the
/// counter's overflow flag.
pub fn propagate<R: PropagationRule>(
    work: &DeviceGrid,
    mask: &DeviceGrid,
    rule: &R,
    seeds: &SeedList,
    live: usize,
    next: &SeedList,
    next_counter: &SeedCounter,
) -> ReconResult<()> {
    check_extent(mask, work)?;
    let live = live.min(seeds.capacity());
    let offsets = rule.offsets();
    let capacity = local_stack_capacity(offsets.len());
    let burst = PROPAGATION_BLOCK * offsets.len();
    let grid = Grid1d::new(live, PROPAGATION_BLOCK)?;

    grid.launch(|block| {
        let mut stack: Vec<Seed> = Vec::with_capacity(capacity);
        // `None` marks a thread without a seed this micro-round
        let mut active: [Option<Seed>; PROPAGATION_BLOCK] = [None; PROPAGATION_BLOCK];
        for (t, slot) in active.iter_mut().enumerate() {
            *slot = block.item(t).map(|i| seeds.read(i));
        }

        for round in 0..MICRO_ROUNDS {
            for seed in active.iter().flatten() {
                for &(dx, dy) in offsets {
                    let (nx, ny) = (seed.x as i32 + dx, seed.y as i32 + dy);
                    if !work.contains(nx, ny) {
                        continue;
                    }
                    if rule.update(work, mask, nx as u32, ny as u32) {
                        stack.push(Seed::new(nx as u32, ny as u32));
                    }
                }
            }
            debug_assert!(stack.len() <= capacity);

            // barrier: thread 0 decides whether to run another micro-round
            let batch = stack.len().min(PROPAGATION_BLOCK);
            let go_on = round + 1 < MICRO_ROUNDS
                && batch > 0
                && stack.len() - batch + burst <= capacity;
            active = [None; PROPAGATION_BLOCK];
            if !go_on {
                break;
            }
            let start = stack.len() - batch;
            for (slot, seed) in active.iter_mut().zip(stack.drain(start..)) {
                *slot = Some(seed);
            }
        }

        append_block(next, next_counter, &stack);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::Extremum;
    use tilemorph_core::FPix;

    #[test]
    fn test_local_stack_capacity() {
        assert_eq!(local_stack_capacity(4), 512);
        assert_eq!(local_stack_capacity(8), 768);
    }

    #[test]
    fn test_propagate_line_converges_in_one_launch() {
        // A 1-pixel corridor; the seed at the left end walks to the right
        let mut work = FPix::new(50, 1).unwrap();
        work.set_pixel(0, 0, 7.0).unwrap();
        let work = DeviceGrid::upload(&work);
        let mask = DeviceGrid::filled(50, 1, 7.0).unwrap();

        let seeds = SeedList::with_capacity(1);
        seeds.write(0, Seed::new(0, 0));
        let next = SeedList::with_capacity(local_stack_capacity(4));
        let counter = SeedCounter::new();
        let op = Extremum::dilate(Connectivity::FourWay);

        propagate(&work, &mask, &GeodesicRule::new(&op), &seeds, 1, &next, &counter).unwrap();
        assert_eq!(counter.read_back(), 0);
        assert_eq!(work.download().unwrap().count_value(7.0), 50);
    }

    #[test]
    fn test_propagate_respects_mask() {
        let mut work = FPix::new(5, 1).unwrap();
        work.set_pixel(0, 0, 9.0).unwrap();
        let work = DeviceGrid::upload(&work);
        let mask = DeviceGrid::upload(&FPix::from_rows(&[[9.0, 9.0, 4.0, 9.0, 9.0]]).unwrap());

        let seeds = SeedList::with_capacity(1);
        seeds.write(0, Seed::new(0, 0));
        let next = SeedList::with_capacity(512);
        let counter = SeedCounter::new();
        let op = Extremum::dilate(Connectivity::FourWay);
        propagate(&work, &mask, &GeodesicRule::new(&op), &seeds, 1, &next, &counter).unwrap();

        let out = work.download().unwrap();
        assert_eq!(out.row(0), &[9.0, 9.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_fill_rule_enters_background_once() {
        let work = DeviceGrid::zeroed(3, 1).unwrap();
        let mask = DeviceGrid::upload(&FPix::from_rows(&[[0.0, 0.0, 255.0]]).unwrap());
        let rule = FillRule::new(Connectivity::FourWay);
        assert!(rule.update(&work, &mask, 1, 0));
        assert!(!rule.update(&work, &mask, 1, 0));
        assert!(!rule.update(&work, &mask, 2, 0));
        assert_eq!(work.load(1, 0), 255.0);
    }

    #[test]
    fn test_propagate_spills_to_next_list() {
        // An open 8-connected field: the frontier outgrows the local stack,
        // so the block must stop early and hand the rest to the next round
        let (w, h) = (200u32, 200u32);
        let mut work = FPix::new(w, h).unwrap();
        work.set_pixel(100, 100, 1.0).unwrap();
        let work = DeviceGrid::upload(&work);
        let mask = DeviceGrid::filled(w, h, 1.0).unwrap();

        let seeds = SeedList::with_capacity(1);
        seeds.write(0, Seed::new(100, 100));
        let next = SeedList::with_capacity(local_stack_capacity(8));
        let counter = SeedCounter::new();
        let op = Extremum::dilate(Connectivity::EightWay);
        propagate(&work, &mask, &GeodesicRule::new(&op), &seeds, 1, &next, &counter).unwrap();

        let spilled = counter.read_back();
        assert!(spilled > 0);
        assert!(spilled <= local_stack_capacity(8));
        assert!(!counter.overflowed());
        for seed in next.read_back(spilled) {
            assert_eq!(work.load(seed.x, seed.y), 1.0);
        }
    }
}
