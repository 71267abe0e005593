//! Host orchestrator for morphological reconstruction
//!
//! Reconstruction repeats a clipped dilation (or erosion) of the work image
//! until nothing changes. Two strategies are available:
//!
//! - **Bulk** (`max_iter > 0`): up to `max_iter` full-grid passes, stopping
//!   early once a pass changes no pixel.
//! - **Worklist** (`max_iter == 0`): two full-grid passes produce the first
//!   seed list, then propagation rounds run until a round appends no seeds.
//!
//! Each launch completes before the host reads back the seed counter or tile
//! flags and decides whether to launch again.

use log::{debug, trace, warn};
use tilemorph_core::{DeviceGrid, FPix, div_up};

use crate::connectivity::Connectivity;
use crate::error::{ReconError, ReconResult};
use crate::kernels::{
    self, FillRule, GeodesicRule, PROPAGATION_BLOCK, PropagationRule, bulk_grid, bulk_pass,
    extract_seeds, local_stack_capacity, propagate, seed_border,
};
use crate::seeds::{SeedCounter, SeedList, TileFlags};
use crate::stencil::{Direction, Extremum, ExtremumOp, validate_op};

/// Options for reconstruction
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// Neighbor set of the stencil and of propagation
    pub connectivity: Connectivity,
    /// Bulk pass budget; 0 runs the worklist strategy to convergence
    pub max_iter: u32,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::EightWay,
            max_iter: 0,
        }
    }
}

impl ReconstructOptions {
    /// Create new options with the specified connectivity
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            connectivity,
            ..Self::default()
        }
    }

    /// Set the connectivity
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Limit the run to `max_iter` bulk passes
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }
}

/// Strategy picked for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Repeated full-grid passes
    Bulk,
    /// Seed extraction followed by propagation rounds
    Worklist,
}

/// What a reconstruction run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructStats {
    pub strategy: Strategy,
    /// Kernel launches issued
    pub launches: usize,
    /// Value read back after each launch that has one: the number of changed
    /// pixels for a bulk pass, the seed counter for extraction and
    /// propagation launches
    pub history: Vec<usize>,
    /// True if the run reached the fixed point; false if the bulk budget ran
    /// out first
    pub converged: bool,
    /// True if a seed list overflowed and the run finished with bulk passes
    pub overflow_recovered: bool,
}

impl ReconstructStats {
    fn new(strategy: Strategy) -> Self {
        ReconstructStats {
            strategy,
            launches: 0,
            history: Vec::new(),
            converged: false,
            overflow_recovered: false,
        }
    }
}

/// Reusable scratch state of the reconstruction engine
///
/// Holds the two seed lists and the seed counter. Lists keep their capacity
/// between runs; no values carry over.
#[derive(Debug, Default)]
pub struct Reconstructor {
    current: SeedList,
    next: SeedList,
    counter: SeedCounter,
    seed_limit: Option<usize>,
}

/// Grow `list` to hold `required` entries, never past `limit`.
fn grow_list(list: &mut SeedList, required: usize, live: usize, limit: Option<usize>) -> bool {
    match limit {
        None => list.ensure_capacity(required, live),
        Some(limit) => {
            let target = required.min(limit);
            if list.capacity() >= target {
                return false;
            }
            *list = SeedList::with_capacity(target);
            true
        }
    }
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose seed lists never grow past `limit` entries.
    ///
    /// Appends that do not fit are refused and the run finishes with bulk
    /// passes, so this exercises overflow recovery.
    #[doc(hidden)]
    pub fn with_seed_capacity_limit(limit: usize) -> Self {
        Reconstructor {
            seed_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Capacity of the two seed lists, (current, next)
    pub fn seed_capacity(&self) -> (usize, usize) {
        (self.current.capacity(), self.next.capacity())
    }

    /// Reconstruct `work` under `mask` in place.
    ///
    /// `temp` is a scratch grid of the same extent. With `max_iter > 0` at
    /// most `max_iter` bulk passes run; with `max_iter == 0` the worklist
    /// strategy runs to convergence.
    ///
    /// The result is only the true reconstruction if `work` starts on the
    /// inner side of `mask` (below it for dilation, above it for erosion),
    /// and a custom op must be monotone or the worklist may never drain.
    ///
    /// # Errors
    ///
    /// Returns `ReconError::DimensionMismatch` if the grids differ in extent,
    /// `ReconError::InvalidParameters` if `temp` is the same grid as `work`
    /// or `mask`, and `ReconError::ConnectivityMismatch` if `op` is
    /// inconsistent. All are checked before anything is launched.
    pub fn run<O: ExtremumOp>(
        &mut self,
        work: &DeviceGrid,
        mask: &DeviceGrid,
        temp: &DeviceGrid,
        max_iter: u32,
        op: &O,
    ) -> ReconResult<ReconstructStats> {
        kernels::check_extent(mask, work)?;
        kernels::check_extent(mask, temp)?;
        if std::ptr::eq(work, temp) || std::ptr::eq(mask, temp) {
            return Err(ReconError::InvalidParameters(
                "scratch grid must not alias work or mask".to_string(),
            ));
        }
        validate_op(op)?;

        let strategy = if max_iter > 0 {
            Strategy::Bulk
        } else {
            Strategy::Worklist
        };
        debug!(
            "reconstruct {}x{}: {:?} {:?}, {:?} strategy",
            mask.width(),
            mask.height(),
            op.direction(),
            op.connectivity(),
            strategy
        );

        let mut stats = ReconstructStats::new(strategy);
        match strategy {
            Strategy::Bulk => bulk_rounds(work, mask, temp, op, max_iter, &mut stats)?,
            Strategy::Worklist => self.worklist(work, mask, temp, op, &mut stats)?,
        }
        debug!(
            "reconstruct done: {} launches, converged {}",
            stats.launches, stats.converged
        );
        Ok(stats)
    }

    fn worklist<O: ExtremumOp>(
        &mut self,
        work: &DeviceGrid,
        mask: &DeviceGrid,
        temp: &DeviceGrid,
        op: &O,
        stats: &mut ReconstructStats,
    ) -> ReconResult<()> {
        bulk_pass(work, temp, mask, op, None)?;
        stats.launches += 1;

        // one seed per pixel at most
        let pixels = (mask.width() as usize) * (mask.height() as usize);
        grow_list(&mut self.current, pixels, 0, self.seed_limit);
        self.counter.reset();
        extract_seeds(temp, work, mask, op, &self.current, &self.counter)?;
        stats.launches += 1;
        let live = self.counter.read_back();
        stats.history.push(live);
        trace!("seed extraction: {} seeds", live);

        let rule = GeodesicRule::new(op);
        let drained = !self.counter.overflowed() && self.drain(work, mask, &rule, live, stats)?;
        if drained {
            stats.converged = true;
        } else {
            warn!("seed list overflow, finishing with bulk passes");
            stats.overflow_recovered = true;
            bulk_rounds(work, mask, temp, op, u32::MAX, stats)?;
        }
        Ok(())
    }

    /// Run propagation rounds from the first `live` entries of the current
    /// list until a round appends nothing.
    ///
    /// Returns false if a round overflowed the next list; `work` is then
    /// partially propagated but still on the inner side of the mask.
    fn drain<R: PropagationRule>(
        &mut self,
        work: &DeviceGrid,
        mask: &DeviceGrid,
        rule: &R,
        mut live: usize,
        stats: &mut ReconstructStats,
    ) -> ReconResult<bool> {
        let per_block = local_stack_capacity(rule.offsets().len());
        let mut round = 0usize;

        while live > 0 {
            let required = div_up(live, PROPAGATION_BLOCK) * per_block;
            let before = self.next.capacity();
            if grow_list(&mut self.next, required, live, self.seed_limit) {
                debug!(
                    "seed list grown {} -> {} for {} live seeds",
                    before,
                    self.next.capacity(),
                    live
                );
            }

            self.counter.reset();
            propagate(work, mask, rule, &self.current, live, &self.next, &self.counter)?;
            stats.launches += 1;
            round += 1;

            let produced = self.counter.read_back();
            stats.history.push(produced);
            trace!("propagation round {}: {} -> {} seeds", round, live, produced);
            if self.counter.overflowed() {
                return Ok(false);
            }

            std::mem::swap(&mut self.current, &mut self.next);
            live = produced;
        }
        Ok(true)
    }

    /// Fill the background reachable from the image border.
    ///
    /// `marker` becomes 255 on every pixel connected to the border through
    /// pixels where `src` is 0, and 0 elsewhere.
    pub fn fill_from_border(
        &mut self,
        src: &DeviceGrid,
        marker: &DeviceGrid,
        connectivity: Connectivity,
    ) -> ReconResult<ReconstructStats> {
        kernels::check_extent(src, marker)?;
        let mut stats = ReconstructStats::new(Strategy::Worklist);

        let border = kernels::border_pixel_count(src.width(), src.height());
        grow_list(&mut self.current, border, 0, self.seed_limit);
        self.counter.reset();
        seed_border(src, marker, &self.current, &self.counter)?;
        stats.launches += 1;
        let live = self.counter.read_back();
        stats.history.push(live);
        debug!("border fill: {} border seeds", live);

        let drained = !self.counter.overflowed()
            && self.drain(marker, src, &FillRule::new(connectivity), live, &mut stats)?;
        if drained {
            stats.converged = true;
        } else {
            // same fixed point: dilate the marker under "255 where src is 0"
            warn!("seed list overflow in border fill, finishing with bulk passes");
            stats.overflow_recovered = true;
            let ceiling = DeviceGrid::upload(
                &src.download()?
                    .map(|v| if v == 0.0 { FillRule::FILL } else { 0.0 }),
            );
            let temp = DeviceGrid::zeroed(src.width(), src.height())?;
            let op = Extremum::dilate(connectivity);
            bulk_rounds(marker, &ceiling, &temp, &op, u32::MAX, &mut stats)?;
        }
        Ok(stats)
    }
}

/// Up to `max_iter` bulk passes, ping-ponging between `work` and `temp`.
///
/// Stops early once the tile flags sum to zero; the result always ends up in
/// `work`.
fn bulk_rounds<O: ExtremumOp>(
    work: &DeviceGrid,
    mask: &DeviceGrid,
    temp: &DeviceGrid,
    op: &O,
    max_iter: u32,
    stats: &mut ReconstructStats,
) -> ReconResult<()> {
    let flags = TileFlags::new(bulk_grid(mask)?.block_count());
    let (mut src, mut dst) = (work, temp);
    let mut passes = 0u32;

    while passes < max_iter {
        bulk_pass(src, dst, mask, op, Some(&flags))?;
        passes += 1;
        stats.launches += 1;

        let changed = flags.sum();
        stats.history.push(changed);
        trace!("bulk pass {}: {} pixels changed", passes, changed);
        std::mem::swap(&mut src, &mut dst);
        if changed == 0 {
            stats.converged = true;
            break;
        }
    }

    if !std::ptr::eq(src, work) {
        work.copy_from(src)?;
    }
    Ok(())
}

// ============================================================================
// Host entry points
// ============================================================================

fn check_same_extent(work: &FPix, mask: &FPix) -> ReconResult<()> {
    if work.dimensions() != mask.dimensions() {
        return Err(ReconError::DimensionMismatch {
            expected: mask.dimensions(),
            actual: work.dimensions(),
        });
    }
    Ok(())
}

/// Reconstruct `work` under `mask` in place.
///
/// # Arguments
///
/// * `work` - Marker image, replaced by the reconstruction
/// * `mask` - Ceiling (dilation) or floor (erosion), same size as `work`
/// * `direction` - Reconstruction by dilation or by erosion
/// * `options` - Connectivity and bulk pass budget
///
/// # Examples
///
/// ```
/// use tilemorph_core::FPix;
/// use tilemorph_recon::{Direction, ReconstructOptions, reconstruct};
///
/// let mut work = FPix::new(5, 5).unwrap();
/// work.set_pixel(2, 2, 10.0).unwrap();
/// let mask = FPix::new_with_value(5, 5, 10.0).unwrap();
///
/// reconstruct(&mut work, &mask, Direction::Dilate, &ReconstructOptions::default()).unwrap();
/// assert_eq!(work.count_value(10.0), 25);
/// ```
pub fn reconstruct(
    work: &mut FPix,
    mask: &FPix,
    direction: Direction,
    options: &ReconstructOptions,
) -> ReconResult<ReconstructStats> {
    let op = Extremum::new(direction, options.connectivity);
    reconstruct_with(work, mask, &op, options.max_iter)
}

/// Reconstruct `work` under `mask` with a custom stencil op.
pub fn reconstruct_with<O: ExtremumOp>(
    work: &mut FPix,
    mask: &FPix,
    op: &O,
    max_iter: u32,
) -> ReconResult<ReconstructStats> {
    check_same_extent(work, mask)?;
    validate_op(op)?;

    let work_grid = DeviceGrid::upload(work);
    let mask_grid = DeviceGrid::upload(mask);
    let temp = DeviceGrid::zeroed(mask.width(), mask.height())?;

    let stats = Reconstructor::new().run(&work_grid, &mask_grid, &temp, max_iter, op)?;
    work_grid.download_into(work)?;
    Ok(stats)
}
