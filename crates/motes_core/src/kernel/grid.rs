//! Uniform bucket grid for neighbour candidate lookup
//!
//! Rebuilt from scratch before every pass that queries it. The rebuild is a
//! counting sort: count particles per cell, prefix-sum the counts into start
//! offsets, then scatter indices into one flat array. Within a cell, indices
//! stay in ascending order, which keeps per-particle reductions deterministic.

use glam::{IVec3, UVec3, Vec3};

/// Upper bound on cells along one axis. Finer requests widen the cells instead.
pub const MAX_CELLS_PER_AXIS: u32 = 128;

const NOT_INSERTED: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    dims: UVec3,
    /// Edge length of a cell along each axis.
    cell_extent: Vec3,
    world_size: Vec3,
    degenerate: bool,
    /// `cell_starts[c]..cell_starts[c + 1]` indexes `contents` for cell `c`.
    cell_starts: Vec<usize>,
    contents: Vec<usize>,
    /// Scratch: cell of each particle from the counting phase.
    cell_of: Vec<u32>,
    /// Scratch: write cursor per cell during scatter.
    cursors: Vec<usize>,
    dropped: usize,
}

impl SpatialGrid {
    pub fn new(world_size: Vec3, cell_size: f32) -> Self {
        let mut grid = Self {
            dims: UVec3::ONE,
            cell_extent: world_size,
            world_size,
            degenerate: true,
            cell_starts: Vec::new(),
            contents: Vec::new(),
            cell_of: Vec::new(),
            cursors: Vec::new(),
            dropped: 0,
        };
        grid.reconfigure(world_size, cell_size);
        grid
    }

    /// Change the world box or cell size. Contents are cleared.
    pub fn reconfigure(&mut self, world_size: Vec3, cell_size: f32) {
        self.world_size = world_size;
        let world_ok = world_size.is_finite() && world_size.cmpgt(Vec3::ZERO).all();
        self.degenerate = !world_ok || !cell_size.is_finite() || cell_size <= 0.0;

        if self.degenerate {
            self.dims = UVec3::ONE;
            self.cell_extent = world_size;
        } else {
            let wanted = (world_size / cell_size).ceil().max(Vec3::ONE);
            let dims = wanted.min(Vec3::splat(MAX_CELLS_PER_AXIS as f32));
            self.dims = dims.as_uvec3();
            self.cell_extent = Vec3::select(wanted.cmpgt(dims), world_size / dims, Vec3::splat(cell_size));
        }

        self.cell_starts.clear();
        self.contents.clear();
        self.dropped = 0;
        tracing::debug!(
            dims = ?self.dims,
            degenerate = self.degenerate,
            "Spatial grid configured"
        );
    }

    #[inline]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.dims.x * self.dims.y * self.dims.z) as usize
    }

    /// Single-cell brute-force mode, used when the cell size or world box is unusable.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Particles left out of the last rebuild because they were outside the box.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Particles inserted by the last rebuild.
    #[inline]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Cell coordinate of `position`, clamped into the grid.
    pub fn cell_coord(&self, position: Vec3) -> UVec3 {
        let max = self.dims.as_ivec3() - IVec3::ONE;
        self.raw_coord(position).clamp(IVec3::ZERO, max).as_uvec3()
    }

    /// Replace the contents with the given positions, indexed by iteration order.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec3>,
    {
        let cell_count = self.cell_count();
        self.cell_of.clear();
        self.cell_starts.clear();
        self.cell_starts.resize(cell_count + 1, 0);
        self.dropped = 0;

        // Count
        for position in positions {
            match self.cell_index(position) {
                Some(cell) => {
                    self.cell_of.push(cell as u32);
                    self.cell_starts[cell + 1] += 1;
                }
                None => {
                    self.cell_of.push(NOT_INSERTED);
                    self.dropped += 1;
                }
            }
        }

        // Prefix sum
        for cell in 0..cell_count {
            self.cell_starts[cell + 1] += self.cell_starts[cell];
        }

        // Scatter
        self.contents.clear();
        self.contents.resize(self.cell_starts[cell_count], 0);
        self.cursors.clear();
        self.cursors.extend_from_slice(&self.cell_starts[..cell_count]);
        for (index, &cell) in self.cell_of.iter().enumerate() {
            if cell == NOT_INSERTED {
                continue;
            }
            let cursor = &mut self.cursors[cell as usize];
            self.contents[*cursor] = index;
            *cursor += 1;
        }

        if self.dropped > 0 {
            tracing::trace!(dropped = self.dropped, "Particles outside grid bounds");
        }
    }

    /// Indices in the cells overlapping the cube of half-side `radius` around `position`.
    pub fn query(&self, position: Vec3, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_candidate(position, radius, |index| out.push(index));
        out
    }

    /// Visit every candidate neighbour of `position` in a fixed order.
    ///
    /// The candidates are a superset of the true neighbours; callers filter by
    /// distance. Cells outside the grid are skipped.
    pub fn for_each_candidate<F>(&self, position: Vec3, radius: f32, mut f: F)
    where
        F: FnMut(usize),
    {
        if self.degenerate {
            self.contents.iter().for_each(|&index| f(index));
            return;
        }
        if self.cell_starts.len() != self.cell_count() + 1 {
            return;
        }

        let radius = Vec3::splat(radius.max(0.0));
        let max = self.dims.as_ivec3() - IVec3::ONE;
        let lo = self.raw_coord(position - radius);
        let hi = self.raw_coord(position + radius);
        if hi.cmplt(IVec3::ZERO).any() || lo.cmpgt(max).any() {
            return;
        }
        let lo = lo.max(IVec3::ZERO);
        let hi = hi.min(max);

        let (dx, dy) = (self.dims.x as usize, self.dims.y as usize);
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let cell = x as usize + y as usize * dx + z as usize * dx * dy;
                    let range = self.cell_starts[cell]..self.cell_starts[cell + 1];
                    self.contents[range].iter().for_each(|&index| f(index));
                }
            }
        }
    }

    #[inline]
    fn raw_coord(&self, position: Vec3) -> IVec3 {
        ((position + self.world_size * 0.5) / self.cell_extent)
            .floor()
            .as_ivec3()
    }

    fn cell_index(&self, position: Vec3) -> Option<usize> {
        if self.degenerate {
            return Some(0);
        }
        let half = self.world_size * 0.5;
        // NaN fails the comparison and is dropped with the out-of-box positions.
        if !position.abs().cmple(half).all() {
            return None;
        }
        let c = self.cell_coord(position);
        Some((c.x + c.y * self.dims.x + c.z * self.dims.x * self.dims.y) as usize)
    }
}

/// Neighbour candidate source for a pass: the grid, or every particle.
#[derive(Debug, Clone, Copy)]
pub enum Candidates<'a> {
    Grid(&'a SpatialGrid),
    All(usize),
}

impl Candidates<'_> {
    #[inline]
    pub fn for_each<F>(&self, position: Vec3, radius: f32, mut f: F)
    where
        F: FnMut(usize),
    {
        match self {
            Candidates::Grid(grid) => grid.for_each_candidate(position, radius, f),
            Candidates::All(count) => (0..*count).for_each(&mut f),
        }
    }
}
