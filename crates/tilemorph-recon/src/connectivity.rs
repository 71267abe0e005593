//! Pixel adjacency
//!
//! The connectivity mode fixes the neighbor offsets used by every kernel of
//! one reconstruction: the stencil, the seed extraction and the worklist
//! propagation all iterate the same table.

/// Neighbor offsets for 4-connectivity: up, left, right, down
const FOUR_WAY_OFFSETS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Neighbor offsets for 8-connectivity, row-major
const EIGHT_WAY_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Connectivity type for propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connectivity {
    /// 4-way connectivity (up, down, left, right)
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

impl Connectivity {
    /// Offsets (dx, dy) of the neighbors, center excluded
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Connectivity::FourWay => &FOUR_WAY_OFFSETS,
            Connectivity::EightWay => &EIGHT_WAY_OFFSETS,
        }
    }

    /// Maximum number of neighbors a pixel can enqueue
    pub fn fan_out(self) -> usize {
        self.offsets().len()
    }
}
