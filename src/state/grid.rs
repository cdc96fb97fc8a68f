//! Grid & resource store.
//!
//! A `width x height` array of cells. Every cell carries one capacity and
//! one usage counter per resource type, the number of vertices (fixed or
//! movable) placed on it, and the list of movable vertices among them.
//! Capacities start at [`DEAD_CELL`]: a cell with a negative capacity
//! accepts nothing, not even a vertex with zero demand.

use super::registry::VertexId;
use crate::error::{PlaceError, Result};

/// Initial capacity of every `(cell, resource)` pair.
pub const DEAD_CELL: i32 = -1;

/// Per-cell resource capacities, usage counters and movable occupants.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    num_resource_types: usize,
    /// Indexed by `cell * num_resource_types + resource`.
    capacity: Vec<i32>,
    /// Same layout as `capacity`.
    usage: Vec<i32>,
    /// Placed vertices per cell, fixed ones included.
    residents: Vec<u32>,
    /// Movable vertices per cell, oldest first.
    occupants: Vec<Vec<VertexId>>,
}

impl Grid {
    /// Creates a grid with every cell dead.
    pub fn new(width: usize, height: usize, num_resource_types: usize) -> Result<Self> {
        let cells = width
            .checked_mul(height)
            .ok_or_else(|| PlaceError::AllocationFailure("grid size overflows usize".into()))?;
        let slots = cells.checked_mul(num_resource_types).ok_or_else(|| {
            PlaceError::AllocationFailure("resource table size overflows usize".into())
        })?;

        let mut capacity = Vec::new();
        capacity
            .try_reserve_exact(slots)
            .map_err(|e| PlaceError::AllocationFailure(e.to_string()))?;
        capacity.resize(slots, DEAD_CELL);

        let mut usage = Vec::new();
        usage
            .try_reserve_exact(slots)
            .map_err(|e| PlaceError::AllocationFailure(e.to_string()))?;
        usage.resize(slots, 0);

        let mut residents = Vec::new();
        residents
            .try_reserve_exact(cells)
            .map_err(|e| PlaceError::AllocationFailure(e.to_string()))?;
        residents.resize(cells, 0);

        let mut occupants = Vec::new();
        occupants
            .try_reserve_exact(cells)
            .map_err(|e| PlaceError::AllocationFailure(e.to_string()))?;
        occupants.resize_with(cells, Vec::new);

        Ok(Self {
            width,
            height,
            num_resource_types,
            capacity,
            usage,
            residents,
            occupants,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_resource_types(&self) -> usize {
        self.num_resource_types
    }

    pub fn num_cells(&self) -> usize {
        self.width * self.height
    }

    /// Validates `(x, y)` and returns the flat cell index.
    pub fn cell_index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width {
            return Err(PlaceError::OutOfBounds {
                what: "x",
                index: x,
                limit: self.width,
            });
        }
        if y >= self.height {
            return Err(PlaceError::OutOfBounds {
                what: "y",
                index: y,
                limit: self.height,
            });
        }
        Ok(self.index_of(x, y))
    }

    #[inline]
    pub(crate) fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn check_resource(&self, resource: usize) -> Result<()> {
        if resource >= self.num_resource_types {
            return Err(PlaceError::OutOfBounds {
                what: "resource",
                index: resource,
                limit: self.num_resource_types,
            });
        }
        Ok(())
    }

    fn slot(&self, x: usize, y: usize, resource: usize) -> Result<usize> {
        let cell = self.cell_index(x, y)?;
        self.check_resource(resource)?;
        Ok(cell * self.num_resource_types + resource)
    }

    /// Sets the capacity of one resource type at a cell.
    ///
    /// A negative value marks the resource as unavailable. On a cell that
    /// holds any vertex, lowering the capacity below what is in use, or
    /// below zero, fails with [`PlaceError::ResourceExceeded`].
    pub fn set_capacity(&mut self, x: usize, y: usize, resource: usize, value: i32) -> Result<()> {
        let slot = self.slot(x, y, resource)?;
        let cell = self.index_of(x, y);
        if self.residents[cell] > 0 && value < self.usage[slot].max(0) {
            return Err(PlaceError::ResourceExceeded { x, y, resource });
        }
        self.capacity[slot] = value;
        Ok(())
    }

    /// Configured capacity of a resource type at a cell.
    pub fn capacity(&self, x: usize, y: usize, resource: usize) -> Result<i32> {
        Ok(self.capacity[self.slot(x, y, resource)?])
    }

    /// Amount of a resource type consumed by the vertices at a cell.
    pub fn usage(&self, x: usize, y: usize, resource: usize) -> Result<i32> {
        Ok(self.usage[self.slot(x, y, resource)?])
    }

    /// Capacity left over at a cell (`capacity - usage`).
    pub fn remaining(&self, x: usize, y: usize, resource: usize) -> Result<i32> {
        let slot = self.slot(x, y, resource)?;
        Ok(self.capacity[slot] - self.usage[slot])
    }

    /// Number of vertices placed at a cell, fixed ones included.
    pub fn residents(&self, x: usize, y: usize) -> Result<u32> {
        Ok(self.residents[self.cell_index(x, y)?])
    }

    /// Movable vertices at a cell, oldest first.
    pub fn occupants(&self, x: usize, y: usize) -> Result<&[VertexId]> {
        Ok(&self.occupants[self.cell_index(x, y)?])
    }

    /// Whether `demand` fits in what is left at a cell.
    pub fn fits(&self, x: usize, y: usize, demand: &[i32]) -> Result<bool> {
        Ok(self.fits_at(self.cell_index(x, y)?, demand))
    }

    #[inline]
    fn range(&self, cell: usize) -> std::ops::Range<usize> {
        let start = cell * self.num_resource_types;
        start..start + self.num_resource_types
    }

    /// Unchecked variant of [`fits`](Self::fits) for a flat cell index.
    #[inline]
    pub(crate) fn fits_at(&self, cell: usize, demand: &[i32]) -> bool {
        let range = self.range(cell);
        self.capacity[range.clone()]
            .iter()
            .zip(&self.usage[range])
            .zip(demand)
            .all(|((&cap, &used), &want)| cap - used - want >= 0)
    }

    /// First resource type at which `demand` does not fit, if any.
    pub(crate) fn first_overflow(&self, cell: usize, demand: &[i32]) -> Option<usize> {
        let range = self.range(cell);
        self.capacity[range.clone()]
            .iter()
            .zip(&self.usage[range])
            .zip(demand)
            .position(|((&cap, &used), &want)| cap - used - want < 0)
    }

    /// Books one vertex with `demand` onto `cell`.
    #[inline]
    pub(crate) fn occupy(&mut self, cell: usize, demand: &[i32]) {
        let range = self.range(cell);
        add_resources(&mut self.usage[range], demand);
        self.residents[cell] += 1;
    }

    /// Takes one vertex with `demand` off `cell`.
    #[inline]
    pub(crate) fn release(&mut self, cell: usize, demand: &[i32]) {
        let range = self.range(cell);
        subtract_resources(&mut self.usage[range], demand);
        self.residents[cell] -= 1;
    }

    #[inline]
    pub(crate) fn occupants_at(&self, cell: usize) -> &[VertexId] {
        &self.occupants[cell]
    }

    #[inline]
    pub(crate) fn push_occupant(&mut self, cell: usize, vertex: VertexId) {
        self.occupants[cell].push(vertex);
    }

    #[inline]
    pub(crate) fn pop_occupant(&mut self, cell: usize) -> Option<VertexId> {
        self.occupants[cell].pop()
    }

    /// Removes `vertex` from the occupant list of `cell`, preserving order,
    /// and returns where it was listed.
    pub(crate) fn remove_occupant(&mut self, cell: usize, vertex: VertexId) -> Option<usize> {
        let list = &mut self.occupants[cell];
        let pos = list.iter().rposition(|&v| v == vertex)?;
        list.remove(pos);
        Some(pos)
    }

    /// Lists `vertex` at `pos` in the occupant list of `cell`.
    #[inline]
    pub(crate) fn insert_occupant(&mut self, cell: usize, pos: usize, vertex: VertexId) {
        let list = &mut self.occupants[cell];
        list.insert(pos.min(list.len()), vertex);
    }

    /// Whether usage is within capacity everywhere.
    ///
    /// A cell holding any vertex needs a non-negative capacity for every
    /// resource type; an empty cell must have no usage at all.
    pub fn within_capacity(&self) -> bool {
        (0..self.num_cells()).all(|cell| {
            let range = self.range(cell);
            let mut slots = self.capacity[range.clone()].iter().zip(&self.usage[range]);
            if self.residents[cell] == 0 {
                slots.all(|(_, &used)| used == 0)
            } else {
                slots.all(|(&cap, &used)| used <= cap && cap >= 0)
            }
        })
    }
}

/// `a += b`, element-wise over the shorter of the two slices.
pub fn add_resources(a: &mut [i32], b: &[i32]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x += *y;
    }
}

/// `a -= b`, element-wise over the shorter of the two slices.
pub fn subtract_resources(a: &mut [i32], b: &[i32]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x -= *y;
    }
}

/// Whether every entry of `a` is zero or positive.
pub fn all_non_negative(a: &[i32]) -> bool {
    a.iter().all(|&x| x >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NR: usize = 2;

    fn grid() -> Grid {
        Grid::new(2, 3, NR).unwrap()
    }

    #[test]
    fn test_new_grid_is_dead() {
        let g = grid();
        assert_eq!(g.num_cells(), 6);
        for x in 0..2 {
            for y in 0..3 {
                for r in 0..NR {
                    assert_eq!(g.capacity(x, y, r).unwrap(), DEAD_CELL);
                    assert_eq!(g.usage(x, y, r).unwrap(), 0);
                }
                assert!(g.occupants(x, y).unwrap().is_empty());
                assert!(!g.fits(x, y, &[0, 0]).unwrap());
            }
        }
    }

    #[test]
    fn test_set_capacity_bounds() {
        let mut g = grid();
        assert!(matches!(
            g.set_capacity(2, 0, 0, 1),
            Err(PlaceError::OutOfBounds { what: "x", .. })
        ));
        assert!(matches!(
            g.set_capacity(0, 3, 0, 1),
            Err(PlaceError::OutOfBounds { what: "y", .. })
        ));
        assert!(matches!(
            g.set_capacity(0, 0, NR, 1),
            Err(PlaceError::OutOfBounds {
                what: "resource",
                ..
            })
        ));
        g.set_capacity(1, 2, 1, 5).unwrap();
        assert_eq!(g.capacity(1, 2, 1).unwrap(), 5);
        assert_eq!(g.remaining(1, 2, 1).unwrap(), 5);
    }

    #[test]
    fn test_fits_and_occupy() {
        let mut g = grid();
        g.set_capacity(0, 1, 0, 2).unwrap();
        g.set_capacity(0, 1, 1, 1).unwrap();
        let cell = g.cell_index(0, 1).unwrap();

        assert!(g.fits_at(cell, &[2, 1]));
        assert!(!g.fits_at(cell, &[3, 0]));
        assert_eq!(g.first_overflow(cell, &[1, 2]), Some(1));

        g.occupy(cell, &[1, 1]);
        assert_eq!(g.residents(0, 1).unwrap(), 1);
        assert_eq!(g.usage(0, 1, 0).unwrap(), 1);
        assert_eq!(g.remaining(0, 1, 1).unwrap(), 0);
        assert!(g.fits_at(cell, &[1, 0]));
        assert!(!g.fits_at(cell, &[0, 1]));

        g.release(cell, &[1, 1]);
        assert_eq!(g.remaining(0, 1, 0).unwrap(), 2);
        assert_eq!(g.residents(0, 1).unwrap(), 0);
    }

    #[test]
    fn test_lowering_capacity_below_usage_fails() {
        let mut g = grid();
        g.set_capacity(1, 1, 0, 3).unwrap();
        g.set_capacity(1, 1, 1, 0).unwrap();
        let cell = g.cell_index(1, 1).unwrap();
        g.occupy(cell, &[2, 0]);
        assert!(matches!(
            g.set_capacity(1, 1, 0, 1),
            Err(PlaceError::ResourceExceeded {
                x: 1,
                y: 1,
                resource: 0
            })
        ));
        g.set_capacity(1, 1, 0, 2).unwrap();
        assert!(g.within_capacity());
    }

    #[test]
    fn test_occupied_cell_cannot_die() {
        let mut g = grid();
        g.set_capacity(0, 0, 0, 0).unwrap();
        g.set_capacity(0, 0, 1, 0).unwrap();
        assert!(g.within_capacity());

        // A vertex with zero demand leaves no usage behind but still counts.
        let cell = g.cell_index(0, 0).unwrap();
        g.occupy(cell, &[0, 0]);
        assert_eq!(g.usage(0, 0, 0).unwrap(), 0);
        assert!(matches!(
            g.set_capacity(0, 0, 1, DEAD_CELL),
            Err(PlaceError::ResourceExceeded {
                x: 0,
                y: 0,
                resource: 1
            })
        ));
        assert_eq!(g.capacity(0, 0, 1).unwrap(), 0);
        assert!(g.within_capacity());

        g.release(cell, &[0, 0]);
        g.set_capacity(0, 0, 1, DEAD_CELL).unwrap();
        assert!(g.within_capacity());
    }

    #[test]
    fn test_occupant_order() {
        let mut g = grid();
        let cell = g.index_of(1, 0);
        for i in 0..4 {
            g.push_occupant(cell, VertexId::from_raw(i));
        }
        assert_eq!(g.remove_occupant(cell, VertexId::from_raw(1)), Some(1));
        assert_eq!(g.remove_occupant(cell, VertexId::from_raw(1)), None);
        assert_eq!(
            g.occupants(1, 0).unwrap(),
            &[
                VertexId::from_raw(0),
                VertexId::from_raw(2),
                VertexId::from_raw(3)
            ]
        );
        assert_eq!(g.pop_occupant(cell), Some(VertexId::from_raw(3)));
        g.insert_occupant(cell, 1, VertexId::from_raw(1));
        assert_eq!(
            g.occupants(1, 0).unwrap(),
            &[
                VertexId::from_raw(0),
                VertexId::from_raw(1),
                VertexId::from_raw(2)
            ]
        );
    }

    #[test]
    fn test_subtract_resources() {
        // One entry longer than the other: the extra entry is left alone.
        let mut a = vec![1, 2, 3];
        let b = vec![0, 1];
        subtract_resources(&mut a, &b);
        assert_eq!(a, vec![1, 1, 3]);
        assert_eq!(b, vec![0, 1]);
    }

    #[test]
    fn test_add_resources() {
        let mut a = vec![1, 2, 3];
        let b = vec![0, 1];
        add_resources(&mut a, &b);
        assert_eq!(a, vec![1, 3, 3]);
    }

    #[test]
    fn test_all_non_negative() {
        assert!(all_non_negative(&[0, 0]));
        assert!(all_non_negative(&[100, 100]));
        assert!(!all_non_negative(&[-1, 1]));
        assert!(!all_non_negative(&[-1, -1]));
        assert!(all_non_negative(&[]));
    }
}
