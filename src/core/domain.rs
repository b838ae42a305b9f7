use nalgebra::{Matrix3, Point3};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// --- Physics Types ---

/// Defines the periodic cell of a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// Cell matrix in Å. Columns are the lattice vectors a, b, c.
    pub vectors: Matrix3<f64>,
}

impl Lattice {
    /// Builds a lattice from a cell matrix, rejecting singular cells.
    pub fn new(vectors: Matrix3<f64>) -> Result<Self, Error> {
        let lat = Self { vectors };
        if lat.volume() < 1e-10 {
            return Err(Error::input("cell matrix is singular"));
        }
        Ok(lat)
    }

    /// Builds a cubic cell with edge length `a` (Å).
    pub fn cubic(a: f64) -> Result<Self, Error> {
        Self::new(Matrix3::from_diagonal_element(a))
    }

    /// Cell volume in Å³.
    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }
}

// --- The Core Entity ---

/// A chemical structure in framework units (Å).
///
/// This is what callers hand to a [`Calculator`](crate::Calculator): atomic
/// numbers, Cartesian positions, and an optional periodic cell with
/// per-axis periodicity flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub numbers: Vec<u8>,
    pub positions: Vec<Point3<f64>>,
    pub lattice: Option<Lattice>,
    pub pbc: [bool; 3],
}

impl Structure {
    pub fn new(
        numbers: Vec<u8>,
        positions: Vec<Point3<f64>>,
        lattice: Option<Lattice>,
        pbc: [bool; 3],
    ) -> Result<Self, Error> {
        if numbers.is_empty() {
            return Err(Error::input("structure contains no atoms"));
        }
        if numbers.len() != positions.len() {
            return Err(Error::input(format!(
                "atom count mismatch: {} numbers vs {} positions",
                numbers.len(),
                positions.len()
            )));
        }
        if pbc.iter().any(|&p| p) && lattice.is_none() {
            return Err(Error::input("periodic structure requires a cell"));
        }
        Ok(Self {
            numbers,
            positions,
            lattice,
            pbc,
        })
    }

    /// An isolated (non-periodic) structure.
    pub fn molecule(numbers: Vec<u8>, positions: Vec<Point3<f64>>) -> Result<Self, Error> {
        Self::new(numbers, positions, None, [false; 3])
    }

    /// A fully periodic structure.
    pub fn crystal(
        numbers: Vec<u8>,
        positions: Vec<Point3<f64>>,
        lattice: Lattice,
    ) -> Result<Self, Error> {
        Self::new(numbers, positions, Some(lattice), [true; 3])
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// True if any axis is periodic.
    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }
}

// --- Change Tracking ---

/// Which inputs differ between two successive structures.
///
/// The calculator keys its model cache on this: only positions and cell
/// may change under a live handle, anything else forces a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub numbers: bool,
    pub positions: bool,
    pub cell: bool,
    pub pbc: bool,
}

impl ChangeSet {
    /// The change set for a first-time calculation (everything differs).
    pub fn all() -> Self {
        Self {
            numbers: true,
            positions: true,
            cell: true,
            pbc: true,
        }
    }

    /// Comparison is exact: any numeric difference counts as a change.
    pub fn between(old: &Structure, new: &Structure) -> Self {
        Self {
            numbers: old.numbers != new.numbers,
            positions: old.positions != new.positions,
            cell: old.lattice != new.lattice,
            pbc: old.pbc != new.pbc,
        }
    }

    pub fn any(&self) -> bool {
        self.numbers || self.positions || self.cell || self.pbc
    }

    /// True if only positions and/or cell differ, the updatable subset.
    pub fn geometry_only(&self) -> bool {
        !self.numbers && !self.pbc
    }
}
