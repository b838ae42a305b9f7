//! Unit conversions between the framework side (eV, Å) and the engine
//! side (Hartree, Bohr).

use nalgebra::Matrix3;

// CODATA 2018
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_TO_ANGSTROM;
pub const HARTREE_TO_EV: f64 = 27.211386245988;

/// Row-major flat indices selecting (xx, yy, zz, yz, xz, xy) from a 3×3
/// tensor.
pub const VOIGT_ORDER: [usize; 6] = [0, 4, 8, 5, 2, 1];

/// Collapses a (symmetric) 3×3 stress tensor to 6-component Voigt order.
pub fn to_voigt(m: &Matrix3<f64>) -> [f64; 6] {
    VOIGT_ORDER.map(|k| m[(k / 3, k % 3)])
}
