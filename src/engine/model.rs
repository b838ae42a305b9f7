use nalgebra::{Matrix3, Point3, Vector3};

use crate::engine::damping::DampingParam;
use crate::error::EngineError;

/// The result of a dispersion evaluation, in atomic units.
#[derive(Debug, Clone)]
pub struct DispersionRecord {
    /// Dispersion energy (Hartree).
    pub energy: f64,
    /// Energy gradient per atom (Hartree/Bohr); present when requested.
    pub gradient: Option<Vec<Vector3<f64>>>,
    /// Strain derivative of the energy (Hartree); present when requested.
    pub sigma: Option<Matrix3<f64>>,
}

/// A live handle to a dispersion model.
///
/// The handle is keyed to the atom set, cell shape and periodicity it was
/// built with; only positions and cell may move under it via [`update`].
///
/// [`update`]: DispersionModel::update
pub trait DispersionModel {
    /// Refreshes positions and cell (both Bohr) in place.
    fn update(
        &mut self,
        positions: &[Point3<f64>],
        lattice: Option<&Matrix3<f64>>,
    ) -> Result<(), EngineError>;

    /// Evaluates the dispersion correction for the given damping parameters.
    fn get_dispersion(
        &mut self,
        param: &DampingParam,
        grad: bool,
    ) -> Result<DispersionRecord, EngineError>;
}

/// A generic interface for dispersion engines: builds model handles from a
/// structure already converted to atomic units. Construction is the
/// expensive step; the handle is meant to be reused across geometries.
pub trait DispersionEngine {
    fn new_model(
        &self,
        numbers: &[u8],
        positions: &[Point3<f64>],
        lattice: Option<&Matrix3<f64>>,
        periodic: [bool; 3],
    ) -> Result<Box<dyn DispersionModel>, EngineError>;

    /// Returns the name of the engine (e.g. "s-dftd3").
    fn name(&self) -> &str;
}
