//! The dispersion calculator: parameter bookkeeping, model-handle
//! caching, unit conversion, and result remapping around an engine.

pub mod mixing;

use log::debug;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::domain::{ChangeSet, Structure};
use crate::core::units::{to_voigt, ANGSTROM_TO_BOHR, BOHR_TO_ANGSTROM, HARTREE_TO_EV};
use crate::engine::damping::{DampingFamily, DampingParam, ParamTweaks};
use crate::engine::model::{DispersionEngine, DispersionModel};
use crate::error::{EngineError, Error};

pub use mixing::SumCalculator;

/// Computed properties in framework units (eV, eV/Å, eV/Å³).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub energy: f64,
    /// Alias of `energy`; there is no electronic entropy term here.
    pub free_energy: f64,
    pub forces: Vec<Vector3<f64>>,
    /// Voigt-order stress (xx, yy, zz, yz, xz, xy); periodic structures
    /// only.
    pub stress: Option<[f64; 6]>,
}

/// A single-point calculator over structures.
pub trait Calculator {
    fn calculate(&mut self, structure: &Structure) -> Result<Properties, Error>;

    /// Returns the name of the calculator (e.g. "dftd3").
    fn name(&self) -> &str;
}

/// D3 dispersion-correction calculator.
///
/// Owns a dispersion engine and caches the expensive model handle across
/// calculations: geometry-only changes refresh the handle in place,
/// anything else rebuilds it. Damping parameters are rebuilt from the
/// current settings on every calculation.
pub struct D3Calculator {
    engine: Box<dyn DispersionEngine>,

    // Parameters; mutating any of them invalidates previous results.
    method: Option<String>,
    damping: Option<DampingFamily>,
    params_tweaks: ParamTweaks,
    cache_api: bool,

    // Cached state.
    model: Option<Box<dyn DispersionModel>>,
    last: Option<Structure>,
    results: Option<Properties>,
}

impl D3Calculator {
    pub fn new(engine: Box<dyn DispersionEngine>) -> Self {
        Self {
            engine,
            method: None,
            damping: None,
            params_tweaks: ParamTweaks::default(),
            cache_api: true,
            model: None,
            last: None,
            results: None,
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn with_damping(mut self, damping: DampingFamily) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn with_params_tweaks(mut self, tweaks: ParamTweaks) -> Self {
        self.params_tweaks = tweaks;
        self
    }

    pub fn with_cache_api(mut self, cache_api: bool) -> Self {
        self.cache_api = cache_api;
        self
    }

    pub fn set_method(&mut self, method: Option<&str>) {
        self.method = method.map(str::to_string);
        self.reset();
    }

    pub fn set_damping(&mut self, damping: Option<DampingFamily>) {
        self.damping = damping;
        self.reset();
    }

    pub fn set_params_tweaks(&mut self, tweaks: ParamTweaks) {
        self.params_tweaks = tweaks;
        self.reset();
    }

    pub fn set_cache_api(&mut self, cache_api: bool) {
        self.cache_api = cache_api;
        self.reset();
    }

    /// Clears all information from the old calculation. The model handle
    /// survives unless caching is disabled.
    pub fn reset(&mut self) {
        self.last = None;
        self.results = None;
        if !self.cache_api {
            self.model = None;
        }
    }

    /// Composes this calculator additively with another one.
    pub fn add_calculator(self, other: Box<dyn Calculator>) -> SumCalculator {
        SumCalculator::new(vec![Box::new(self), other])
    }

    /// Structure geometry in engine units (Bohr).
    fn engine_geometry(structure: &Structure) -> (Vec<Point3<f64>>, Option<Matrix3<f64>>) {
        let positions = structure
            .positions
            .iter()
            .map(|p| Point3::from(p.coords * ANGSTROM_TO_BOHR))
            .collect();
        let lattice = structure
            .lattice
            .as_ref()
            .map(|lat| lat.vectors * ANGSTROM_TO_BOHR);
        (positions, lattice)
    }

    /// Decides the fate of the cached model handle for this change set:
    /// keep, refresh in place, or discard. An update failure means the
    /// geometry is bad for an in-place refresh; the handle is discarded
    /// and a full rebuild gets a try instead.
    fn check_model(&mut self, structure: &Structure, changes: &ChangeSet) {
        if !changes.geometry_only() {
            if self.model.take().is_some() {
                debug!("discarding dispersion model: non-geometry inputs changed");
            }
            return;
        }
        if !changes.any() {
            return;
        }
        if let Some(model) = self.model.as_mut() {
            let (positions, lattice) = Self::engine_geometry(structure);
            if let Err(e) = model.update(&positions, lattice.as_ref()) {
                debug!("geometry update failed ({e}); discarding dispersion model");
                self.model = None;
            }
        }
    }

    /// Builds a model handle if none is cached. Construction failure is an
    /// input error: the engine rejected the geometry.
    fn ensure_model(&mut self, structure: &Structure) -> Result<(), Error> {
        if self.model.is_some() {
            return Ok(());
        }
        let (positions, lattice) = Self::engine_geometry(structure);
        debug!(
            "building {} dispersion model for {} atoms",
            self.engine.name(),
            structure.len()
        );
        let model = self
            .engine
            .new_model(
                &structure.numbers,
                &positions,
                lattice.as_ref(),
                structure.pbc,
            )
            .map_err(|e| Error::Input(format!("cannot construct dispersion model: {e}")))?;
        self.model = Some(model);
        Ok(())
    }
}

impl Calculator for D3Calculator {
    fn calculate(&mut self, structure: &Structure) -> Result<Properties, Error> {
        let changes = match &self.last {
            Some(prev) => ChangeSet::between(prev, structure),
            None => ChangeSet::all(),
        };
        if !changes.any() {
            if let Some(results) = &self.results {
                return Ok(results.clone());
            }
        }

        self.check_model(structure, &changes);
        self.ensure_model(structure)?;

        // A fresh damping-parameter object for every calculation.
        let damping = self
            .damping
            .ok_or_else(|| Error::input("no damping function selected"))?;
        let param = DampingParam::build(damping, self.method.as_deref(), &self.params_tweaks)?;

        let evaluated = match self.model.as_mut() {
            Some(model) => model.get_dispersion(&param, true),
            None => Err(EngineError::new("dispersion model unavailable")),
        };
        let record = evaluated
            .map_err(|e| Error::CalculationFailed(format!("could not evaluate input: {e}")))?;

        // Map the engine record back to framework units.
        let energy = record.energy * HARTREE_TO_EV;
        let gradient = record
            .gradient
            .ok_or_else(|| Error::CalculationFailed("engine returned no gradient".into()))?;
        if gradient.len() != structure.len() {
            return Err(Error::CalculationFailed(format!(
                "engine returned {} gradients for {} atoms",
                gradient.len(),
                structure.len()
            )));
        }
        let forces = gradient
            .iter()
            .map(|g| *g * (-HARTREE_TO_EV / BOHR_TO_ANGSTROM))
            .collect();
        let stress = if structure.is_periodic() {
            let sigma = record
                .sigma
                .ok_or_else(|| Error::CalculationFailed("engine returned no virial".into()))?;
            let volume = match &structure.lattice {
                Some(lat) => lat.volume(),
                None => return Err(Error::input("periodic structure requires a cell")),
            };
            Some(to_voigt(&(sigma * (HARTREE_TO_EV / volume))))
        } else {
            None
        };

        let results = Properties {
            energy,
            free_energy: energy,
            forces,
            stress,
        };
        self.last = Some(structure.clone());
        self.results = Some(results.clone());
        if !self.cache_api {
            self.model = None;
        }
        Ok(results)
    }

    fn name(&self) -> &str {
        "dftd3"
    }
}
