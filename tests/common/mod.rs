use std::cell::Cell;
use std::rc::Rc;

use nalgebra::{Matrix3, Point3, Vector3};

use dftd3::core::domain::Lattice;
use dftd3::engine::model::{DispersionEngine, DispersionModel, DispersionRecord};
use dftd3::error::EngineError;
use dftd3::Structure;

/// Call counters shared between a test and its mock engine.
#[derive(Default)]
pub struct MockState {
    pub builds: Cell<usize>,
    pub updates: Cell<usize>,
    pub evals: Cell<usize>,
}

/// Engine stub returning a fixed record, with switchable failure modes.
pub struct MockEngine {
    pub record: DispersionRecord,
    pub state: Rc<MockState>,
    pub fail_build: bool,
    pub fail_update: bool,
    pub fail_eval: bool,
}

impl MockEngine {
    pub fn new(record: DispersionRecord) -> (Self, Rc<MockState>) {
        let state = Rc::new(MockState::default());
        let engine = Self {
            record,
            state: Rc::clone(&state),
            fail_build: false,
            fail_update: false,
            fail_eval: false,
        };
        (engine, state)
    }
}

impl DispersionEngine for MockEngine {
    fn new_model(
        &self,
        numbers: &[u8],
        positions: &[Point3<f64>],
        _lattice: Option<&Matrix3<f64>>,
        _periodic: [bool; 3],
    ) -> Result<Box<dyn DispersionModel>, EngineError> {
        self.state.builds.set(self.state.builds.get() + 1);
        if self.fail_build {
            return Err(EngineError::new("cannot construct model"));
        }
        assert_eq!(numbers.len(), positions.len());
        Ok(Box::new(MockModel {
            record: self.record.clone(),
            state: Rc::clone(&self.state),
            fail_update: self.fail_update,
            fail_eval: self.fail_eval,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockModel {
    record: DispersionRecord,
    state: Rc<MockState>,
    fail_update: bool,
    fail_eval: bool,
}

impl DispersionModel for MockModel {
    fn update(
        &mut self,
        _positions: &[Point3<f64>],
        _lattice: Option<&Matrix3<f64>>,
    ) -> Result<(), EngineError> {
        self.state.updates.set(self.state.updates.get() + 1);
        if self.fail_update {
            return Err(EngineError::new("bad geometry"));
        }
        Ok(())
    }

    fn get_dispersion(
        &mut self,
        _param: &dftd3::DampingParam,
        grad: bool,
    ) -> Result<DispersionRecord, EngineError> {
        self.state.evals.set(self.state.evals.get() + 1);
        if self.fail_eval {
            return Err(EngineError::new("evaluation failed"));
        }
        let mut record = self.record.clone();
        if !grad {
            record.gradient = None;
            record.sigma = None;
        }
        Ok(record)
    }
}

// --- Fixtures ---

/// Water in the geometry the upstream calculator documents.
pub fn water() -> Structure {
    Structure::molecule(
        vec![8, 1, 1],
        vec![
            Point3::new(0.0, 0.0, 0.119262),
            Point3::new(0.0, 0.763239, -0.477047),
            Point3::new(0.0, -0.763239, -0.477047),
        ],
    )
    .unwrap()
}

/// A two-atom rocksalt-like structure in a 5 Å cubic cell.
pub fn rocksalt() -> Structure {
    Structure::crystal(
        vec![11, 17],
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.5, 2.5, 2.5)],
        Lattice::cubic(5.0).unwrap(),
    )
    .unwrap()
}

/// Engine record with distinct, easily recognizable components.
pub fn fixed_record(natoms: usize) -> DispersionRecord {
    let gradient = (0..natoms)
        .map(|i| {
            let k = (i + 1) as f64;
            Vector3::new(1.0e-3 * k, -2.0e-3 * k, 3.0e-3 * k)
        })
        .collect();
    DispersionRecord {
        energy: -0.01,
        gradient: Some(gradient),
        sigma: Some(Matrix3::new(
            1.0e-3, 6.0e-3, 5.0e-3, //
            6.0e-3, 2.0e-3, 4.0e-3, //
            5.0e-3, 4.0e-3, 3.0e-3,
        )),
    }
}
