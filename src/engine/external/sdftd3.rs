//! Engine backend over the native s-dftd3 shared library.
//!
//! Raw handles (error, structure, model) are owned by the wrapper types
//! and released in `Drop`. Every API call goes through the owned error
//! handle, which is checked before results are trusted.

use std::os::raw::{c_char, c_int};

use nalgebra::{Matrix3, Point3, Vector3};

use crate::engine::damping::DampingParam;
use crate::engine::model::{DispersionEngine, DispersionModel, DispersionRecord};
use crate::error::EngineError;

mod ffi {
    use std::os::raw::{c_char, c_int};

    #[repr(C)]
    pub struct Dftd3Error {
        _private: [u8; 0],
    }
    #[repr(C)]
    pub struct Dftd3Structure {
        _private: [u8; 0],
    }
    #[repr(C)]
    pub struct Dftd3Model {
        _private: [u8; 0],
    }
    #[repr(C)]
    pub struct Dftd3Param {
        _private: [u8; 0],
    }

    #[link(name = "s-dftd3")]
    extern "C" {
        pub fn dftd3_new_error() -> *mut Dftd3Error;
        pub fn dftd3_check_error(error: *mut Dftd3Error) -> c_int;
        pub fn dftd3_get_error(
            error: *mut Dftd3Error,
            buffer: *mut c_char,
            buffersize: *const c_int,
        );
        pub fn dftd3_delete_error(error: *mut *mut Dftd3Error);

        pub fn dftd3_new_structure(
            error: *mut Dftd3Error,
            natoms: c_int,
            numbers: *const c_int,
            positions: *const f64,
            lattice: *const f64,
            periodic: *const bool,
        ) -> *mut Dftd3Structure;
        pub fn dftd3_delete_structure(mol: *mut *mut Dftd3Structure);
        pub fn dftd3_update_structure(
            error: *mut Dftd3Error,
            mol: *mut Dftd3Structure,
            positions: *const f64,
            lattice: *const f64,
        );

        pub fn dftd3_new_d3_model(
            error: *mut Dftd3Error,
            mol: *mut Dftd3Structure,
        ) -> *mut Dftd3Model;
        pub fn dftd3_delete_model(disp: *mut *mut Dftd3Model);

        pub fn dftd3_new_rational_damping(
            error: *mut Dftd3Error,
            s6: f64,
            s8: f64,
            s9: f64,
            a1: f64,
            a2: f64,
            alp: f64,
        ) -> *mut Dftd3Param;
        pub fn dftd3_new_zero_damping(
            error: *mut Dftd3Error,
            s6: f64,
            s8: f64,
            s9: f64,
            rs6: f64,
            rs8: f64,
            alp: f64,
        ) -> *mut Dftd3Param;
        pub fn dftd3_new_mrational_damping(
            error: *mut Dftd3Error,
            s6: f64,
            s8: f64,
            s9: f64,
            a1: f64,
            a2: f64,
            alp: f64,
        ) -> *mut Dftd3Param;
        pub fn dftd3_new_mzero_damping(
            error: *mut Dftd3Error,
            s6: f64,
            s8: f64,
            s9: f64,
            rs6: f64,
            rs8: f64,
            alp: f64,
            bet: f64,
        ) -> *mut Dftd3Param;
        pub fn dftd3_new_optimizedpower_damping(
            error: *mut Dftd3Error,
            s6: f64,
            s8: f64,
            s9: f64,
            a1: f64,
            a2: f64,
            alp: f64,
            bet: f64,
        ) -> *mut Dftd3Param;
        pub fn dftd3_delete_param(param: *mut *mut Dftd3Param);

        pub fn dftd3_get_dispersion(
            error: *mut Dftd3Error,
            mol: *mut Dftd3Structure,
            disp: *mut Dftd3Model,
            param: *mut Dftd3Param,
            energy: *mut f64,
            gradient: *mut f64,
            sigma: *mut f64,
        );
    }
}

// --- Error Handle ---

struct ErrorHandle(*mut ffi::Dftd3Error);

impl ErrorHandle {
    fn new() -> Self {
        Self(unsafe { ffi::dftd3_new_error() })
    }

    /// Reads and clears the error state of the last API call.
    fn check(&self) -> Result<(), EngineError> {
        if unsafe { ffi::dftd3_check_error(self.0) } == 0 {
            return Ok(());
        }
        let mut buffer = [0 as c_char; 512];
        let size = buffer.len() as c_int;
        unsafe { ffi::dftd3_get_error(self.0, buffer.as_mut_ptr(), &size) };
        let end = buffer.iter().position(|&c| c == 0).unwrap_or(0);
        let message: String = buffer[..end].iter().map(|&c| c as u8 as char).collect();
        Err(EngineError::new(message))
    }
}

impl Drop for ErrorHandle {
    fn drop(&mut self) {
        unsafe { ffi::dftd3_delete_error(&mut self.0) };
    }
}

// --- Geometry Marshalling ---

/// Positions as a flat (natoms, 3) array, each atom's xyz contiguous.
fn flatten_positions(positions: &[Point3<f64>]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(3 * positions.len());
    for p in positions {
        flat.extend_from_slice(&[p.x, p.y, p.z]);
    }
    flat
}

/// Cell as a flat (3, 3) array, one lattice vector after another.
fn flatten_lattice(lattice: &Matrix3<f64>) -> [f64; 9] {
    let mut flat = [0.0; 9];
    for i in 0..3 {
        let v = lattice.column(i);
        flat[3 * i] = v[0];
        flat[3 * i + 1] = v[1];
        flat[3 * i + 2] = v[2];
    }
    flat
}

// --- Engine ---

/// The production dispersion engine backed by the s-dftd3 library.
pub struct SDftd3Engine;

impl SDftd3Engine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SDftd3Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl DispersionEngine for SDftd3Engine {
    fn new_model(
        &self,
        numbers: &[u8],
        positions: &[Point3<f64>],
        lattice: Option<&Matrix3<f64>>,
        periodic: [bool; 3],
    ) -> Result<Box<dyn DispersionModel>, EngineError> {
        if numbers.len() != positions.len() {
            return Err(EngineError::new("numbers/positions length mismatch"));
        }
        let error = ErrorHandle::new();
        let natoms = numbers.len() as c_int;
        let numbers: Vec<c_int> = numbers.iter().map(|&z| z as c_int).collect();
        let pos = flatten_positions(positions);
        let cell = lattice.map(flatten_lattice);
        let cell_ptr = cell
            .as_ref()
            .map_or(std::ptr::null(), |c| c.as_ptr());

        let mut mol = unsafe {
            ffi::dftd3_new_structure(
                error.0,
                natoms,
                numbers.as_ptr(),
                pos.as_ptr(),
                cell_ptr,
                periodic.as_ptr(),
            )
        };
        if let Err(e) = error.check() {
            if !mol.is_null() {
                unsafe { ffi::dftd3_delete_structure(&mut mol) };
            }
            return Err(e);
        }

        let mut model = unsafe { ffi::dftd3_new_d3_model(error.0, mol) };
        if let Err(e) = error.check() {
            if !model.is_null() {
                unsafe { ffi::dftd3_delete_model(&mut model) };
            }
            unsafe { ffi::dftd3_delete_structure(&mut mol) };
            return Err(e);
        }

        Ok(Box::new(SDftd3Model {
            error,
            mol,
            model,
            natoms: natoms as usize,
        }))
    }

    fn name(&self) -> &str {
        "s-dftd3"
    }
}

// --- Model Handle ---

pub struct SDftd3Model {
    error: ErrorHandle,
    mol: *mut ffi::Dftd3Structure,
    model: *mut ffi::Dftd3Model,
    natoms: usize,
}

impl Drop for SDftd3Model {
    fn drop(&mut self) {
        unsafe {
            ffi::dftd3_delete_model(&mut self.model);
            ffi::dftd3_delete_structure(&mut self.mol);
        }
    }
}

impl SDftd3Model {
    /// Builds the native damping-parameter object for one evaluation.
    fn new_param(&self, param: &DampingParam) -> Result<*mut ffi::Dftd3Param, EngineError> {
        let handle = unsafe {
            match param {
                DampingParam::Rational(p) => ffi::dftd3_new_rational_damping(
                    self.error.0,
                    p.s6,
                    p.s8,
                    p.s9,
                    p.a1,
                    p.a2,
                    p.alp,
                ),
                DampingParam::Zero(p) => ffi::dftd3_new_zero_damping(
                    self.error.0,
                    p.s6,
                    p.s8,
                    p.s9,
                    p.rs6,
                    p.rs8,
                    p.alp,
                ),
                DampingParam::ModifiedRational(p) => ffi::dftd3_new_mrational_damping(
                    self.error.0,
                    p.s6,
                    p.s8,
                    p.s9,
                    p.a1,
                    p.a2,
                    p.alp,
                ),
                DampingParam::ModifiedZero(p) => ffi::dftd3_new_mzero_damping(
                    self.error.0,
                    p.s6,
                    p.s8,
                    p.s9,
                    p.rs6,
                    p.rs8,
                    p.alp,
                    p.bet,
                ),
                DampingParam::OptimizedPower(p) => ffi::dftd3_new_optimizedpower_damping(
                    self.error.0,
                    p.s6,
                    p.s8,
                    p.s9,
                    p.a1,
                    p.a2,
                    p.alp,
                    p.bet,
                ),
            }
        };
        self.error.check()?;
        Ok(handle)
    }
}

impl DispersionModel for SDftd3Model {
    fn update(
        &mut self,
        positions: &[Point3<f64>],
        lattice: Option<&Matrix3<f64>>,
    ) -> Result<(), EngineError> {
        if positions.len() != self.natoms {
            return Err(EngineError::new(format!(
                "update with {} positions on a {}-atom model",
                positions.len(),
                self.natoms
            )));
        }
        let pos = flatten_positions(positions);
        let cell = lattice.map(flatten_lattice);
        let cell_ptr = cell
            .as_ref()
            .map_or(std::ptr::null(), |c| c.as_ptr());
        unsafe { ffi::dftd3_update_structure(self.error.0, self.mol, pos.as_ptr(), cell_ptr) };
        self.error.check()
    }

    fn get_dispersion(
        &mut self,
        param: &DampingParam,
        grad: bool,
    ) -> Result<DispersionRecord, EngineError> {
        let mut par = self.new_param(param)?;

        let mut energy = 0.0f64;
        let mut gradient = vec![0.0f64; 3 * self.natoms];
        let mut sigma = [0.0f64; 9];
        unsafe {
            ffi::dftd3_get_dispersion(
                self.error.0,
                self.mol,
                self.model,
                par,
                &mut energy,
                if grad {
                    gradient.as_mut_ptr()
                } else {
                    std::ptr::null_mut()
                },
                if grad {
                    sigma.as_mut_ptr()
                } else {
                    std::ptr::null_mut()
                },
            );
            ffi::dftd3_delete_param(&mut par);
        }
        self.error.check()?;

        let (gradient, sigma) = if grad {
            let g = gradient
                .chunks_exact(3)
                .map(|c| Vector3::new(c[0], c[1], c[2]))
                .collect();
            (Some(g), Some(Matrix3::from_column_slice(&sigma)))
        } else {
            (None, None)
        };
        Ok(DispersionRecord {
            energy,
            gradient,
            sigma,
        })
    }
}
