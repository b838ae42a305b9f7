//! DFT-D3 dispersion correction calculator.
//!
//! The dispersion physics lives in an external native engine (s-dftd3);
//! this crate translates structures and damping parameters into the
//! engine's units and conventions, caches the expensive model handle
//! across geometry updates, and maps the results back to eV/Å properties.

pub mod calculator;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;

pub use crate::calculator::{Calculator, D3Calculator, Properties};
pub use crate::core::domain::{Lattice, Structure};
pub use crate::engine::damping::{DampingFamily, DampingParam, ParamTweaks};
pub use crate::error::Error;
