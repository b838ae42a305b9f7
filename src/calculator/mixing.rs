//! Additive combination of calculators.

use nalgebra::Vector3;

use crate::calculator::{Calculator, Properties};
use crate::core::domain::Structure;
use crate::error::Error;

/// Sums the properties of its constituent calculators, each evaluated
/// independently on the same structure. Stress survives only if every
/// constituent provides it.
pub struct SumCalculator {
    calcs: Vec<Box<dyn Calculator>>,
}

impl SumCalculator {
    pub fn new(calcs: Vec<Box<dyn Calculator>>) -> Self {
        Self { calcs }
    }
}

impl Calculator for SumCalculator {
    fn calculate(&mut self, structure: &Structure) -> Result<Properties, Error> {
        if self.calcs.is_empty() {
            return Err(Error::input("sum calculator has no constituents"));
        }
        let n = structure.len();
        let mut energy = 0.0;
        let mut free_energy = 0.0;
        let mut forces = vec![Vector3::zeros(); n];
        let mut stress = Some([0.0; 6]);

        for calc in &mut self.calcs {
            let p = calc.calculate(structure)?;
            if p.forces.len() != n {
                return Err(Error::CalculationFailed(format!(
                    "calculator '{}' returned {} forces for {} atoms",
                    calc.name(),
                    p.forces.len(),
                    n
                )));
            }
            energy += p.energy;
            free_energy += p.free_energy;
            for (acc, f) in forces.iter_mut().zip(&p.forces) {
                *acc += *f;
            }
            stress = match (stress, p.stress) {
                (Some(mut acc), Some(s)) => {
                    for (a, b) in acc.iter_mut().zip(s.iter()) {
                        *a += b;
                    }
                    Some(acc)
                }
                _ => None,
            };
        }

        Ok(Properties {
            energy,
            free_energy,
            forces,
            stress,
        })
    }

    fn name(&self) -> &str {
        "sum"
    }
}
