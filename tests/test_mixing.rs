mod common;

use approx::assert_abs_diff_eq;

use common::{fixed_record, rocksalt, water, MockEngine};
use dftd3::engine::model::DispersionRecord;
use dftd3::{Calculator, D3Calculator, DampingFamily};

fn d3(record: DispersionRecord) -> D3Calculator {
    let (engine, _state) = MockEngine::new(record);
    D3Calculator::new(Box::new(engine))
        .with_method("pbe")
        .with_damping(DampingFamily::Rational)
}

#[test]
fn sum_equals_constituents_computed_independently() {
    let structure = water();

    let mut first = fixed_record(3);
    first.energy = -0.01;
    let mut second = fixed_record(3);
    second.energy = -0.002;

    // The same records evaluated separately...
    let lhs = d3(first.clone()).calculate(&structure).unwrap();
    let rhs = d3(second.clone()).calculate(&structure).unwrap();

    // ...and through the combinator.
    let mut sum = d3(first).add_calculator(Box::new(d3(second)));
    let combined = sum.calculate(&structure).unwrap();

    assert_abs_diff_eq!(combined.energy, lhs.energy + rhs.energy, epsilon = 1e-12);
    assert_abs_diff_eq!(
        combined.free_energy,
        lhs.free_energy + rhs.free_energy,
        epsilon = 1e-12
    );
    for i in 0..structure.len() {
        for k in 0..3 {
            assert_abs_diff_eq!(
                combined.forces[i][k],
                lhs.forces[i][k] + rhs.forces[i][k],
                epsilon = 1e-12
            );
        }
    }
    assert!(combined.stress.is_none());
}

#[test]
fn sum_adds_stress_for_periodic_structures() {
    let structure = rocksalt();

    let mut sum = d3(fixed_record(2)).add_calculator(Box::new(d3(fixed_record(2))));
    let combined = sum.calculate(&structure).unwrap();
    let single = d3(fixed_record(2)).calculate(&structure).unwrap();

    let combined_stress = combined.stress.expect("periodic sum must report stress");
    let single_stress = single.stress.unwrap();
    for (got, want) in combined_stress.iter().zip(single_stress.iter()) {
        assert_abs_diff_eq!(*got, 2.0 * want, epsilon = 1e-12);
    }
}
