//! Minimal xyz / extended-xyz reader.

use std::fs;
use std::path::Path;

use nalgebra::{Matrix3, Point3, Vector3};

use crate::core::domain::{Lattice, Structure};
use crate::core::elements;
use crate::error::Error;

/// Reads a structure from an xyz file. A `Lattice="..."` entry on the
/// comment line (extended-xyz convention) makes the structure fully
/// periodic.
pub fn read_xyz(path: impl AsRef<Path>) -> Result<Structure, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Input(format!("cannot read {}: {e}", path.display())))?;
    parse_xyz(&text)
}

pub fn parse_xyz(text: &str) -> Result<Structure, Error> {
    let mut lines = text.lines();
    let natoms: usize = lines
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::input("empty xyz file"))?
        .parse()
        .map_err(|_| Error::input("first xyz line must be the atom count"))?;
    let comment = lines.next().unwrap_or("");
    let lattice = parse_lattice_tag(comment)?;

    let mut numbers = Vec::with_capacity(natoms);
    let mut positions = Vec::with_capacity(natoms);
    for (i, line) in lines.enumerate() {
        if numbers.len() == natoms {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts.len() < 4 {
            return Err(Error::Input(format!(
                "xyz line {}: expected a symbol and three coordinates",
                i + 3
            )));
        }
        let number = elements::atomic_number(parts[0])
            .ok_or_else(|| Error::Input(format!("unknown element symbol '{}'", parts[0])))?;
        let mut xyz = [0.0; 3];
        for (slot, text) in xyz.iter_mut().zip(&parts[1..4]) {
            *slot = text.parse().map_err(|_| {
                Error::Input(format!("xyz line {}: bad coordinate '{text}'", i + 3))
            })?;
        }
        numbers.push(number);
        positions.push(Point3::new(xyz[0], xyz[1], xyz[2]));
    }
    if numbers.len() != natoms {
        return Err(Error::Input(format!(
            "xyz header promises {natoms} atoms, found {}",
            numbers.len()
        )));
    }

    match lattice {
        Some(lattice) => Structure::crystal(numbers, positions, lattice),
        None => Structure::molecule(numbers, positions),
    }
}

/// Extracts an extended-xyz `Lattice="ax ay az bx by bz cx cy cz"` tag
/// (rows are the lattice vectors) from the comment line.
fn parse_lattice_tag(comment: &str) -> Result<Option<Lattice>, Error> {
    const TAG: &str = "Lattice=\"";
    let start = match comment.find(TAG) {
        Some(i) => i + TAG.len(),
        None => return Ok(None),
    };
    let rest = &comment[start..];
    let end = rest
        .find('"')
        .ok_or_else(|| Error::input("unterminated Lattice tag"))?;
    let values: Vec<f64> = rest[..end]
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| Error::input("Lattice tag must contain nine numbers"))?;
    if values.len() != 9 {
        return Err(Error::Input(format!(
            "Lattice tag must contain nine numbers, found {}",
            values.len()
        )));
    }
    let a = Vector3::new(values[0], values[1], values[2]);
    let b = Vector3::new(values[3], values[4], values[5]);
    let c = Vector3::new(values[6], values[7], values[8]);
    Ok(Some(Lattice::new(Matrix3::from_columns(&[a, b, c]))?))
}
