use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use dftd3::core::elements;
use dftd3::engine::external::sdftd3::SDftd3Engine;
use dftd3::io::read_xyz;
use dftd3::{Calculator, D3Calculator, DampingFamily, ParamTweaks};

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "DFT-D3 dispersion correction", long_about = None)]
struct Args {
    /// Structure file (xyz; an extended-xyz Lattice tag makes it periodic)
    input: PathBuf,

    /// Method to look damping parameters up for (e.g. pbe, tpss)
    #[arg(short, long)]
    method: Option<String>,

    /// Damping function (d3bj, d3zero, d3bjm, d3zerom, d3op)
    #[arg(short, long, default_value = "d3bj")]
    damping: String,

    /// Override a damping parameter (repeatable), e.g. -p s8=0.7875
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Emit results as JSON
    #[arg(long)]
    json: bool,
}

fn parse_tweaks(overrides: &[String]) -> Result<ParamTweaks> {
    let mut tweaks = ParamTweaks::default();
    for entry in overrides {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got '{entry}'"))?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("'{value}' is not a number"))?;
        tweaks.set(key, value)?;
    }
    Ok(tweaks)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let structure = read_xyz(&args.input)?;
    let damping: DampingFamily = args.damping.parse()?;
    let tweaks = parse_tweaks(&args.params)?;

    let mut calc = D3Calculator::new(Box::new(SDftd3Engine::new()))
        .with_damping(damping)
        .with_params_tweaks(tweaks);
    if let Some(method) = &args.method {
        calc = calc.with_method(method);
    }

    let results = calc.calculate(&structure)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("Dispersion energy: {:20.12} eV", results.energy);
    println!("Forces (eV/Å):");
    for (number, force) in structure.numbers.iter().zip(&results.forces) {
        let symbol = elements::symbol(*number).unwrap_or("?");
        println!(
            "{:<3} {:16.10} {:16.10} {:16.10}",
            symbol, force.x, force.y, force.z
        );
    }
    if let Some(stress) = results.stress {
        println!("Stress (eV/Å³, Voigt xx yy zz yz xz xy):");
        let row: Vec<String> = stress.iter().map(|s| format!("{s:14.10}")).collect();
        println!("{}", row.join(" "));
    }
    Ok(())
}
