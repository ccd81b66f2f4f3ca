use std::path::PathBuf;

use anyhow::{Result, bail};
use roomrays::io::{SnapshotReader, read_building};
use roomrays::sim::acoustics::ImpulseResponse;
use roomrays::{Simulation, SimulationConfig};

const USAGE: &str = "Usage: roomrays <building.json> <config.json> <output_dir>";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [building_path, config_path, output_dir] = args.as_slice() else {
        bail!("{USAGE}");
    };

    let building = read_building(&PathBuf::from(building_path))?;
    let config = SimulationConfig::from_json_file(&PathBuf::from(config_path))?;
    let time_step = config.time_step;

    let sim = Simulation::new(building, config)?;
    let output_dir = PathBuf::from(output_dir);
    let result = sim.run_to_dir(&output_dir)?;

    println!(
        "Simulated {} steps, {} of {} rays still alive",
        result.num_steps,
        result.rays.num_alive(),
        result.rays.len()
    );
    let hit_series = SnapshotReader::new(&output_dir).hit_series()?;
    for (i, total) in result.hits.iter().enumerate() {
        let ir = ImpulseResponse::from_cumulative_hits(&hit_series, i, time_step)?;
        let half = ir.cumulative.iter().position(|v| *v >= 0.5);
        match half {
            Some(step) => println!(
                "Absorber {i}: {total:.6} collected, half reached at {:.4} s",
                ir.time_axis()[step]
            ),
            None => println!("Absorber {i}: {total:.6} collected"),
        }
    }

    Ok(())
}
