use std::path::Path;

use anyhow::{Result, bail};

use crate::io::snapshots::SnapshotReader;

/// Impulse response of one absorber derived from its cumulative hits.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    /// Simulation time step in seconds.
    pub time_step: f64,
    /// Cumulative hits normalized to `[0, 1]` by the final value.
    pub cumulative: Vec<f64>,
    /// Energy captured during each step.
    pub energy_per_step: Vec<f64>,
}

impl ImpulseResponse {
    /// Builds the response of absorber `absorber` from `hits[step][absorber]`.
    ///
    /// If nothing was captured the normalized curve is all zeros.
    pub fn from_cumulative_hits(
        hits: &[Vec<f64>],
        absorber: usize,
        time_step: f64,
    ) -> Result<Self> {
        if time_step <= 0.0 {
            bail!("Time step must be positive, got {time_step}");
        }
        let series = hits
            .iter()
            .enumerate()
            .map(|(step, h)| match h.get(absorber) {
                Some(v) => Ok(*v),
                None => bail!("Absorber {absorber} missing at step {step}"),
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut previous = 0.0;
        let energy_per_step = series
            .iter()
            .map(|&v| {
                let de = v - previous;
                previous = v;
                de
            })
            .collect();

        let total = series.last().copied().unwrap_or(0.0);
        let cumulative = if total > 0.0 {
            series.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; series.len()]
        };

        Ok(Self {
            time_step,
            cumulative,
            energy_per_step,
        })
    }

    /// Reads the hit series from a snapshot directory.
    pub fn from_snapshots(dir: &Path, absorber: usize, time_step: f64) -> Result<Self> {
        let hits = SnapshotReader::new(dir).hit_series()?;
        Self::from_cumulative_hits(&hits, absorber, time_step)
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Elapsed time at the end of each step: `(step + 1) * time_step`.
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| (i + 1) as f64 * self.time_step)
            .collect()
    }

    /// Total captured energy.
    pub fn total_energy(&self) -> f64 {
        self.energy_per_step.iter().sum()
    }

    /// Schroeder backward integration in dB, 0 dB at time 0.
    pub fn schroeder_decay(&self) -> Vec<f64> {
        let total = self.total_energy();
        if total <= 0.0 {
            return vec![f64::NEG_INFINITY; self.energy_per_step.len()];
        }

        let mut decay = vec![0.0; self.energy_per_step.len()];
        let mut remaining = total;
        for (d, &e) in decay.iter_mut().zip(self.energy_per_step.iter()) {
            *d = 10.0 * (remaining / total).log10();
            remaining -= e;
        }

        decay
    }
}
