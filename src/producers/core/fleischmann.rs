//! Time series and trials, exported as plain helpers.
//!
//! This script defines no case type, so discovery finds nothing here;
//! `fleischmann_lab` builds its session on top of these helpers.
use super::session_metadata;
use crate::case::{Binding, Bindings};
use crate::data::{DataObject, Dataset};
use crate::nwb::{NwbFile, TimeSeries, Timing};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;

const SERIE_LENGTH: usize = 10;
const UNIT: &str = "squirrel squared";

pub(super) fn bindings() -> Bindings {
    vec![
        ("metadata", Binding::Item),
        ("acquisition", Binding::Item),
        ("create", Binding::Item),
        ("test_basic", Binding::Item),
    ]
}

/// Values of the synthetic acquisition.
#[derive(Debug, Clone)]
pub(super) struct Acquisition {
    pub(super) data: Vec<f64>,
    pub(super) timestamps: Vec<f64>,
    pub(super) trials: Vec<f64>,
}

impl Acquisition {
    pub(super) fn generate(rng: &mut StdRng) -> Self {
        Acquisition {
            data: (0..SERIE_LENGTH).map(|_| rng.random::<f64>()).collect(),
            timestamps: linspace(0.0, 0.1, SERIE_LENGTH),
            trials: (0..5).map(|step| step as f64 * 0.02).collect(),
        }
    }

    fn series(&self, name: &str) -> TimeSeries {
        TimeSeries {
            name: name.to_string(),
            data: Dataset::float64(self.data.clone()),
            unit: UNIT.to_string(),
            timing: Timing::Timestamps(self.timestamps.clone()),
        }
    }
}

/// Session with one acquisition series, one stimulus series and a trials table.
pub(super) fn create(acquisition: &Acquisition, acquisition_name: &str, stimulus_name: &str) -> NwbFile {
    let mut file = NwbFile::new(&session_metadata());
    file.add_acquisition(acquisition.series(acquisition_name));
    file.add_stimulus(acquisition.series(stimulus_name));
    let half_width = match acquisition.trials.as_slice() {
        [first, second, ..] => (second - first) / 2.0,
        _ => 0.0,
    };
    for trial in &acquisition.trials {
        file.add_trial(*trial, trial + half_width);
    }
    file
}

pub(super) fn test_basic(case: &str, object: &DataObject) -> Result<()> {
    session_metadata().check(case, object)
}

/// Evenly spaced samples over `[start, stop]`, endpoint included.
fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start; count];
    }
    let step = (stop - start) / (count - 1) as f64;
    let mut values: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
    values[count - 1] = stop;
    values
}
