//! Time series, trials and two-photon optical physiology.
//!
//! Pseudo-random inputs come from a generator seeded per case instance, so
//! `create` and `test` regenerate identical values.
use super::fleischmann::{self, Acquisition};
use crate::case::{ensure_eq, require, Artifact, Binding, Bindings, CaseType, Created, SampleCase};
use crate::data::{ArrayData, DataObject, Dataset, Value};
use crate::nwb::{
    ImagingPlane, OpticalChannel, PlaneSegmentation, RoiResponseSeries, TwoPhotonSeries,
};
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NAME: &str = "FleischmannLab";
const FILENAME: &str = "fleischmann.nwb";
const DEFAULT_SEED: u64 = 42;
const SERIE_LENGTH: usize = 10;
const NCELLS: usize = 10;
const PIX_DIM: i64 = 150;
const ACQUISITION_NAME: &str = "my_awesome_timeserie1";
const STIMULUS_NAME: &str = "my_awesome_timeserie2";
const MODULE: &str = "ophys";

pub(super) fn bindings() -> Bindings {
    vec![
        ("metadata", Binding::Item),
        ("CONST", Binding::Item),
        ("timeseries", Binding::Item),
        ("ophys", Binding::Item),
        (NAME, Binding::Case(CaseType::of::<FleischmannLab>(NAME))),
    ]
}

/// Optical physiology inputs, as a suite2p run would report them.
#[derive(Debug, Clone)]
struct Ophys {
    ly: i64,
    lx: i64,
    filelist: Vec<String>,
    fs: f64,
    nplanes: i64,
    ypix: Vec<i64>,
    xpix: Vec<i64>,
    lam: Vec<f64>,
    iscell: Vec<i64>,
    traces: Vec<f64>,
}

impl Ophys {
    fn generate(rng: &mut StdRng) -> Self {
        Ophys {
            ly: PIX_DIM,
            lx: PIX_DIM,
            filelist: vec!["/path/to/tiff/files".to_string()],
            fs: 4.5,
            nplanes: 3,
            ypix: (0..NCELLS).map(|_| rng.random_range(0..PIX_DIM)).collect(),
            xpix: (0..NCELLS).map(|_| rng.random_range(0..PIX_DIM)).collect(),
            lam: (0..NCELLS).map(|_| rng.random::<f64>()).collect(),
            iscell: (0..NCELLS).map(|_| rng.random_range(0..2)).collect(),
            traces: (0..NCELLS * SERIE_LENGTH)
                .map(|_| 100.0 * rng.random::<f64>())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FleischmannLab {
    seed: u64,
}

impl Default for FleischmannLab {
    fn default() -> Self {
        FleischmannLab { seed: DEFAULT_SEED }
    }
}

impl FleischmannLab {
    fn inputs(&self) -> (Acquisition, Ophys) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let acquisition = Acquisition::generate(&mut rng);
        let ophys = Ophys::generate(&mut rng);
        (acquisition, ophys)
    }

    fn build(&self) -> Result<DataObject> {
        let (acquisition, ophys) = self.inputs();
        let mut file = fleischmann::create(&acquisition, ACQUISITION_NAME, STIMULUS_NAME);

        file.create_device(
            "Microscope",
            "My two-photon microscope",
            "The best microscope manufacturer",
        );
        file.create_imaging_plane(ImagingPlane {
            name: "ImagingPlane".to_string(),
            description: "standard".to_string(),
            device: "Microscope".to_string(),
            optical_channel: OpticalChannel {
                name: "OpticalChannel".to_string(),
                description: "an optical channel".to_string(),
                emission_lambda: 500.0,
            },
            imaging_rate: ophys.fs,
            excitation_lambda: 600.0,
            indicator: "GCaMP".to_string(),
            location: "V1".to_string(),
            grid_spacing: vec![2.0, 2.0, 30.0],
            grid_spacing_unit: "microns".to_string(),
        })?;
        file.add_two_photon_series(TwoPhotonSeries {
            name: "TwoPhotonSeries".to_string(),
            imaging_plane: "/general/optophysiology/ImagingPlane".to_string(),
            dimension: vec![ophys.ly, ophys.lx],
            external_file: ophys.filelist.clone(),
            starting_frame: vec![0],
            starting_time: 0.0,
            rate: ophys.fs * ophys.nplanes as f64,
        });
        file.create_processing_module(MODULE, "optical physiology processed data");

        let mut segmentation = PlaneSegmentation::new(
            "PlaneSegmentation",
            "suite2p output",
            "/general/optophysiology/ImagingPlane",
            "/acquisition/TwoPhotonSeries",
        );
        for cell in 0..NCELLS {
            segmentation.add_roi(vec![[
                ophys.ypix[cell] as f64,
                ophys.xpix[cell] as f64,
                ophys.lam[cell],
            ]]);
        }
        segmentation.add_column(
            "iscell",
            "two columns - iscell & probcell",
            Dataset::int64(ophys.iscell.clone()),
        )?;
        let rois = (0..segmentation.roi_count() as i64).collect();
        file.add_plane_segmentation(MODULE, segmentation)?;

        let traces = Dataset::new(vec![NCELLS, SERIE_LENGTH], ArrayData::Float64(ophys.traces))
            .map_err(|err| anyhow!("traces: {err}"))?;
        file.add_fluorescence(
            MODULE,
            RoiResponseSeries {
                name: "Plane_1".to_string(),
                data: traces,
                rois,
                rois_description: "all ROIs".to_string(),
                unit: "lumens".to_string(),
                rate: ophys.fs,
            },
        );
        Ok(file.into_object())
    }

    fn floats<'a>(&self, object: &'a DataObject, path: &str) -> Result<&'a [f64]> {
        require(NAME, path, object.dataset(path).and_then(Dataset::as_f64))
    }

    fn ints<'a>(&self, object: &'a DataObject, path: &str) -> Result<&'a [i64]> {
        require(NAME, path, object.dataset(path).and_then(Dataset::as_i64))
    }
}

impl SampleCase for FleischmannLab {
    fn filename(&self) -> &str {
        FILENAME
    }

    fn create(&self) -> Result<Created> {
        let case = self.clone();
        let artifacts = std::iter::once_with(move || -> Result<Artifact> {
            Ok(Artifact {
                namespace: "core".to_string(),
                filename: FILENAME.to_string(),
                object: case.build()?,
            })
        });
        Ok(Created::Artifacts(Box::new(artifacts)))
    }

    fn test(&self, object: &DataObject) -> Result<()> {
        let (acquisition, ophys) = self.inputs();
        fleischmann::test_basic(NAME, object)?;

        for (group, name) in [
            ("acquisition", ACQUISITION_NAME),
            ("stimulus/presentation", STIMULUS_NAME),
        ] {
            let data = self.floats(object, &format!("{group}/{name}/data"))?;
            ensure_eq(NAME, name, data, acquisition.data.as_slice())?;
            let timestamps = self.floats(object, &format!("{group}/{name}/timestamps"))?;
            ensure_eq(NAME, name, timestamps, acquisition.timestamps.as_slice())?;
        }
        let starts = self.floats(object, "intervals/trials/start_time")?;
        ensure_eq(NAME, "trials", starts, acquisition.trials.as_slice())?;

        let segmentation = require(
            NAME,
            "PlaneSegmentation",
            object.group("processing/ophys/ImageSegmentation/PlaneSegmentation"),
        )?;
        let plane_path = require(
            NAME,
            "PlaneSegmentation imaging_plane",
            segmentation.attribute("imaging_plane").and_then(Value::as_str),
        )?;
        let imaging_rate = require(
            NAME,
            "imaging_rate",
            object.attribute(&format!("{}/imaging_rate", plane_path.trim_start_matches('/'))),
        )?;
        ensure_eq(NAME, "imaging_rate", imaging_rate, &Value::Float(ophys.fs))?;

        let rate = require(
            NAME,
            "TwoPhotonSeries rate",
            object.attribute("acquisition/TwoPhotonSeries/rate"),
        )?;
        ensure_eq(
            NAME,
            "TwoPhotonSeries rate",
            rate,
            &Value::Float(ophys.fs * ophys.nplanes as f64),
        )?;
        let external = require(
            NAME,
            "external_file",
            object
                .dataset("acquisition/TwoPhotonSeries/external_file")
                .and_then(Dataset::as_text),
        )?;
        ensure_eq(NAME, "external_file", external, ophys.filelist.as_slice())?;
        let dimension = self.ints(object, "acquisition/TwoPhotonSeries/dimension")?;
        ensure_eq(NAME, "dimension", dimension, &[ophys.ly, ophys.lx][..])?;

        let iscell = self.ints(
            object,
            "processing/ophys/ImageSegmentation/PlaneSegmentation/iscell",
        )?;
        ensure_eq(NAME, "iscell", iscell, ophys.iscell.as_slice())?;

        let traces = self.floats(object, "processing/ophys/Fluorescence/Plane_1/data")?;
        ensure_eq(NAME, "Plane_1 traces", traces, ophys.traces.as_slice())
    }
}
