//! NWB-shaped builders over [`DataObject`].
//!
//! Producers describe sessions, time series and optical physiology through
//! these types; the resulting tree uses the group names of the NWB schema so
//! test routines can address data by its NWB path.
use crate::case::{ensure_eq, require};
use crate::data::{ArrayData, DataObject, Dataset, Value};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

pub const NWB_VERSION: &str = "2.5.0";

/// Session-level metadata stored as root attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetadata {
    pub session_description: String,
    pub identifier: String,
    pub session_start_time: DateTime<Utc>,
    pub experimenter: Vec<String>,
    pub lab: String,
    pub institution: String,
    pub experiment_description: String,
    pub session_id: String,
}

impl SessionMetadata {
    fn text_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("session_description", &self.session_description),
            ("identifier", &self.identifier),
            ("lab", &self.lab),
            ("institution", &self.institution),
            ("experiment_description", &self.experiment_description),
            ("session_id", &self.session_id),
        ]
    }

    /// Assert that `object` carries exactly this metadata.
    pub fn check(&self, case: &str, object: &DataObject) -> Result<()> {
        for (field, expected) in self.text_fields() {
            let actual = require(case, field, object.attribute(field))?;
            ensure_eq(case, field, &actual.as_str(), &Some(expected))?;
        }
        let experimenter = require(case, "experimenter", object.attribute("experimenter"))?;
        let expected: Value = self.experimenter.clone().into();
        ensure_eq(case, "experimenter", experimenter, &expected)?;

        let start = require(
            case,
            "session_start_time",
            object.attribute("session_start_time"),
        )?;
        let parsed = start
            .as_str()
            .map(DateTime::parse_from_rfc3339)
            .transpose()
            .map_err(|err| anyhow!("{case}: session_start_time: {err}"))?
            .map(|time| time.with_timezone(&Utc));
        ensure_eq(
            case,
            "session_start_time",
            &parsed,
            &Some(self.session_start_time),
        )
    }
}

/// How samples of a time series map to time.
#[derive(Debug, Clone)]
pub enum Timing {
    Timestamps(Vec<f64>),
    Rate { starting_time: f64, rate: f64 },
}

#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub name: String,
    pub data: Dataset,
    pub unit: String,
    pub timing: Timing,
}

impl TimeSeries {
    fn into_group(self) -> DataObject {
        let mut group = DataObject::new().with_attribute("neurodata_type", "TimeSeries");
        group.set_attribute("unit", self.unit);
        group.set_dataset("data", self.data);
        write_timing(&mut group, self.timing);
        group
    }
}

fn write_timing(group: &mut DataObject, timing: Timing) {
    match timing {
        Timing::Timestamps(timestamps) => {
            group.set_dataset("timestamps", Dataset::float64(timestamps));
        }
        Timing::Rate {
            starting_time,
            rate,
        } => {
            group.set_attribute("starting_time", starting_time);
            group.set_attribute("rate", rate);
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpticalChannel {
    pub name: String,
    pub description: String,
    pub emission_lambda: f64,
}

#[derive(Debug, Clone)]
pub struct ImagingPlane {
    pub name: String,
    pub description: String,
    pub device: String,
    pub optical_channel: OpticalChannel,
    pub imaging_rate: f64,
    pub excitation_lambda: f64,
    pub indicator: String,
    pub location: String,
    pub grid_spacing: Vec<f64>,
    pub grid_spacing_unit: String,
}

/// Two-photon acquisition backed by external image files.
#[derive(Debug, Clone)]
pub struct TwoPhotonSeries {
    pub name: String,
    pub imaging_plane: String,
    pub dimension: Vec<i64>,
    pub external_file: Vec<String>,
    pub starting_frame: Vec<i64>,
    pub starting_time: f64,
    pub rate: f64,
}

/// ROI table of an image segmentation.
#[derive(Debug, Clone)]
pub struct PlaneSegmentation {
    pub name: String,
    pub description: String,
    pub imaging_plane: String,
    pub reference_images: String,
    pixel_masks: Vec<Vec<[f64; 3]>>,
    columns: Vec<(String, String, Dataset)>,
}

impl PlaneSegmentation {
    pub fn new(name: &str, description: &str, imaging_plane: &str, reference_images: &str) -> Self {
        PlaneSegmentation {
            name: name.to_string(),
            description: description.to_string(),
            imaging_plane: imaging_plane.to_string(),
            reference_images: reference_images.to_string(),
            pixel_masks: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Add one ROI given as `(y, x, weight)` pixels.
    pub fn add_roi(&mut self, pixel_mask: Vec<[f64; 3]>) {
        self.pixel_masks.push(pixel_mask);
    }

    pub fn add_column(&mut self, name: &str, description: &str, data: Dataset) -> Result<()> {
        if data.shape().first().copied() != Some(self.pixel_masks.len()) {
            return Err(anyhow!(
                "column {name} has {:?} rows, table has {}",
                data.shape().first(),
                self.pixel_masks.len()
            ));
        }
        self.columns
            .push((name.to_string(), description.to_string(), data));
        Ok(())
    }

    pub fn roi_count(&self) -> usize {
        self.pixel_masks.len()
    }

    fn into_group(self) -> Result<DataObject> {
        let mut group = DataObject::new().with_attribute("neurodata_type", "PlaneSegmentation");
        group.set_attribute("description", self.description);
        group.set_attribute("imaging_plane", self.imaging_plane);
        group.set_attribute("reference_images", self.reference_images);

        let ids = (0..self.pixel_masks.len() as i64).collect();
        let mut index = Vec::with_capacity(self.pixel_masks.len());
        let mut pixels = Vec::new();
        for mask in &self.pixel_masks {
            pixels.extend(mask.iter().flatten().copied());
            index.push((pixels.len() / 3) as i64);
        }
        let pixel_count = pixels.len() / 3;
        group.set_dataset("id", Dataset::int64(ids));
        group.set_dataset("pixel_mask_index", Dataset::int64(index));
        group.set_dataset(
            "pixel_mask",
            Dataset::new(vec![pixel_count, 3], ArrayData::Float64(pixels)).map_err(|err| anyhow!(err))?,
        );
        for (name, description, data) in self.columns {
            group.set_dataset(&name, data);
            group.set_attribute(&format!("{name}.description"), description);
        }
        Ok(group)
    }
}

/// Fluorescence traces over a region of a plane segmentation.
#[derive(Debug, Clone)]
pub struct RoiResponseSeries {
    pub name: String,
    pub data: Dataset,
    pub rois: Vec<i64>,
    pub rois_description: String,
    pub unit: String,
    pub rate: f64,
}

/// Builder for an NWB file tree.
#[derive(Debug, Clone)]
pub struct NwbFile {
    root: DataObject,
}

impl NwbFile {
    pub fn new(metadata: &SessionMetadata) -> Self {
        let mut root = DataObject::new().with_attribute("nwb_version", NWB_VERSION);
        for (field, value) in metadata.text_fields() {
            root.set_attribute(field, value);
        }
        root.set_attribute("experimenter", metadata.experimenter.clone());
        root.set_attribute(
            "session_start_time",
            metadata.session_start_time.to_rfc3339(),
        );
        NwbFile { root }
    }

    pub fn add_acquisition(&mut self, series: TimeSeries) {
        let name = series.name.clone();
        self.root
            .ensure_group("acquisition")
            .insert_group(&name, series.into_group());
    }

    pub fn add_stimulus(&mut self, series: TimeSeries) {
        let name = series.name.clone();
        self.root
            .ensure_group("stimulus/presentation")
            .insert_group(&name, series.into_group());
    }

    pub fn add_two_photon_series(&mut self, series: TwoPhotonSeries) {
        let mut group = DataObject::new().with_attribute("neurodata_type", "TwoPhotonSeries");
        group.set_attribute("imaging_plane", series.imaging_plane);
        group.set_attribute("format", "external");
        group.set_dataset("dimension", Dataset::int64(series.dimension));
        group.set_dataset("external_file", Dataset::text(series.external_file));
        group.set_dataset("starting_frame", Dataset::int64(series.starting_frame));
        write_timing(
            &mut group,
            Timing::Rate {
                starting_time: series.starting_time,
                rate: series.rate,
            },
        );
        self.root
            .ensure_group("acquisition")
            .insert_group(&series.name, group);
    }

    /// Append a row to the trials table.
    pub fn add_trial(&mut self, start_time: f64, stop_time: f64) {
        let trials = self.root.ensure_group("intervals/trials");
        let mut starts = column_f64(trials, "start_time");
        let mut stops = column_f64(trials, "stop_time");
        starts.push(start_time);
        stops.push(stop_time);
        let ids = (0..starts.len() as i64).collect();
        trials.set_dataset("start_time", Dataset::float64(starts));
        trials.set_dataset("stop_time", Dataset::float64(stops));
        trials.set_dataset("id", Dataset::int64(ids));
    }

    pub fn create_device(&mut self, name: &str, description: &str, manufacturer: &str) {
        let device = DataObject::new()
            .with_attribute("description", description)
            .with_attribute("manufacturer", manufacturer);
        self.root
            .ensure_group("general/devices")
            .insert_group(name, device);
    }

    pub fn create_imaging_plane(&mut self, plane: ImagingPlane) -> Result<()> {
        if self.root.group(&format!("general/devices/{}", plane.device)).is_none() {
            return Err(anyhow!(
                "imaging plane {} references unknown device {}",
                plane.name,
                plane.device
            ));
        }
        let channel = DataObject::new()
            .with_attribute("description", plane.optical_channel.description)
            .with_attribute("emission_lambda", plane.optical_channel.emission_lambda);
        let mut group = DataObject::new()
            .with_attribute("description", plane.description)
            .with_attribute("device", format!("/general/devices/{}", plane.device))
            .with_attribute("imaging_rate", plane.imaging_rate)
            .with_attribute("excitation_lambda", plane.excitation_lambda)
            .with_attribute("indicator", plane.indicator)
            .with_attribute("location", plane.location)
            .with_attribute("grid_spacing_unit", plane.grid_spacing_unit);
        group.set_dataset("grid_spacing", Dataset::float64(plane.grid_spacing));
        group.insert_group(&plane.optical_channel.name, channel);
        self.root
            .ensure_group("general/optophysiology")
            .insert_group(&plane.name, group);
        Ok(())
    }

    pub fn add_plane_segmentation(&mut self, module: &str, segmentation: PlaneSegmentation) -> Result<()> {
        let name = segmentation.name.clone();
        let group = segmentation.into_group()?;
        self.processing_module(module)
            .ensure_group("ImageSegmentation")
            .insert_group(&name, group);
        Ok(())
    }

    pub fn add_fluorescence(&mut self, module: &str, series: RoiResponseSeries) {
        let mut group = DataObject::new()
            .with_attribute("neurodata_type", "RoiResponseSeries")
            .with_attribute("unit", series.unit)
            .with_attribute("rois.description", series.rois_description);
        group.set_dataset("data", series.data);
        group.set_dataset("rois", Dataset::int64(series.rois));
        write_timing(
            &mut group,
            Timing::Rate {
                starting_time: 0.0,
                rate: series.rate,
            },
        );
        self.processing_module(module)
            .ensure_group("Fluorescence")
            .insert_group(&series.name, group);
    }

    pub fn create_processing_module(&mut self, name: &str, description: &str) {
        self.processing_module(name)
            .set_attribute("description", description);
    }

    fn processing_module(&mut self, name: &str) -> &mut DataObject {
        self.root.ensure_group("processing").ensure_group(name)
    }

    pub fn into_object(self) -> DataObject {
        self.root
    }
}

fn column_f64(group: &DataObject, name: &str) -> Vec<f64> {
    group
        .dataset(name)
        .and_then(Dataset::as_f64)
        .map(<[f64]>::to_vec)
        .unwrap_or_default()
}
