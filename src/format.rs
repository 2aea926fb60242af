//! Sample file codec.
//!
//! Sample files hold one data object inside a versioned JSON envelope. Readers
//! refuse envelopes from other formats or versions instead of guessing.
use crate::data::DataObject;
use crate::error::HealthError;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const FORMAT_ID: &str = "nwb-healthstatus/json";
pub const FORMAT_VERSION: u32 = 1;
/// Published sample files are world-readable, unlike the temp file they start as.
#[cfg(unix)]
const SAMPLE_FILE_MODE: u32 = 0o644;

/// Persistence seam between the runner and the on-disk representation.
pub trait SampleFormat {
    fn write(&self, object: &DataObject, path: &Path) -> Result<()>;
    fn read(&self, path: &Path) -> Result<DataObject>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    root: &'a DataObject,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    format: String,
    version: u32,
    root: DataObject,
}

/// JSON envelope format used for every bundled producer.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSampleFormat;

impl SampleFormat for JsonSampleFormat {
    fn write(&self, object: &DataObject, path: &Path) -> Result<()> {
        object
            .validate()
            .map_err(|message| anyhow!("refusing to write {}: {message}", path.display()))?;
        let envelope = EnvelopeRef {
            format: FORMAT_ID,
            version: FORMAT_VERSION,
            root: object,
        };
        let bytes = serde_json::to_vec_pretty(&envelope).context("serialize sample file")?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(&bytes)
            .with_context(|| format!("write {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(SAMPLE_FILE_MODE))
                .with_context(|| format!("set permissions on {}", path.display()))?;
        }
        tmp.persist(path)
            .with_context(|| format!("publish {}", path.display()))?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<DataObject> {
        if !path.is_file() {
            return Err(HealthError::MissingArtifact {
                path: path.to_path_buf(),
            }
            .into());
        }
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let corrupt = |message: String| HealthError::CorruptArtifact {
            path: path.to_path_buf(),
            message,
        };
        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|err| corrupt(err.to_string()))?;
        if envelope.format != FORMAT_ID {
            return Err(corrupt(format!("unexpected format {:?}", envelope.format)).into());
        }
        if envelope.version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported version {}", envelope.version)).into());
        }
        envelope.root.validate().map_err(corrupt)?;
        Ok(envelope.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Value};

    fn sample_object() -> DataObject {
        let mut object = DataObject::new()
            .with_attribute("session_id", "LONELYMTN")
            .with_attribute("experimenter", vec!["Dr. Bilbo Baggins"]);
        object
            .ensure_group("acquisition/ts")
            .set_dataset("data", Dataset::float64(vec![0.1, 0.2 + 0.1, 1e-300, -0.0]));
        object
    }

    #[test]
    fn written_object_reads_back_bit_for_bit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("core").join("sample.nwb");
        let object = sample_object();

        JsonSampleFormat.write(&object, &path).expect("write sample");
        let back = JsonSampleFormat.read(&path).expect("read sample");

        assert_eq!(back, object);
        let original = object.dataset("acquisition/ts/data").and_then(Dataset::as_f64);
        let reread = back.dataset("acquisition/ts/data").and_then(Dataset::as_f64);
        let bits = |values: Option<&[f64]>| {
            values
                .unwrap_or_default()
                .iter()
                .map(|value| value.to_bits())
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(original), bits(reread));
        assert_eq!(
            back.attribute("experimenter"),
            Some(&Value::List(vec![Value::from("Dr. Bilbo Baggins")]))
        );
    }

    #[test]
    fn non_finite_floats_are_refused_before_writing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nan.nwb");
        let mut object = DataObject::new();
        object
            .ensure_group("acquisition/ts")
            .set_dataset("data", Dataset::float64(vec![1.0, f64::NAN]));

        let err = JsonSampleFormat.write(&object, &path).unwrap_err();
        assert!(err.to_string().contains("non-finite"), "{err}");
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn published_sample_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sample.nwb");
        JsonSampleFormat
            .write(&sample_object(), &path)
            .expect("write sample");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, SAMPLE_FILE_MODE);
    }

    #[test]
    fn missing_file_is_missing_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = JsonSampleFormat
            .read(&dir.path().join("absent.nwb"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HealthError>(),
            Some(HealthError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn foreign_envelope_is_corrupt_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("foreign.nwb");
        fs::write(&path, r#"{"format":"hdf5","version":1,"root":{}}"#).expect("write");
        let err = JsonSampleFormat.read(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HealthError>(),
            Some(HealthError::CorruptArtifact { .. })
        ));

        fs::write(&path, "not json").expect("write");
        let err = JsonSampleFormat.read(&path).unwrap_err();
        assert!(err.to_string().contains("not readable"), "{err}");
    }
}
