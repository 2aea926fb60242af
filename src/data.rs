//! In-memory data objects written to and read from sample files.
//!
//! A data object is a tree of groups. Each group carries scalar attributes
//! and typed n-dimensional datasets, mirroring the HDF5 layout NWB files use.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar or list attribute value.
///
/// Values are tagged on disk so integers and floats stay distinct after a
/// round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Value::Float(value) => value.is_finite(),
            Value::List(values) => values.iter().all(Value::is_finite),
            _ => true,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// Flat element storage of a dataset, in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "snake_case")]
pub enum ArrayData {
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Text(Vec<String>),
}

impl ArrayData {
    fn len(&self) -> usize {
        match self {
            ArrayData::Float64(values) => values.len(),
            ArrayData::Int64(values) => values.len(),
            ArrayData::Text(values) => values.len(),
        }
    }
}

/// Typed array with an explicit shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    shape: Vec<usize>,
    data: ArrayData,
}

impl Dataset {
    /// Build a dataset, rejecting shapes that disagree with the element count.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, String> {
        let dataset = Dataset { shape, data };
        dataset.check_shape()?;
        Ok(dataset)
    }

    pub fn float64(values: Vec<f64>) -> Self {
        Dataset {
            shape: vec![values.len()],
            data: ArrayData::Float64(values),
        }
    }

    pub fn int64(values: Vec<i64>) -> Self {
        Dataset {
            shape: vec![values.len()],
            data: ArrayData::Int64(values),
        }
    }

    pub fn text(values: Vec<String>) -> Self {
        Dataset {
            shape: vec![values.len()],
            data: ArrayData::Text(values),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            ArrayData::Float64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            ArrayData::Int64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match &self.data {
            ArrayData::Text(values) => Some(values),
            _ => None,
        }
    }

    fn check_shape(&self) -> Result<(), String> {
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            return Err(format!(
                "shape {:?} expects {expected} elements, found {}",
                self.shape,
                self.data.len()
            ));
        }
        Ok(())
    }

    fn check_finite(&self) -> Result<(), String> {
        if let ArrayData::Float64(values) = &self.data {
            if let Some((index, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(format!("non-finite value {value} at index {index}"));
            }
        }
        Ok(())
    }
}

/// Group node of a data object tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataObject {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    datasets: BTreeMap<String, Dataset>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    groups: BTreeMap<String, DataObject>,
}

impl DataObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn set_dataset(&mut self, name: &str, dataset: Dataset) {
        self.datasets.insert(name.to_string(), dataset);
    }

    pub fn insert_group(&mut self, name: &str, group: DataObject) {
        self.groups.insert(name.to_string(), group);
    }

    /// Return the group at `path`, creating every missing level.
    pub fn ensure_group(&mut self, path: &str) -> &mut DataObject {
        let mut node = self;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            node = node.groups.entry(segment.to_string()).or_default();
        }
        node
    }

    /// Look up an attribute by `/`-separated path.
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        let (parent, leaf) = split_path(path);
        self.group_at(parent)?.attributes.get(leaf)
    }

    /// Look up a dataset by `/`-separated path.
    pub fn dataset(&self, path: &str) -> Option<&Dataset> {
        let (parent, leaf) = split_path(path);
        self.group_at(parent)?.datasets.get(leaf)
    }

    /// Look up a group by `/`-separated path.
    pub fn group(&self, path: &str) -> Option<&DataObject> {
        self.group_at(path)
    }

    /// Check dataset shapes and that every float is finite, reporting the first bad path.
    ///
    /// JSON has no NaN or infinity, so a tree failing this check cannot be stored.
    pub fn validate(&self) -> Result<(), String> {
        self.validate_at("")
    }

    fn validate_at(&self, prefix: &str) -> Result<(), String> {
        for (name, value) in &self.attributes {
            if !value.is_finite() {
                return Err(format!("attribute {prefix}{name}: non-finite value"));
            }
        }
        for (name, dataset) in &self.datasets {
            dataset
                .check_shape()
                .and_then(|()| dataset.check_finite())
                .map_err(|err| format!("dataset {prefix}{name}: {err}"))?;
        }
        for (name, group) in &self.groups {
            group.validate_at(&format!("{prefix}{name}/"))?;
        }
        Ok(())
    }

    fn group_at(&self, path: &str) -> Option<&DataObject> {
        let mut node = self;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            node = node.groups.get(segment)?;
        }
        Some(node)
    }
}

fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, leaf)) => (parent, leaf),
        None => ("", path),
    }
}
