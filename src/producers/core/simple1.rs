//! Session metadata only.
use super::session_metadata;
use crate::case::{Binding, Bindings, CaseType, Created, SampleCase};
use crate::data::DataObject;
use crate::nwb::NwbFile;
use anyhow::Result;

pub(super) fn bindings() -> Bindings {
    vec![
        ("metadata", Binding::Item),
        ("Simple1", Binding::Case(CaseType::of::<Simple1>("Simple1"))),
    ]
}

#[derive(Debug, Default)]
pub struct Simple1;

impl SampleCase for Simple1 {
    fn filename(&self) -> &str {
        "simple1.nwb"
    }

    fn create(&self) -> Result<Created> {
        Ok(Created::Single(NwbFile::new(&session_metadata()).into_object()))
    }

    fn test(&self, object: &DataObject) -> Result<()> {
        session_metadata().check("Simple1", object)
    }
}
