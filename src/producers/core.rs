//! Producer `core`: sessions built from the NWB core schema only.
use crate::nwb::SessionMetadata;
use crate::registry::Registry;
use chrono::{TimeZone, Utc};

mod fleischmann;
mod fleischmann_lab;
mod simple1;

const PRODUCER: &str = "core";

pub(super) fn register(registry: &mut Registry) {
    registry.register(PRODUCER, "simple1", simple1::bindings);
    registry.register(PRODUCER, "fleischmann", fleischmann::bindings);
    registry.register(PRODUCER, "fleischmann_lab", fleischmann_lab::bindings);
}

/// Session metadata shared by every `core` script.
fn session_metadata() -> SessionMetadata {
    SessionMetadata {
        session_description: "my first synthetic recording".to_string(),
        identifier: "EXAMPLE_ID".to_string(),
        session_start_time: Utc
            .with_ymd_and_hms(2021, 3, 3, 0, 0, 0)
            .single()
            .unwrap_or_default(),
        experimenter: vec!["Dr. Bilbo Baggins".to_string()],
        lab: "Bag End Laboratory".to_string(),
        institution: "University of Middle Earth at the Shire".to_string(),
        experiment_description:
            "I went on an adventure with thirteen dwarves to reclaim vast treasures.".to_string(),
        session_id: "LONELYMTN".to_string(),
    }
}
