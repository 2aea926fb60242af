//! Bundled case scripts, one submodule per producer.
//!
//! Each producer directory holds one source file per case script; the file
//! paths are what `sample create` and `sample test` take on the command line.
use crate::registry::Registry;

mod core;

pub fn register_all(registry: &mut Registry) {
    self::core::register(registry);
}
