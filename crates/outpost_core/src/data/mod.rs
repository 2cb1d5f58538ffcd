//! Data structures for block and resource configuration.
//!
//! This module contains pure data structures that define resources and
//! block parameters. All structs are designed to be deserialized from RON
//! files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `outpost_headless`.

mod block_data;
mod resource_data;

pub use block_data::{BlockData, CaptureTurretData, MultiDrillData};
pub use resource_data::ResourceData;
