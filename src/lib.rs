//! netmeta - network telemetry enrichment and filtering
//!
//! Normalizes SNMP-derived interface and device attributes, decides per record
//! whether it continues downstream, and loads MIB trap descriptors into a
//! queryable registry.

pub mod cli;
pub mod config;
pub mod error;
pub mod filtering;
pub mod pipeline;
pub mod registry;
pub mod sink;

pub use error::{NetmetaError, Result};
