//! Output sinks
//!
//! A sink takes formatted payload bytes and delivers them somewhere. Delivery
//! is fire-and-forget: `send` returns immediately and failures only show up in
//! the sink's delivery counters.

mod http;
mod meter;

pub use http::{HttpSink, API_KEY_HEADER};
pub use meter::Meter;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Encoding the formatter wrote payloads with; advertised as `Content-Encoding`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            other => Err(format!("Unknown compression '{}'", other)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
        }
    }
}

/// Destination for formatted output
pub trait Sink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Queue a payload for delivery without waiting for it
    fn send(&self, payload: Vec<u8>);

    /// Rolling delivery rates, keyed by counter name
    fn http_info(&self) -> HashMap<String, f64>;

    fn close(&self) {}
}
