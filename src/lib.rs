#[macro_use]
extern crate tracing;

pub mod bot;
pub mod coord;
pub mod exclusion;
pub mod kml;
mod location;
pub use location::*;
pub mod mail;
pub mod report;
pub mod transform;
pub mod wm;
