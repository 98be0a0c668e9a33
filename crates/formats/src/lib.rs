pub mod document;
pub mod kml;

pub use document::*;
pub use kml::*;
