pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use math::{GeoCoord, Vec3, project};
