pub mod selection;
pub mod shared;

pub use selection::*;
pub use shared::*;
