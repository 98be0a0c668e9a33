pub mod config;
pub mod frame;
pub mod session;

pub use config::*;
pub use frame::*;
pub use session::*;
