pub mod buffer;
pub mod mesh;
pub mod renderer;

pub use buffer::*;
pub use mesh::*;
pub use renderer::*;
