//! Render data handed to the host
//!
//! The crate does not draw. It produces plain buffers (`bytemuck::Pod`) and
//! a per-frame snapshot that the platform layer turns into canvas or GPU
//! calls.

pub mod frame;
pub mod mesh;
pub mod shapes;
pub mod vertex;

pub use frame::{Frame, JellyView, SpriteQuad};
pub use mesh::MeshBuffers;
pub use vertex::{ColorVertex, MeshVertex};
