//! Vertex generation for hosts that draw the linkage
//!
//! Produces triangle lists in world units from a read-only
//! [`FrameSnapshot`](crate::sim::FrameSnapshot); the host owns the GPU side.

pub mod shapes;
pub mod vertex;

pub use shapes::{LinkageStyle, frame_vertices};
pub use vertex::{Vertex, colors};
