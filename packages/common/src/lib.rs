pub mod dom;
pub mod geometry;

pub use dom::*;
pub use geometry::*;
