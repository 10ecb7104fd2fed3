pub mod geometry;
pub mod preprocessing;
pub mod extraction;
pub mod region_grow;
pub mod simplification;

pub use geometry::*;
pub use preprocessing::*;
pub use extraction::*;
pub use region_grow::*;
pub use simplification::*;
