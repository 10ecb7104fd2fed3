pub mod geojson;
pub mod overlay;

pub use self::geojson::*;
pub use overlay::*;
