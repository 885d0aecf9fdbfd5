pub mod calibration;
pub mod catalog;
pub mod extraction;
pub mod fitting;
pub mod image;
pub mod model;
pub mod serialization;

mod traits;

pub use traits::{CalibrationAccessor, ImageSource, LineCatalog, LineSelection};
