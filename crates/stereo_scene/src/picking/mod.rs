//! Ray picking: ray primitives, pickability component and scene picker

pub mod eye_pointee;
pub mod picker;
pub mod ray;

pub use eye_pointee::{EyePointeeHolder, PointeeKind};
pub use picker::{PickResult, PickSpace, Picker};
pub use ray::{Ray, EPSILON};
