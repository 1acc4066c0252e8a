//! Visibility culling: frustum planes, frustum culler and occlusion culler

pub mod frustum;
pub mod frustum_culler;
pub mod occlusion_culler;

pub use frustum::{Frustum, Plane};
pub use frustum_culler::FrustumCuller;
pub use occlusion_culler::OcclusionCuller;
