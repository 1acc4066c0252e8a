//! GPU context implementations

pub mod headless;

pub use headless::{GpuCommand, GpuState, HeadlessGpu, OcclusionOracle};
