//! Temporal visibility state driven by occlusion queries

/// Hysteresis filter over per-frame visibility signals
///
/// Occlusion results flicker for objects near silhouette edges. The filter
/// counts signals (+1 visible, -1 hidden) and only flips the state once the
/// running count leaves `[-check_frames, check_frames]`, then starts counting
/// again from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
    visible: bool,
    count: i32,
    check_frames: i32,
}

impl VisibilityFilter {
    /// Default number of frames a contrary signal must persist
    pub const DEFAULT_CHECK_FRAMES: i32 = 12;

    /// Starts visible with an empty count
    pub fn new(check_frames: i32) -> Self {
        Self {
            visible: true,
            count: 0,
            check_frames,
        }
    }

    /// Feed one raw signal; returns the (possibly updated) state
    pub fn record(&mut self, signal: bool) -> bool {
        self.count += if signal { 1 } else { -1 };

        if self.count > self.check_frames {
            self.visible = true;
            self.count = 0;
        } else if self.count < -self.check_frames {
            self.visible = false;
            self.count = 0;
        }
        self.visible
    }

    /// Current filtered state
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Running count since the last flip
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Window length
    pub fn check_frames(&self) -> i32 {
        self.check_frames
    }
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHECK_FRAMES)
    }
}

/// Occlusion query lifecycle of one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcclusionState {
    /// No query outstanding; one may be issued this frame
    #[default]
    NoQueryIssued,
    /// A query was issued and its result has not been read yet
    QueryPending,
}
