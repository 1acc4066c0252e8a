//! Headless GPU context
//!
//! Records every command instead of executing it and tracks the current
//! fixed-function state. Occlusion query results come from an oracle closure
//! that decides how many samples each proxy draw passes, and become available
//! only after a configurable number of polls to mimic GPU latency.

use std::collections::HashMap;

use crate::render::gpu::{DrawCall, GpuContext, QueryHandle};
use crate::scene::CullFace;

/// Decides how many samples a draw inside an occlusion query passes
pub type OcclusionOracle = Box<dyn FnMut(&DrawCall) -> u32>;

/// Commands recorded by [`HeadlessGpu`]
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    /// Depth test toggled
    DepthTest(bool),
    /// Blending toggled
    Blend(bool),
    /// Cull mode set
    CullFace(CullFace),
    /// Polygon offset set or cleared
    PolygonOffset(Option<(f32, f32)>),
    /// Colour writes toggled
    ColorMask(bool),
    /// Buffers cleared
    Clear([f32; 4]),
    /// Query started
    BeginQuery(QueryHandle),
    /// Query ended
    EndQuery(QueryHandle),
    /// Draw submitted
    Draw(DrawCall),
}

/// Current fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuState {
    /// Depth test enabled
    pub depth_test: bool,
    /// Blending enabled
    pub blend: bool,
    /// Culled face
    pub cull_face: CullFace,
    /// Polygon offset `(factor, units)` when enabled
    pub polygon_offset: Option<(f32, f32)>,
    /// Colour writes enabled
    pub color_mask: bool,
}

impl Default for GpuState {
    fn default() -> Self {
        Self {
            depth_test: true,
            blend: true,
            cull_face: CullFace::Back,
            polygon_offset: None,
            color_mask: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SubmittedQuery {
    samples: u32,
    polls_remaining: u32,
}

/// Recording GPU context for tests and offline runs
pub struct HeadlessGpu {
    state: GpuState,
    commands: Vec<GpuCommand>,
    next_query: u32,
    active_query: Option<(QueryHandle, u32)>,
    submitted: HashMap<QueryHandle, SubmittedQuery>,
    query_latency: u32,
    oracle: OcclusionOracle,
}

impl HeadlessGpu {
    /// Every proxy passes one sample; results are available on the first poll
    pub fn new() -> Self {
        Self {
            state: GpuState::default(),
            commands: Vec::new(),
            next_query: 1,
            active_query: None,
            submitted: HashMap::new(),
            query_latency: 0,
            oracle: Box::new(|_| 1),
        }
    }

    /// Builder pattern: number of unsuccessful polls before a result is available
    pub fn with_query_latency(mut self, polls: u32) -> Self {
        self.query_latency = polls;
        self
    }

    /// Builder pattern: sample oracle for occlusion proxies
    pub fn with_oracle(mut self, oracle: impl FnMut(&DrawCall) -> u32 + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    /// Replace the sample oracle
    pub fn set_oracle(&mut self, oracle: impl FnMut(&DrawCall) -> u32 + 'static) {
        self.oracle = Box::new(oracle);
    }

    /// Current fixed-function state
    pub fn state(&self) -> GpuState {
        self.state
    }

    /// Commands recorded since the last [`take_commands`](Self::take_commands)
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Draw calls in the command log, in submission order
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            GpuCommand::Draw(call) => Some(call),
            _ => None,
        })
    }

    /// Number of queries submitted but not yet read
    pub fn outstanding_queries(&self) -> usize {
        self.submitted.len()
    }
}

impl Default for HeadlessGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuContext for HeadlessGpu {
    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
        self.commands.push(GpuCommand::DepthTest(enabled));
    }

    fn set_blend(&mut self, enabled: bool) {
        self.state.blend = enabled;
        self.commands.push(GpuCommand::Blend(enabled));
    }

    fn set_cull_face(&mut self, cull_face: CullFace) {
        self.state.cull_face = cull_face;
        self.commands.push(GpuCommand::CullFace(cull_face));
    }

    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>) {
        self.state.polygon_offset = offset;
        self.commands.push(GpuCommand::PolygonOffset(offset));
    }

    fn set_color_mask(&mut self, enabled: bool) {
        self.state.color_mask = enabled;
        self.commands.push(GpuCommand::ColorMask(enabled));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(GpuCommand::Clear(color));
    }

    fn create_query(&mut self) -> QueryHandle {
        let handle = QueryHandle(self.next_query);
        self.next_query += 1;
        handle
    }

    fn begin_query(&mut self, query: QueryHandle) {
        if let Some((previous, _)) = self.active_query {
            log::warn!("begin_query({query:?}) while {previous:?} is still active");
        }
        self.active_query = Some((query, 0));
        self.commands.push(GpuCommand::BeginQuery(query));
    }

    fn end_query(&mut self, query: QueryHandle) {
        match self.active_query.take() {
            Some((active, samples)) if active == query => {
                self.submitted.insert(
                    query,
                    SubmittedQuery {
                        samples,
                        polls_remaining: self.query_latency,
                    },
                );
            }
            other => log::warn!("end_query({query:?}) does not match active query {other:?}"),
        }
        self.commands.push(GpuCommand::EndQuery(query));
    }

    fn poll_query(&mut self, query: QueryHandle) -> Option<u32> {
        let submitted = self.submitted.get_mut(&query)?;
        if submitted.polls_remaining > 0 {
            submitted.polls_remaining -= 1;
            return None;
        }
        self.submitted.remove(&query).map(|q| q.samples)
    }

    fn draw(&mut self, call: &DrawCall) {
        if let Some((_, samples)) = self.active_query.as_mut() {
            *samples += (self.oracle)(call);
        }
        self.commands.push(GpuCommand::Draw(call.clone()));
    }
}
