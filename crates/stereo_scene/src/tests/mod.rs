//! Cross-module tests: scene graph, render pipeline and picking working together

mod render_pipeline_integration;
mod scene_graph_integration;
