pub mod density;
pub mod heatmap;
pub mod pipeline;
pub mod projection;
pub mod swings;
pub mod zones;

pub use density::{aggregate_levels, DensityProfile};
pub use heatmap::build_heatmap;
pub use pipeline::{run_pipeline, PipelineOutput, PipelineWarning};
pub use projection::project_levels;
pub use swings::detect_swings;
pub use zones::find_hot_zones;
