mod render;

pub use render::{display_job, display_report, display_submitted};
