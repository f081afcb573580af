mod calculator;
mod daily_reset;
mod metrics;

pub use calculator::{adaptive_session_length, calculate_flow_intensity, flow_score};
pub use daily_reset::{apply_daily_reset, should_reset};
pub use metrics::{FlowIntensity, FlowMetrics, BASELINE_SESSION_MIN};
