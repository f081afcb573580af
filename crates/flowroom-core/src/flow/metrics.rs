use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Baseline focus length (minutes) the scoring is tuned against.
pub const BASELINE_SESSION_MIN: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowIntensity {
    Low,
    #[default]
    Medium,
    High,
}

impl FlowIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowIntensity::Low => "low",
            FlowIntensity::Medium => "medium",
            FlowIntensity::High => "high",
        }
    }
}

impl std::fmt::Display for FlowIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived focus analytics, owned by the timer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Completed focus sessions since the last daily reset.
    pub consecutive_sessions: u32,
    pub current_streak: u32,
    /// Never below `current_streak`.
    pub longest_streak: u32,
    pub flow_intensity: FlowIntensity,
    /// Interruptions since the last successful completion.
    pub distraction_count: u32,
    #[serde(default)]
    pub session_start_time: Option<DateTime<Utc>>,
    /// All-time focus minutes.
    pub total_focus_time: u64,
    /// Two-point running average, minutes.
    pub average_session_length: f64,
    /// Longest single completed session, minutes.
    pub best_flow_duration: f64,
    #[serde(default)]
    pub last_session_date: Option<NaiveDate>,
}

impl Default for FlowMetrics {
    fn default() -> Self {
        Self {
            consecutive_sessions: 0,
            current_streak: 0,
            longest_streak: 0,
            flow_intensity: FlowIntensity::Medium,
            distraction_count: 0,
            session_start_time: None,
            total_focus_time: 0,
            average_session_length: BASELINE_SESSION_MIN,
            best_flow_duration: 0.0,
            last_session_date: None,
        }
    }
}
