//! Flow intensity scoring and adaptive session length.
//!
//! Both functions are pure. Malformed inputs never produce an error: they
//! resolve to a safe default (`Medium`, or the unchanged base length).

use super::metrics::{FlowIntensity, BASELINE_SESSION_MIN};

const HIGH_THRESHOLD: f64 = 1.5;
const MEDIUM_THRESHOLD: f64 = 0.8;
const MAX_LENGTH_SCORE: f64 = 2.0;

const HIGH_STEP_MIN: u32 = 5;
const HIGH_CAP_MIN: u32 = 90;
const MEDIUM_STEP_MIN: u32 = 2;
const MEDIUM_CAP_MIN: u32 = 60;
const LOW_SHRINK_MIN: u32 = 5;
const LOW_FLOOR_MIN: u32 = 15;

/// Raw flow score: `(1 - distraction_ratio) * min(avg / 25, 2)`.
///
/// Returns `None` when the inputs cannot be scored.
pub fn flow_score(
    consecutive_sessions: u32,
    distraction_count: u32,
    average_session_length: f64,
) -> Option<f64> {
    if !average_session_length.is_finite() || average_session_length < 0.0 {
        return None;
    }
    let distraction_ratio = distraction_count as f64 / consecutive_sessions.max(1) as f64;
    let length_score = (average_session_length / BASELINE_SESSION_MIN).min(MAX_LENGTH_SCORE);
    let score = (1.0 - distraction_ratio) * length_score;
    score.is_finite().then_some(score)
}

pub fn calculate_flow_intensity(
    consecutive_sessions: u32,
    distraction_count: u32,
    average_session_length: f64,
) -> FlowIntensity {
    let Some(score) = flow_score(consecutive_sessions, distraction_count, average_session_length)
    else {
        tracing::warn!(
            consecutive_sessions,
            distraction_count,
            average_session_length,
            "unscorable flow inputs, defaulting to medium"
        );
        return FlowIntensity::Medium;
    };

    if score > HIGH_THRESHOLD {
        FlowIntensity::High
    } else if score > MEDIUM_THRESHOLD {
        FlowIntensity::Medium
    } else {
        FlowIntensity::Low
    }
}

/// Next work-phase length in minutes.
///
/// High flow grows by 5 min per consecutive session (cap 90), medium by 2
/// (cap 60), low shrinks by 5 (floor 15). Overflow returns `base_minutes`.
pub fn adaptive_session_length(
    base_minutes: u32,
    intensity: FlowIntensity,
    consecutive_sessions: u32,
) -> u32 {
    let grown = |step: u32, cap: u32| {
        consecutive_sessions
            .checked_mul(step)
            .and_then(|bonus| base_minutes.checked_add(bonus))
            .map(|minutes| minutes.min(cap))
    };

    let adapted = match intensity {
        FlowIntensity::High => grown(HIGH_STEP_MIN, HIGH_CAP_MIN),
        FlowIntensity::Medium => grown(MEDIUM_STEP_MIN, MEDIUM_CAP_MIN),
        FlowIntensity::Low => Some(base_minutes.saturating_sub(LOW_SHRINK_MIN).max(LOW_FLOOR_MIN)),
    };

    adapted.unwrap_or_else(|| {
        tracing::warn!(base_minutes, consecutive_sessions, "adaptive length overflowed");
        base_minutes
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn undistracted_long_sessions_are_high() {
        assert_eq!(calculate_flow_intensity(10, 0, 50.0), FlowIntensity::High);
        // Length score caps at 2.0.
        assert_eq!(calculate_flow_intensity(1, 0, 500.0), FlowIntensity::High);
    }

    #[test]
    fn baseline_sessions_without_distraction_score_exactly_one() {
        assert_eq!(flow_score(10, 0, 25.0), Some(1.0));
        assert_eq!(calculate_flow_intensity(10, 0, 25.0), FlowIntensity::Medium);
    }

    #[test]
    fn heavy_distraction_is_low() {
        assert_eq!(calculate_flow_intensity(1, 5, 10.0), FlowIntensity::Low);
        assert_eq!(calculate_flow_intensity(2, 1, 25.0), FlowIntensity::Low);
    }

    #[test]
    fn thresholds_are_strict() {
        // 1.5 exactly is not high; 0.8 exactly is not medium.
        assert_eq!(calculate_flow_intensity(1, 0, 37.5), FlowIntensity::Medium);
        assert_eq!(calculate_flow_intensity(1, 0, 20.0), FlowIntensity::Low);
        assert_eq!(calculate_flow_intensity(1, 0, 37.6), FlowIntensity::High);
        assert_eq!(calculate_flow_intensity(1, 0, 20.1), FlowIntensity::Medium);
        assert_eq!(calculate_flow_intensity(10, 1, 25.0), FlowIntensity::Medium);
    }

    #[test]
    fn zero_sessions_counts_as_one() {
        assert_eq!(flow_score(0, 1, 25.0), Some(0.0));
    }

    #[test]
    fn malformed_average_defaults_to_medium() {
        assert_eq!(calculate_flow_intensity(3, 0, f64::NAN), FlowIntensity::Medium);
        assert_eq!(calculate_flow_intensity(3, 0, f64::INFINITY), FlowIntensity::Medium);
        assert_eq!(calculate_flow_intensity(3, 0, -4.0), FlowIntensity::Medium);
    }

    #[test]
    fn high_flow_is_capped_at_ninety() {
        assert_eq!(adaptive_session_length(25, FlowIntensity::High, 20), 90);
        assert_eq!(adaptive_session_length(25, FlowIntensity::High, 3), 40);
    }

    #[test]
    fn medium_flow_grows_gently() {
        assert_eq!(adaptive_session_length(25, FlowIntensity::Medium, 0), 25);
        assert_eq!(adaptive_session_length(25, FlowIntensity::Medium, 4), 33);
        assert_eq!(adaptive_session_length(25, FlowIntensity::Medium, 100), 60);
    }

    #[test]
    fn low_flow_shrinks_with_floor() {
        assert_eq!(adaptive_session_length(25, FlowIntensity::Low, 0), 20);
        assert_eq!(adaptive_session_length(25, FlowIntensity::Low, 7), 20);
        assert_eq!(adaptive_session_length(18, FlowIntensity::Low, 1), 15);
        assert_eq!(adaptive_session_length(3, FlowIntensity::Low, 1), 15);
    }

    #[test]
    fn overflow_returns_base() {
        assert_eq!(adaptive_session_length(25, FlowIntensity::High, u32::MAX), 25);
        assert_eq!(adaptive_session_length(u32::MAX, FlowIntensity::Medium, 1), u32::MAX);
    }

    proptest! {
        #[test]
        fn low_flow_never_below_floor(base in any::<u32>(), sessions in any::<u32>()) {
            prop_assert!(adaptive_session_length(base, FlowIntensity::Low, sessions) >= 15);
        }

        #[test]
        fn high_flow_never_above_cap(base in 0u32..90, sessions in any::<u32>()) {
            let minutes = adaptive_session_length(base, FlowIntensity::High, sessions);
            prop_assert!(minutes <= 90);
        }

        #[test]
        fn scoring_never_panics(
            sessions in any::<u32>(),
            distractions in any::<u32>(),
            avg in any::<f64>(),
        ) {
            let _ = calculate_flow_intensity(sessions, distractions, avg);
        }
    }
}
