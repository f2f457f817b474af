//! Threshold evaluation for environmental metrics and gas concentrations.
//!
//! Two kinds of thresholds exist: range thresholds for environmental metrics
//! (a value is good inside `[min, max]`, warning outside) and single-limit
//! thresholds for gases, where status is derived from the ratio of the
//! reading to the limit. Evaluation is pure; the same thresholds drive both
//! dashboard coloring and settings persistence.

use serde::{Deserialize, Serialize};

/// Status of an environmental metric against its configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStatus {
    /// Within the configured range (inclusive on both ends).
    Good,
    /// Outside the configured range.
    Warning,
}

impl MetricStatus {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            MetricStatus::Good => "good",
            MetricStatus::Warning => "warning",
        }
    }
}

/// Status of a gas concentration against its configured limit.
///
/// Ordered by severity so the worst of several gases can be taken with
/// `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GasStatus {
    /// At or below half the limit.
    Normal,
    /// Above half the limit, at or below 80% of it.
    Attention,
    /// Above 80% of the limit.
    Critical,
}

impl GasStatus {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            GasStatus::Normal => "normal",
            GasStatus::Attention => "attention",
            GasStatus::Critical => "critical",
        }
    }
}

/// An acceptable range for an environmental metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeThreshold {
    /// Lower bound, inclusive.
    pub min: f32,
    /// Upper bound, inclusive.
    pub max: f32,
}

impl RangeThreshold {
    /// Create a range threshold.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Evaluate a reading against the range.
    pub fn evaluate(&self, value: f32) -> MetricStatus {
        if value >= self.min && value <= self.max {
            MetricStatus::Good
        } else {
            MetricStatus::Warning
        }
    }
}

/// A maximum acceptable concentration for a gas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasThreshold {
    /// Maximum acceptable concentration.
    pub max: f32,
}

impl GasThreshold {
    /// Readings above this fraction of the limit need attention.
    pub const ATTENTION_RATIO: f32 = 0.5;
    /// Readings above this fraction of the limit are critical.
    pub const CRITICAL_RATIO: f32 = 0.8;

    /// Create a gas threshold.
    pub fn new(max: f32) -> Self {
        Self { max }
    }

    /// Fraction of the limit the reading occupies.
    ///
    /// A non-positive limit reads as infinitely over it, so a misconfigured
    /// threshold surfaces as critical rather than permanently normal.
    pub fn ratio(&self, value: f32) -> f32 {
        if self.max > 0.0 {
            value / self.max
        } else {
            f32::INFINITY
        }
    }

    /// Percentage of the limit, capped at 100 for display bars.
    pub fn percent_of_limit(&self, value: f32) -> u16 {
        (self.ratio(value) * 100.0).min(100.0).max(0.0) as u16
    }

    /// Evaluate a reading against the limit.
    pub fn evaluate(&self, value: f32) -> GasStatus {
        let ratio = self.ratio(value);
        if ratio > Self::CRITICAL_RATIO {
            GasStatus::Critical
        } else if ratio > Self::ATTENTION_RATIO {
            GasStatus::Attention
        } else {
            GasStatus::Normal
        }
    }
}

/// The full set of alert thresholds for a farm building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Acceptable air temperature in degrees Celsius.
    pub temperature: RangeThreshold,
    /// Acceptable relative humidity in percent.
    pub humidity: RangeThreshold,
    /// Acceptable air quality index (0-100, higher is better).
    pub air_quality: RangeThreshold,
    /// Acceptable light level in percent.
    pub light_level: RangeThreshold,
    /// Carbon monoxide limit in ppm.
    pub co: GasThreshold,
    /// Carbon dioxide limit in ppm.
    pub co2: GasThreshold,
    /// Ammonia limit in ppm.
    pub nh3: GasThreshold,
    /// Hydrogen sulfide limit in ppm.
    pub h2s: GasThreshold,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            temperature: RangeThreshold::new(18.0, 26.0),
            humidity: RangeThreshold::new(40.0, 70.0),
            air_quality: RangeThreshold::new(80.0, 100.0),
            light_level: RangeThreshold::new(20.0, 80.0),
            co: GasThreshold::new(5.0),
            co2: GasThreshold::new(1000.0),
            nh3: GasThreshold::new(15.0),
            h2s: GasThreshold::new(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_inclusive_bounds() {
        let range = RangeThreshold::new(18.0, 26.0);
        assert_eq!(range.evaluate(18.0), MetricStatus::Good);
        assert_eq!(range.evaluate(26.0), MetricStatus::Good);
        assert_eq!(range.evaluate(24.5), MetricStatus::Good);
        assert_eq!(range.evaluate(17.9), MetricStatus::Warning);
        assert_eq!(range.evaluate(27.0), MetricStatus::Warning);
    }

    #[test]
    fn gas_status_breakpoints() {
        let co = GasThreshold::new(5.0);
        // At exactly half the limit the reading is still normal.
        assert_eq!(co.evaluate(2.5), GasStatus::Normal);
        assert_eq!(co.evaluate(2.0), GasStatus::Normal);
        assert_eq!(co.evaluate(3.0), GasStatus::Attention);
        // At exactly 80% of the limit the reading is still attention.
        assert_eq!(co.evaluate(4.0), GasStatus::Attention);
        assert_eq!(co.evaluate(4.5), GasStatus::Critical);
        assert_eq!(co.evaluate(6.0), GasStatus::Critical);
    }

    #[test]
    fn gas_percent_is_capped() {
        let h2s = GasThreshold::new(1.0);
        assert_eq!(h2s.percent_of_limit(0.4), 40);
        assert_eq!(h2s.percent_of_limit(1.0), 100);
        assert_eq!(h2s.percent_of_limit(2.5), 100);
    }

    #[test]
    fn non_positive_limit_reads_critical() {
        let broken = GasThreshold::new(0.0);
        assert_eq!(broken.evaluate(0.1), GasStatus::Critical);
    }

    #[test]
    fn gas_status_orders_by_severity() {
        assert!(GasStatus::Critical > GasStatus::Attention);
        assert!(GasStatus::Attention > GasStatus::Normal);
        let worst = [GasStatus::Normal, GasStatus::Attention, GasStatus::Normal]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(worst, GasStatus::Attention);
    }

    #[test]
    fn defaults_match_recommended_farm_limits() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.temperature, RangeThreshold::new(18.0, 26.0));
        assert_eq!(thresholds.humidity, RangeThreshold::new(40.0, 70.0));
        assert_eq!(thresholds.co2.max, 1000.0);
        assert_eq!(thresholds.h2s.max, 1.0);
    }

    #[test]
    fn thresholds_round_trip_through_serde() {
        let thresholds = AlertThresholds::default();
        let text = serde_json::to_string(&thresholds).unwrap();
        let back: AlertThresholds = serde_json::from_str(&text).unwrap();
        assert_eq!(back, thresholds);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let back: AlertThresholds =
            serde_json::from_str(r#"{"co": {"max": 9.0}}"#).unwrap();
        assert_eq!(back.co.max, 9.0);
        assert_eq!(back.co2.max, 1000.0);
    }
}
