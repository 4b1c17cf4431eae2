//! Metric presenter
//!
//! Turns an [`AnalysisPayload`] into a flat, renderer-ready [`SummaryView`]:
//! one [`MetricView`] per metric with its fill fraction, severity band and
//! any partial-data error carried through.
//!
//! | Scale | Range | critical | warning | caution | good |
//! |-------|-------|----------|---------|---------|------|
//! | Rating | 0-10 | `<= 2` | `<= 5` | `< 8` | else |
//! | Ratio | 0-5 | `<= 2` | `<= 3` | `< 4` | else |
//! | Confidence | 0-100 | `<= 25` | `<= 50` | `<= 75` | else |
//!
//! The confidence scale uses inclusive upper bounds for every band, unlike the
//! other two. Values are not clamped: a rating of 12 yields a fill of 1.2.

use std::fmt;

use crate::format::format_local_timestamp;
use crate::types::{AnalysisPayload, MetricReport};

/// Ordered severity bands, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Caution,
    Good,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Caution => "caution",
            Severity::Good => "good",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scale a metric is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// 0-10 ratings
    Rating,
    /// 0-5 risk/reward ratio
    Ratio,
    /// 0-100 confidence score
    Confidence,
}

impl Scale {
    /// Upper end of the scale
    pub fn max(&self) -> f64 {
        match self {
            Scale::Rating => 10.0,
            Scale::Ratio => 5.0,
            Scale::Confidence => 100.0,
        }
    }

    /// Proportion of the scale covered by `value` (unclamped)
    pub fn fill_fraction(&self, value: f64) -> f64 {
        value / self.max()
    }

    /// Severity band for `value`
    pub fn severity(&self, value: f64) -> Severity {
        match self {
            Scale::Rating => {
                if value <= 2.0 {
                    Severity::Critical
                } else if value <= 5.0 {
                    Severity::Warning
                } else if value < 8.0 {
                    Severity::Caution
                } else {
                    Severity::Good
                }
            }
            Scale::Ratio => {
                if value <= 2.0 {
                    Severity::Critical
                } else if value <= 3.0 {
                    Severity::Warning
                } else if value < 4.0 {
                    Severity::Caution
                } else {
                    Severity::Good
                }
            }
            Scale::Confidence => {
                if value <= 25.0 {
                    Severity::Critical
                } else if value <= 50.0 {
                    Severity::Warning
                } else if value <= 75.0 {
                    Severity::Caution
                } else {
                    Severity::Good
                }
            }
        }
    }
}

/// Which metric a [`MetricView`] shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CodeActivity,
    SmartContractRisk,
    TokenPerformance,
    SocialSentiment,
    RiskRewardRatio,
    ConfidenceScore,
}

impl MetricKind {
    /// Display order
    pub const ALL: [MetricKind; 6] = [
        MetricKind::CodeActivity,
        MetricKind::SmartContractRisk,
        MetricKind::TokenPerformance,
        MetricKind::SocialSentiment,
        MetricKind::RiskRewardRatio,
        MetricKind::ConfidenceScore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::CodeActivity => "Code Activity",
            MetricKind::SmartContractRisk => "Smart Contract Risk",
            MetricKind::TokenPerformance => "Token Performance",
            MetricKind::SocialSentiment => "Social Sentiment",
            MetricKind::RiskRewardRatio => "Risk Reward Ratio",
            MetricKind::ConfidenceScore => "Confidence Score",
        }
    }

    pub fn scale(&self) -> Scale {
        match self {
            MetricKind::RiskRewardRatio => Scale::Ratio,
            MetricKind::ConfidenceScore => Scale::Confidence,
            _ => Scale::Rating,
        }
    }
}

/// A single metric, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct MetricView {
    pub kind: MetricKind,
    /// Raw value as reported
    pub value: f64,
    pub fill_fraction: f64,
    pub severity: Severity,
    /// Explanation from the service (rated metrics only)
    pub comment: Option<String>,
    /// Partial-data error to show next to the metric
    pub error: Option<String>,
}

impl MetricView {
    fn new(kind: MetricKind, value: f64, comment: Option<String>, error: Option<String>) -> Self {
        let scale = kind.scale();
        Self {
            kind,
            value,
            fill_fraction: scale.fill_fraction(value),
            severity: scale.severity(value),
            comment,
            error,
        }
    }

    fn from_report(kind: MetricKind, report: &MetricReport) -> Self {
        Self::new(
            kind,
            report.rating,
            Some(report.comment.clone()),
            report.error.clone(),
        )
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// "7.5 / 10" style readout
    pub fn score_text(&self) -> String {
        format!("{} / {}", self.value, self.kind.scale().max())
    }
}

/// Everything the summary screen shows for one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    /// Metrics in display order (see [`MetricKind::ALL`])
    pub metrics: Vec<MetricView>,
    pub final_recommendation: String,
    /// Analysis timestamp in local time
    pub analyzed_at: String,
    /// Whether to offer the buy prompt
    pub offers_decision: bool,
}

impl SummaryView {
    pub fn metric(&self, kind: MetricKind) -> Option<&MetricView> {
        self.metrics.iter().find(|m| m.kind == kind)
    }

    /// Metrics that carry a partial-data error
    pub fn errors(&self) -> impl Iterator<Item = &MetricView> {
        self.metrics.iter().filter(|m| m.error.is_some())
    }
}

/// Build the view model for an analysis. Pure and idempotent.
pub fn present(payload: &AnalysisPayload) -> SummaryView {
    let result = &payload.result;

    let metrics = vec![
        MetricView::from_report(MetricKind::CodeActivity, &result.code_activity),
        MetricView::from_report(MetricKind::SmartContractRisk, &result.smart_contract_risk),
        MetricView::from_report(MetricKind::TokenPerformance, &result.token_performance),
        MetricView::from_report(MetricKind::SocialSentiment, &result.social_sentiment),
        MetricView::new(
            MetricKind::RiskRewardRatio,
            result.risk_reward_ratio,
            None,
            None,
        ),
        MetricView::new(
            MetricKind::ConfidenceScore,
            result.confidence_score,
            None,
            None,
        ),
    ];

    SummaryView {
        metrics,
        final_recommendation: result.final_recommendation.clone(),
        analyzed_at: format_local_timestamp(result.timestamp),
        offers_decision: payload.has_trading_prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_payload;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_rating_bands() {
        let cases = [
            (0.0, Severity::Critical),
            (2.0, Severity::Critical),
            (2.01, Severity::Warning),
            (5.0, Severity::Warning),
            (5.5, Severity::Caution),
            (7.99, Severity::Caution),
            (8.0, Severity::Good),
            (10.0, Severity::Good),
        ];
        for (value, expected) in cases {
            assert_eq!(Scale::Rating.severity(value), expected, "rating {value}");
        }
    }

    #[test]
    fn test_ratio_bands() {
        assert_eq!(Scale::Ratio.severity(2.0), Severity::Critical);
        assert_eq!(Scale::Ratio.severity(3.0), Severity::Warning);
        assert_eq!(Scale::Ratio.severity(3.5), Severity::Caution);
        assert_eq!(Scale::Ratio.severity(4.0), Severity::Good);
    }

    #[test]
    fn test_confidence_bands_use_inclusive_upper_bounds() {
        assert_eq!(Scale::Confidence.severity(25.0), Severity::Critical);
        assert_eq!(Scale::Confidence.severity(50.0), Severity::Warning);
        assert_eq!(Scale::Confidence.severity(75.0), Severity::Caution);
        assert_eq!(Scale::Confidence.severity(76.0), Severity::Good);
    }

    #[test]
    fn test_fill_fractions() {
        assert_close(Scale::Rating.fill_fraction(6.0), 0.6);
        assert_close(Scale::Ratio.fill_fraction(2.5), 0.5);
        assert_close(Scale::Confidence.fill_fraction(40.0), 0.4);
    }

    #[test]
    fn test_out_of_range_values_are_not_clamped() {
        assert_close(Scale::Rating.fill_fraction(12.0), 1.2);
        assert_close(Scale::Confidence.fill_fraction(-10.0), -0.1);
        assert_eq!(Scale::Rating.severity(12.0), Severity::Good);
    }

    #[test]
    fn test_present_sample_payload() {
        let view = present(&sample_payload());

        assert_eq!(view.metrics.len(), 6);
        let kinds: Vec<_> = view.metrics.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());

        let code = view.metric(MetricKind::CodeActivity).unwrap();
        assert_eq!(code.severity, Severity::Good);
        assert_close(code.fill_fraction, 0.9);
        assert_eq!(code.comment.as_deref(), Some("Very active"));
        assert_eq!(code.score_text(), "9 / 10");

        let risk = view.metric(MetricKind::SmartContractRisk).unwrap();
        assert_eq!(risk.severity, Severity::Warning);
        assert_eq!(risk.score_text(), "3.5 / 10");

        let ratio = view.metric(MetricKind::RiskRewardRatio).unwrap();
        assert_close(ratio.fill_fraction, 0.5);
        assert_eq!(ratio.severity, Severity::Warning);
        assert!(ratio.comment.is_none());

        let confidence = view.metric(MetricKind::ConfidenceScore).unwrap();
        assert_close(confidence.fill_fraction, 0.4);
        assert_eq!(confidence.severity, Severity::Warning);
        assert_eq!(confidence.score_text(), "40 / 100");

        assert_eq!(view.final_recommendation, "Hold");
        assert!(view.offers_decision);
        assert!(!view.analyzed_at.is_empty());
    }

    #[test]
    fn test_metric_errors_are_carried_through() {
        let view = present(&sample_payload());
        let errored: Vec<_> = view.errors().map(|m| m.kind).collect();
        assert_eq!(errored, vec![MetricKind::SocialSentiment]);

        let sentiment = view.metric(MetricKind::SocialSentiment).unwrap();
        assert_eq!(sentiment.error.as_deref(), Some("rate limited"));
        // Error does not suppress the rating
        assert_eq!(sentiment.severity, Severity::Critical);
        assert_eq!(sentiment.comment.as_deref(), Some("Quiet"));
    }

    #[test]
    fn test_present_is_idempotent_and_pure() {
        let payload = sample_payload();
        let first = present(&payload);
        let second = present(&payload);
        assert_eq!(first, second);
        assert_eq!(payload, sample_payload());
    }

    #[test]
    fn test_no_trading_prompt_hides_decision() {
        let mut payload = sample_payload();
        payload.has_trading_prompt = false;
        assert!(!present(&payload).offers_decision);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical < Severity::Warning);
        assert!(Severity::Caution < Severity::Good);
    }
}
