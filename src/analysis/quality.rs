//! Quality scoring for analyzed documents

use super::{AnalysisDefaults, StructuredAnalysis};
use crate::config::QualityConfig;

/// Weights and scales for the quality heuristic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityWeights {
    pub patterns: f32,
    pub insights: f32,
    pub complexity: f32,
    pub maintainability: f32,
    pub summary: f32,
    pub complexity_scale: f32,
    pub maintainability_scale: f32,
    pub summary_min_chars: usize,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self::from(&QualityConfig::default())
    }
}

impl From<&QualityConfig> for QualityWeights {
    fn from(config: &QualityConfig) -> Self {
        Self {
            patterns: config.patterns_weight,
            insights: config.insights_weight,
            complexity: config.complexity_weight,
            maintainability: config.maintainability_weight,
            summary: config.summary_weight,
            complexity_scale: config.complexity_scale,
            maintainability_scale: config.maintainability_scale,
            summary_min_chars: config.summary_min_chars,
        }
    }
}

impl QualityWeights {
    /// Score an analysis in [0, 1]
    pub fn score(&self, analysis: &StructuredAnalysis, defaults: AnalysisDefaults) -> f32 {
        let mut score = 0.0f32;

        if !analysis.patterns.is_empty() {
            score += self.patterns;
        }
        if !analysis.insights.is_empty() {
            score += self.insights;
        }

        let complexity = analysis.complexity.unwrap_or(defaults.complexity);
        score += self.complexity * ratio(complexity, self.complexity_scale);

        let maintainability = analysis.maintainability.unwrap_or(defaults.maintainability);
        score += self.maintainability * ratio(maintainability, self.maintainability_scale);

        if analysis.summary.chars().count() > self.summary_min_chars {
            score += self.summary;
        }

        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 1.0)
    }
}

/// `value / scale` limited to [0, 1]; NaN and non-positive scales give 0
fn ratio(value: f32, scale: f32) -> f32 {
    if !value.is_finite() || !(scale > 0.0) {
        return 0.0;
    }
    (value / scale).clamp(0.0, 1.0)
}

impl From<&QualityConfig> for AnalysisDefaults {
    fn from(config: &QualityConfig) -> Self {
        Self {
            complexity: config.fallback_complexity,
            maintainability: config.fallback_maintainability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_analysis() -> StructuredAnalysis {
        StructuredAnalysis {
            summary: "A booking service that schedules plumbers and electricians across regions."
                .to_string(),
            insights: vec!["uses optimistic locking".to_string()],
            patterns: vec!["repository".to_string()],
            tags: vec![],
            complexity: Some(10.0),
            maintainability: Some(100.0),
        }
    }

    #[test]
    fn test_full_marks() {
        let score = QualityWeights::default().score(&full_analysis(), AnalysisDefaults::default());
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_analysis_uses_fallbacks() {
        let score = QualityWeights::default()
            .score(&StructuredAnalysis::default(), AnalysisDefaults::default());
        // 0.2 * 5/10 + 0.3 * 50/100
        assert!((score - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_scales_cap_at_one() {
        let mut analysis = full_analysis();
        analysis.complexity = Some(40.0);
        analysis.maintainability = Some(400.0);
        let score = QualityWeights::default().score(&analysis, AnalysisDefaults::default());
        assert!(score <= 1.0);
    }

    #[test]
    fn test_nan_inputs_count_as_zero() {
        let analysis = StructuredAnalysis {
            complexity: Some(f32::NAN),
            maintainability: Some(f32::NAN),
            ..Default::default()
        };
        let score = QualityWeights::default().score(&analysis, AnalysisDefaults::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_short_summary_earns_nothing() {
        let analysis = StructuredAnalysis {
            summary: "short".to_string(),
            complexity: Some(0.0),
            maintainability: Some(0.0),
            ..Default::default()
        };
        let score = QualityWeights::default().score(&analysis, AnalysisDefaults::default());
        assert_eq!(score, 0.0);
    }
}
