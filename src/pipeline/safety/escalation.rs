//! Safety overrides on top of the classifier.
//!
//! Rules read the intake (symptom text, vitals), never the model output.
//! They can only escalate. First match wins.

use serde::Serialize;

use crate::pipeline::types::{Department, FeatureVector, RiskLevel};

/// Result of the override pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideOutcome {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    /// Set only when a rule fired; otherwise routing decides.
    pub department: Option<Department>,
    /// Which rule fired, for the audit trail.
    pub rule_id: Option<&'static str>,
}

/// A hard-coded override rule.
struct OverrideRule {
    /// Unique identifier for audit trail.
    id: &'static str,
    condition: OverrideCondition,
    /// Minimum confidence once the rule fires.
    confidence_floor: f64,
    department: Department,
}

enum OverrideCondition {
    /// Symptom text contains any keyword (case-insensitive substring).
    SymptomKeywords { keywords: &'static [&'static str] },
    /// Systolic or diastolic at/above threshold.
    BloodPressureAtLeast { systolic: i64, diastolic: i64 },
}

// ── Keyword sets ────────────────────────────────────────────

static CARDIAC_RESPIRATORY_KEYWORDS: &[&str] = &["chest", "heart", "stroke", "breathe"];

pub const CARDIAC_RESPIRATORY_FLOOR: f64 = 0.95;
pub const HYPERTENSIVE_CRISIS_FLOOR: f64 = 0.90;
pub const CRISIS_SYSTOLIC: i64 = 160;
pub const CRISIS_DIASTOLIC: i64 = 100;

// ── Rule registry ───────────────────────────────────────────

/// Rules in strict priority order.
fn rules() -> [OverrideRule; 2] {
    [
        // CARD-001: cardiac/respiratory complaint → High, Cardiology
        OverrideRule {
            id: "CARD-001",
            condition: OverrideCondition::SymptomKeywords {
                keywords: CARDIAC_RESPIRATORY_KEYWORDS,
            },
            confidence_floor: CARDIAC_RESPIRATORY_FLOOR,
            department: Department::Cardiology,
        },
        // HTN-001: hypertensive crisis → High, Cardiology
        OverrideRule {
            id: "HTN-001",
            condition: OverrideCondition::BloodPressureAtLeast {
                systolic: CRISIS_SYSTOLIC,
                diastolic: CRISIS_DIASTOLIC,
            },
            confidence_floor: HYPERTENSIVE_CRISIS_FLOOR,
            department: Department::Cardiology,
        },
    ]
}

// ── Matching logic ──────────────────────────────────────────

/// Apply the first matching override to the model's answer.
pub fn apply_overrides(
    risk_level: RiskLevel,
    confidence: f64,
    features: &FeatureVector,
    symptoms: &str,
) -> OverrideOutcome {
    let symptoms_lower = symptoms.to_lowercase();

    for rule in rules() {
        if rule.condition.matches(&symptoms_lower, features) {
            let escalated = risk_level.max(RiskLevel::High);
            let confidence = confidence.max(rule.confidence_floor).min(1.0);

            tracing::warn!(
                rule_id = rule.id,
                model_risk = risk_level.as_str(),
                confidence,
                "Safety override rule fired"
            );

            return OverrideOutcome {
                risk_level: escalated,
                confidence,
                department: Some(rule.department),
                rule_id: Some(rule.id),
            };
        }
    }

    OverrideOutcome {
        risk_level,
        confidence,
        department: None,
        rule_id: None,
    }
}

impl OverrideCondition {
    fn matches(&self, symptoms_lower: &str, features: &FeatureVector) -> bool {
        match self {
            Self::SymptomKeywords { keywords } => {
                keywords.iter().any(|kw| symptoms_lower.contains(kw))
            }
            Self::BloodPressureAtLeast { systolic, diastolic } => {
                features.systolic >= *systolic || features.diastolic >= *diastolic
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;
    use crate::pipeline::types::PatientIntake;
    use serde_json::json;

    fn features_with_bp(bp: &str) -> FeatureVector {
        normalize(&serde_json::from_value::<PatientIntake>(json!({ "bp": bp })).unwrap())
    }

    fn normal() -> FeatureVector {
        features_with_bp("120/80")
    }

    // ── CARD-001 ───────────────────────────────────────────────

    #[test]
    fn card_001_fires_for_chest_any_case() {
        let out = apply_overrides(RiskLevel::Low, 0.4, &normal(), "Sudden CHEST tightness");
        assert_eq!(out.rule_id, Some("CARD-001"));
        assert_eq!(out.risk_level, RiskLevel::High);
        assert_eq!(out.department, Some(Department::Cardiology));
        assert_eq!(out.confidence, 0.95);
    }

    #[test]
    fn card_001_keeps_higher_model_confidence() {
        let out = apply_overrides(RiskLevel::High, 0.99, &normal(), "stroke symptoms");
        assert_eq!(out.confidence, 0.99);
    }

    #[test]
    fn card_001_fires_for_each_keyword() {
        for symptoms in ["chest pain", "heart racing", "possible stroke", "can't breathe"] {
            let out = apply_overrides(RiskLevel::Low, 0.0, &normal(), symptoms);
            assert_eq!(out.rule_id, Some("CARD-001"), "symptoms {symptoms:?}");
        }
    }

    #[test]
    fn card_001_does_not_fire_for_breath() {
        // "breath" is not "breathe"
        let out = apply_overrides(RiskLevel::Low, 0.6, &normal(), "shortness of breath");
        assert_eq!(out.rule_id, None);
        assert_eq!(out.risk_level, RiskLevel::Low);
    }

    // ── HTN-001 ────────────────────────────────────────────────

    #[test]
    fn htn_001_fires_for_crisis_bp() {
        let out = apply_overrides(RiskLevel::Low, 0.3, &features_with_bp("170/110"), "headache");
        assert_eq!(out.rule_id, Some("HTN-001"));
        assert_eq!(out.risk_level, RiskLevel::High);
        assert_eq!(out.department, Some(Department::Cardiology));
        assert_eq!(out.confidence, 0.90);
    }

    #[test]
    fn htn_001_boundaries_are_inclusive() {
        assert_eq!(
            apply_overrides(RiskLevel::Low, 0.0, &features_with_bp("160/70"), "").rule_id,
            Some("HTN-001")
        );
        assert_eq!(
            apply_overrides(RiskLevel::Low, 0.0, &features_with_bp("110/100"), "").rule_id,
            Some("HTN-001")
        );
        assert_eq!(
            apply_overrides(RiskLevel::Low, 0.0, &features_with_bp("159/99"), "").rule_id,
            None
        );
    }

    #[test]
    fn htn_001_ignores_defaulted_bp() {
        let out = apply_overrides(RiskLevel::Low, 0.5, &features_with_bp("abc"), "");
        assert_eq!(out.rule_id, None);
    }

    // ── Priority and monotonicity ──────────────────────────────

    #[test]
    fn keyword_rule_takes_priority_over_bp_rule() {
        let out = apply_overrides(RiskLevel::Low, 0.1, &features_with_bp("170/110"), "chest pain");
        assert_eq!(out.rule_id, Some("CARD-001"));
        assert_eq!(out.confidence, 0.95);
    }

    #[test]
    fn no_rule_leaves_model_answer_untouched() {
        let out = apply_overrides(RiskLevel::Medium, 0.62, &normal(), "mild cough");
        assert_eq!(
            out,
            OverrideOutcome {
                risk_level: RiskLevel::Medium,
                confidence: 0.62,
                department: None,
                rule_id: None,
            }
        );
    }

    #[test]
    fn overrides_never_lower_risk() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            for symptoms in ["", "chest", "cough"] {
                for bp in ["120/80", "170/110"] {
                    let out = apply_overrides(level, 0.5, &features_with_bp(bp), symptoms);
                    assert!(out.risk_level >= level);
                    assert!(out.confidence >= 0.5);
                }
            }
        }
    }
}
