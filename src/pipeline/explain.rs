//! Human-readable reasons attached to every triage result.

use super::types::FeatureVector;

pub const ROUTINE_EXPLANATION: &str = "Routine analysis based on vitals and lifestyle factors.";

const ELEVATED_SYSTOLIC: i64 = 140;
const ELEVATED_DIASTOLIC: i64 = 90;
const TACHYCARDIA_BPM: i64 = 100;
const FEVER_F: f64 = 100.4;
const VULNERABLE_AGE: i64 = 60;

/// Build explanations in fixed order: blood pressure, heart rate, fever,
/// symptom keywords, age. Never empty.
pub fn explain(features: &FeatureVector, symptoms: &str, age: i64) -> Vec<String> {
    let symptoms = symptoms.to_lowercase();
    let mut explanations = Vec::new();

    if features.systolic > ELEVATED_SYSTOLIC || features.diastolic > ELEVATED_DIASTOLIC {
        explanations.push(format!(
            "Elevated Blood Pressure ({}/{}) indicates hypertension.",
            features.systolic, features.diastolic
        ));
    }
    if features.heart_rate > TACHYCARDIA_BPM {
        explanations.push(format!(
            "Abnormal Heart Rate detected ({} BPM).",
            features.heart_rate
        ));
    }
    if features.temperature > FEVER_F {
        explanations.push(format!(
            "High Fever detected ({}°F).",
            display_temperature(features.temperature)
        ));
    }

    if symptoms.contains("chest") || symptoms.contains("pain") {
        explanations.push("Reported symptoms match critical cardiac warning signs.".to_string());
    }
    if symptoms.contains("breath") {
        explanations.push("Respiratory distress reported.".to_string());
    }

    if age > VULNERABLE_AGE {
        explanations.push("Patient age group indicates higher vulnerability.".to_string());
    }

    if explanations.is_empty() {
        explanations.push(ROUTINE_EXPLANATION.to_string());
    }
    explanations
}

/// Whole degrees keep one decimal ("101.0"), others print as-is ("102.5").
fn display_temperature(temperature: f64) -> String {
    if temperature.fract() == 0.0 {
        format!("{temperature:.1}")
    } else {
        temperature.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;
    use crate::pipeline::types::PatientIntake;
    use serde_json::json;

    fn features(value: serde_json::Value) -> FeatureVector {
        normalize(&serde_json::from_value::<PatientIntake>(value).unwrap())
    }

    #[test]
    fn normal_vitals_get_routine_explanation() {
        let f = features(json!({}));
        assert_eq!(explain(&f, "", f.age), vec![ROUTINE_EXPLANATION.to_string()]);
    }

    #[test]
    fn all_findings_in_fixed_order() {
        let f = features(json!({
            "age": 72,
            "bp": "150/95",
            "heartRate": 110,
            "temperature": 101.3
        }));
        let out = explain(&f, "Chest pain and short of breath", f.age);
        assert_eq!(
            out,
            vec![
                "Elevated Blood Pressure (150/95) indicates hypertension.",
                "Abnormal Heart Rate detected (110 BPM).",
                "High Fever detected (101.3°F).",
                "Reported symptoms match critical cardiac warning signs.",
                "Respiratory distress reported.",
                "Patient age group indicates higher vulnerability.",
            ]
        );
    }

    #[test]
    fn thresholds_are_strict() {
        let f = features(json!({
            "age": 60,
            "bp": "140/90",
            "heartRate": 100,
            "temperature": 100.4
        }));
        assert_eq!(explain(&f, "", f.age), vec![ROUTINE_EXPLANATION.to_string()]);
    }

    #[test]
    fn whole_degree_fever_keeps_decimal() {
        let f = features(json!({ "temperature": 102 }));
        assert_eq!(explain(&f, "", f.age), vec!["High Fever detected (102.0°F)."]);
    }

    #[test]
    fn pain_alone_counts_as_cardiac_warning() {
        let f = features(json!({}));
        assert_eq!(
            explain(&f, "abdominal PAIN", f.age),
            vec!["Reported symptoms match critical cardiac warning signs."]
        );
    }

    #[test]
    fn defaulted_bp_is_not_elevated() {
        let f = features(json!({ "bp": "abc" }));
        assert!(!explain(&f, "", f.age)[0].starts_with("Elevated"));
    }
}
