//! Intake → feature vector.
//!
//! `normalize` is total: every missing or malformed field is replaced by a
//! documented default and recorded in `FeatureVector::defaulted`. Nothing is
//! surfaced to the caller; defaults are logged at debug level only.

use serde_json::Value;

use super::types::{
    ChronicDisease, FeatureVector, Gender, IntakeField, Parsed, PatientIntake, SmokingStatus,
};

pub const DEFAULT_AGE: i64 = 30;
pub const DEFAULT_HEART_RATE: i64 = 70;
pub const DEFAULT_TEMPERATURE_F: f64 = 98.6;
pub const DEFAULT_SYSTOLIC: i64 = 120;
pub const DEFAULT_DIASTOLIC: i64 = 80;
pub const DEFAULT_GENDER: Gender = Gender::Male;

/// Features the classifiers were trained on but the intake form never
/// collects. Fixed literals, independent of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticDefaults {
    pub smoking: SmokingStatus,
    pub alcohol_units_per_week: f64,
    pub activity_hours_per_week: f64,
    pub sleep_hours_per_day: f64,
    pub stress_level: i64,
    pub respiratory_rate: i64,
    pub oxygen_saturation: i64,
    pub bmi: f64,
}

pub const SYNTHETIC_DEFAULTS: SyntheticDefaults = SyntheticDefaults {
    smoking: SmokingStatus::Never,
    alcohol_units_per_week: 1.0,
    activity_hours_per_week: 3.0,
    sleep_hours_per_day: 7.0,
    stress_level: 5,
    respiratory_rate: 16,
    oxygen_saturation: 98,
    bmi: 24.5,
};

/// Build the canonical feature vector for one intake record.
pub fn normalize(intake: &PatientIntake) -> FeatureVector {
    let age = parse_integer(intake.age.as_ref(), DEFAULT_AGE);
    let gender = resolve_gender(intake.gender.as_ref());
    let bp = parse_blood_pressure(intake.bp.as_deref());
    let heart_rate = parse_integer(intake.heart_rate.as_ref(), DEFAULT_HEART_RATE);
    let temperature = parse_float(intake.temperature.as_ref(), DEFAULT_TEMPERATURE_F);

    let mut defaulted = Vec::new();
    for (field, was_defaulted) in [
        (IntakeField::Age, age.is_defaulted()),
        (IntakeField::Gender, gender.is_defaulted()),
        (IntakeField::BloodPressure, bp.is_defaulted()),
        (IntakeField::HeartRate, heart_rate.is_defaulted()),
        (IntakeField::Temperature, temperature.is_defaulted()),
    ] {
        if was_defaulted {
            tracing::debug!(field = field.as_str(), "Intake field missing or malformed, default applied");
            defaulted.push(field);
        }
    }

    let (systolic, diastolic) = bp.value();
    let synthetic = SYNTHETIC_DEFAULTS;

    FeatureVector {
        age: age.value(),
        gender: gender.value(),
        systolic,
        diastolic,
        derived_map: derived_map(systolic, diastolic),
        heart_rate: heart_rate.value(),
        temperature: temperature.value(),
        smoking: synthetic.smoking,
        alcohol_units_per_week: synthetic.alcohol_units_per_week,
        activity_hours_per_week: synthetic.activity_hours_per_week,
        sleep_hours_per_day: synthetic.sleep_hours_per_day,
        stress_level: synthetic.stress_level,
        respiratory_rate: synthetic.respiratory_rate,
        oxygen_saturation: synthetic.oxygen_saturation,
        bmi: synthetic.bmi,
        chronic_disease: resolve_chronic_disease(intake.history_text()),
        defaulted,
    }
}

/// Mean arterial pressure estimate: (SBP + 2·DBP) / 3.
pub fn derived_map(systolic: i64, diastolic: i64) -> f64 {
    (systolic as f64 + 2.0 * diastolic as f64) / 3.0
}

/// Integer coercion. Accepts JSON integers, finite floats (truncated) and
/// integer strings; anything else yields the default.
pub fn parse_integer(raw: Option<&Value>, default: i64) -> Parsed<i64> {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) => Parsed::Value(v),
        None => Parsed::Defaulted(default),
    }
}

/// Float coercion. Accepts JSON numbers and numeric strings; non-finite
/// values are treated as malformed.
pub fn parse_float(raw: Option<&Value>, default: f64) -> Parsed<f64> {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed.filter(|f| f.is_finite()) {
        Some(v) => Parsed::Value(v),
        None => Parsed::Defaulted(default),
    }
}

/// Split "SYS/DIA" on '/'. If either side is missing or non-numeric, both
/// sides fall back to 120/80.
pub fn parse_blood_pressure(raw: Option<&str>) -> Parsed<(i64, i64)> {
    let default = Parsed::Defaulted((DEFAULT_SYSTOLIC, DEFAULT_DIASTOLIC));
    let Some(raw) = raw else { return default };

    let mut parts = raw.split('/');
    let systolic = parts.next().and_then(|s| s.trim().parse::<i64>().ok());
    let diastolic = parts.next().and_then(|s| s.trim().parse::<i64>().ok());

    match (systolic, diastolic) {
        (Some(sys), Some(dia)) => Parsed::Value((sys, dia)),
        _ => default,
    }
}

/// Exactly "Male" or "Female" pass through. Any other present value,
/// including `""` and `null`, is Other. Only a missing key defaults to Male.
pub fn resolve_gender(raw: Option<&Value>) -> Parsed<Gender> {
    let Some(raw) = raw else {
        return Parsed::Defaulted(DEFAULT_GENDER);
    };
    let gender = match raw.as_str() {
        Some("Male") => Gender::Male,
        Some("Female") => Gender::Female,
        _ => Gender::Other,
    };
    Parsed::Value(gender)
}

/// Keyword match against free-text history. Diabetes is the non-missing
/// default, not a clinical inference.
pub fn resolve_chronic_disease(history: &str) -> ChronicDisease {
    let history = history.to_lowercase();
    if history.contains("heart") {
        ChronicDisease::HeartDisease
    } else if history.contains("hypertension") || history.contains("pressure") {
        ChronicDisease::Hypertension
    } else {
        ChronicDisease::Diabetes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn intake(value: serde_json::Value) -> PatientIntake {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_intake_gets_all_defaults() {
        let features = normalize(&PatientIntake::default());
        assert_eq!(features.age, 30);
        assert_eq!(features.heart_rate, 70);
        assert!((features.temperature - 98.6).abs() < 1e-9);
        assert_eq!((features.systolic, features.diastolic), (120, 80));
        assert_eq!(features.gender, Gender::Male);
        assert_eq!(features.chronic_disease, ChronicDisease::Diabetes);
        assert_eq!(features.defaulted.len(), 5);
    }

    #[test]
    fn well_formed_intake_has_no_defaults() {
        let features = normalize(&intake(json!({
            "age": 46, "gender": "Male", "bp": "155/95",
            "heartRate": 105, "temperature": 99.2
        })));
        assert_eq!(features.age, 46);
        assert_eq!((features.systolic, features.diastolic), (155, 95));
        assert_eq!(features.heart_rate, 105);
        assert!(features.defaulted.is_empty());
    }

    #[test]
    fn derived_map_formula() {
        let features = normalize(&intake(json!({"bp": "120/90"})));
        assert!((features.derived_map - 100.0).abs() < 1e-9);
        assert!((derived_map(155, 95) - 115.0).abs() < 1e-9);
    }

    #[test]
    fn unparsable_bp_falls_back_to_120_80() {
        for raw in ["abc", "150", "150/", "/90", "150/abc", "", "155/95 mmHg"] {
            let parsed = parse_blood_pressure(Some(raw));
            assert_eq!(parsed, Parsed::Defaulted((120, 80)), "input {raw:?}");
        }
    }

    #[test]
    fn bp_tolerates_whitespace_and_extra_parts() {
        assert_eq!(parse_blood_pressure(Some(" 130 / 85 ")), Parsed::Value((130, 85)));
        assert_eq!(parse_blood_pressure(Some("130/85/70")), Parsed::Value((130, 85)));
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(parse_integer(Some(&json!(45)), 30), Parsed::Value(45));
        assert_eq!(parse_integer(Some(&json!("45")), 30), Parsed::Value(45));
        assert_eq!(parse_integer(Some(&json!(45.9)), 30), Parsed::Value(45));
        assert_eq!(parse_integer(Some(&json!("45.9")), 30), Parsed::Defaulted(30));
        assert_eq!(parse_integer(Some(&json!("abc")), 30), Parsed::Defaulted(30));
        assert_eq!(parse_integer(Some(&json!(null)), 30), Parsed::Defaulted(30));
        assert_eq!(parse_integer(Some(&json!(true)), 30), Parsed::Defaulted(30));
        assert_eq!(parse_integer(None, 70), Parsed::Defaulted(70));
    }

    #[test]
    fn float_coercion() {
        assert_eq!(parse_float(Some(&json!(101.2)), 98.6), Parsed::Value(101.2));
        assert_eq!(parse_float(Some(&json!("101.2")), 98.6), Parsed::Value(101.2));
        assert_eq!(parse_float(Some(&json!(100)), 98.6), Parsed::Value(100.0));
        assert_eq!(parse_float(Some(&json!("NaN")), 98.6), Parsed::Defaulted(98.6));
        assert_eq!(parse_float(Some(&json!("warm")), 98.6), Parsed::Defaulted(98.6));
    }

    #[test]
    fn gender_mapping() {
        assert_eq!(resolve_gender(Some(&json!("Female"))).value(), Gender::Female);
        assert_eq!(resolve_gender(Some(&json!("Male"))).value(), Gender::Male);
        assert_eq!(resolve_gender(Some(&json!("Non-binary"))).value(), Gender::Other);
        assert!(!resolve_gender(Some(&json!("Non-binary"))).is_defaulted());
        assert_eq!(resolve_gender(None), Parsed::Defaulted(Gender::Male));
    }

    #[test]
    fn gender_match_is_exact() {
        let inputs = [
            json!("male"),
            json!("FEMALE"),
            json!(" Male"),
            json!(""),
            json!("  "),
            Value::Null,
            json!(1),
        ];
        for raw in inputs {
            assert_eq!(resolve_gender(Some(&raw)), Parsed::Value(Gender::Other), "{raw}");
        }
    }

    #[test]
    fn explicit_null_gender_is_other_but_absent_is_male() {
        let explicit = normalize(&intake(json!({"gender": null})));
        assert_eq!(explicit.gender, Gender::Other);
        assert!(!explicit.defaulted.contains(&IntakeField::Gender));

        let absent = normalize(&PatientIntake::default());
        assert_eq!(absent.gender, Gender::Male);
        assert!(absent.defaulted.contains(&IntakeField::Gender));
    }

    #[test]
    fn chronic_disease_keywords() {
        assert_eq!(resolve_chronic_disease("Prior HEART attack"), ChronicDisease::HeartDisease);
        assert_eq!(
            resolve_chronic_disease("Hypertension, High Cholesterol."),
            ChronicDisease::Hypertension
        );
        assert_eq!(resolve_chronic_disease("high blood pressure"), ChronicDisease::Hypertension);
        assert_eq!(resolve_chronic_disease("asthma"), ChronicDisease::Diabetes);
        assert_eq!(resolve_chronic_disease(""), ChronicDisease::Diabetes);
    }

    #[test]
    fn heart_keyword_wins_over_pressure() {
        assert_eq!(
            resolve_chronic_disease("heart failure and high pressure"),
            ChronicDisease::HeartDisease
        );
    }

    #[test]
    fn synthetic_constants_are_input_independent() {
        let a = normalize(&intake(json!({"age": 80, "history": "smoker"})));
        let b = normalize(&PatientIntake::default());
        assert_eq!(a.smoking, b.smoking);
        assert_eq!(a.respiratory_rate, 16);
        assert_eq!(a.oxygen_saturation, 98);
        assert!((a.bmi - 24.5).abs() < 1e-9);
    }

    #[test]
    fn malformed_fields_are_recorded() {
        let features = normalize(&intake(json!({
            "age": 52, "gender": "Female", "bp": "abc",
            "heartRate": "fast", "temperature": 100.1
        })));
        assert_eq!(
            features.defaulted,
            vec![IntakeField::BloodPressure, IntakeField::HeartRate]
        );
    }
}
