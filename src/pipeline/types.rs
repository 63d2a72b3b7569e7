use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════
// Input: intake record
// ═══════════════════════════════════════════════════════════

/// Raw intake record as produced by the intake form or the document extractor.
///
/// Every field is optional. Numeric fields are kept as raw JSON so that
/// malformed values ("abc", `null`, `true`) reach the normalizer instead of
/// failing deserialization. Text fields accept any scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIntake {
    /// Passthrough only, never read by the engine.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
    /// Kept raw: an absent key and an explicit `null` resolve differently.
    #[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
    pub gender: Option<Value>,
    /// Blood pressure as "SYS/DIA".
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub bp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<Value>,
    /// Degrees Fahrenheit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
}

impl PatientIntake {
    pub fn symptoms_text(&self) -> &str {
        self.symptoms.as_deref().unwrap_or("")
    }

    pub fn history_text(&self) -> &str {
        self.history.as_deref().unwrap_or("")
    }
}

/// Accept strings, numbers and booleans as text; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Any present value, `null` included. Only a missing key is `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ═══════════════════════════════════════════════════════════
// Categorical features
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmokingStatus {
    Current,
    Former,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChronicDisease {
    Diabetes,
    #[serde(rename = "Heart Disease")]
    HeartDisease,
    Hypertension,
}

/// Category codes follow the alphabetical ordering the classifiers were
/// trained with.
pub trait CategoryCode {
    fn category_code(&self) -> f32;
}

impl CategoryCode for Gender {
    fn category_code(&self) -> f32 {
        match self {
            Gender::Female => 0.0,
            Gender::Male => 1.0,
            Gender::Other => 2.0,
        }
    }
}

impl CategoryCode for SmokingStatus {
    fn category_code(&self) -> f32 {
        match self {
            SmokingStatus::Current => 0.0,
            SmokingStatus::Former => 1.0,
            SmokingStatus::Never => 2.0,
        }
    }
}

impl CategoryCode for ChronicDisease {
    fn category_code(&self) -> f32 {
        match self {
            ChronicDisease::Diabetes => 0.0,
            ChronicDisease::HeartDisease => 1.0,
            ChronicDisease::Hypertension => 2.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Feature vector
// ═══════════════════════════════════════════════════════════

/// Intake fields whose value can be replaced by a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeField {
    Age,
    Gender,
    BloodPressure,
    HeartRate,
    Temperature,
}

impl IntakeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeField::Age => "age",
            IntakeField::Gender => "gender",
            IntakeField::BloodPressure => "bp",
            IntakeField::HeartRate => "heartRate",
            IntakeField::Temperature => "temperature",
        }
    }
}

/// Outcome of coercing one intake field: the value read, or the default
/// that replaced a missing/malformed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parsed<T> {
    Value(T),
    Defaulted(T),
}

impl<T: Copy> Parsed<T> {
    pub fn value(&self) -> T {
        match self {
            Parsed::Value(v) | Parsed::Defaulted(v) => *v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Parsed::Defaulted(_))
    }
}

/// Canonical classifier input. Built only by `normalize::normalize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub age: i64,
    pub gender: Gender,
    pub systolic: i64,
    pub diastolic: i64,
    pub derived_map: f64,
    pub heart_rate: i64,
    pub temperature: f64,
    pub smoking: SmokingStatus,
    pub alcohol_units_per_week: f64,
    pub activity_hours_per_week: f64,
    pub sleep_hours_per_day: f64,
    pub stress_level: i64,
    pub respiratory_rate: i64,
    pub oxygen_saturation: i64,
    pub bmi: f64,
    pub chronic_disease: ChronicDisease,
    /// Fields that were missing or malformed and received defaults.
    pub defaulted: Vec<IntakeField>,
}

/// Named classifier input columns, in the training column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FeatureColumn {
    Age,
    Gender,
    Bmi,
    SmokingStatus,
    AlcoholConsumption,
    PhysicalActivity,
    SleepDuration,
    ChronicDiseaseHistory,
    StressLevel,
    HeartRate,
    RespiratoryRate,
    BodyTemperature,
    OxygenSaturation,
    SystolicBloodPressure,
    DiastolicBloodPressure,
    DerivedMap,
}

impl FeatureColumn {
    /// Column name as it appears in the training data.
    pub fn name(&self) -> &'static str {
        match self {
            FeatureColumn::Age => "Age",
            FeatureColumn::Gender => "Gender",
            FeatureColumn::Bmi => "BMI",
            FeatureColumn::SmokingStatus => "Smoking Status",
            FeatureColumn::AlcoholConsumption => "Alcohol Consumption (per week)",
            FeatureColumn::PhysicalActivity => "Physical Activity (hours/week)",
            FeatureColumn::SleepDuration => "Sleep Duration (hours/day)",
            FeatureColumn::ChronicDiseaseHistory => "Chronic Disease History",
            FeatureColumn::StressLevel => "Stress Level (1-10)",
            FeatureColumn::HeartRate => "Heart Rate",
            FeatureColumn::RespiratoryRate => "Respiratory Rate",
            FeatureColumn::BodyTemperature => "Body Temperature",
            FeatureColumn::OxygenSaturation => "Oxygen Saturation",
            FeatureColumn::SystolicBloodPressure => "Systolic Blood Pressure",
            FeatureColumn::DiastolicBloodPressure => "Diastolic Blood Pressure",
            FeatureColumn::DerivedMap => "Derived_MAP",
        }
    }
}

/// Every column of the legacy full-feature model.
pub const FULL_FEATURE_COLUMNS: [FeatureColumn; 16] = [
    FeatureColumn::Age,
    FeatureColumn::Gender,
    FeatureColumn::Bmi,
    FeatureColumn::SmokingStatus,
    FeatureColumn::AlcoholConsumption,
    FeatureColumn::PhysicalActivity,
    FeatureColumn::SleepDuration,
    FeatureColumn::ChronicDiseaseHistory,
    FeatureColumn::StressLevel,
    FeatureColumn::HeartRate,
    FeatureColumn::RespiratoryRate,
    FeatureColumn::BodyTemperature,
    FeatureColumn::OxygenSaturation,
    FeatureColumn::SystolicBloodPressure,
    FeatureColumn::DiastolicBloodPressure,
    FeatureColumn::DerivedMap,
];

/// Vitals-only subset used by the newer risk model.
pub const REDUCED_VITALS_COLUMNS: [FeatureColumn; 7] = [
    FeatureColumn::Age,
    FeatureColumn::HeartRate,
    FeatureColumn::RespiratoryRate,
    FeatureColumn::BodyTemperature,
    FeatureColumn::OxygenSaturation,
    FeatureColumn::SystolicBloodPressure,
    FeatureColumn::DiastolicBloodPressure,
];

impl FeatureVector {
    /// Numeric value of one column, categoricals as category codes.
    pub fn column(&self, column: FeatureColumn) -> f32 {
        match column {
            FeatureColumn::Age => self.age as f32,
            FeatureColumn::Gender => self.gender.category_code(),
            FeatureColumn::Bmi => self.bmi as f32,
            FeatureColumn::SmokingStatus => self.smoking.category_code(),
            FeatureColumn::AlcoholConsumption => self.alcohol_units_per_week as f32,
            FeatureColumn::PhysicalActivity => self.activity_hours_per_week as f32,
            FeatureColumn::SleepDuration => self.sleep_hours_per_day as f32,
            FeatureColumn::ChronicDiseaseHistory => self.chronic_disease.category_code(),
            FeatureColumn::StressLevel => self.stress_level as f32,
            FeatureColumn::HeartRate => self.heart_rate as f32,
            FeatureColumn::RespiratoryRate => self.respiratory_rate as f32,
            FeatureColumn::BodyTemperature => self.temperature as f32,
            FeatureColumn::OxygenSaturation => self.oxygen_saturation as f32,
            FeatureColumn::SystolicBloodPressure => self.systolic as f32,
            FeatureColumn::DiastolicBloodPressure => self.diastolic as f32,
            FeatureColumn::DerivedMap => self.derived_map as f32,
        }
    }

    /// Project onto the given columns, preserving their order.
    pub fn project(&self, columns: &[FeatureColumn]) -> Vec<f32> {
        columns.iter().map(|c| self.column(*c)).collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Output: triage decision
// ═══════════════════════════════════════════════════════════

/// Risk category. Ordered so that `High` is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a classifier class code (0=Low, 1=Medium, 2=High).
    pub fn from_class_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RiskLevel::Low),
            1 => Some(RiskLevel::Medium),
            2 => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    Cardiology,
    #[serde(rename = "Internal Medicine")]
    InternalMedicine,
    #[serde(rename = "General Practice")]
    GeneralPractice,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Cardiology => "Cardiology",
            Department::InternalMedicine => "Internal Medicine",
            Department::GeneralPractice => "General Practice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Emergency,
    Normal,
}

/// Final triage decision, serialized as the engine's output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub department: Department,
    pub priority: Priority,
    pub wait_time: String,
    pub explanations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
