//! Clinical observation types for heart-disease risk screening.
//!
//! Based on the UCI Heart Disease (Cleveland) feature set. Categorical fields
//! are stored as typed enums; the numeric codes only exist at the edges and are
//! interpreted through an explicit [`Coding`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric convention for the categorical fields.
///
/// | Field | Cleveland | ZeroBased |
/// |-------|-----------|-----------|
/// | cp    | 1..=4     | 0..=3     |
/// | slope | 1..=3     | 0..=2     |
/// | thal  | 3, 6, 7   | 0, 1, 2   |
///
/// `sex`, `fbs`, `restecg`, `exang` and `ca` are coded identically in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coding {
    /// Original UCI Cleveland codes (canonical)
    #[default]
    Cleveland,
    /// Zero-based codes used by some form and model variants
    ZeroBased,
}

impl fmt::Display for Coding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cleveland => write!(f, "cleveland"),
            Self::ZeroBased => write!(f, "zero-based"),
        }
    }
}

impl FromStr for Coding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cleveland" | "uci" => Ok(Self::Cleveland),
            "zero-based" | "zero_based" | "zerobased" | "zero" => Ok(Self::ZeroBased),
            other => Err(format!("unknown coding '{other}' (expected cleveland or zero-based)")),
        }
    }
}

/// A categorical clinical field with a fixed set of values.
pub trait Category: Copy + PartialEq + Sized + 'static {
    /// All values, in code order.
    const VARIANTS: &'static [Self];

    /// Numeric code under the given coding.
    fn code(self, coding: Coding) -> u8;

    /// Human-readable name.
    fn label(self) -> &'static str;

    /// Decode a numeric code. Returns `None` for codes outside the coding.
    fn from_code(code: u8, coding: Coding) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.code(coding) == code)
    }

    /// Accepted codes under the given coding, for error messages and hints.
    fn codes(coding: Coding) -> Vec<u8> {
        Self::VARIANTS.iter().map(|v| v.code(coding)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Category for Sex {
    const VARIANTS: &'static [Self] = &[Self::Female, Self::Male];

    fn code(self, _coding: Coding) -> u8 {
        match self {
            Self::Female => 0,
            Self::Male => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

/// Chest pain type (`cp`), ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChestPain {
    TypicalAngina,
    AtypicalAngina,
    NonAnginal,
    Asymptomatic,
}

impl Category for ChestPain {
    const VARIANTS: &'static [Self] = &[
        Self::TypicalAngina,
        Self::AtypicalAngina,
        Self::NonAnginal,
        Self::Asymptomatic,
    ];

    fn code(self, coding: Coding) -> u8 {
        let base = match self {
            Self::TypicalAngina => 0,
            Self::AtypicalAngina => 1,
            Self::NonAnginal => 2,
            Self::Asymptomatic => 3,
        };
        match coding {
            Coding::Cleveland => base + 1,
            Coding::ZeroBased => base,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::TypicalAngina => "Typical angina",
            Self::AtypicalAngina => "Atypical angina",
            Self::NonAnginal => "Non-anginal pain",
            Self::Asymptomatic => "Asymptomatic",
        }
    }
}

/// Resting electrocardiographic result (`restecg`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestingEcg {
    Normal,
    StTAbnormality,
    LvHypertrophy,
}

impl Category for RestingEcg {
    const VARIANTS: &'static [Self] = &[Self::Normal, Self::StTAbnormality, Self::LvHypertrophy];

    fn code(self, _coding: Coding) -> u8 {
        match self {
            Self::Normal => 0,
            Self::StTAbnormality => 1,
            Self::LvHypertrophy => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::StTAbnormality => "ST-T wave abnormality",
            Self::LvHypertrophy => "Left ventricular hypertrophy",
        }
    }
}

/// Slope of the peak exercise ST segment (`slope`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StSlope {
    Upsloping,
    Flat,
    Downsloping,
}

impl Category for StSlope {
    const VARIANTS: &'static [Self] = &[Self::Upsloping, Self::Flat, Self::Downsloping];

    fn code(self, coding: Coding) -> u8 {
        let base = match self {
            Self::Upsloping => 0,
            Self::Flat => 1,
            Self::Downsloping => 2,
        };
        match coding {
            Coding::Cleveland => base + 1,
            Coding::ZeroBased => base,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Upsloping => "Upsloping",
            Self::Flat => "Flat",
            Self::Downsloping => "Downsloping",
        }
    }
}

/// Thalassemia status (`thal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Thalassemia {
    Normal,
    FixedDefect,
    ReversibleDefect,
}

impl Category for Thalassemia {
    const VARIANTS: &'static [Self] = &[Self::Normal, Self::FixedDefect, Self::ReversibleDefect];

    fn code(self, coding: Coding) -> u8 {
        match (coding, self) {
            (Coding::Cleveland, Self::Normal) => 3,
            (Coding::Cleveland, Self::FixedDefect) => 6,
            (Coding::Cleveland, Self::ReversibleDefect) => 7,
            (Coding::ZeroBased, Self::Normal) => 0,
            (Coding::ZeroBased, Self::FixedDefect) => 1,
            (Coding::ZeroBased, Self::ReversibleDefect) => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FixedDefect => "Fixed defect",
            Self::ReversibleDefect => "Reversible defect",
        }
    }
}

/// The thirteen observation fields, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Age,
    Sex,
    ChestPain,
    RestingBp,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    StDepression,
    StSlope,
    Vessels,
    Thalassemia,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Age,
        Field::Sex,
        Field::ChestPain,
        Field::RestingBp,
        Field::Cholesterol,
        Field::FastingBloodSugar,
        Field::RestingEcg,
        Field::MaxHeartRate,
        Field::ExerciseAngina,
        Field::StDepression,
        Field::StSlope,
        Field::Vessels,
        Field::Thalassemia,
    ];

    /// JSON key used on the wire.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Sex => "sex",
            Self::ChestPain => "cp",
            Self::RestingBp => "trestbps",
            Self::Cholesterol => "chol",
            Self::FastingBloodSugar => "fbs",
            Self::RestingEcg => "restecg",
            Self::MaxHeartRate => "thalach",
            Self::ExerciseAngina => "exang",
            Self::StDepression => "oldpeak",
            Self::StSlope => "slope",
            Self::Vessels => "ca",
            Self::Thalassemia => "thal",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Sex => "Sex",
            Self::ChestPain => "Chest Pain Type",
            Self::RestingBp => "Resting BP",
            Self::Cholesterol => "Cholesterol",
            Self::FastingBloodSugar => "Fasting Blood Sugar",
            Self::RestingEcg => "Resting ECG",
            Self::MaxHeartRate => "Max Heart Rate",
            Self::ExerciseAngina => "Exercise Angina",
            Self::StDepression => "ST Depression",
            Self::StSlope => "ST Slope",
            Self::Vessels => "Major Vessels",
            Self::Thalassemia => "Thalassemia",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.message)
    }
}

/// Inclusive validation ranges (union of all form variants).
pub mod ranges {
    pub const AGE: (f64, f64) = (1.0, 120.0);
    pub const RESTING_BP: (f64, f64) = (50.0, 250.0);
    pub const CHOLESTEROL: (f64, f64) = (100.0, 600.0);
    pub const MAX_HEART_RATE: (f64, f64) = (50.0, 250.0);
    pub const ST_DEPRESSION: (f64, f64) = (0.0, 10.0);
    pub const VESSELS: (f64, f64) = (0.0, 4.0);
}

/// Unvalidated observation as submitted by a form or a JSON document.
///
/// Keys match the wire contract; categorical values are raw codes whose meaning
/// depends on the [`Coding`] they are decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationInput {
    pub age: f64,
    pub sex: f64,
    pub cp: f64,
    pub trestbps: f64,
    pub chol: f64,
    pub fbs: f64,
    pub restecg: f64,
    pub thalach: f64,
    pub exang: f64,
    pub oldpeak: f64,
    pub slope: f64,
    pub ca: f64,
    pub thal: f64,
}

impl ObservationInput {
    /// Values in wire order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Build from values in wire order.
    ///
    /// # Errors
    /// Returns error if the slice does not hold exactly 13 values.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        if v.len() != Field::ALL.len() {
            return Err(format!(
                "Expected {} features, got {}",
                Field::ALL.len(),
                v.len()
            ));
        }

        Ok(Self {
            age: v[0],
            sex: v[1],
            cp: v[2],
            trestbps: v[3],
            chol: v[4],
            fbs: v[5],
            restecg: v[6],
            thalach: v[7],
            exang: v[8],
            oldpeak: v[9],
            slope: v[10],
            ca: v[11],
            thal: v[12],
        })
    }

    /// Raw value of a single field.
    #[must_use]
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Age => self.age,
            Field::Sex => self.sex,
            Field::ChestPain => self.cp,
            Field::RestingBp => self.trestbps,
            Field::Cholesterol => self.chol,
            Field::FastingBloodSugar => self.fbs,
            Field::RestingEcg => self.restecg,
            Field::MaxHeartRate => self.thalach,
            Field::ExerciseAngina => self.exang,
            Field::StDepression => self.oldpeak,
            Field::StSlope => self.slope,
            Field::Vessels => self.ca,
            Field::Thalassemia => self.thal,
        }
    }
}

/// Validated clinical observation.
///
/// Transient: created per submission and dropped on reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalObservation {
    /// Age in years
    pub age: u32,
    pub sex: Sex,
    pub chest_pain: ChestPain,
    /// Resting blood pressure in mm Hg on admission
    pub resting_bp: u32,
    /// Serum cholesterol in mg/dl
    pub cholesterol: u32,
    /// Fasting blood sugar > 120 mg/dl
    pub fasting_blood_sugar: bool,
    pub resting_ecg: RestingEcg,
    /// Maximum heart rate achieved (bpm)
    pub max_heart_rate: u32,
    pub exercise_angina: bool,
    /// ST depression induced by exercise relative to rest, one decimal
    pub st_depression: f64,
    pub st_slope: StSlope,
    /// Major vessels colored by fluoroscopy
    pub vessels: u8,
    pub thalassemia: Thalassemia,
}

impl ClinicalObservation {
    /// Validate raw input and decode categorical codes with `coding`.
    ///
    /// Every offending field is reported, in wire order.
    ///
    /// # Errors
    /// Returns one [`FieldError`] per invalid field.
    pub fn from_input(input: &ObservationInput, coding: Coding) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let age = whole_in_range(&mut errors, Field::Age, input.age, ranges::AGE);
        let sex = category::<Sex>(&mut errors, Field::Sex, input.sex, coding);
        let chest_pain = category::<ChestPain>(&mut errors, Field::ChestPain, input.cp, coding);
        let resting_bp =
            whole_in_range(&mut errors, Field::RestingBp, input.trestbps, ranges::RESTING_BP);
        let cholesterol =
            whole_in_range(&mut errors, Field::Cholesterol, input.chol, ranges::CHOLESTEROL);
        let fasting_blood_sugar = flag(&mut errors, Field::FastingBloodSugar, input.fbs);
        let resting_ecg = category::<RestingEcg>(&mut errors, Field::RestingEcg, input.restecg, coding);
        let max_heart_rate = whole_in_range(
            &mut errors,
            Field::MaxHeartRate,
            input.thalach,
            ranges::MAX_HEART_RATE,
        );
        let exercise_angina = flag(&mut errors, Field::ExerciseAngina, input.exang);
        let st_depression = decimal_in_range(
            &mut errors,
            Field::StDepression,
            input.oldpeak,
            ranges::ST_DEPRESSION,
        );
        let st_slope = category::<StSlope>(&mut errors, Field::StSlope, input.slope, coding);
        let vessels = whole_in_range(&mut errors, Field::Vessels, input.ca, ranges::VESSELS);
        let thalassemia = category::<Thalassemia>(&mut errors, Field::Thalassemia, input.thal, coding);

        match (
            age,
            sex,
            chest_pain,
            resting_bp,
            cholesterol,
            fasting_blood_sugar,
            resting_ecg,
            max_heart_rate,
            exercise_angina,
            st_depression,
            st_slope,
            vessels,
            thalassemia,
        ) {
            (
                Some(age),
                Some(sex),
                Some(chest_pain),
                Some(resting_bp),
                Some(cholesterol),
                Some(fasting_blood_sugar),
                Some(resting_ecg),
                Some(max_heart_rate),
                Some(exercise_angina),
                Some(st_depression),
                Some(st_slope),
                Some(vessels),
                Some(thalassemia),
            ) if errors.is_empty() => Ok(Self {
                age,
                sex,
                chest_pain,
                resting_bp,
                cholesterol,
                fasting_blood_sugar,
                resting_ecg,
                max_heart_rate,
                exercise_angina,
                st_depression,
                st_slope,
                vessels: vessels as u8,
                thalassemia,
            }),
            _ => Err(errors),
        }
    }

    /// Encode back to raw codes under `coding`.
    #[must_use]
    pub fn to_input(&self, coding: Coding) -> ObservationInput {
        ObservationInput {
            age: f64::from(self.age),
            sex: f64::from(self.sex.code(coding)),
            cp: f64::from(self.chest_pain.code(coding)),
            trestbps: f64::from(self.resting_bp),
            chol: f64::from(self.cholesterol),
            fbs: f64::from(u8::from(self.fasting_blood_sugar)),
            restecg: f64::from(self.resting_ecg.code(coding)),
            thalach: f64::from(self.max_heart_rate),
            exang: f64::from(u8::from(self.exercise_angina)),
            oldpeak: self.st_depression,
            slope: f64::from(self.st_slope.code(coding)),
            ca: f64::from(self.vessels),
            thal: f64::from(self.thalassemia.code(coding)),
        }
    }

    /// Age-predicted maximum heart rate (`220 - age`), if positive.
    #[must_use]
    pub fn predicted_max_heart_rate(&self) -> Option<u32> {
        220u32.checked_sub(self.age).filter(|&hr| hr > 0)
    }

    /// Achieved heart rate as a percentage of the age-predicted maximum.
    ///
    /// `None` when the predicted maximum is not positive (age >= 220).
    #[must_use]
    pub fn heart_rate_percentage(&self) -> Option<f64> {
        self.predicted_max_heart_rate()
            .map(|predicted| f64::from(self.max_heart_rate) / f64::from(predicted) * 100.0)
    }
}

fn finite(errors: &mut Vec<FieldError>, field: Field, value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        errors.push(FieldError::new(field, "Invalid number"));
        None
    }
}

fn whole_in_range(
    errors: &mut Vec<FieldError>,
    field: Field,
    value: f64,
    (min, max): (f64, f64),
) -> Option<u32> {
    let value = finite(errors, field, value)?;
    if value.fract() != 0.0 {
        errors.push(FieldError::new(field, "Must be a whole number"));
        return None;
    }
    if !(min..=max).contains(&value) {
        errors.push(FieldError::new(
            field,
            format!("Value must be between {min} and {max}"),
        ));
        return None;
    }
    Some(value as u32)
}

fn decimal_in_range(
    errors: &mut Vec<FieldError>,
    field: Field,
    value: f64,
    (min, max): (f64, f64),
) -> Option<f64> {
    let value = finite(errors, field, value)?;
    if !(min..=max).contains(&value) {
        errors.push(FieldError::new(
            field,
            format!("Value must be between {min} and {max}"),
        ));
        return None;
    }
    // Tolerance absorbs binary representation error (2.3 * 10 = 22.999...).
    let tenths = value * 10.0;
    if (tenths - tenths.round()).abs() > 1e-6 {
        errors.push(FieldError::new(field, "At most one decimal place"));
        return None;
    }
    Some(value)
}

fn flag(errors: &mut Vec<FieldError>, field: Field, value: f64) -> Option<bool> {
    let value = finite(errors, field, value)?;
    if value == 0.0 {
        Some(false)
    } else if value == 1.0 {
        Some(true)
    } else {
        errors.push(FieldError::new(field, format!("{value} must be 0 or 1")));
        None
    }
}

fn category<C: Category>(
    errors: &mut Vec<FieldError>,
    field: Field,
    value: f64,
    coding: Coding,
) -> Option<C> {
    let value = finite(errors, field, value)?;
    let decoded = if value.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&value) {
        C::from_code(value as u8, coding)
    } else {
        None
    };

    if decoded.is_none() {
        let accepted: Vec<String> = C::codes(coding).iter().map(u8::to_string).collect();
        errors.push(FieldError::new(
            field,
            format!("{value} is not one of {} ({coding} coding)", accepted.join(", ")),
        ));
    }
    decoded
}
