//! Risk assessment result types.
//!
//! Represents the output of either evaluation strategy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Four-level risk classification derived from the normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    /// Score below 25
    Low,
    /// Score 25-39
    Moderate,
    /// Score 40-59
    High,
    /// Score 60 and above
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskTier {
    pub const MODERATE_CUTOFF: u8 = 25;
    pub const HIGH_CUTOFF: u8 = 40;
    pub const VERY_HIGH_CUTOFF: u8 = 60;

    /// Classify a normalized 0-100 score.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= Self::VERY_HIGH_CUTOFF {
            Self::VeryHigh
        } else if score >= Self::HIGH_CUTOFF {
            Self::High
        } else if score >= Self::MODERATE_CUTOFF {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Whether this tier counts as a positive prediction.
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Self::High | Self::VeryHigh)
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Consultation advised",
            Self::VeryHigh => "Very high risk - Prompt medical evaluation advised",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Moderate => write!(f, "Moderate"),
            Self::High => write!(f, "High"),
            Self::VeryHigh => write!(f, "Very High"),
        }
    }
}

/// A contributing factor recorded by a scoring band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskFactor {
    AgeOver60,
    AgeOver50,
    MaleOver45,
    TypicalAngina,
    AtypicalAngina,
    NonAnginalPain,
    HighRestingBp,
    HighCholesterol,
    BorderlineCholesterol,
    HighFastingBloodSugar,
    LvHypertrophy,
    StTAbnormality,
    LowMaxHeartRate,
    ExerciseAngina,
    SignificantStDepression,
    ModerateStDepression,
    DownslopingSt,
    FlatSt,
    ThreeVessels,
    TwoVessels,
    OneVessel,
    ReversibleThalDefect,
    FixedThalDefect,
}

impl RiskFactor {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AgeOver60 => "Age over 60 years",
            Self::AgeOver50 => "Age over 50 years",
            Self::MaleOver45 => "Male over 45",
            Self::TypicalAngina => "Typical angina chest pain",
            Self::AtypicalAngina => "Atypical angina",
            Self::NonAnginalPain => "Non-anginal pain",
            Self::HighRestingBp => "High resting blood pressure (≥140 mm Hg)",
            Self::HighCholesterol => "High serum cholesterol (≥240 mg/dl)",
            Self::BorderlineCholesterol => "Borderline high cholesterol",
            Self::HighFastingBloodSugar => "Fasting blood sugar > 120 mg/dl",
            Self::LvHypertrophy => "Left ventricular hypertrophy on ECG",
            Self::StTAbnormality => "ST-T wave abnormality on ECG",
            Self::LowMaxHeartRate => "Low maximum heart rate achieved",
            Self::ExerciseAngina => "Exercise-induced angina",
            Self::SignificantStDepression => "Significant ST depression (≥2.0)",
            Self::ModerateStDepression => "Moderate ST depression",
            Self::DownslopingSt => "Downsloping ST segment",
            Self::FlatSt => "Flat ST segment",
            Self::ThreeVessels => "3 major vessels colored by fluoroscopy",
            Self::TwoVessels => "2 major vessels colored by fluoroscopy",
            Self::OneVessel => "1 major vessel colored by fluoroscopy",
            Self::ReversibleThalDefect => "Reversible thalassemia defect",
            Self::FixedThalDefect => "Fixed thalassemia defect",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for RiskFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Result of the local heuristic scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// Binary prediction (true = disease indicated)
    pub prediction: bool,

    /// Normalized score, 0-99
    pub score: u8,

    /// Accumulated band points before normalization
    pub raw_score: u32,

    pub tier: RiskTier,

    /// First triggered factors in evaluation order (at most five)
    pub factors: Vec<RiskFactor>,
}

/// Result mapped from the remote prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePrediction {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub prediction: u8,

    /// Model probability/confidence (0.0 to 1.0), if the service supplied one
    pub confidence: Option<f64>,

    /// Informational message from the service
    pub message: Option<String>,
}

impl RemotePrediction {
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }
}

/// Which evaluation strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// In-process heuristic scorer
    #[default]
    Local,
    /// Remote prediction endpoint
    Remote,
}

impl Strategy {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Local => Self::Remote,
            Self::Remote => Self::Local,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "heuristic" => Ok(Self::Local),
            "remote" | "api" => Ok(Self::Remote),
            other => Err(format!("unknown strategy '{other}' (expected local or remote)")),
        }
    }
}

/// Output of an evaluator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum Evaluation {
    Local(RiskAssessment),
    Remote(RemotePrediction),
}

impl Evaluation {
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Local(_) => Strategy::Local,
            Self::Remote(_) => Strategy::Remote,
        }
    }

    /// Binary prediction regardless of strategy.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Local(a) => a.prediction,
            Self::Remote(r) => r.is_positive(),
        }
    }
}

/// An evaluation with its metadata, as handed to presentation.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub evaluation: Evaluation,

    /// Timestamp of evaluation
    pub evaluated_at: chrono::DateTime<chrono::Utc>,
}

impl AssessmentReport {
    #[must_use]
    pub fn new(evaluation: Evaluation) -> Self {
        Self {
            evaluation,
            evaluated_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_cutoffs() {
        assert_eq!(RiskTier::from_score(0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(24), RiskTier::Low);
        assert_eq!(RiskTier::from_score(25), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(39), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(40), RiskTier::High);
        assert_eq!(RiskTier::from_score(59), RiskTier::High);
        assert_eq!(RiskTier::from_score(60), RiskTier::VeryHigh);
        assert_eq!(RiskTier::from_score(99), RiskTier::VeryHigh);
    }

    #[test]
    fn test_tier_is_monotonic() {
        let tiers: Vec<RiskTier> = (0..=100).map(RiskTier::from_score).collect();
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_positive_tiers() {
        assert!(!RiskTier::Low.is_positive());
        assert!(!RiskTier::Moderate.is_positive());
        assert!(RiskTier::High.is_positive());
        assert!(RiskTier::VeryHigh.is_positive());
    }

    #[test]
    fn test_assessment_serializes_labels() {
        let assessment = RiskAssessment {
            prediction: true,
            score: 62,
            raw_score: 124,
            tier: RiskTier::VeryHigh,
            factors: vec![RiskFactor::AgeOver60, RiskFactor::ExerciseAngina],
        };
        let json = serde_json::to_value(Evaluation::Local(assessment)).expect("Should serialize");
        assert_eq!(json["strategy"], "local");
        assert_eq!(json["tier"], "Very High");
        assert_eq!(json["factors"][0], "Age over 60 years");
        assert_eq!(json["factors"][1], "Exercise-induced angina");
    }

    #[test]
    fn test_strategy_parse_and_toggle() {
        assert_eq!("Remote".parse::<Strategy>(), Ok(Strategy::Remote));
        assert_eq!("local".parse::<Strategy>(), Ok(Strategy::Local));
        assert!("ml".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Local.toggled(), Strategy::Remote);
    }
}
