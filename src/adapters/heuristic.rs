//! Local heuristic scorer.
//!
//! A hand-tuned additive band model over the thirteen Cleveland features.
//! Every field contributes independently; the sum is normalized against a
//! fixed divisor and classified into a [`RiskTier`].
//!
//! # Normalization ceiling
//!
//! The highest band weights sum to [`MAX_RAW_SCORE`] (206), which exceeds
//! [`NORMALIZATION_DIVISOR`] (200). The score is therefore capped at
//! [`SCORE_CEILING`]: any raw score of 197 or more reports 99.

use std::convert::Infallible;

use crate::domain::{
    ChestPain, ClinicalObservation, Evaluation, Field, RestingEcg, RiskAssessment, RiskFactor,
    RiskTier, Sex, StSlope, Strategy, Thalassemia,
};
use crate::ports::RiskEvaluator;

/// Divisor used to turn raw band points into a percentage.
pub const NORMALIZATION_DIVISOR: u32 = 200;

/// Highest normalized score ever reported.
pub const SCORE_CEILING: u8 = 99;

/// Maximum number of contributing factors kept in an assessment.
pub const MAX_FACTORS: usize = 5;

/// Largest attainable raw score (every top band firing).
pub const MAX_RAW_SCORE: u32 = 15 + 5 + 20 + 15 + 15 + 10 + 15 + 15 + 18 + 18 + 15 + 25 + 20;

/// Points contributed by a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub field: Field,
    pub points: u32,
    pub factor: Option<RiskFactor>,
}

impl Contribution {
    fn new(field: Field, points: u32, factor: Option<RiskFactor>) -> Self {
        Self {
            field,
            points,
            factor,
        }
    }
}

/// Per-field contributions in evaluation order.
#[must_use]
pub fn breakdown(obs: &ClinicalObservation) -> Vec<Contribution> {
    vec![
        age_band(obs),
        sex_band(obs),
        chest_pain_band(obs),
        resting_bp_band(obs),
        cholesterol_band(obs),
        fasting_blood_sugar_band(obs),
        resting_ecg_band(obs),
        heart_rate_band(obs),
        exercise_angina_band(obs),
        st_depression_band(obs),
        st_slope_band(obs),
        vessels_band(obs),
        thalassemia_band(obs),
    ]
}

/// Score an observation. Total and deterministic.
#[must_use]
pub fn score(obs: &ClinicalObservation) -> RiskAssessment {
    let contributions = breakdown(obs);

    let raw_score: u32 = contributions.iter().map(|c| c.points).sum();
    let score = normalize(raw_score);
    let tier = RiskTier::from_score(score);
    let factors = contributions
        .iter()
        .filter_map(|c| c.factor)
        .take(MAX_FACTORS)
        .collect();

    RiskAssessment {
        prediction: tier.is_positive(),
        score,
        raw_score,
        tier,
        factors,
    }
}

/// `min(round(raw / 200 * 100), 99)`, rounding halves up.
#[must_use]
pub fn normalize(raw_score: u32) -> u8 {
    let pct = (u64::from(raw_score) * 100 + u64::from(NORMALIZATION_DIVISOR / 2))
        / u64::from(NORMALIZATION_DIVISOR);
    pct.min(u64::from(SCORE_CEILING)) as u8
}

fn age_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = if obs.age > 60 {
        (15, Some(RiskFactor::AgeOver60))
    } else if obs.age > 50 {
        (10, Some(RiskFactor::AgeOver50))
    } else if obs.age > 40 {
        (5, None)
    } else {
        (0, None)
    };
    Contribution::new(Field::Age, points, factor)
}

fn sex_band(obs: &ClinicalObservation) -> Contribution {
    match obs.sex {
        Sex::Male => {
            let factor = (obs.age > 45).then_some(RiskFactor::MaleOver45);
            Contribution::new(Field::Sex, 5, factor)
        }
        Sex::Female => Contribution::new(Field::Sex, 0, None),
    }
}

fn chest_pain_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = match obs.chest_pain {
        ChestPain::TypicalAngina => (20, Some(RiskFactor::TypicalAngina)),
        ChestPain::AtypicalAngina => (15, Some(RiskFactor::AtypicalAngina)),
        ChestPain::NonAnginal => (10, Some(RiskFactor::NonAnginalPain)),
        ChestPain::Asymptomatic => (0, None),
    };
    Contribution::new(Field::ChestPain, points, factor)
}

fn resting_bp_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = if obs.resting_bp >= 140 {
        (15, Some(RiskFactor::HighRestingBp))
    } else if obs.resting_bp >= 120 {
        (8, None)
    } else {
        (0, None)
    };
    Contribution::new(Field::RestingBp, points, factor)
}

fn cholesterol_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = if obs.cholesterol >= 240 {
        (15, Some(RiskFactor::HighCholesterol))
    } else if obs.cholesterol >= 200 {
        (8, Some(RiskFactor::BorderlineCholesterol))
    } else {
        (0, None)
    };
    Contribution::new(Field::Cholesterol, points, factor)
}

fn fasting_blood_sugar_band(obs: &ClinicalObservation) -> Contribution {
    if obs.fasting_blood_sugar {
        Contribution::new(
            Field::FastingBloodSugar,
            10,
            Some(RiskFactor::HighFastingBloodSugar),
        )
    } else {
        Contribution::new(Field::FastingBloodSugar, 0, None)
    }
}

fn resting_ecg_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = match obs.resting_ecg {
        RestingEcg::LvHypertrophy => (15, Some(RiskFactor::LvHypertrophy)),
        RestingEcg::StTAbnormality => (10, Some(RiskFactor::StTAbnormality)),
        RestingEcg::Normal => (0, None),
    };
    Contribution::new(Field::RestingEcg, points, factor)
}

// Lower achieved/predicted ratio means higher risk. Undefined ratios (age >= 220)
// contribute nothing.
fn heart_rate_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = match obs.heart_rate_percentage() {
        Some(pct) if pct < 70.0 => (15, Some(RiskFactor::LowMaxHeartRate)),
        Some(pct) if pct < 85.0 => (8, None),
        Some(_) => (0, None),
        None => {
            tracing::debug!("Heart-rate reserve undefined for age, band skipped");
            (0, None)
        }
    };
    Contribution::new(Field::MaxHeartRate, points, factor)
}

fn exercise_angina_band(obs: &ClinicalObservation) -> Contribution {
    if obs.exercise_angina {
        Contribution::new(Field::ExerciseAngina, 18, Some(RiskFactor::ExerciseAngina))
    } else {
        Contribution::new(Field::ExerciseAngina, 0, None)
    }
}

fn st_depression_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = if obs.st_depression >= 2.0 {
        (18, Some(RiskFactor::SignificantStDepression))
    } else if obs.st_depression >= 1.0 {
        (10, Some(RiskFactor::ModerateStDepression))
    } else {
        (0, None)
    };
    Contribution::new(Field::StDepression, points, factor)
}

fn st_slope_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = match obs.st_slope {
        StSlope::Downsloping => (15, Some(RiskFactor::DownslopingSt)),
        StSlope::Flat => (8, Some(RiskFactor::FlatSt)),
        StSlope::Upsloping => (0, None),
    };
    Contribution::new(Field::StSlope, points, factor)
}

fn vessels_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = match obs.vessels {
        0 => (0, None),
        1 => (10, Some(RiskFactor::OneVessel)),
        2 => (18, Some(RiskFactor::TwoVessels)),
        _ => (25, Some(RiskFactor::ThreeVessels)),
    };
    Contribution::new(Field::Vessels, points, factor)
}

fn thalassemia_band(obs: &ClinicalObservation) -> Contribution {
    let (points, factor) = match obs.thalassemia {
        Thalassemia::ReversibleDefect => (20, Some(RiskFactor::ReversibleThalDefect)),
        Thalassemia::FixedDefect => (12, Some(RiskFactor::FixedThalDefect)),
        Thalassemia::Normal => (0, None),
    };
    Contribution::new(Field::Thalassemia, points, factor)
}

/// In-process evaluator backed by [`score`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RiskEvaluator for HeuristicScorer {
    type Error = Infallible;

    fn strategy(&self) -> Strategy {
        Strategy::Local
    }

    fn evaluate(&self, observation: &ClinicalObservation) -> Result<Evaluation, Self::Error> {
        Ok(Evaluation::Local(score(observation)))
    }
}
