//! Remote predictor client.
//!
//! Sends the thirteen observation fields as JSON to `<base-url>/predict` and
//! maps the reply to a [`RemotePrediction`]. One best-effort call per request:
//! no retries, no queuing.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::domain::{Category, ClinicalObservation, Coding, Evaluation, RemotePrediction, Strategy};
use crate::ports::RiskEvaluator;

/// Path appended to the configured base URL.
pub const PREDICT_PATH: &str = "/predict";

/// Errors from the remote prediction endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Could not connect to the prediction service: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx reply. `message` is the server's own text when it supplied one.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response from prediction service: {0}")]
    MalformedResponse(String),
}

/// JSON request body: exactly the thirteen wire keys.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub age: u32,
    pub sex: u8,
    pub cp: u8,
    pub trestbps: u32,
    pub chol: u32,
    pub fbs: u8,
    pub restecg: u8,
    pub thalach: u32,
    pub exang: u8,
    pub oldpeak: f64,
    pub slope: u8,
    pub ca: u8,
    pub thal: u8,
}

impl PredictRequest {
    /// Encode an observation with the categorical codes of `coding`.
    #[must_use]
    pub fn new(obs: &ClinicalObservation, coding: Coding) -> Self {
        Self {
            age: obs.age,
            sex: obs.sex.code(coding),
            cp: obs.chest_pain.code(coding),
            trestbps: obs.resting_bp,
            chol: obs.cholesterol,
            fbs: u8::from(obs.fasting_blood_sugar),
            restecg: obs.resting_ecg.code(coding),
            thalach: obs.max_heart_rate,
            exang: u8::from(obs.exercise_angina),
            oldpeak: obs.st_depression,
            slope: obs.st_slope.code(coding),
            ca: obs.vessels,
            thal: obs.thalassemia.code(coding),
        }
    }
}

/// Lenient view of the reply; every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct PredictResponse {
    prediction: Option<f64>,
    probability: Option<f64>,
    confidence: Option<f64>,
    message: Option<String>,
    error: Option<String>,
}

/// Map a raw HTTP reply to a prediction.
///
/// # Errors
/// - `Rejected` for non-2xx statuses, carrying the body's `error` or `message`
///   text, or a generic "Prediction failed" notice.
/// - `MalformedResponse` for a 2xx body without a valid `prediction`.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<RemotePrediction, RemoteError> {
    if !status.is_success() {
        let parsed: PredictResponse = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .error
            .or(parsed.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "Prediction failed: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_string()
            });
        return Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: PredictResponse = serde_json::from_str(body)
        .map_err(|e| RemoteError::MalformedResponse(format!("invalid JSON body: {e}")))?;

    let prediction = match parsed.prediction {
        Some(p) if p == 0.0 => 0,
        Some(p) if p == 1.0 => 1,
        Some(p) => {
            return Err(RemoteError::MalformedResponse(format!(
                "'prediction' must be 0 or 1, got {p}"
            )))
        }
        None => {
            return Err(RemoteError::MalformedResponse(
                "missing 'prediction' field".to_string(),
            ))
        }
    };

    let confidence = parsed.probability.or(parsed.confidence);
    if let Some(c) = confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(RemoteError::MalformedResponse(format!(
                "confidence {c} outside [0, 1]"
            )));
        }
    }

    Ok(RemotePrediction {
        prediction,
        confidence,
        message: parsed.message,
    })
}

/// Blocking HTTP client for the remote prediction endpoint.
pub struct HttpPredictor {
    client: Client,
    base_url: String,
    coding: Coding,
}

impl HttpPredictor {
    /// Create a client for `base_url`.
    ///
    /// `timeout` of `None` waits indefinitely.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        coding: Coding,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            coding,
        })
    }

    /// Create a client from application settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, RemoteError> {
        Self::new(
            settings.api_base_url.clone(),
            settings.wire_coding,
            settings.request_timeout,
        )
    }

    /// Full URL of the prediction endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, PREDICT_PATH)
    }

    #[must_use]
    pub fn coding(&self) -> Coding {
        self.coding
    }

    /// Send one prediction request.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or a malformed body.
    pub fn predict(&self, obs: &ClinicalObservation) -> Result<RemotePrediction, RemoteError> {
        let url = self.endpoint();
        tracing::debug!("POST {} ({} coding)", url, self.coding);

        let response = self
            .client
            .post(&url)
            .json(&PredictRequest::new(obs, self.coding))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        tracing::debug!("Prediction service replied with status {}", status.as_u16());

        interpret_response(status, &body)
    }
}

impl RiskEvaluator for HttpPredictor {
    type Error = RemoteError;

    fn strategy(&self) -> Strategy {
        Strategy::Remote
    }

    fn evaluate(&self, observation: &ClinicalObservation) -> Result<Evaluation, Self::Error> {
        self.predict(observation).map(Evaluation::Remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChestPain, RestingEcg, Sex, StSlope, Thalassemia};

    fn observation() -> ClinicalObservation {
        ClinicalObservation {
            age: 63,
            sex: Sex::Male,
            chest_pain: ChestPain::TypicalAngina,
            resting_bp: 145,
            cholesterol: 233,
            fasting_blood_sugar: true,
            resting_ecg: RestingEcg::LvHypertrophy,
            max_heart_rate: 150,
            exercise_angina: false,
            st_depression: 2.3,
            st_slope: StSlope::Downsloping,
            vessels: 0,
            thalassemia: Thalassemia::FixedDefect,
        }
    }

    #[test]
    fn test_success_maps_probability_to_confidence() {
        let result = interpret_response(StatusCode::OK, r#"{"prediction":1,"probability":0.82}"#)
            .expect("Should map");
        assert_eq!(result.prediction, 1);
        assert_eq!(result.confidence, Some(0.82));
        assert!(result.is_positive());
    }

    #[test]
    fn test_success_accepts_confidence_field_and_message() {
        let result = interpret_response(
            StatusCode::OK,
            r#"{"prediction":0,"confidence":0.3,"message":"ok"}"#,
        )
        .expect("Should map");
        assert_eq!(result.prediction, 0);
        assert_eq!(result.confidence, Some(0.3));
        assert_eq!(result.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_probability_takes_precedence_over_confidence() {
        let result = interpret_response(
            StatusCode::OK,
            r#"{"prediction":1,"probability":0.9,"confidence":0.1}"#,
        )
        .expect("Should map");
        assert_eq!(result.confidence, Some(0.9));
    }

    #[test]
    fn test_confidence_is_optional() {
        let result = interpret_response(StatusCode::OK, r#"{"prediction":1}"#).expect("Should map");
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn test_missing_prediction_is_malformed() {
        let err = interpret_response(StatusCode::OK, r#"{"probability":0.4}"#)
            .expect_err("Should fail");
        assert!(matches!(err, RemoteError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_prediction_and_confidence_are_malformed() {
        assert!(matches!(
            interpret_response(StatusCode::OK, r#"{"prediction":2}"#),
            Err(RemoteError::MalformedResponse(_))
        ));
        assert!(matches!(
            interpret_response(StatusCode::OK, r#"{"prediction":1,"probability":1.5}"#),
            Err(RemoteError::MalformedResponse(_))
        ));
        assert!(matches!(
            interpret_response(StatusCode::OK, "<html>"),
            Err(RemoteError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_rejection_carries_server_error() {
        let err = interpret_response(StatusCode::BAD_REQUEST, r#"{"error":"bad input"}"#)
            .expect_err("Should fail");
        assert_eq!(err.to_string(), "bad input");
        assert!(matches!(err, RemoteError::Rejected { status: 400, .. }));
    }

    #[test]
    fn test_rejection_falls_back_to_message_then_generic() {
        let err = interpret_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"age missing"}"#,
        )
        .expect_err("Should fail");
        assert_eq!(err.to_string(), "age missing");

        let err = interpret_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            .expect_err("Should fail");
        assert_eq!(err.to_string(), "Prediction failed: 500 Internal Server Error");
    }

    #[test]
    fn test_request_body_has_exactly_wire_keys() {
        let body = serde_json::to_value(PredictRequest::new(&observation(), Coding::Cleveland))
            .expect("Should serialize");
        let obj = body.as_object().expect("Object body");

        let keys: Vec<&str> = crate::domain::Field::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(obj.len(), keys.len());
        for key in keys {
            assert!(obj[key].is_number(), "{key} should be numeric");
        }
        assert_eq!(body["cp"], 1);
        assert_eq!(body["thal"], 6);
        assert_eq!(body["oldpeak"], 2.3);
    }

    #[test]
    fn test_request_body_uses_zero_based_codes() {
        let body = serde_json::to_value(PredictRequest::new(&observation(), Coding::ZeroBased))
            .expect("Should serialize");
        assert_eq!(body["cp"], 0);
        assert_eq!(body["slope"], 2);
        assert_eq!(body["thal"], 1);
        assert_eq!(body["restecg"], 2);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = HttpPredictor::new("http://localhost:5000/", Coding::ZeroBased, None)
            .expect("Should build");
        assert_eq!(client.endpoint(), "http://localhost:5000/predict");
        assert_eq!(client.strategy(), Strategy::Remote);
    }
}
