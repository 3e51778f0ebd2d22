//! `HttpPredictor` against a canned-response server on a local socket.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cardiorisk::adapters::{HttpPredictor, RemoteError};
use cardiorisk::application::AssessmentService;
use cardiorisk::domain::{
    ChestPain, ClinicalObservation, Coding, Evaluation, RestingEcg, Sex, StSlope, Thalassemia,
};
use cardiorisk::CardioriskError;

/// Captured request: head (request line + headers) and body.
struct Captured {
    head: String,
    body: String,
}

/// Serve one request with `status_line` and `body`, then close.
fn serve_once(status_line: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().expect("length");
                }
            }
            head.push_str(&line);
        }

        let mut body_bytes = vec![0u8; content_length];
        reader.read_exact(&mut body_bytes).expect("read body");

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).expect("write");
        stream.flush().expect("flush");

        Captured {
            head,
            body: String::from_utf8(body_bytes).expect("utf8"),
        }
    });

    (addr, handle)
}

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

fn predictor(addr: SocketAddr, coding: Coding) -> HttpPredictor {
    HttpPredictor::new(format!("http://{addr}"), coding, Some(Duration::from_secs(5)))
        .expect("client")
}

#[test]
fn test_successful_prediction_with_probability() {
    let (addr, server) = serve_once("200 OK", r#"{"prediction":1,"probability":0.82}"#);

    let result = predictor(addr, Coding::ZeroBased)
        .predict(&observation())
        .expect("Should predict");
    assert_eq!(result.prediction, 1);
    assert_eq!(result.confidence, Some(0.82));
    assert!(result.is_positive());

    let captured = server.join().expect("server");
    assert!(captured.head.starts_with("POST /predict HTTP/1.1"));
    assert!(captured
        .head
        .to_ascii_lowercase()
        .contains("content-type: application/json"));

    let body: serde_json::Value = serde_json::from_str(&captured.body).expect("json body");
    let obj = body.as_object().expect("object");
    assert_eq!(obj.len(), 13);
    assert_eq!(obj["age"], 63);
    // Zero-based wire codes
    assert_eq!(obj["cp"], 0);
    assert_eq!(obj["slope"], 2);
    assert_eq!(obj["thal"], 1);
    assert_eq!(obj["oldpeak"], 2.3);
}

#[test]
fn test_cleveland_wire_coding() {
    let (addr, server) = serve_once("200 OK", r#"{"prediction":0,"confidence":0.4,"message":"ok"}"#);

    let result = predictor(addr, Coding::Cleveland)
        .predict(&observation())
        .expect("Should predict");
    assert_eq!(result.prediction, 0);
    assert_eq!(result.confidence, Some(0.4));
    assert_eq!(result.message.as_deref(), Some("ok"));

    let captured = server.join().expect("server");
    let body: serde_json::Value = serde_json::from_str(&captured.body).expect("json body");
    assert_eq!(body["cp"], 1);
    assert_eq!(body["slope"], 3);
    assert_eq!(body["thal"], 6);
}

#[test]
fn test_rejection_carries_server_error() {
    let (addr, server) = serve_once("400 Bad Request", r#"{"error":"bad input"}"#);

    let err = predictor(addr, Coding::ZeroBased)
        .predict(&observation())
        .expect_err("Should reject");
    match &err {
        RemoteError::Rejected { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "bad input");
        }
        other => panic!("Expected rejection, got {other:?}"),
    }
    assert_eq!(err.to_string(), "bad input");
    server.join().expect("server");
}

#[test]
fn test_rejection_without_body_message() {
    let (addr, server) = serve_once("500 Internal Server Error", "oops");

    let err = predictor(addr, Coding::ZeroBased)
        .predict(&observation())
        .expect_err("Should reject");
    assert_eq!(err.to_string(), "Prediction failed: 500 Internal Server Error");
    server.join().expect("server");
}

#[test]
fn test_missing_prediction_is_malformed() {
    let (addr, server) = serve_once("200 OK", r#"{"probability":0.5}"#);

    let err = predictor(addr, Coding::ZeroBased)
        .predict(&observation())
        .expect_err("Should fail");
    assert!(matches!(err, RemoteError::MalformedResponse(_)));
    server.join().expect("server");
}

#[test]
fn test_connection_refused_is_transport_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };

    let err = predictor(addr, Coding::ZeroBased)
        .predict(&observation())
        .expect_err("Nothing listening");
    assert!(matches!(err, RemoteError::Transport(_)));
    assert!(err
        .to_string()
        .starts_with("Could not connect to the prediction service"));
}

#[test]
fn test_service_wraps_remote_evaluation() {
    let (addr, server) = serve_once("200 OK", r#"{"prediction":1}"#);

    let service = AssessmentService::new(std::sync::Arc::new(predictor(addr, Coding::ZeroBased)));
    let report = service.assess(&observation()).expect("Should assess");
    match report.evaluation {
        Evaluation::Remote(r) => {
            assert_eq!(r.prediction, 1);
            assert_eq!(r.confidence, None);
        }
        Evaluation::Local(_) => panic!("Expected remote evaluation"),
    }
    server.join().expect("server");

    let (addr, server) = serve_once("503 Service Unavailable", r#"{"message":"model loading"}"#);
    let service = AssessmentService::new(std::sync::Arc::new(predictor(addr, Coding::ZeroBased)));
    let err = service.assess(&observation()).expect_err("Should fail");
    assert!(matches!(err, CardioriskError::Remote(RemoteError::Rejected { status: 503, .. })));
    assert_eq!(err.to_string(), "model loading");
    server.join().expect("server");
}
