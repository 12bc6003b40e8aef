//! HTTP client and workflow tests against an in-process fake service

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use relann_client::{ExtractionService, HttpServices, ReviewWorkflow, SentenceQueue};
use relann_core::{AppConfig, Category, RelannError, Service, ServiceConfig, Triple, Validity};
use relann_review::{IngestOutcome, ReviewEvent};

const SENTENCE: &str = "Mary is Harry.";
const UNLUCKY: &str = "The model falls over on this one.";

#[derive(Clone, Default)]
struct Recorded {
    persisted: Arc<Mutex<Vec<Value>>>,
    skipped: Arc<Mutex<Vec<String>>>,
}

async fn predict(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, &'static str)> {
    if body["sentence"] == UNLUCKY {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "model crashed"));
    }
    if body["sentence"] == SENTENCE {
        Ok(Json(json!({
            "model_prediction": [["Mary", "is", "Harry"]],
            "dp_prediction": [["Mary", "is", "Harry"]],
            "ner_oie_prediction": []
        })))
    } else {
        Ok(Json(json!({})))
    }
}

async fn persist(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.persisted.lock().unwrap().push(body);
    Json(json!("Ok"))
}

async fn next_sentence() -> Json<Value> {
    Json(json!({ "sentence": SENTENCE }))
}

async fn skip(State(recorded): State<Recorded>, Json(body): Json<Value>) -> StatusCode {
    let sentence = body["sentence"].as_str().unwrap_or_default().to_string();
    recorded.skipped.lock().unwrap().push(sentence);
    StatusCode::OK
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded")
}

/// Start the fake service and return its base URL
async fn spawn_fake(recorded: Recorded) -> String {
    let router = Router::new()
        .route("/predict", post(predict))
        .route("/persist", post(persist))
        .route("/sentence", get(next_sentence).post(skip))
        .route("/broken", post(broken))
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn service_config(base: &str) -> ServiceConfig {
    ServiceConfig {
        extraction_url: format!("{base}/predict"),
        persistence_url: format!("{base}/persist"),
        queue_url: format!("{base}/sentence"),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_predict_decodes_candidates() {
    let base = spawn_fake(Recorded::default()).await;
    let services = HttpServices::from_config(&service_config(&base)).unwrap();

    let response = services.predict(SENTENCE).await.unwrap();
    assert_eq!(response.model_prediction, vec![Triple::new("Mary", "is", "Harry")]);
    assert_eq!(response.dp_prediction.len(), 1);

    let empty = services.predict("Nothing to see here.").await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_error_status_is_unavailable() {
    let base = spawn_fake(Recorded::default()).await;
    let mut config = service_config(&base);
    config.extraction_url = format!("{base}/broken");
    let services = HttpServices::from_config(&config).unwrap();

    let err = services.predict(SENTENCE).await.unwrap_err();
    match err {
        RelannError::ServiceUnavailable { service, message } => {
            assert_eq!(service, Service::Extraction);
            assert!(message.contains("model not loaded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let services = HttpServices::from_config(&service_config(&base)).unwrap();
    let err = services.next_sentence().await.unwrap_err();
    assert!(matches!(
        err,
        RelannError::ServiceUnavailable {
            service: Service::Queue,
            ..
        }
    ));
}

#[tokio::test]
async fn test_workflow_round_trip() {
    let recorded = Recorded::default();
    let base = spawn_fake(recorded.clone()).await;

    let mut config = AppConfig::default();
    config.services = service_config(&base);
    config.review.dedup_on_confirm = true;
    let mut workflow = ReviewWorkflow::from_config(&config).unwrap();

    let (sentence, outcome) = workflow.next_sentence().await.unwrap();
    assert_eq!(sentence, SENTENCE);
    assert_eq!(outcome, IngestOutcome::Applied);

    workflow
        .apply(ReviewEvent::Toggle {
            category: Category::DependencyParse,
            index: 0,
        })
        .unwrap();
    workflow
        .apply(ReviewEvent::AddUser {
            entity1: "Harry".to_string(),
            relation: "is".to_string(),
            entity2: "Mary".to_string(),
        })
        .unwrap();

    let outcome = workflow.confirm().await.unwrap();
    assert_eq!(outcome.acknowledgement, json!("Ok"));
    assert!(workflow.session().sentence().is_none());

    let persisted = recorded.persisted.lock().unwrap();
    assert_eq!(
        persisted[0],
        json!({
            "sentence": SENTENCE,
            "validInstances": [["Mary", "is", "Harry"], ["Harry", "is", "Mary"]],
            "invalidInstances": []
        })
    );
}

#[tokio::test]
async fn test_workflow_skip() {
    let recorded = Recorded::default();
    let base = spawn_fake(recorded.clone()).await;

    let mut config = AppConfig::default();
    config.services = service_config(&base);
    let mut workflow = ReviewWorkflow::from_config(&config).unwrap();

    workflow.submit("Nothing to see here.").await.unwrap();
    workflow.skip().await.unwrap();

    assert!(workflow.session().sentence().is_none());
    assert_eq!(
        recorded.skipped.lock().unwrap().as_slice(),
        ["Nothing to see here.".to_string()]
    );
}

#[tokio::test]
async fn test_workflow_discards_superseded_extraction() {
    let base = spawn_fake(Recorded::default()).await;
    let mut config = AppConfig::default();
    config.services = service_config(&base);
    let mut workflow = ReviewWorkflow::from_config(&config).unwrap();

    let first = workflow.begin(SENTENCE);
    let second = workflow.begin("Bob killed Conrad in London");

    let (first, response) = workflow.extract(first).await.unwrap();
    assert_eq!(workflow.ingest(&first, response), IngestOutcome::Stale);
    assert!(workflow.session().predictions().is_empty());

    let (second, response) = workflow.extract(second).await.unwrap();
    assert_eq!(workflow.ingest(&second, response), IngestOutcome::Cleared);
}

#[tokio::test]
async fn test_workflow_keeps_review_when_extraction_fails() {
    let base = spawn_fake(Recorded::default()).await;
    let mut config = AppConfig::default();
    config.services = service_config(&base);
    let mut workflow = ReviewWorkflow::from_config(&config).unwrap();

    workflow.submit(SENTENCE).await.unwrap();
    workflow
        .apply(ReviewEvent::Toggle {
            category: Category::Model,
            index: 0,
        })
        .unwrap();
    workflow
        .apply(ReviewEvent::AddUser {
            entity1: "Harry".to_string(),
            relation: "is".to_string(),
            entity2: "Mary".to_string(),
        })
        .unwrap();

    let err = workflow.submit(UNLUCKY).await.unwrap_err();
    assert!(matches!(
        err,
        RelannError::ServiceUnavailable {
            service: Service::Extraction,
            ..
        }
    ));

    let session = workflow.session();
    assert_eq!(session.sentence(), Some(SENTENCE));
    assert_eq!(session.get(Category::DependencyParse, 0).unwrap(), Validity::Valid);
    assert_eq!(session.user_instances().len(), 1);
}
