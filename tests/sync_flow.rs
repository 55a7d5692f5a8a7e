//! End-to-end save/delete flow through the public API: a scripted transport
//! stands in for the remote services, the SQLite store is the real one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use macrohunt::net::{HttpRequest, HttpResponse};
use macrohunt::{
    Credentials, HttpTransport, Meal, MealStore, MealType, SqliteMealStore, SyncService,
};

struct FakeRemote {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeRemote {
    fn new(responses: Vec<(u16, &str)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| HttpResponse {
                        status,
                        body: Bytes::copy_from_slice(body.as_bytes()),
                    })
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeRemote {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, macrohunt::ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("fake remote ran out of responses"))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("macrohunt=debug")
        .with_test_writer()
        .try_init();
}

fn credentials() -> Credentials {
    Credentials {
        craft_token: "token".into(),
        space_id: "space".into(),
        collection_id: "meals".into(),
        gemini_key: "key".into(),
        ..Credentials::default()
    }
}

#[tokio::test]
async fn save_then_delete_keeps_both_stores_in_step() {
    init_tracing();

    let store = Arc::new(SqliteMealStore::connect("sqlite::memory:").await.unwrap());
    let remote = FakeRemote::new(vec![
        (200, r#"{"items":[{"id":"doc-100"}]}"#),
        (200, ""), // photo upload
        (200, ""), // notes append
        (200, ""), // remote delete
    ]);
    let service = SyncService::new(store.clone(), remote.clone());

    let mut meal = Meal::new("Bibimbap", MealType::Dinner);
    meal.calories = 620;
    meal.photos = vec![Bytes::from_static(b"jpeg bytes")];
    meal.notes = "extra gochujang".into();

    let report = service.save_with_sync(&credentials(), meal).await.unwrap();
    assert!(report.attach_error.is_none());
    assert_eq!(report.meal.remote_doc_id.as_deref(), Some("doc-100"));

    let stored = store.fetch_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].remote_doc_id.as_deref(), Some("doc-100"));
    assert_eq!(stored[0].photos.len(), 1);

    service.delete_with_sync(&credentials(), &stored[0]).await.unwrap();
    assert!(store.fetch_all().await.unwrap().is_empty());
    assert_eq!(remote.request_count(), 4);
}

#[tokio::test]
async fn unconfigured_app_still_tracks_meals_locally() {
    init_tracing();

    let store = Arc::new(SqliteMealStore::connect("sqlite::memory:").await.unwrap());
    let remote = FakeRemote::new(vec![]);
    let service = SyncService::new(store.clone(), remote.clone());

    let report = service
        .save_with_sync(&Credentials::default(), Meal::new("Toast", MealType::Breakfast))
        .await
        .unwrap();
    assert!(report.meal.remote_doc_id.is_none());
    assert_eq!(remote.request_count(), 0);
    assert_eq!(store.fetch_all().await.unwrap().len(), 1);
}
