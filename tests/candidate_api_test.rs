use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use candidate_registry::{
    app,
    middleware::cors::frontend_cors,
    models::{election::Election, voter::Voter},
    services::{image_service::ImageStore, memory_store::MemoryCandidateStore},
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "candidate-form-boundary";

struct TestApp {
    router: Router,
    images: ImageStore,
    _uploads: TempDir,
}

async fn setup_app() -> TestApp {
    let store = MemoryCandidateStore::new();
    store
        .insert_voter(Voter {
            id: 1,
            first_name: "Amara".into(),
            last_name: "Nwosu".into(),
            email: "amara@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            approved: Some(true),
        })
        .await;
    for (id, name) in [(10, "Student Union 2026"), (20, "Faculty Board 2026")] {
        store
            .insert_election(Election {
                id,
                name: name.into(),
                description: Some("Confidential schedule notes".into()),
                start_time: None,
                end_time: None,
                status: Some("UPCOMING".into()),
            })
            .await;
    }

    let uploads = tempfile::tempdir().expect("tempdir");
    let images = ImageStore::init(uploads.path()).await.expect("image store");
    let state = AppState::new(Arc::new(store), images.clone());

    TestApp {
        router: app(state),
        images,
        _uploads: uploads,
    }
}

fn candidate_json(election_id: i64, post: &str) -> JsonValue {
    json!({
        "voter": { "id": 1 },
        "election": { "id": election_id },
        "post": post,
        "bio": format!("Running for {}", post),
        "approved": false
    })
}

fn json_request(method: &str, uri: &str, body: &JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(candidate: &JsonValue, image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"candidate\"\r\n");
    body.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
    body.extend_from_slice(candidate.to_string().as_bytes());
    body.extend_from_slice(b"\r\n");

    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/candidates")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, election_id: i64, post: &str) -> JsonValue {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/candidates",
            &candidate_json(election_id, post),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

#[tokio::test]
async fn create_then_read_back_by_id() {
    let test = setup_app().await;
    let created = create(&test.router, 10, "President").await;
    let id = created["candidateId"].as_i64().expect("generated id");

    let resp = test
        .router
        .clone()
        .oneshot(get_request(&format!("/api/v1/candidates/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;

    assert_eq!(fetched["candidateId"], id);
    assert_eq!(fetched["post"], "President");
    assert_eq!(fetched["bio"], "Running for President");
    assert_eq!(fetched["approved"], false);
    assert_eq!(fetched["voter"]["id"], 1);
    assert_eq!(fetched["election"]["id"], 10);
    assert!(fetched["dateRegistered"].is_string());
    assert!(fetched["imageUrl"].is_null());
}

#[tokio::test]
async fn bio_over_500_chars_is_rejected_and_not_stored() {
    let test = setup_app().await;
    let mut body = candidate_json(10, "Treasurer");
    body["bio"] = json!("b".repeat(501));

    let resp = test
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/candidates", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(resp).await["error"].is_string());

    let resp = test
        .router
        .clone()
        .oneshot(get_request("/api/v1/candidates"))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn unknown_references_fail_at_the_store() {
    let test = setup_app().await;

    let mut no_voter = candidate_json(10, "Treasurer");
    no_voter.as_object_mut().unwrap().remove("voter");
    let resp = test
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/candidates", &no_voter))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = test
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/candidates",
            &candidate_json(999, "Treasurer"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn multipart_with_image_sets_image_url() {
    let test = setup_app().await;
    let png: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    let resp = test
        .router
        .clone()
        .oneshot(multipart_request(
            &candidate_json(10, "Secretary"),
            Some(("portrait.png", png)),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;

    let url = body["imageUrl"].as_str().expect("imageUrl set");
    assert!(url.starts_with("/uploads/candidates/"));
    assert!(url.ends_with(".png"));
    assert_eq!(body["imageUpload"]["status"], "stored");
    assert_eq!(body["imageUpload"]["url"], url);
    assert_eq!(body["post"], "Secretary");

    let stored_name = url.trim_start_matches("/uploads/candidates/");
    assert_ne!(stored_name, "portrait.png");
    let on_disk = std::fs::read(test.images.image_dir().join(stored_name)).unwrap();
    assert_eq!(on_disk, png);

    let resp = test.router.clone().oneshot(get_request(url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let served = to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&served[..], png);
}

#[tokio::test]
async fn multipart_without_image_leaves_image_url_unset() {
    let test = setup_app().await;

    let resp = test
        .router
        .clone()
        .oneshot(multipart_request(&candidate_json(10, "Secretary"), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert!(body["imageUrl"].is_null());
    assert_eq!(body["imageUpload"]["status"], "notProvided");

    let resp = test
        .router
        .clone()
        .oneshot(multipart_request(
            &candidate_json(10, "Auditor"),
            Some(("blank.png", &b""[..])),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert!(body["imageUrl"].is_null());
    assert_eq!(body["imageUpload"]["status"], "notProvided");
}

#[tokio::test]
async fn image_write_failure_still_saves_candidate() {
    let test = setup_app().await;
    std::fs::remove_dir_all(test.images.image_dir()).unwrap();

    let resp = test
        .router
        .clone()
        .oneshot(multipart_request(
            &candidate_json(20, "Dean"),
            Some(("face.jpg", &b"\xFF\xD8\xFF"[..])),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert!(body["candidateId"].is_i64());
    assert!(body["imageUrl"].is_null());
    assert_eq!(body["imageUpload"]["status"], "failed");
    assert!(body["imageUpload"]["reason"].is_string());
}

#[tokio::test]
async fn rejected_multipart_create_removes_its_image() {
    let test = setup_app().await;
    let mut body = candidate_json(10, "Treasurer");
    body["bio"] = json!("b".repeat(501));

    for _ in 0..3 {
        let resp = test
            .router
            .clone()
            .oneshot(multipart_request(&body, Some(("p.png", &b"png"[..]))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let resp = test
        .router
        .clone()
        .oneshot(multipart_request(
            &candidate_json(999, "Treasurer"),
            Some(("p.png", &b"png"[..])),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(std::fs::read_dir(test.images.image_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn concurrent_uploads_with_same_name_do_not_collide() {
    let test = setup_app().await;

    let first = test.router.clone().oneshot(multipart_request(
        &candidate_json(10, "Captain"),
        Some(("photo.jpg", &b"first"[..])),
    ));
    let second = test.router.clone().oneshot(multipart_request(
        &candidate_json(10, "Vice Captain"),
        Some(("photo.jpg", &b"second"[..])),
    ));
    let (first, second) = tokio::join!(first, second);

    let first = body_json(first.unwrap()).await;
    let second = body_json(second.unwrap()).await;
    let (a, b) = (
        first["imageUrl"].as_str().unwrap(),
        second["imageUrl"].as_str().unwrap(),
    );
    assert_ne!(a, b);
    assert!(a.ends_with(".jpg") && b.ends_with(".jpg"));
    assert_eq!(std::fs::read_dir(test.images.image_dir()).unwrap().count(), 2);
}

#[tokio::test]
async fn list_by_election_returns_only_that_election() {
    let test = setup_app().await;
    create(&test.router, 10, "President").await;
    create(&test.router, 20, "Dean").await;
    create(&test.router, 10, "Treasurer").await;

    for (election_id, expected) in [(10, 2), (20, 1), (30, 0)] {
        let resp = test
            .router
            .clone()
            .oneshot(get_request(&format!(
                "/api/v1/candidates/election/{}",
                election_id
            )))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let list = body_json(resp).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), expected);
        assert!(list.iter().all(|c| c["election"]["id"] == election_id));
    }

    let resp = test
        .router
        .clone()
        .oneshot(get_request("/api/v1/candidates"))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn update_replaces_fields_and_keeps_id() {
    let test = setup_app().await;
    let created = create(&test.router, 10, "President").await;
    let id = created["candidateId"].as_i64().unwrap();

    let replacement = json!({
        "candidateId": 12345,
        "voter": { "id": 1 },
        "elections": { "id": 20 },
        "post": "Chancellor",
        "bio": "Updated statement",
        "approved": true
    });
    let resp = test
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/candidates/{}", id),
            &replacement,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;

    assert_eq!(updated["candidateId"], id);
    assert_eq!(updated["election"]["id"], 20);
    assert_eq!(updated["post"], "Chancellor");
    assert_eq!(updated["approved"], true);
    assert_eq!(updated["dateRegistered"], created["dateRegistered"]);
}

#[tokio::test]
async fn update_or_delete_of_missing_id_is_not_found() {
    let test = setup_app().await;

    let resp = test
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/candidates/404",
            &candidate_json(10, "Ghost"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/v1/candidates/404")
        .body(Body::empty())
        .unwrap();
    let resp = test.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("404"));
}

#[tokio::test]
async fn delete_then_get_returns_empty() {
    let test = setup_app().await;
    let created = create(&test.router, 10, "President").await;
    let id = created["candidateId"].as_i64().unwrap();

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/candidates/{}", id))
        .body(Body::empty())
        .unwrap();
    let resp = test.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["message"],
        format!("Candidate with candidate_id {} deleted successfully!", id)
    );

    let resp = test
        .router
        .clone()
        .oneshot(get_request(&format!("/api/v1/candidates/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.is_null());
}

#[tokio::test]
async fn responses_hide_sensitive_voter_and_election_fields() {
    let test = setup_app().await;
    create(&test.router, 10, "President").await;

    let resp = test
        .router
        .clone()
        .oneshot(get_request("/api/v1/candidates"))
        .await
        .unwrap();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(!text.contains("passwordHash"));
    assert!(!text.contains("argon2"));
    assert!(!text.contains("Confidential schedule notes"));
    assert!(!text.contains("UPCOMING"));

    let list: JsonValue = serde_json::from_str(&text).unwrap();
    let voter = list[0]["voter"].as_object().unwrap();
    assert!(!voter.contains_key("approved"));
    assert_eq!(voter["email"], "amara@example.com");
    let election = list[0]["election"].as_object().unwrap();
    assert_eq!(election.len(), 2);
    assert_eq!(election["name"], "Student Union 2026");
}

#[tokio::test]
async fn cors_allows_only_the_frontend_origin() {
    let test = setup_app().await;
    let router = test
        .router
        .clone()
        .layer(frontend_cors("http://localhost:5173").unwrap());

    let req = Request::builder()
        .uri("/api/v1/candidates")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    let req = Request::builder()
        .uri("/api/v1/candidates")
        .header("origin", "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_ne!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://evil.example")
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let test = setup_app().await;
    let resp = test
        .router
        .clone()
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}
