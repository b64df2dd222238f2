use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use knowmyslots::{AppState, Database, router};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

fn app() -> (Router, TempDir) {
    let uploads = tempdir().unwrap();
    let state = AppState::new(Database::in_memory(), uploads.path());
    (router(state), uploads)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_contacts_add_then_replace() {
    let (app, _uploads) = app();
    let body = json!({
        "year": "2024",
        "season": "2024 Spring",
        "label": "Agents",
        "contacts": ["a@x.com", " b @x.com"]
    });

    let (status, group) = send_json(&app, "POST", "/api/contacts/add", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["values"], json!(["a@x.com", "b@x.com"]));

    let body = json!({
        "year": "2024",
        "season": "2024 Spring",
        "label": "Agents",
        "values": ["c@x.com"]
    });
    let (status, group) = send_json(&app, "POST", "/api/contacts/add", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["values"], json!(["c@x.com"]));
}

#[tokio::test]
async fn test_emails_add_appends() {
    let (app, _uploads) = app();
    let first = json!({"year": "2024", "season": "2024 Spring", "label": "Agents", "emails": ["a@x.com", "b@x.com"]});
    let second = json!({"year": "2024", "season": "2024 Spring", "label": "Agents", "emails": ["c@x.com"]});

    send_json(&app, "POST", "/api/email/add", first).await;
    let (status, group) = send_json(&app, "POST", "/api/email/add", second).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["values"], json!(["a@x.com", "b@x.com", "c@x.com"]));

    let (status, summary) = get_json(&app, "/api/email/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalUniqueContacts"], 3);
}

#[tokio::test]
async fn test_add_requires_fields() {
    let (app, _uploads) = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/contacts/add",
        json!({"year": "2024", "label": "Agents"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Season is required.");
}

#[tokio::test]
async fn test_add_label_conflict() {
    let (app, _uploads) = app();
    let body = json!({"year": "2024", "season": "2024 Spring", "label": "Agents"});

    let (first, _) = send_json(&app, "POST", "/api/contacts/add-label", body.clone()).await;
    let (second, message) = send_json(&app, "POST", "/api/contacts/add-label", body).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(message["message"].as_str().unwrap().contains("Agents"));
}

#[tokio::test]
async fn test_update_label_flow() {
    let (app, _uploads) = app();
    for label in ["Agents", "Students"] {
        let body = json!({"year": "2024", "season": "2024 Spring", "label": label});
        send_json(&app, "POST", "/api/contacts/add-label", body).await;
    }

    let rename = json!({"year": "2024", "season": "2024 Spring", "oldLabel": "Agents", "newLabel": "Students"});
    let (status, _) = send_json(&app, "PUT", "/api/contacts/update-label", rename).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let rename = json!({"year": "2024", "season": "2024 Spring", "oldLabel": "Ghost", "newLabel": "Other"});
    let (status, _) = send_json(&app, "PUT", "/api/contacts/update-label", rename).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let nothing = json!({"year": "2024", "season": "2024 Spring", "oldLabel": "Agents"});
    let (status, body) = send_json(&app, "PUT", "/api/contacts/update", nothing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nothing to update.");

    let update = json!({
        "year": "2024",
        "season": "2024 Spring",
        "oldLabel": "Agents",
        "newLabel": "Mentors",
        "contacts": ["m@x.com"]
    });
    let (status, group) = send_json(&app, "PUT", "/api/contacts/update", update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["label"], "Mentors");

    let (status, values) = get_json(&app, "/api/contacts/2024/2024%20Spring/Mentors/values").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(values, json!(["m@x.com"]));
}

#[tokio::test]
async fn test_seasoned_lookups() {
    let (app, _uploads) = app();
    let body = json!({"year": "2024", "season": "2024 Fall", "label": "Agents", "values": ["a@x.com"]});
    send_json(&app, "POST", "/api/contacts/add", body).await;

    let (status, groups) = get_json(&app, "/api/contacts/2024/2024%20Fall").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(groups.as_array().unwrap().len(), 1);

    let (status, groups) = get_json(&app, "/api/contacts/2030/2030%20Fall").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(groups, json!([]));

    let (status, _) = get_json(&app, "/api/contacts/2024/2024%20Fall/Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, seasons) = get_json(&app, "/api/contacts/season").await;
    assert_eq!(seasons, json!(["2024 Fall"]));

    let (_, all) = get_json(&app, "/api/contacts/allcontacts").await;
    assert_eq!(all[0]["season"], "2024 Fall");
}

#[tokio::test]
async fn test_links_flow() {
    let (app, _uploads) = app();

    let (status, group) = send_json(&app, "POST", "/api/link/add-year", json!({"year": "2024"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["label"], "Edit this label");

    let (status, _) = send_json(&app, "POST", "/api/link/add-year", json!({"year": " 2024 "})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_json(&app, "POST", "/api/link/add-year", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({"year": "2024", "label": "Docs", "Links": ["https://a"]});
    let (status, _) = send_json(&app, "POST", "/api/link/add-labels", body).await;
    assert_eq!(status, StatusCode::CREATED);

    let append = json!({"year": "2024", "label": "Docs", "newLinks": ["https://a", "https://b"], "dedup": true});
    let (status, group) = send_json(&app, "PUT", "/api/link/append-links", append).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["values"], json!(["https://a", "https://b"]));

    let (_, labels) = get_json(&app, "/api/link/2024/labels").await;
    assert_eq!(labels.as_array().unwrap().len(), 2);

    let (status, _) = get_json(&app, "/api/link/1999/labels").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, links) = get_json(&app, "/api/link/2024/Docs/links").await;
    assert_eq!(links, json!(["https://a", "https://b"]));

    let (_, summary) = get_json(&app, "/api/link/stats").await;
    assert_eq!(summary["totalLinks"], 2);
    assert_eq!(summary["totalLabels"], 2);

    let (_, years) = get_json(&app, "/api/link/unique-years").await;
    assert_eq!(years, json!(["2024"]));
}

#[tokio::test]
async fn test_export_headers() {
    let (app, _uploads) = app();
    let body = json!({"year": "2024", "season": "2024 Spring", "label": "Agents", "values": ["a@x.com"]});
    send_json(&app, "POST", "/api/contacts/add", body).await;

    let request = Request::builder()
        .uri("/api/contacts/export")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=contacts.xlsx"
    );

    let request = Request::builder()
        .uri("/api/dashboard/export?list=unique&format=csv")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("Contact 1,Contact 2"));
    assert!(csv.contains("a@x.com,N/A"));

    let (status, _) = get_json(&app, "/api/contacts/export?format=pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_data() {
    let (app, _uploads) = app();
    let body = json!({"year": "2024", "season": "2024 Spring", "label": "Agents", "values": ["a@x.com", "b@x.com"]});
    send_json(&app, "POST", "/api/contacts/add", body).await;

    let (status, data) = get_json(&app, "/api/dashboard/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["totalContacts"], 2);
    assert_eq!(data["contactsPerYear"]["2024"]["spring"], 2);

    let (_, categorized) = get_json(&app, "/api/dashboard/handlecontacts").await;
    assert_eq!(categorized["categorizedData"]["2024"]["spring"]["totalUnique"], 2);

    let (_, lists) = get_json(&app, "/api/dashboard/contactlist").await;
    assert_eq!(lists["categorizedContacts"]["2024"]["spring"], json!(["a@x.com", "b@x.com"]));
}

const BOUNDARY: &str = "knowmyslots-test-boundary";

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/pdf/append-pdfs")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_append_pdfs() {
    let (app, uploads) = app();
    let (status, group) = send_json(&app, "POST", "/api/pdf/add-year", json!({"year": "2024"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["label"], "EDIT THIS LABEL");

    let body = multipart_body(
        &[("year", "2024"), ("label", "EDIT THIS LABEL")],
        Some(("Guide.pdf", b"%PDF-1.4 test")),
    );
    let (status, bytes) = send(&app, upload_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let group: Value = serde_json::from_slice(&bytes).unwrap();
    let entry = &group["values"][0];
    assert_eq!(entry["description"], "No description");
    let url = entry["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/Guide-"));
    assert!(url.ends_with(".pdf"));

    let stored: Vec<_> = std::fs::read_dir(uploads.path()).unwrap().collect();
    assert_eq!(stored.len(), 1);

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let (status, content) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content, b"%PDF-1.4 test");

    let (_, pdfs) = get_json(&app, "/api/pdf/2024/EDIT%20THIS%20LABEL/pdfs").await;
    assert_eq!(pdfs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_append_pdfs_validation() {
    let (app, uploads) = app();

    let body = multipart_body(&[("year", "2024"), ("label", "Forms")], None);
    let (status, _) = send(&app, upload_request(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = multipart_body(
        &[("year", "2024"), ("label", "Forms")],
        Some(("a.pdf", b"%PDF")),
    );
    let (status, _) = send(&app, upload_request(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_pdf_entries_may_omit_fields() {
    let (app, _uploads) = app();
    let body = json!({
        "year": "2024",
        "pdfs": [{"url": "/uploads/a.pdf"}, {"description": "no file"}]
    });

    let (status, group) = send_json(&app, "POST", "/api/pdf/add-year", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        group["values"],
        json!([{"url": "/uploads/a.pdf", "description": "No description"}])
    );

    let body = json!({"year": "2024", "label": "Forms", "pdfs": [{"url": " /uploads/b.pdf "}]});
    let (status, group) = send_json(&app, "POST", "/api/pdf/add-labels", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["values"][0]["url"], "/uploads/b.pdf");
}

#[tokio::test]
async fn test_responses_carry_values_field() {
    let (app, _uploads) = app();
    let body = json!({"year": "2024", "season": "2024 Spring", "label": "Agents", "contacts": ["a@x.com"]});

    let (_, group) = send_json(&app, "POST", "/api/contacts/add", body).await;
    assert_eq!(group["values"], json!(["a@x.com"]));
    assert!(group.get("contacts").is_none());
    assert!(group["id"].is_string());
    assert!(group["createdAt"].is_string());
}
