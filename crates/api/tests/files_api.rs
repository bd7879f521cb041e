//! Integration tests for document upload, removal, and download.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use common::{body_json, build_test_app, delete_auth, get_auth, user_with_token};

const BOUNDARY: &str = "test-multipart-boundary";

/// Build a multipart upload body with `category`, `field_id`, and `file`
/// parts, the same shape the frontend sends.
fn multipart_body(category: &str, field_id: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("category", category), ("field_id", field_id)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    pool: &PgPool,
    token: &str,
    category: &str,
    field_id: &str,
    filename: &str,
    content: &[u8],
) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/submissions/me/files")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            category, field_id, filename, content,
        )))
        .expect("request must build");
    build_test_app(pool.clone())
        .oneshot(request)
        .await
        .expect("request must succeed")
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_stores_the_file_and_records_metadata(pool: PgPool) {
    let (partner, token) = user_with_token(&pool, "acme@example.com", "partner").await;

    let response = upload(
        &pool,
        &token,
        "Compliance",
        "aml-policy",
        "AML Policy.PDF",
        b"pdf bytes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let entry = body_json(response).await;
    assert_eq!(entry["name"], "aml-policy-1.pdf");
    assert_eq!(entry["category"], "Compliance");
    assert_eq!(entry["field_id"], "aml-policy");
    assert_eq!(entry["size"], 9);
    let storage_path = entry["storage_path"].as_str().unwrap();
    assert!(storage_path.starts_with(&format!("users/{}/submissions/", partner.id)));
    assert!(storage_path.ends_with("/compliance/aml-policy/aml-policy-1.pdf"));

    // The metadata is visible on the submission.
    let me = body_json(get_auth(build_test_app(pool), "/api/v1/submissions/me", &token).await).await;
    let files = me["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], entry["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeat_uploads_for_a_field_get_sequence_numbers(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "acme@example.com", "partner").await;

    let first = upload(&pool, &token, "Security", "pentest", "report.pdf", b"v1").await;
    assert_eq!(body_json(first).await["name"], "pentest-1.pdf");

    let second = upload(&pool, &token, "Security", "pentest", "report.pdf", b"v2").await;
    assert_eq!(body_json(second).await["name"], "pentest-2.pdf");

    // Both files count as one covered field for progress purposes.
    let me = body_json(
        get_auth(build_test_app(pool.clone()), "/api/v1/submissions/me", &token).await,
    )
    .await;
    let id = me["id"].as_str().unwrap();
    let progress = body_json(
        get_auth(
            build_test_app(pool),
            &format!("/api/v1/submissions/{id}/progress"),
            &token,
        )
        .await,
    )
    .await;
    let security = progress["sections"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["section"] == "Security")
        .unwrap();
    assert_eq!(security["uploaded"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_with_bad_inputs_is_rejected(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "acme@example.com", "partner").await;

    // Unknown section.
    let response = upload(&pool, &token, "Legal", "contract", "c.pdf", b"x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Field ids become path components, so traversal characters are out.
    let response = upload(&pool, &token, "Compliance", "../../etc", "c.pdf", b"x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Empty file.
    let response = upload(&pool, &token, "Compliance", "aml-policy", "c.pdf", b"").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_over_the_body_size_limit_is_refused(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "acme@example.com", "partner").await;

    // Twice the configured cap (see `test_config`). The body is refused
    // while being read, never stored.
    let oversized = vec![b'x'; 2 * 64 * 1024];
    let response = upload(&pool, &token, "Compliance", "aml-policy", "big.pdf", &oversized).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let me = body_json(get_auth(build_test_app(pool), "/api/v1/submissions/me", &token).await).await;
    assert!(me["files"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn owner_and_admin_can_download(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    let (_, admin_token) = user_with_token(&pool, "reviewer@example.com", "admin").await;
    let (_, other_token) = user_with_token(&pool, "other@example.com", "partner").await;

    let entry = body_json(
        upload(
            &pool,
            &partner_token,
            "Attestations",
            "signed-terms",
            "terms.pdf",
            b"signed content",
        )
        .await,
    )
    .await;
    let url = entry["url"].as_str().unwrap().to_string();

    for token in [&partner_token, &admin_token] {
        let response = get_auth(build_test_app(pool.clone()), &url, token).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap(),
            "attachment; filename=\"signed-terms-1.pdf\""
        );
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body must collect")
            .to_bytes();
        assert_eq!(&bytes[..], b"signed content");
    }

    // An unrelated partner may not.
    let response = get_auth(build_test_app(pool), &url, &other_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_metadata_and_blob(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "acme@example.com", "partner").await;

    let entry = body_json(
        upload(&pool, &token, "Compliance", "aml-policy", "p.pdf", b"bytes").await,
    )
    .await;
    let file_id = entry["id"].as_str().unwrap().to_string();
    let url = entry["url"].as_str().unwrap().to_string();

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/me/files/{file_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let me = body_json(
        get_auth(build_test_app(pool.clone()), "/api/v1/submissions/me", &token).await,
    )
    .await;
    assert!(me["files"].as_array().unwrap().is_empty());

    // Metadata entry gone, so download is a 404.
    let response = get_auth(build_test_app(pool.clone()), &url, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting it again is also a 404.
    let response = delete_auth(
        build_test_app(pool),
        &format!("/api/v1/submissions/me/files/{file_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_event_does_not_clobber_existing_files(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "acme@example.com", "partner").await;

    upload(&pool, &token, "Compliance", "aml-policy", "a.pdf", b"a").await;
    upload(&pool, &token, "Compliance", "kyc-policy", "b.pdf", b"b").await;
    upload(&pool, &token, "Security", "pentest", "c.pdf", b"c").await;

    let me = body_json(get_auth(build_test_app(pool), "/api/v1/submissions/me", &token).await).await;
    let files = me["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);

    // Each upload appended; nothing was overwritten.
    let names: Vec<_> = files.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"aml-policy-1.pdf"));
    assert!(names.contains(&"kyc-policy-1.pdf"));
    assert!(names.contains(&"pentest-1.pdf"));
}
