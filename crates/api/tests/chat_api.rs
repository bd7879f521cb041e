//! Integration tests for the per-section conversation threads: posting as
//! admin and partner, thread states, visibility filtering, and mention
//! delivery from chat.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, build_test_app, get_auth, post_json_auth, user_with_token};

async fn seed_submission(pool: &PgPool, partner_token: &str) -> String {
    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/submissions/me",
        partner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_comment_lands_on_the_thread(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    let (_, admin_token) = user_with_token(&pool, "reviewer@example.com", "admin").await;
    let id = seed_submission(&pool, &partner_token).await;

    let response = post_json_auth(
        build_test_app(pool),
        &format!("/api/v1/submissions/{id}/chat"),
        json!({ "section": "Security", "text": "please clarify the audit scope" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let chat = json["chat"].as_array().unwrap();
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0]["from"], "admin");
    assert_eq!(chat[0]["admin_name"], "reviewer@example.com");
    assert_eq!(chat[0]["category"], "Security");
    // Plain comments do not touch the timeline.
    assert_eq!(json["timeline"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn partner_reply_also_lands_on_the_timeline(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    seed_submission(&pool, &partner_token).await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/submissions/me/chat",
        json!({ "section": "Compliance", "text": "documents re-uploaded" }),
        &partner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let chat = json["chat"].as_array().unwrap();
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0]["from"], "partner");
    assert!(chat[0]["admin_name"].is_null());

    assert!(json["timeline"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["title"] == "Partner Replied" && e["content"] == "documents re-uploaded"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_message_is_rejected(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    seed_submission(&pool, &partner_token).await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/submissions/me/chat",
        json!({ "section": "Compliance", "text": "   " }),
        &partner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn thread_query_returns_messages_and_state(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    let (_, admin_token) = user_with_token(&pool, "reviewer@example.com", "admin").await;
    let id = seed_submission(&pool, &partner_token).await;

    // Empty thread renders as "noConversation".
    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat?section=Security"),
        &admin_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["state"], "noConversation");
    assert!(json["messages"].as_array().unwrap().is_empty());

    post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat"),
        json!({ "section": "Security", "text": "please clarify" }),
        &admin_token,
    )
    .await;

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat?section=Security"),
        &admin_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["state"], "open");
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);

    // Approving the section resolves its thread.
    post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/review"),
        json!({ "section": "Security", "action": "approve" }),
        &admin_token,
    )
    .await;

    let response = get_auth(
        build_test_app(pool),
        &format!("/api/v1/submissions/{id}/chat?section=Security"),
        &admin_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["state"], "resolved");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restricted_admin_sees_only_granted_threads(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    let (_, full_token) = user_with_token(&pool, "lead@example.com", "admin").await;
    let (restricted, restricted_token) =
        user_with_token(&pool, "junior@example.com", "admin").await;
    let id = seed_submission(&pool, &partner_token).await;

    for section in ["Security", "Compliance"] {
        post_json_auth(
            build_test_app(pool.clone()),
            &format!("/api/v1/submissions/{id}/chat"),
            json!({ "section": section, "text": format!("note on {section}") }),
            &full_token,
        )
        .await;
    }

    sqlx::query("UPDATE users SET stage_permissions = $1 WHERE id = $2")
        .bind(json!({ "Security": ["view"] }))
        .bind(restricted.id)
        .execute(&pool)
        .await
        .expect("update should succeed");

    // Unscoped query: only the granted section's messages come back.
    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat"),
        &restricted_token,
    )
    .await;
    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["category"], "Security");

    // Asking for an ungranted section directly is forbidden.
    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat?section=Compliance"),
        &restricted_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A view grant is not a comment grant.
    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat"),
        json!({ "section": "Security", "text": "drive-by comment" }),
        &restricted_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owning partner always sees everything.
    let response = get_auth(
        build_test_app(pool),
        &format!("/api/v1/submissions/{id}/chat"),
        &partner_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn partner_mention_of_a_reviewer_creates_a_notification(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    let (reviewer, _) = user_with_token(&pool, "reviewer@example.com", "admin").await;
    seed_submission(&pool, &partner_token).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/submissions/me/chat",
        json!({
            "section": "Compliance",
            "text": "@reviewer@example.com the new AML policy is up"
        }),
        &partner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(reviewer.id)
        .fetch_one(&pool)
        .await
        .expect("count should succeed");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_mention_of_the_partner_creates_a_notification(pool: PgPool) {
    let (partner, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    let (_, admin_token) = user_with_token(&pool, "reviewer@example.com", "admin").await;
    let id = seed_submission(&pool, &partner_token).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/submissions/{id}/chat"),
        json!({
            "section": "Security",
            "text": "@acme@example.com please re-upload the audit report"
        }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let chat = json["chat"].as_array().unwrap();
    assert_eq!(chat[0]["mentions"], json!([partner.id.to_string()]));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(partner.id)
        .fetch_one(&pool)
        .await
        .expect("count should succeed");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mention_of_unknown_email_is_ignored(pool: PgPool) {
    let (_, partner_token) = user_with_token(&pool, "acme@example.com", "partner").await;
    seed_submission(&pool, &partner_token).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/submissions/me/chat",
        json!({
            "section": "Compliance",
            "text": "@stranger@nowhere.net can you help"
        }),
        &partner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(&pool)
        .await
        .expect("count should succeed");
    assert_eq!(count, 0);
}
