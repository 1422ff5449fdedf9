mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::{
    create_board, create_organization, get_board, json_request, make_request, register_user,
    setup_test_app,
};

#[tokio::test]
async fn test_health_check() {
    let t = setup_test_app().await;

    let (status, body) = common::make_request(t.app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn test_register_login_and_me() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "Ana@Example.com", "Ana").await;

    let (status, me) = json_request(&t.app, "GET", "/api/auth/me", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ana@example.com");
    assert_eq!(me["name"], "Ana");

    let (status, _) = make_request(
        t.app.clone(),
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "ana@example.com", "password": "wrong-password" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = make_request(
        t.app.clone(),
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "ana@example.com", "password": "password123" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"email\":\"ana@example.com\""));
}

#[tokio::test]
async fn test_register_rejects_short_password_and_duplicate_email() {
    let t = setup_test_app().await;

    let (status, body) = make_request(
        t.app.clone(),
        "POST",
        "/api/auth/register",
        Some(json!({ "email": "a@b.co", "password": "short", "name": "A" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least 8 characters"));

    register_user(&t.app, "a@b.co", "A").await;
    let (status, _) = make_request(
        t.app.clone(),
        "POST",
        "/api/auth/register",
        Some(json!({ "email": "a@b.co", "password": "password123", "name": "A" }).to_string()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_requires_session() {
    let t = setup_test_app().await;

    let (status, body) = make_request(t.app.clone(), "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("\"status\":401"));

    let (status, _) =
        make_request(t.app, "GET", "/api/auth/me", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_organization_slug_and_collision_suffix() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;

    let first = create_organization(&t.app, &token, "Acme Corp!").await;
    assert_eq!(first, "acme-corp");

    let second = create_organization(&t.app, &token, "Acme  Corp").await;
    assert!(second.starts_with("acme-corp-"));
    assert_eq!(second.len(), "acme-corp-".len() + 6);

    let (status, orgs) = json_request(&t.app, "GET", "/api/organizations", None, &token).await;
    assert_eq!(status, StatusCode::OK);
    let orgs = orgs.as_array().unwrap();
    assert_eq!(orgs.len(), 2);
    assert!(orgs.iter().all(|o| o["role"] == "OWNER"));
}

#[tokio::test]
async fn test_new_board_has_default_lists() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;

    let view = get_board(&t.app, &token, &board_id).await;
    assert_eq!(view["title"], "Roadmap");
    assert_eq!(view["organizationSlug"], "acme");

    let lists: Vec<(String, i64)> = view["lists"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| (l["title"].as_str().unwrap().to_string(), l["order"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        lists,
        vec![
            ("To Do".to_string(), 0),
            ("In Progress".to_string(), 1),
            ("Done".to_string(), 2),
        ]
    );

    let (status, detail) =
        json_request(&t.app, "GET", &format!("/api/organizations/{}", slug), None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["boards"][0]["id"], board_id.as_str());
    assert_eq!(detail["boards"][0]["listCount"], 3);
}

#[tokio::test]
async fn test_board_in_unknown_organization_is_not_found() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;

    let (status, _) = json_request(
        &t.app,
        "POST",
        "/api/boards",
        Some(json!({ "title": "X", "organizationSlug": "nope" })),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_board() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;

    let (status, board) = json_request(
        &t.app,
        "PATCH",
        &format!("/api/boards/{}", board_id),
        Some(json!({ "title": "Roadmap 2026", "description": "Next year" })),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["title"], "Roadmap 2026");
    assert_eq!(get_board(&t.app, &token, &board_id).await["description"], "Next year");

    let (status, _) =
        json_request(&t.app, "DELETE", &format!("/api/boards/{}", board_id), None, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let lists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lists WHERE board_id = ?")
        .bind(&board_id)
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(lists, 0);

    let (status, _) =
        json_request(&t.app, "GET", &format!("/api/boards/{}", board_id), None, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let t = setup_test_app().await;
    let owner = register_user(&t.app, "owner@example.com", "Owner").await;
    let outsider = register_user(&t.app, "eve@example.com", "Eve").await;
    let slug = create_organization(&t.app, &owner, "Acme").await;
    let board_id = create_board(&t.app, &owner, &slug, "Roadmap").await;
    let view = get_board(&t.app, &owner, &board_id).await;
    let todo = common::list_id(&view, "To Do");

    let (status, _) =
        json_request(&t.app, "GET", &format!("/api/boards/{}", board_id), None, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = json_request(
        &t.app,
        "POST",
        &format!("/api/lists/{}/cards", todo),
        Some(json!({ "title": "sneaky" })),
        &outsider,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        json_request(&t.app, "GET", &format!("/api/organizations/{}", slug), None, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let cards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(cards, 0);
}

#[tokio::test]
async fn test_invitation_grants_membership() {
    let t = setup_test_app().await;
    let owner = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &owner, "Acme").await;
    let board_id = create_board(&t.app, &owner, &slug, "Roadmap").await;

    let (status, invitation) = json_request(
        &t.app,
        "POST",
        &format!("/api/organizations/{}/invitations", slug),
        Some(json!({ "email": "Bob@Example.com" })),
        &owner,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{invitation}");
    assert_eq!(invitation["email"], "bob@example.com");

    let token: String = sqlx::query_scalar("SELECT token FROM invitations WHERE email = ?")
        .bind("bob@example.com")
        .fetch_one(&t.pool)
        .await
        .unwrap();

    let eve = register_user(&t.app, "eve@example.com", "Eve").await;
    let (status, _) = json_request(
        &t.app,
        "POST",
        &format!("/api/invitations/{}/accept", token),
        None,
        &eve,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let bob = register_user(&t.app, "bob@example.com", "Bob").await;
    let (status, org) = json_request(
        &t.app,
        "POST",
        &format!("/api/invitations/{}/accept", token),
        None,
        &bob,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(org["slug"], slug.as_str());

    get_board(&t.app, &bob, &board_id).await;

    // members cannot invite
    let (status, _) = json_request(
        &t.app,
        "POST",
        &format!("/api/organizations/{}/invitations", slug),
        Some(json!({ "email": "carol@example.com" })),
        &bob,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // a used token is gone
    let (status, _) = json_request(
        &t.app,
        "POST",
        &format!("/api/invitations/{}/accept", token),
        None,
        &bob,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn multipart_body(boundary: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn test_card_attachment_upload_and_download() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;
    let view = get_board(&t.app, &token, &board_id).await;
    let card = common::create_card(&t.app, &token, &common::list_id(&view, "To Do"), "Brief").await;
    let card_id = card["id"].as_str().unwrap();

    let pdf = b"%PDF-1.7\n1 0 obj\n".to_vec();
    let boundary = "teamflow-boundary";
    let request = Request::builder()
        .uri(format!("/api/cards/{}/attachments", card_id))
        .method("POST")
        .header("authorization", format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(boundary, "brief.pdf", "application/pdf", &pdf)))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let stored: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(stored[0]["mimeType"], "application/pdf");
    assert_eq!(stored[0]["originalFilename"], "brief.pdf");
    assert!(stored[0].get("filePath").is_none());
    let file_id = stored[0]["id"].as_str().unwrap().to_string();

    let (status, listed) = json_request(
        &t.app,
        "GET",
        &format!("/api/cards/{}/attachments", card_id),
        None,
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .uri(format!("/api/files/{}", file_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(response.headers().contains_key(header::ETAG));
    let downloaded = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(downloaded.as_ref(), pdf.as_slice());

    let (status, _) =
        json_request(&t.app, "DELETE", &format!("/api/files/{}", file_id), None, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_avatar_rejects_non_image() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;

    let boundary = "teamflow-boundary";
    let request = Request::builder()
        .uri("/api/auth/avatar")
        .method("POST")
        .header("authorization", format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(
            boundary,
            "notes.txt",
            "text/plain",
            b"just some text",
        )))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn upload_pdf(t: &common::TestApp, token: &str, card_id: &str) -> String {
    let boundary = "teamflow-boundary";
    let request = Request::builder()
        .uri(format!("/api/cards/{}/attachments", card_id))
        .method("POST")
        .header("authorization", format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(
            boundary,
            "notes.pdf",
            "application/pdf",
            b"%PDF-1.7\n1 0 obj\n",
        )))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let stored: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let id = stored[0]["id"].as_str().unwrap();

    sqlx::query_scalar("SELECT file_path FROM attachments WHERE id = ?")
        .bind(id)
        .fetch_one(&t.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_deleting_parents_removes_attachment_files() {
    let t = setup_test_app().await;
    let token = register_user(&t.app, "owner@example.com", "Owner").await;
    let slug = create_organization(&t.app, &token, "Acme").await;
    let board_id = create_board(&t.app, &token, &slug, "Roadmap").await;
    let view = get_board(&t.app, &token, &board_id).await;
    let todo = common::list_id(&view, "To Do");
    let doing = common::list_id(&view, "In Progress");

    let card = common::create_card(&t.app, &token, &todo, "Card").await;
    let card_file = upload_pdf(&t, &token, card["id"].as_str().unwrap()).await;
    let listed = common::create_card(&t.app, &token, &doing, "Listed").await;
    let list_file = upload_pdf(&t, &token, listed["id"].as_str().unwrap()).await;
    let boarded = common::create_card(&t.app, &token, &todo, "Boarded").await;
    let board_file = upload_pdf(&t, &token, boarded["id"].as_str().unwrap()).await;

    for path in [&card_file, &list_file, &board_file] {
        assert!(std::path::Path::new(path).exists());
        assert!(path.starts_with(t.uploads.path().to_string_lossy().as_ref()));
    }

    let (status, _) = json_request(
        &t.app,
        "DELETE",
        &format!("/api/cards/{}", card["id"].as_str().unwrap()),
        None,
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!std::path::Path::new(&card_file).exists());
    assert!(std::path::Path::new(&list_file).exists());

    let (status, _) =
        json_request(&t.app, "DELETE", &format!("/api/lists/{}", doing), None, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!std::path::Path::new(&list_file).exists());
    assert!(std::path::Path::new(&board_file).exists());

    let (status, _) =
        json_request(&t.app, "DELETE", &format!("/api/boards/{}", board_id), None, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!std::path::Path::new(&board_file).exists());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachments")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}
