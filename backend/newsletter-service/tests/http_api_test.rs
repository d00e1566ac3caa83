/// End-to-end API tests over the in-memory store
use actix_middleware::{CorrelationIdMiddleware, JwtAuthMiddleware};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use crypto_core::JwtSigner;
use newsletter_service::domain::Role;
use newsletter_service::handlers;
use newsletter_service::repository::Store;
use newsletter_service::services::accounts::{CreateUserRequest, RegisterRequest};
use newsletter_service::{AppState, ServiceSettings};
use serde_json::{json, Value};
use std::sync::Arc;

const SECRET: &str = "integration-test-secret-0123456789";

fn test_state() -> (web::Data<AppState>, Arc<JwtSigner>) {
    let signer = Arc::new(JwtSigner::new(SECRET, 1).unwrap());
    let state = AppState::new(
        Store::in_memory(),
        signer.clone(),
        ServiceSettings::default(),
        None,
    );
    (web::Data::new(state), signer)
}

macro_rules! init_app {
    ($state:expr, $signer:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(JwtAuthMiddleware::new($signer.clone()))
                .wrap(CorrelationIdMiddleware)
                .configure(handlers::configure),
        )
        .await
    };
}

/// Send a request and decode the JSON body
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Register `nickname` and return `(token, user id)`
macro_rules! register {
    ($app:expr, $nickname:expr) => {{
        let (status, body) = call!(
            $app,
            test::TestRequest::post()
                .uri("/newsletter/api/v1/auth/register")
                .set_json(json!({
                    "firstName": "Test",
                    "surName": "User",
                    "nickname": $nickname,
                    "email": format!("{}@example.com", $nickname),
                    "password": "secret123",
                }))
        );
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        let token = body["token"].as_str().unwrap().to_string();
        let (_, me) = call!($app, authed(test::TestRequest::get(), &token).uri(&api("/auth/me")));
        let id = me["data"]["id"].as_str().unwrap().to_string();
        (token, id)
    }};
}

fn api(path: &str) -> String {
    format!("{}{}", handlers::API_PREFIX, path)
}

fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

macro_rules! create_post {
    ($app:expr, $token:expr) => {{
        let (status, body) = call!(
            $app,
            authed(test::TestRequest::post(), &$token)
                .uri(&api("/post/createpost"))
                .set_json(json!({ "title": "Weekly digest", "content": "news", "tags": ["rust"] }))
        );
        assert_eq!(status, StatusCode::CREATED, "create post failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_register_sets_cookie_and_hides_password() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&api("/auth/register"))
            .set_json(json!({
                "firstName": "Ada",
                "surName": "Lovelace",
                "nickname": "ada",
                "email": "ada@example.com",
                "password": "secret123",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "token")
        .expect("token cookie");
    assert!(cookie.http_only().unwrap_or(false));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let token = body["token"].as_str().unwrap();

    let (status, me) = call!(app, authed(test::TestRequest::get(), token).uri(&api("/auth/me")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["nickname"], "ada");
    assert_eq!(me["data"]["role"], "user");
    assert!(me["data"].get("passwordHash").is_none());
}

#[actix_web::test]
async fn test_session_cookie_authenticates() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, _) = register!(app, "cookie");

    let (status, body) = call!(
        app,
        test::TestRequest::get()
            .uri(&api("/auth/me"))
            .cookie(actix_web::cookie::Cookie::new("token", token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "cookie");
}

#[actix_web::test]
async fn test_protected_route_without_token_is_401() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);

    let (status, body) = call!(app, test::TestRequest::get().uri(&api("/auth/me")));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not authorized to access this route");

    let (status, _) = call!(
        app,
        authed(test::TestRequest::get(), "not-a-token").uri(&api("/auth/me"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_duplicate_registration_and_bad_login() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    register!(app, "dup");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&api("/auth/register"))
            .set_json(json!({
                "firstName": "Other",
                "surName": "Person",
                "nickname": "someone-else",
                "email": "dup@example.com",
                "password": "secret123",
            }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate field value entered");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&api("/auth/login"))
            .set_json(json!({ "email": "dup@example.com", "password": "wrong-password" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&api("/auth/login"))
            .set_json(json!({ "email": "dup@example.com", "password": "secret123" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[actix_web::test]
async fn test_malformed_input_is_rejected() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, _) = register!(app, "malformed");

    let (status, body) = call!(
        app,
        authed(test::TestRequest::get(), &token).uri(&api("/post/get/not-a-uuid"))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");

    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api("/post/createpost"))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{ not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request body");
}

#[actix_web::test]
async fn test_post_vote_toggles_over_http() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, user_id) = register!(app, "voter");
    let post_id = create_post!(app, token);
    let uri = api(&format!("/post/vote/{}", post_id));

    let vote = |value: Value| authed(test::TestRequest::put(), &token).uri(&uri).set_json(json!({ "vote": value }));

    let (status, body) = call!(app, vote(json!(1)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 1);
    assert_eq!(body["data"]["upvotes"], json!([user_id]));

    let (_, body) = call!(app, vote(json!(1)));
    assert_eq!(body["score"], 0);
    assert_eq!(body["data"]["upvotes"], json!([]));

    let (_, body) = call!(app, vote(json!(0)));
    assert_eq!(body["score"], -1);
    assert_eq!(body["data"]["downvotes"], json!([user_id]));

    let (_, body) = call!(app, vote(json!(1)));
    assert_eq!(body["score"], 1);
    assert_eq!(body["data"]["downvotes"], json!([]));

    // Unknown values leave the ledger untouched
    let (status, body) = call!(app, vote(json!(7)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 1);
}

#[actix_web::test]
async fn test_comment_depth_limit() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, _) = register!(app, "threader");
    let post_id = create_post!(app, token);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api(&format!("/comment/post/{}", post_id)))
            .set_json(json!({ "comment": "root" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["comment"]["depth"], 1);
    assert_eq!(body["data"]["post"]["comments"][0], body["data"]["comment"]["id"]);
    let mut parent = body["data"]["comment"]["id"].as_str().unwrap().to_string();

    for depth in 2..=4 {
        let (status, body) = call!(
            app,
            authed(test::TestRequest::post(), &token)
                .uri(&api(&format!("/comment/comment/{}", parent)))
                .set_json(json!({ "comment": format!("level {}", depth) }))
        );
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["comment"]["depth"], depth);
        assert_eq!(body["data"]["parent"]["id"], json!(parent));
        parent = body["data"]["comment"]["id"].as_str().unwrap().to_string();
    }

    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api(&format!("/comment/comment/{}", parent)))
            .set_json(json!({ "comment": "too deep" }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_post_deletion_cascades_to_comments() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (author, _) = register!(app, "author");
    let (reader, _) = register!(app, "reader");
    let post_id = create_post!(app, author);

    let (_, body) = call!(
        app,
        authed(test::TestRequest::post(), &reader)
            .uri(&api(&format!("/comment/post/{}", post_id)))
            .set_json(json!({ "comment": "first!" }))
    );
    let comment_id = body["data"]["comment"]["id"].as_str().unwrap().to_string();
    let (status, _) = call!(
        app,
        authed(test::TestRequest::post(), &author)
            .uri(&api(&format!("/comment/comment/{}", comment_id)))
            .set_json(json!({ "comment": "thanks" }))
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call!(
        app,
        authed(test::TestRequest::delete(), &reader).uri(&api(&format!("/post/delete/{}", post_id)))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::delete(), &author).uri(&api(&format!("/post/delete/{}", post_id)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));

    let (status, _) = call!(
        app,
        authed(test::TestRequest::get(), &author).uri(&api(&format!("/post/get/{}", post_id)))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::get(), &author).uri(&api(&format!("/comment/get/{}", post_id)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = call!(
        app,
        authed(test::TestRequest::get(), &author).uri(&api(&format!("/comment/get/{}", comment_id)))
    );
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_post_author_blanks_comment() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (author, _) = register!(app, "owner");
    let (reader, _) = register!(app, "commenter");
    let post_id = create_post!(app, author);

    let (_, body) = call!(
        app,
        authed(test::TestRequest::post(), &reader)
            .uri(&api(&format!("/comment/post/{}", post_id)))
            .set_json(json!({ "comment": "spam spam spam" }))
    );
    let comment_id = body["data"]["comment"]["id"].as_str().unwrap().to_string();
    let uri = api(&format!("/comment/delete/postauthor/{}", comment_id));

    let (status, _) = call!(app, authed(test::TestRequest::put(), &reader).uri(&uri));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call!(app, authed(test::TestRequest::put(), &author).uri(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["body"], "Deleted Comment");
    assert_eq!(body["data"]["deleted"], true);

    let (_, body) = call!(
        app,
        authed(test::TestRequest::get(), &reader).uri(&api(&format!("/comment/get/{}", post_id)))
    );
    assert_eq!(body["data"][0]["body"], "Deleted Comment");
    assert_eq!(body["data"][0]["author"]["nickname"], "commenter");
}

#[actix_web::test]
async fn test_user_admin_requires_admin_role() {
    let (state, signer) = test_state();
    state
        .accounts
        .create_user(CreateUserRequest {
            account: RegisterRequest {
                first_name: "Root".into(),
                sur_name: "Admin".into(),
                nickname: "root".into(),
                email: "root@example.com".into(),
                password: "secret123".into(),
            },
            role: Some(Role::Admin),
            ..Default::default()
        })
        .await
        .unwrap();
    let app = init_app!(state, signer);
    let (user_token, user_id) = register!(app, "plain");

    let (status, body) = call!(
        app,
        authed(test::TestRequest::delete(), &user_token).uri(&api(&format!("/user/{}", user_id)))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "User role user is not authorized to access this route");

    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&api("/auth/login"))
            .set_json(json!({ "email": "root@example.com", "password": "secret123" }))
    );
    let admin_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = call!(app, test::TestRequest::get().uri(&api("/user")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &admin_token)
            .uri(&api("/user"))
            .set_json(json!({
                "firstName": "New",
                "surName": "Editor",
                "nickname": "editor",
                "email": "editor@example.com",
                "password": "secret123",
                "role": "admin",
            }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "admin");

    let (status, body) = call!(
        app,
        authed(test::TestRequest::put(), &admin_token)
            .uri(&api(&format!("/user/{}", user_id)))
            .set_json(json!({ "password": "sneaky123" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call!(
        app,
        authed(test::TestRequest::delete(), &admin_token).uri(&api(&format!("/user/{}", user_id)))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call!(app, test::TestRequest::get().uri(&api(&format!("/user/{}", user_id))));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_search_and_feeds() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, user_id) = register!(app, "searcher");
    create_post!(app, token);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api("/search/post"))
            .set_json(json!({ "query": "DIGEST" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api("/search/user/auto"))
            .set_json(json!({ "query": "sea" }))
    );
    assert_eq!(body["data"][0]["id"], json!(user_id));

    let (status, _) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api("/search/user"))
            .set_json(json!({ "query": "" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call!(app, authed(test::TestRequest::post(), &token).uri(&api("/post")));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call!(
        app,
        authed(test::TestRequest::get(), &token).uri(&api("/post/tag/rust"))
    );
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api(&format!("/post/user/{}", user_id)))
            .set_json(json!({ "limit": 5 }))
    );
    assert_eq!(body["data"][0]["authorId"], json!(user_id));
}

#[actix_web::test]
async fn test_health_and_readiness() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);

    let (status, body) = call!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call!(app, test::TestRequest::get().uri("/ready"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[actix_web::test]
async fn test_role_is_read_from_the_stored_account() {
    let (state, signer) = test_state();
    let admin = state
        .accounts
        .create_user(CreateUserRequest {
            account: RegisterRequest {
                first_name: "Former".into(),
                sur_name: "Admin".into(),
                nickname: "former".into(),
                email: "former@example.com".into(),
                password: "secret123".into(),
            },
            role: Some(Role::Admin),
            ..Default::default()
        })
        .await
        .unwrap();
    let app = init_app!(state, signer);

    let (_, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&api("/auth/login"))
            .set_json(json!({ "email": "former@example.com", "password": "secret123" }))
    );
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = call!(
        app,
        authed(test::TestRequest::put(), &token)
            .uri(&api(&format!("/user/{}", admin.id)))
            .set_json(json!({ "role": "user" }))
    );
    assert_eq!(status, StatusCode::OK);

    // Same token, but the account is no longer an admin
    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api("/user"))
            .set_json(json!({
                "firstName": "Sneaky",
                "surName": "Admin",
                "nickname": "sneaky",
                "email": "sneaky@example.com",
                "password": "secret123",
                "role": "admin",
            }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "User role user is not authorized to access this route");
}

#[actix_web::test]
async fn test_deleted_account_token_is_rejected() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, user_id) = register!(app, "ghost");

    state
        .accounts
        .delete_user(user_id.parse().unwrap())
        .await
        .unwrap();

    let (status, body) = call!(
        app,
        authed(test::TestRequest::post(), &token)
            .uri(&api("/post/createpost"))
            .set_json(json!({ "title": "boo", "content": "still here?" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authorized to access this route");

    let (status, _) = call!(app, authed(test::TestRequest::get(), &token).uri(&api("/auth/me")));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_vote_accepts_float_and_ignores_strings() {
    let (state, signer) = test_state();
    let app = init_app!(state, signer);
    let (token, _) = register!(app, "floaty");
    let post_id = create_post!(app, token);
    let uri = api(&format!("/post/vote/{}", post_id));

    let (status, body) = call!(
        app,
        authed(test::TestRequest::put(), &token)
            .uri(&uri)
            .set_json(json!({ "vote": 1.0 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 1);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::put(), &token)
            .uri(&uri)
            .set_json(json!({ "vote": "1" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 1);

    let (status, body) = call!(
        app,
        authed(test::TestRequest::put(), &token)
            .uri(&uri)
            .set_json(json!({ "vote": 0.0 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], -1);
}
