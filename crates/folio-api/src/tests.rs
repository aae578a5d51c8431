//! Router tests driven with `tower::ServiceExt::oneshot` against an
//! in-memory store.

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Duration;
use folio_auth::{
  RoutePolicy, TokenService,
  token::{MAX_LIFETIME, TokenConfigError},
};
use folio_core::UserId;
use folio_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, ConfigError, DEFAULT_TOKEN_TTL_SECS, ServerConfig, router};

struct TestApp {
  router: Router,
  tokens: Arc<TokenService>,
}

async fn app() -> TestApp {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let tokens = Arc::new(TokenService::new(b"api-test-secret", Duration::hours(1)).unwrap());
  let state = AppState::new(store, tokens.clone(), RoutePolicy::default());
  TestApp { router: router(state), tokens }
}

struct Reply {
  status:  StatusCode,
  headers: HeaderMap,
  json:    Value,
}

impl TestApp {
  async fn call(
    &self,
    method: Method,
    uri: &str,
    authorization: Option<String>,
    body: Option<Value>,
  ) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string())),
      None => builder.body(Body::empty()),
    }
    .unwrap();

    let res = self.router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    Reply { status, headers, json }
  }

  async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
    self.call(Method::GET, uri, token.map(|t| format!("Token {t}")), None).await
  }

  async fn send(&self, method: Method, uri: &str, token: &str, body: Option<Value>) -> Reply {
    self.call(method, uri, Some(format!("Token {token}")), body).await
  }

  /// Register `name` and return its token.
  async fn register(&self, name: &str) -> String {
    let reply = self
      .call(
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "user": {
          "username": name,
          "email": format!("{name}@example.com"),
          "password": "password",
        }})),
      )
      .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.json);
    reply.json["user"]["token"].as_str().unwrap().to_owned()
  }

  /// Create an article and return its id.
  async fn article(&self, token: &str, title: &str) -> i64 {
    let reply = self
      .send(
        Method::POST,
        "/api/articles",
        token,
        Some(json!({ "article": {
          "title": title,
          "description": "desc",
          "body": "body",
          "tagList": ["rust", "web"],
        }})),
      )
      .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.json);
    reply.json["article"]["id"].as_i64().unwrap()
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_and_fetch_current_user() {
  let app = app().await;
  let token = app.register("alice").await;

  let login = app
    .call(
      Method::POST,
      "/api/users/login",
      None,
      Some(json!({ "user": { "email": "alice@example.com", "password": "password" } })),
    )
    .await;
  assert_eq!(login.status, StatusCode::OK);
  assert_eq!(login.json["user"]["username"], "alice");
  assert!(login.json["user"]["token"].is_string());

  let me = app.get("/api/user", Some(&token)).await;
  assert_eq!(me.status, StatusCode::OK);
  assert_eq!(me.json["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn missing_token_on_protected_route_is_401_with_challenge() {
  let app = app().await;
  let reply = app.get("/api/user", None).await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
  assert_eq!(reply.headers[header::WWW_AUTHENTICATE], "Token");
  assert!(reply.json["errors"]["token"].is_array());
}

#[tokio::test]
async fn bearer_scheme_is_accepted() {
  let app = app().await;
  let token = app.register("alice").await;
  let reply = app
    .call(Method::GET, "/api/user", Some(format!("Bearer {token}")), None)
    .await;
  assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn bad_token_on_public_route_is_rejected() {
  let app = app().await;
  assert_eq!(app.get("/api/tags", None).await.status, StatusCode::OK);

  let reply = app.get("/api/tags", Some("forged.token")).await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

  let foreign = TokenService::new(b"another-secret", Duration::hours(1))
    .unwrap()
    .issue(UserId::new(1));
  let reply = app.get("/api/articles", Some(&foreign)).await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_deleted_user_is_unauthenticated() {
  let app = app().await;
  let ghost = app.tokens.issue(UserId::new(999));
  let reply = app.get("/api/user", Some(&ghost)).await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_409() {
  let app = app().await;
  app.register("alice").await;
  let reply = app
    .call(
      Method::POST,
      "/api/users",
      None,
      Some(json!({ "user": {
        "username": "someone-else",
        "email": "alice@example.com",
        "password": "password",
      }})),
    )
    .await;
  assert_eq!(reply.status, StatusCode::CONFLICT);
  assert!(reply.json["errors"]["email"].is_array());
}

#[tokio::test]
async fn blank_username_is_422() {
  let app = app().await;
  let reply = app
    .call(
      Method::POST,
      "/api/users",
      None,
      Some(json!({ "user": { "username": "", "email": "a@x.com", "password": "pw" } })),
    )
    .await;
  assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(reply.json["errors"]["username"][0], "can't be blank");
}

#[tokio::test]
async fn wrong_password_is_401() {
  let app = app().await;
  app.register("alice").await;
  let reply = app
    .call(
      Method::POST,
      "/api/users/login",
      None,
      Some(json!({ "user": { "email": "alice@example.com", "password": "nope" } })),
    )
    .await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_user_returns_new_values() {
  let app = app().await;
  let token = app.register("alice").await;
  let reply = app
    .send(
      Method::PUT,
      "/api/user",
      &token,
      Some(json!({ "user": { "bio": "hello", "image": "https://img/a.png" } })),
    )
    .await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.json["user"]["bio"], "hello");
  assert_eq!(reply.json["user"]["username"], "alice");
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_and_unfollow_profile() {
  let app = app().await;
  let alice = app.register("alice").await;
  app.register("bob").await;

  let reply = app.send(Method::POST, "/api/profiles/bob/follow", &alice, None).await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.json["profile"]["following"], true);

  let anon = app.get("/api/profiles/bob", None).await;
  assert_eq!(anon.json["profile"]["following"], false);
  let seen = app.get("/api/profiles/bob", Some(&alice)).await;
  assert_eq!(seen.json["profile"]["following"], true);

  let reply = app.send(Method::DELETE, "/api/profiles/bob/follow", &alice, None).await;
  assert_eq!(reply.json["profile"]["following"], false);

  let reply = app.send(Method::POST, "/api/profiles/alice/follow", &alice, None).await;
  assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

  assert_eq!(app.get("/api/profiles/nobody", None).await.status, StatusCode::NOT_FOUND);
}

// ─── Articles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn article_lifecycle_enforces_ownership() {
  let app = app().await;
  let alice = app.register("alice").await;
  let bob = app.register("bob").await;
  let id = app.article(&alice, "Hello World").await;
  let uri = format!("/api/articles/{id}");

  let reply = app.get(&uri, None).await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.json["article"]["slug"], "hello-world");
  assert_eq!(reply.json["article"]["tagList"], json!(["rust", "web"]));
  assert_eq!(reply.json["article"]["author"]["username"], "alice");

  let reply = app
    .send(Method::PUT, &uri, &bob, Some(json!({ "article": { "title": "Mine now" } })))
    .await;
  assert_eq!(reply.status, StatusCode::FORBIDDEN);

  let reply = app.send(Method::DELETE, &uri, &bob, None).await;
  assert_eq!(reply.status, StatusCode::FORBIDDEN);

  let reply = app
    .send(Method::PUT, &uri, &alice, Some(json!({ "article": { "body": "edited" } })))
    .await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.json["article"]["body"], "edited");
  assert_eq!(reply.json["article"]["title"], "Hello World");

  let reply = app.send(Method::DELETE, &uri, &alice, None).await;
  assert_eq!(reply.status, StatusCode::NO_CONTENT);
  assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_article_requires_token() {
  let app = app().await;
  let reply = app
    .call(
      Method::POST,
      "/api/articles",
      None,
      Some(json!({ "article": { "title": "t", "body": "b" } })),
    )
    .await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn favorited_flag_depends_on_caller() {
  let app = app().await;
  let alice = app.register("alice").await;
  let bob = app.register("bob").await;
  let mut ids = Vec::new();
  for i in 1..=5 {
    ids.push(app.article(&alice, &format!("post {i}")).await);
  }
  let target = ids[4];

  let reply = app
    .send(Method::POST, &format!("/api/articles/{target}/favorite"), &bob, None)
    .await;
  assert_eq!(reply.status, StatusCode::OK);
  assert_eq!(reply.json["article"]["favorited"], true);
  assert_eq!(reply.json["article"]["favoritesCount"], 1);

  let anon = app.get("/api/articles", None).await;
  assert_eq!(anon.json["articlesCount"], 5);
  for article in anon.json["articles"].as_array().unwrap() {
    assert_eq!(article["favorited"], false);
  }

  let mine = app.get("/api/articles", Some(&bob)).await;
  for article in mine.json["articles"].as_array().unwrap() {
    let expected = article["id"].as_i64() == Some(target);
    assert_eq!(article["favorited"], expected, "{article}");
  }
}

#[tokio::test]
async fn toggle_and_unfavorite_keep_count_consistent() {
  let app = app().await;
  let alice = app.register("alice").await;
  let bob = app.register("bob").await;
  let id = app.article(&alice, "toggled").await;
  let toggle = format!("/api/articles/{id}/favorite/toggle");
  let favorite = format!("/api/articles/{id}/favorite");

  let on = app.send(Method::POST, &toggle, &bob, None).await;
  assert_eq!(on.json["article"]["favorited"], true);
  assert_eq!(on.json["article"]["favoritesCount"], 1);

  let off = app.send(Method::POST, &toggle, &bob, None).await;
  assert_eq!(off.json["article"]["favorited"], false);
  assert_eq!(off.json["article"]["favoritesCount"], 0);

  let noop = app.send(Method::DELETE, &favorite, &bob, None).await;
  assert_eq!(noop.status, StatusCode::OK);
  assert_eq!(noop.json["article"]["favoritesCount"], 0);

  let missing = app.send(Method::POST, "/api/articles/999/favorite/toggle", &bob, None).await;
  assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_feed() {
  let app = app().await;
  let alice = app.register("alice").await;
  let bob = app.register("bob").await;
  app.article(&alice, "by alice").await;
  let bobs = app.article(&bob, "by bob").await;

  let by_author = app.get("/api/articles?author=bob", None).await;
  assert_eq!(by_author.json["articlesCount"], 1);
  assert_eq!(by_author.json["articles"][0]["id"], bobs);

  let unknown = app.get("/api/articles?author=nobody", None).await;
  assert_eq!(unknown.status, StatusCode::OK);
  assert_eq!(unknown.json["articlesCount"], 0);

  let paged = app.get("/api/articles?limit=1&offset=1", None).await;
  assert_eq!(paged.json["articlesCount"], 2);
  assert_eq!(paged.json["articles"].as_array().unwrap().len(), 1);

  assert_eq!(app.get("/api/articles/feed", None).await.status, StatusCode::UNAUTHORIZED);

  app.send(Method::POST, "/api/profiles/bob/follow", &alice, None).await;
  let feed = app.get("/api/articles/feed", Some(&alice)).await;
  assert_eq!(feed.status, StatusCode::OK);
  assert_eq!(feed.json["articlesCount"], 1);
  assert_eq!(feed.json["articles"][0]["author"]["following"], true);
}

#[tokio::test]
async fn tags_endpoint_lists_tags() {
  let app = app().await;
  let alice = app.register("alice").await;
  app.article(&alice, "tagged").await;
  let reply = app.get("/api/tags", None).await;
  assert_eq!(reply.json["tags"], json!(["rust", "web"]));
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comment_flow() {
  let app = app().await;
  let alice = app.register("alice").await;
  let bob = app.register("bob").await;
  let id = app.article(&alice, "discussed").await;
  let uri = format!("/api/articles/{id}/comments");

  let created = app
    .send(Method::POST, &uri, &bob, Some(json!({ "comment": { "body": "nice" } })))
    .await;
  assert_eq!(created.status, StatusCode::CREATED);
  let comment_id = created.json["comment"]["id"].as_i64().unwrap();
  assert_eq!(created.json["comment"]["author"]["username"], "bob");

  let listed = app.get(&uri, None).await;
  assert_eq!(listed.json["comments"].as_array().unwrap().len(), 1);

  let delete_uri = format!("{uri}/{comment_id}");
  let reply = app.send(Method::DELETE, &delete_uri, &alice, None).await;
  assert_eq!(reply.status, StatusCode::FORBIDDEN);
  let reply = app.send(Method::DELETE, &delete_uri, &bob, None).await;
  assert_eq!(reply.status, StatusCode::NO_CONTENT);

  let listed = app.get(&uri, None).await;
  assert!(listed.json["comments"].as_array().unwrap().is_empty());

  assert_eq!(
    app.get("/api/articles/404/comments", None).await.status,
    StatusCode::NOT_FOUND
  );
}

// ─── Configuration ───────────────────────────────────────────────────────────

fn config(secret: &str, ttl: u64) -> ServerConfig {
  ServerConfig {
    host:           "127.0.0.1".into(),
    port:           8000,
    store_path:     PathBuf::from(":memory:"),
    token_secret:   secret.into(),
    token_ttl_secs: ttl,
  }
}

#[test]
fn config_builds_token_service() {
  let tokens = config("secret", DEFAULT_TOKEN_TTL_SECS).token_service().unwrap();
  assert_eq!(tokens.lifetime(), Duration::days(7));
}

#[test]
fn config_rejects_empty_secret_and_bad_ttl() {
  assert!(matches!(config("", 60).token_service(), Err(ConfigError::Token(_))));
  assert!(matches!(config("secret", 0).token_service(), Err(ConfigError::Token(_))));
  assert!(matches!(
    config("secret", u64::MAX).token_service(),
    Err(ConfigError::TokenTtl(_))
  ));
  assert!(matches!(
    config("secret", 10_000_000_000_000).token_service(),
    Err(ConfigError::Token(TokenConfigError::LifetimeTooLong))
  ));
}

#[test]
fn config_at_max_lifetime_issues_tokens() {
  let ttl = MAX_LIFETIME.num_seconds() as u64;
  let tokens = config("secret", ttl).token_service().unwrap();
  let token = tokens.issue(UserId::new(1));
  assert_eq!(tokens.verify(&token), Some(UserId::new(1)));
}

#[test]
fn config_defaults_apply() {
  let cfg: ServerConfig =
    serde_json::from_value(json!({ "token_secret": "s" })).unwrap();
  assert_eq!(cfg.port, 8000);
  assert_eq!(cfg.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
}
