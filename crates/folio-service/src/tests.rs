//! Usecase tests over an in-memory `SqliteStore`, run inside principal
//! scopes.

use std::{future::Future, sync::Arc};

use chrono::Duration;
use folio_auth::{Principal, TokenService, principal};
use folio_core::{
  ArticleId, Error, UserId,
  article::{Article, ArticleUpdate, NewArticle},
  store::UserStore,
};
use folio_store_sqlite::SqliteStore;

use crate::{
  ArticleFilter, ArticleService, ProfileService, Registration, UserChanges, UserService,
};

struct Harness {
  store:    Arc<SqliteStore>,
  tokens:   Arc<TokenService>,
  users:    UserService<SqliteStore>,
  profiles: ProfileService<SqliteStore>,
  articles: ArticleService<SqliteStore>,
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let tokens = Arc::new(TokenService::new(b"service-test-secret", Duration::days(7)).unwrap());
  Harness {
    users: UserService::new(store.clone(), tokens.clone()),
    profiles: ProfileService::new(store.clone()),
    articles: ArticleService::new(store.clone()),
    store,
    tokens,
  }
}

async fn as_user<F: Future>(id: UserId, fut: F) -> F::Output {
  principal::scope(Principal::User(id), fut).await
}

async fn anonymous<F: Future>(fut: F) -> F::Output {
  principal::scope(Principal::Anonymous, fut).await
}

impl Harness {
  async fn register(&self, name: &str) -> UserId {
    self
      .users
      .register(Registration {
        username: name.to_owned(),
        email:    format!("{name}@example.com"),
        password: format!("{name}-password"),
      })
      .await
      .unwrap()
      .user
      .user_id
  }

  async fn write(&self, author: UserId, title: &str) -> Article {
    as_user(author, self.articles.create(NewArticle {
      title:       title.to_owned(),
      description: "desc".to_owned(),
      body:        "body".to_owned(),
      tags:        vec!["test".to_owned()],
    }))
    .await
    .unwrap()
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_login_issue_verifiable_tokens() {
  let h = harness().await;
  let registered = h
    .users
    .register(Registration {
      username: "alice".into(),
      email:    "a@x.com".into(),
      password: "secret".into(),
    })
    .await
    .unwrap();
  assert_eq!(h.tokens.verify(&registered.token), Some(registered.user.user_id));

  let logged_in = h.users.login("a@x.com", "secret").await.unwrap();
  assert_eq!(logged_in.user.user_id, registered.user.user_id);
  assert_eq!(h.tokens.verify(&logged_in.token), Some(registered.user.user_id));
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_a_second_row() {
  let h = harness().await;
  h.users
    .register(Registration {
      username: "alice".into(),
      email:    "a@x.com".into(),
      password: "secret".into(),
    })
    .await
    .unwrap();

  let err = h
    .users
    .register(Registration {
      username: "alice2".into(),
      email:    "a@x.com".into(),
      password: "other".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyExists(ref what) if what == "email"), "{err:?}");
  assert!(h.store.find_by_username("alice2").await.unwrap().is_none());
}

#[tokio::test]
async fn registration_requires_fields() {
  let h = harness().await;
  let err = h
    .users
    .register(Registration {
      username: "  ".into(),
      email:    "a@x.com".into(),
      password: "secret".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation { field: "username", .. }), "{err:?}");

  let err = h
    .users
    .register(Registration {
      username: "alice".into(),
      email:    "not-an-email".into(),
      password: "secret".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation { field: "email", .. }), "{err:?}");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
  let h = harness().await;
  h.register("alice").await;

  let wrong_password = h.users.login("alice@example.com", "nope").await.unwrap_err();
  let unknown_email = h.users.login("bob@example.com", "nope").await.unwrap_err();
  assert!(matches!(wrong_password, Error::Unauthenticated));
  assert!(matches!(unknown_email, Error::Unauthenticated));

  let blank = h.users.login("", "nope").await.unwrap_err();
  assert!(matches!(blank, Error::Validation { field: "email", .. }));
}

#[tokio::test]
async fn current_user_needs_a_principal() {
  let h = harness().await;
  let alice = h.register("alice").await;

  let err = anonymous(h.users.current_user()).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));

  let me = as_user(alice, h.users.current_user()).await.unwrap();
  assert_eq!(me.user.username, "alice");
}

#[tokio::test]
async fn update_user_changes_password_and_profile() {
  let h = harness().await;
  let alice = h.register("alice").await;

  let updated = as_user(alice, h.users.update_user(UserChanges {
    bio: Some("writer".into()),
    password: Some("new-password".into()),
    ..Default::default()
  }))
  .await
  .unwrap();
  assert_eq!(updated.user.bio.as_deref(), Some("writer"));

  assert!(h.users.login("alice@example.com", "alice-password").await.is_err());
  h.users.login("alice@example.com", "new-password").await.unwrap();
}

#[tokio::test]
async fn update_user_to_taken_email_already_exists() {
  let h = harness().await;
  let alice = h.register("alice").await;
  h.register("bob").await;

  let err = as_user(alice, h.users.update_user(UserChanges {
    email: Some("bob@example.com".into()),
    ..Default::default()
  }))
  .await
  .unwrap_err();
  assert!(matches!(err, Error::AlreadyExists(_)), "{err:?}");
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_reflects_in_profile_for_follower_only() {
  let h = harness().await;
  let alice = h.register("alice").await;
  h.register("bob").await;

  let profile = as_user(alice, h.profiles.follow("bob")).await.unwrap();
  assert!(profile.following);

  let seen_by_alice = as_user(alice, h.profiles.get_profile("bob")).await.unwrap();
  assert!(seen_by_alice.following);
  let seen_anonymously = anonymous(h.profiles.get_profile("bob")).await.unwrap();
  assert!(!seen_anonymously.following);

  let profile = as_user(alice, h.profiles.unfollow("bob")).await.unwrap();
  assert!(!profile.following);
  let again = as_user(alice, h.profiles.unfollow("bob")).await.unwrap();
  assert!(!again.following);
}

#[tokio::test]
async fn following_yourself_is_invalid() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let err = as_user(alice, h.profiles.follow("alice")).await.unwrap_err();
  assert!(matches!(err, Error::Validation { .. }), "{err:?}");
}

#[tokio::test]
async fn follow_requires_principal_and_existing_profile() {
  let h = harness().await;
  let alice = h.register("alice").await;
  h.register("bob").await;

  let err = anonymous(h.profiles.follow("bob")).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
  let err = as_user(alice, h.profiles.follow("nobody")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

// ─── Articles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_author_cannot_update_or_delete() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let bob = h.register("bob").await;
  let article = h.write(alice, "Alice's post").await;

  let err = as_user(bob, h.articles.update(article.article_id, ArticleUpdate {
    title: Some("Bob was here".into()),
    ..Default::default()
  }))
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Unauthorized("article")), "{err:?}");

  let err = as_user(bob, h.articles.delete(article.article_id)).await.unwrap_err();
  assert!(matches!(err, Error::Unauthorized("article")), "{err:?}");

  let updated = as_user(alice, h.articles.update(article.article_id, ArticleUpdate {
    title: Some("Edited".into()),
    ..Default::default()
  }))
  .await
  .unwrap();
  assert_eq!(updated.slug, "edited");

  as_user(alice, h.articles.delete(article.article_id)).await.unwrap();
  let err = anonymous(h.articles.get(article.article_id)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn create_requires_principal_and_title() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let input = NewArticle {
    title:       " ".into(),
    description: String::new(),
    body:        "text".into(),
    tags:        vec![],
  };

  let err = anonymous(h.articles.create(input.clone())).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
  let err = as_user(alice, h.articles.create(input)).await.unwrap_err();
  assert!(matches!(err, Error::Validation { field: "title", .. }));
}

#[tokio::test]
async fn favorited_flag_is_per_viewer() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let bob = h.register("bob").await;

  let mut ids: Vec<ArticleId> = Vec::new();
  for i in 1..=6 {
    ids.push(h.write(alice, &format!("post {i}")).await.article_id);
  }
  let fifth = ids[4];
  as_user(bob, h.articles.favorite(fifth)).await.unwrap();

  let page = anonymous(h.articles.list(ArticleFilter::default())).await.unwrap();
  assert_eq!(page.total, 6);
  assert!(page.articles.iter().all(|a| !a.favorited));

  let page = as_user(bob, h.articles.list(ArticleFilter::default())).await.unwrap();
  for article in &page.articles {
    assert_eq!(article.favorited, article.article_id == fifth, "{}", article.article_id);
  }
}

#[tokio::test]
async fn favorite_operations_return_updated_article() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let bob = h.register("bob").await;
  let article = h.write(alice, "likeable").await;
  let id = article.article_id;

  let on = as_user(bob, h.articles.toggle_favorite(id)).await.unwrap();
  assert!(on.favorited);
  assert_eq!(on.favorites_count, 1);

  let off = as_user(bob, h.articles.toggle_favorite(id)).await.unwrap();
  assert!(!off.favorited);
  assert_eq!(off.favorites_count, 0);

  let set = as_user(bob, h.articles.favorite(id)).await.unwrap();
  let set_again = as_user(bob, h.articles.favorite(id)).await.unwrap();
  assert_eq!(set.favorites_count, 1);
  assert_eq!(set_again.favorites_count, 1);

  let cleared = as_user(alice, h.articles.unfavorite(id)).await.unwrap();
  assert!(!cleared.favorited);
  assert_eq!(cleared.favorites_count, 1);

  let err = anonymous(h.articles.favorite(id)).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
}

#[tokio::test]
async fn list_filters_by_username() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let bob = h.register("bob").await;
  let by_alice = h.write(alice, "by alice").await;
  let by_bob = h.write(bob, "by bob").await;
  as_user(alice, h.articles.favorite(by_bob.article_id)).await.unwrap();

  let page = anonymous(h.articles.list(ArticleFilter {
    author: Some("alice".into()),
    ..Default::default()
  }))
  .await
  .unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.articles[0].article_id, by_alice.article_id);

  let page = anonymous(h.articles.list(ArticleFilter {
    favorited: Some("alice".into()),
    ..Default::default()
  }))
  .await
  .unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.articles[0].article_id, by_bob.article_id);

  let page = anonymous(h.articles.list(ArticleFilter {
    author: Some("nobody".into()),
    ..Default::default()
  }))
  .await
  .unwrap();
  assert_eq!(page.total, 0);
  assert!(page.articles.is_empty());
}

#[tokio::test]
async fn feed_shows_followed_authors_with_following_flag() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let bob = h.register("bob").await;
  h.write(alice, "own post").await;
  let by_bob = h.write(bob, "bob's post").await;

  let err = anonymous(h.articles.feed(None, None)).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));

  as_user(alice, h.profiles.follow("bob")).await.unwrap();
  let feed = as_user(alice, h.articles.feed(None, None)).await.unwrap();
  assert_eq!(feed.total, 1);
  assert_eq!(feed.articles[0].article_id, by_bob.article_id);
  assert!(feed.articles[0].author.following);
}

#[tokio::test]
async fn tags_lists_names_in_use() {
  let h = harness().await;
  let alice = h.register("alice").await;
  h.write(alice, "tagged").await;
  let tags = anonymous(h.articles.tags()).await.unwrap();
  assert_eq!(tags, vec!["test".to_owned()]);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comment_lifecycle_and_ownership() {
  let h = harness().await;
  let alice = h.register("alice").await;
  let bob = h.register("bob").await;
  let article = h.write(alice, "discussed").await;
  let other = h.write(alice, "elsewhere").await;

  let comment = as_user(bob, h.articles.add_comment(article.article_id, "first!"))
    .await
    .unwrap();
  assert_eq!(comment.body, "first!");

  let err = as_user(alice, h.articles.delete_comment(article.article_id, comment.comment_id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Unauthorized("comment")), "{err:?}");

  let err = as_user(bob, h.articles.delete_comment(other.article_id, comment.comment_id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)), "{err:?}");

  as_user(alice, h.profiles.follow("bob")).await.unwrap();
  let listed = as_user(alice, h.articles.list_comments(article.article_id))
    .await
    .unwrap();
  assert_eq!(listed.len(), 1);
  assert!(listed[0].author.following);

  as_user(bob, h.articles.delete_comment(article.article_id, comment.comment_id))
    .await
    .unwrap();
  let listed = anonymous(h.articles.list_comments(article.article_id)).await.unwrap();
  assert!(listed.is_empty());
}

#[tokio::test]
async fn comments_on_missing_article_are_not_found() {
  let h = harness().await;
  let alice = h.register("alice").await;

  let err = anonymous(h.articles.list_comments(ArticleId::new(77))).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
  let err = as_user(alice, h.articles.add_comment(ArticleId::new(77), "hi"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
  let err = as_user(alice, h.articles.add_comment(ArticleId::new(77), "  "))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation { field: "body", .. }));
}
