//! Articles, favorites, comments and tags.
//!
//! Mutations go through [`ensure_owner`] against the freshly fetched record
//! and hand that same record to the store, whose write re-checks the author.
//! Reads are personalised for the caller with one batched favorite lookup
//! and one batched follow lookup per page.

use std::sync::Arc;

use folio_auth::{ownership::ensure_owner, principal};
use folio_core::{
  ArticleId, CommentId, Error, Result, UserId,
  article::{Article, ArticleUpdate, Comment, FavoriteState, NewArticle},
  store::{
    ArticlePage, ArticleQuery, ArticleStore as _, CommentStore as _, ProfileStore as _,
    UserStore as _,
  },
};

use crate::{Store, required, store_err};

/// Listing filters as a client names them: authors and favoriters by
/// username. An unknown username matches nothing.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
  pub tag:       Option<String>,
  pub author:    Option<String>,
  pub favorited: Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

pub struct ArticleService<S> {
  store: Arc<S>,
}

impl<S> Clone for ArticleService<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: Store> ArticleService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ─── Helpers ───────────────────────────────────────────────────────────────

  async fn fetch(&self, id: ArticleId) -> Result<Article> {
    self
      .store
      .get_article(id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound("article".into()))
  }

  async fn user_id_for(&self, username: &str) -> Result<Option<UserId>> {
    let user = self.store.find_by_username(username).await.map_err(store_err)?;
    Ok(user.map(|u| u.user_id))
  }

  /// Fill in `favorited` and `author.following` for the current caller.
  async fn personalize(&self, articles: &mut [Article]) -> Result<()> {
    let Some(viewer) = principal::current_or_anonymous().user_id() else {
      return Ok(());
    };
    if articles.is_empty() {
      return Ok(());
    }

    let ids: Vec<ArticleId> = articles.iter().map(|a| a.article_id).collect();
    let authors: Vec<UserId> = articles.iter().map(Article::author_id).collect();
    let favorited = self
      .store
      .favorites_status(viewer, &ids)
      .await
      .map_err(store_err)?;
    let following = self
      .store
      .following_status(viewer, &authors)
      .await
      .map_err(store_err)?;

    for ((article, favorited), following) in articles.iter_mut().zip(favorited).zip(following) {
      article.favorited = favorited;
      article.author.following = following;
    }
    Ok(())
  }

  async fn personalize_comments(&self, comments: &mut [Comment]) -> Result<()> {
    let Some(viewer) = principal::current_or_anonymous().user_id() else {
      return Ok(());
    };
    if comments.is_empty() {
      return Ok(());
    }

    let authors: Vec<UserId> = comments.iter().map(Comment::author_id).collect();
    let following = self
      .store
      .following_status(viewer, &authors)
      .await
      .map_err(store_err)?;
    for (comment, following) in comments.iter_mut().zip(following) {
      comment.author.following = following;
    }
    Ok(())
  }

  async fn page(&self, query: ArticleQuery) -> Result<ArticlePage> {
    let mut page = self.store.list_articles(&query).await.map_err(store_err)?;
    self.personalize(&mut page.articles).await?;
    Ok(page)
  }

  /// Re-read the article after a favorite operation, taking the flag and
  /// counter from the operation's own transaction.
  async fn with_favorite_state(
    &self,
    me:    UserId,
    id:    ArticleId,
    state: FavoriteState,
  ) -> Result<Article> {
    let mut article = self.fetch(id).await?;
    article.favorited = state.favorited;
    article.favorites_count = state.favorites_count;
    article.author.following = self
      .store
      .is_following(me, article.author_id())
      .await
      .map_err(store_err)?;
    Ok(article)
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get(&self, id: ArticleId) -> Result<Article> {
    let mut article = self.fetch(id).await?;
    self.personalize(std::slice::from_mut(&mut article)).await?;
    Ok(article)
  }

  pub async fn list(&self, filter: ArticleFilter) -> Result<ArticlePage> {
    let mut query = ArticleQuery {
      tag: filter.tag,
      limit: filter.limit,
      offset: filter.offset,
      ..Default::default()
    };
    if let Some(name) = filter.author.as_deref() {
      match self.user_id_for(name).await? {
        Some(id) => query.author = Some(id),
        None => return Ok(ArticlePage::default()),
      }
    }
    if let Some(name) = filter.favorited.as_deref() {
      match self.user_id_for(name).await? {
        Some(id) => query.favorited_by = Some(id),
        None => return Ok(ArticlePage::default()),
      }
    }
    self.page(query).await
  }

  /// Articles by authors the caller follows, newest first.
  pub async fn feed(&self, limit: Option<usize>, offset: Option<usize>) -> Result<ArticlePage> {
    let me = principal::current()?;
    self
      .page(ArticleQuery { followed_by: Some(me), limit, offset, ..Default::default() })
      .await
  }

  pub async fn tags(&self) -> Result<Vec<String>> {
    self.store.list_tags().await.map_err(store_err)
  }

  // ─── Writes ────────────────────────────────────────────────────────────────

  pub async fn create(&self, input: NewArticle) -> Result<Article> {
    let me = principal::current()?;
    required("title", &input.title)?;
    required("body", &input.body)?;

    let article = self.store.create_article(me, input).await.map_err(store_err)?;
    tracing::info!(article_id = %article.article_id, author = %me, "article created");
    Ok(article)
  }

  pub async fn update(&self, id: ArticleId, update: ArticleUpdate) -> Result<Article> {
    let me = principal::current()?;
    if let Some(title) = update.title.as_deref() {
      required("title", title)?;
    }
    if let Some(body) = update.body.as_deref() {
      required("body", body)?;
    }

    let article = self.fetch(id).await?;
    ensure_owner(&article, me)?;
    let mut updated = self
      .store
      .update_article(&article, update)
      .await
      .map_err(store_err)?;
    self.personalize(std::slice::from_mut(&mut updated)).await?;
    Ok(updated)
  }

  pub async fn delete(&self, id: ArticleId) -> Result<()> {
    let me = principal::current()?;
    let article = self.fetch(id).await?;
    ensure_owner(&article, me)?;
    self.store.delete_article(&article).await.map_err(store_err)?;
    tracing::info!(article_id = %id, "article deleted");
    Ok(())
  }

  // ─── Favorites ─────────────────────────────────────────────────────────────

  pub async fn favorite(&self, id: ArticleId) -> Result<Article> {
    let me = principal::current()?;
    let state = self.store.favorite(me, id).await.map_err(store_err)?;
    self.with_favorite_state(me, id, state).await
  }

  pub async fn unfavorite(&self, id: ArticleId) -> Result<Article> {
    let me = principal::current()?;
    let state = self.store.unfavorite(me, id).await.map_err(store_err)?;
    self.with_favorite_state(me, id, state).await
  }

  pub async fn toggle_favorite(&self, id: ArticleId) -> Result<Article> {
    let me = principal::current()?;
    let state = self.store.toggle_favorite(me, id).await.map_err(store_err)?;
    self.with_favorite_state(me, id, state).await
  }

  // ─── Comments ──────────────────────────────────────────────────────────────

  pub async fn add_comment(&self, article: ArticleId, body: &str) -> Result<Comment> {
    let me = principal::current()?;
    let body = required("body", body)?;
    self
      .store
      .add_comment(me, article, body.to_owned())
      .await
      .map_err(store_err)
  }

  pub async fn list_comments(&self, article: ArticleId) -> Result<Vec<Comment>> {
    self.fetch(article).await?;
    let mut comments = self.store.list_comments(article).await.map_err(store_err)?;
    self.personalize_comments(&mut comments).await?;
    Ok(comments)
  }

  /// Delete a comment on `article`. A comment that belongs to another
  /// article is reported as not found.
  pub async fn delete_comment(&self, article: ArticleId, id: CommentId) -> Result<()> {
    let me = principal::current()?;
    let comment = self
      .store
      .get_comment(id)
      .await
      .map_err(store_err)?
      .filter(|c| c.article_id == article)
      .ok_or_else(|| Error::NotFound("comment".into()))?;
    ensure_owner(&comment, me)?;
    self.store.delete_comment(&comment).await.map_err(store_err)?;
    Ok(())
  }
}
