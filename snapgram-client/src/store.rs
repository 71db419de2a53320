use std::{cmp, future::Future};

use chrono::Utc;
use futures::StreamExt;
use snapgram_api::{Backend, Comment, CommentId, NewComment, PostId, Query, UserId};

use crate::{Error, StoreConfig};

/// Comments of posts, as stored by a `Backend`
///
/// The `try_*` methods report what went wrong. The others log the error and
/// return a sentinel instead (empty list, `None`, `false`), after which the
/// caller must leave its local copy of the comments untouched.
pub struct CommentStore<B> {
    backend: B,
    config: StoreConfig,
}

impl<B: Backend> CommentStore<B> {
    pub fn new(backend: B) -> CommentStore<B> {
        Self::with_config(backend, StoreConfig::default())
    }

    pub fn with_config(backend: B, config: StoreConfig) -> CommentStore<B> {
        CommentStore { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(res) => res.map_err(Error::from_backend),
            Err(_) => Err(Error::Timeout(self.config.timeout)),
        }
    }

    async fn resolve_name(&self, user: &UserId) -> String {
        if user.is_empty() {
            tracing::warn!("comment has no author id, using fallback name");
            return self.config.fallback_name.clone();
        }
        match self.bounded(self.backend.get_user(user)).await {
            Ok(u) if !u.name.is_empty() => u.name,
            Ok(_) => {
                tracing::warn!(%user, "comment author has an empty name");
                self.config.fallback_name.clone()
            }
            Err(err) => {
                tracing::warn!(%user, "failed to resolve comment author: {:?}", err);
                self.config.fallback_name.clone()
            }
        }
    }

    /// Lists the comments of `post`, oldest first
    ///
    /// Only the listing itself can fail: authors that cannot be resolved get
    /// the fallback name.
    pub async fn try_list(&self, post: &PostId) -> Result<Vec<Comment>, Error> {
        let records = self
            .bounded(self.backend.query_comments(Query::comments_of(post)))
            .await?;
        let width = cmp::max(1, self.config.max_concurrent_lookups);
        let comments = futures::stream::iter(records)
            .map(|r| async move {
                let name = self.resolve_name(&r.fields.user_id).await;
                r.with_user_name(name)
            })
            .buffered(width)
            .collect::<Vec<_>>()
            .await;
        tracing::debug!(%post, num_comments = comments.len(), "listed comments");
        Ok(comments)
    }

    pub async fn list(&self, post: &PostId) -> Vec<Comment> {
        match self.try_list(post).await {
            Ok(comments) => comments,
            Err(err) => {
                tracing::error!("failed to list comments of post {post}: {:?}", err);
                Vec::new()
            }
        }
    }

    /// Adds a comment to `post`
    ///
    /// `content` is not validated here, see `snapgram_api::validate_content`.
    /// The returned comment carries `user_name` as given, the backend does
    /// not store it.
    pub async fn try_add(
        &self,
        post: &PostId,
        user: &UserId,
        user_name: &str,
        content: &str,
    ) -> Result<Comment, Error> {
        let id = CommentId::unique();
        let data = NewComment {
            post_id: post.clone(),
            user_id: user.clone(),
            content: String::from(content),
            created_at: Utc::now(),
        };
        let record = self
            .bounded(self.backend.create_comment(id, data))
            .await?;
        tracing::debug!(%post, comment = %record.id, "added comment");
        Ok(record.with_user_name(String::from(user_name)))
    }

    pub async fn add(
        &self,
        post: &PostId,
        user: &UserId,
        user_name: &str,
        content: &str,
    ) -> Option<Comment> {
        match self.try_add(post, user, user_name, content).await {
            Ok(comment) => Some(comment),
            Err(err) => {
                tracing::error!("failed to add comment to post {post}: {:?}", err);
                None
            }
        }
    }

    /// Deletes a comment, whoever its author is
    pub async fn try_delete(&self, id: &CommentId) -> Result<(), Error> {
        self.bounded(self.backend.delete_comment(id)).await?;
        tracing::debug!(comment = %id, "deleted comment");
        Ok(())
    }

    pub async fn delete(&self, id: &CommentId) -> bool {
        match self.try_delete(id).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("failed to delete comment {id}: {:?}", err);
                false
            }
        }
    }
}
