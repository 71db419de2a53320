use async_trait::async_trait;

use crate::{CommentId, CommentRecord, NewComment, Query, User, UserId};

/// The remote document service holding the comment and user collections
///
/// Errors reported by the service itself are `crate::Error`s, that callers
/// can recover with `anyhow::Error::downcast_ref`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Persists a new comment under the caller-generated `id`
    async fn create_comment(&self, id: CommentId, data: NewComment)
        -> anyhow::Result<CommentRecord>;

    async fn query_comments(&self, query: Query) -> anyhow::Result<Vec<CommentRecord>>;

    async fn delete_comment(&self, id: &CommentId) -> anyhow::Result<()>;

    /// Looks up a record of the user directory
    async fn get_user(&self, id: &UserId) -> anyhow::Result<User>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    async fn create_comment(
        &self,
        id: CommentId,
        data: NewComment,
    ) -> anyhow::Result<CommentRecord> {
        (**self).create_comment(id, data).await
    }

    async fn query_comments(&self, query: Query) -> anyhow::Result<Vec<CommentRecord>> {
        (**self).query_comments(query).await
    }

    async fn delete_comment(&self, id: &CommentId) -> anyhow::Result<()> {
        (**self).delete_comment(id).await
    }

    async fn get_user(&self, id: &UserId) -> anyhow::Result<User> {
        (**self).get_user(id).await
    }
}
