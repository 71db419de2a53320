use snapgram_api::{
    validate_content, Backend, Comment, CommentId, Error as ApiError, PostId, UserId,
};

use crate::{CommentList, CommentStore};

/// The signed-in user, as provided by the session
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
}

/// A comment section shown for one post, with its own copy of the comments
pub struct CommentSection<'s, B> {
    store: &'s CommentStore<B>,
    user: CurrentUser,
    list: CommentList,
}

impl<'s, B: Backend> CommentSection<'s, B> {
    pub fn new(store: &'s CommentStore<B>, post: PostId, user: CurrentUser) -> Self {
        CommentSection {
            store,
            user,
            list: CommentList::new(post),
        }
    }

    pub fn post(&self) -> &PostId {
        self.list.post()
    }

    pub fn comments(&self) -> &[Comment] {
        self.list.comments()
    }

    /// Whether the delete action is offered for `comment`
    pub fn can_delete(&self, comment: &Comment) -> bool {
        comment.user_id == self.user.id
    }

    /// Fetches the comments again, keeping the current ones if that fails
    pub async fn open(&mut self) -> bool {
        match self.store.try_list(self.list.post()).await {
            Ok(comments) => {
                self.list.replace(comments);
                true
            }
            Err(err) => {
                tracing::error!(
                    "failed to refresh comments of post {}: {:?}",
                    self.list.post(),
                    err
                );
                false
            }
        }
    }

    /// Posts `content` as the current user
    ///
    /// Returns whether the comment was added, or an error if `content` is not
    /// worth sending.
    pub async fn submit(&mut self, content: &str) -> Result<bool, ApiError> {
        validate_content(content)?;
        let added = self
            .store
            .add(self.list.post(), &self.user.id, &self.user.name, content)
            .await;
        Ok(self.list.apply_added(added))
    }

    /// Deletes one of the current user's comments
    pub async fn remove(&mut self, id: &CommentId) -> Result<bool, ApiError> {
        match self.list.get(id) {
            None => return Err(ApiError::NotFound(id.0.clone())),
            Some(c) if !self.can_delete(c) => return Err(ApiError::PermissionDenied),
            Some(_) => (),
        }
        let deleted = self.store.delete(id).await;
        Ok(self.list.apply_deleted(id, deleted))
    }
}

#[cfg(test)]
mod tests {
    use snapgram_mock_server::MockBackend;

    use super::*;

    fn alice() -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: String::from("Alice"),
        }
    }

    fn bob() -> CurrentUser {
        CurrentUser {
            id: UserId::new("u2"),
            name: String::from("Bob"),
        }
    }

    fn store() -> CommentStore<MockBackend> {
        let backend = MockBackend::new();
        backend.add_user("u1", "Alice");
        backend.add_user("u2", "Bob");
        CommentStore::new(backend)
    }

    #[tokio::test]
    async fn empty_content_is_not_sent() {
        let store = store();
        let mut section = CommentSection::new(&store, PostId::new("p1"), alice());
        assert_eq!(section.submit("   ").await, Err(ApiError::EmptyContent));
        assert_eq!(store.backend().with_server(|s| s.test_num_comments()), 0);
        assert!(section.comments().is_empty());
    }

    #[tokio::test]
    async fn sections_diverge_until_reopened() {
        let store = store();
        let mut card = CommentSection::new(&store, PostId::new("p1"), alice());
        let mut details = CommentSection::new(&store, PostId::new("p1"), bob());
        assert!(card.open().await);
        assert!(details.open().await);

        assert_eq!(card.submit("from the card").await, Ok(true));
        assert_eq!(card.comments().len(), 1);
        assert_eq!(details.comments().len(), 0);

        assert!(details.open().await);
        assert_eq!(details.comments(), card.comments());
    }

    #[tokio::test]
    async fn only_own_comments_can_be_removed() {
        let store = store();
        let mut mine = CommentSection::new(&store, PostId::new("p1"), alice());
        assert_eq!(mine.submit("hello").await, Ok(true));
        let id = mine.comments()[0].id.clone();

        let mut theirs = CommentSection::new(&store, PostId::new("p1"), bob());
        assert!(theirs.open().await);
        assert!(!theirs.can_delete(&theirs.comments()[0]));
        assert_eq!(theirs.remove(&id).await, Err(ApiError::PermissionDenied));
        assert!(matches!(
            theirs.remove(&CommentId::unique()).await,
            Err(ApiError::NotFound(_))
        ));

        assert_eq!(mine.remove(&id).await, Ok(true));
        assert!(mine.comments().is_empty());
        // bob's copy still shows it until refreshed
        assert_eq!(theirs.comments().len(), 1);
        assert!(theirs.open().await);
        assert!(theirs.comments().is_empty());
    }

    #[tokio::test]
    async fn failures_leave_the_section_untouched() {
        let store = store();
        let mut section = CommentSection::new(&store, PostId::new("p1"), alice());
        assert_eq!(section.submit("first").await, Ok(true));

        store.backend().fail_creates(true);
        assert_eq!(section.submit("second").await, Ok(false));
        assert_eq!(section.comments().len(), 1);

        store.backend().fail_deletes(true);
        let id = section.comments()[0].id.clone();
        assert_eq!(section.remove(&id).await, Ok(false));
        assert_eq!(section.comments().len(), 1);

        store.backend().fail_queries(true);
        assert!(!section.open().await);
        assert_eq!(section.comments().len(), 1);
    }
}
