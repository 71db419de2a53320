use snapgram_api::{Comment, CommentId, PostId};

/// One view's local copy of the comments of a post
///
/// It only ever changes from the results of this view's own operations, and
/// is not notified of anything another view or user does. Two lists for the
/// same post may thus differ until each is refreshed with `replace`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentList {
    post: PostId,
    comments: Vec<Comment>,
}

impl CommentList {
    pub fn new(post: PostId) -> CommentList {
        CommentList {
            post,
            comments: Vec::new(),
        }
    }

    pub fn post(&self) -> &PostId {
        &self.post
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == *id)
    }

    /// Takes the result of a listing as the new contents
    pub fn replace(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
    }

    /// Appends the result of an add, if there is one
    ///
    /// The new comment goes last without re-sorting, even if comments of
    /// other users were created in between. Returns whether the list changed.
    pub fn apply_added(&mut self, added: Option<Comment>) -> bool {
        match added {
            Some(c) if c.post_id == self.post => {
                self.comments.push(c);
                true
            }
            Some(c) => {
                tracing::warn!(
                    comment_post = %c.post_id,
                    list_post = %self.post,
                    "ignoring comment added to another post"
                );
                false
            }
            None => false,
        }
    }

    /// Removes `id` if its deletion succeeded. Returns whether the list changed.
    pub fn apply_deleted(&mut self, id: &CommentId, deleted: bool) -> bool {
        if !deleted {
            return false;
        }
        let len_before = self.comments.len();
        self.comments.retain(|c| c.id != *id);
        self.comments.len() != len_before
    }
}
