pub use chrono;
pub use uuid::Uuid;

pub type Time = chrono::DateTime<chrono::Utc>;

mod backend;
pub use backend::Backend;

mod comment;
pub use comment::{Comment, CommentId, CommentRecord, NewComment, PostId};

mod document;
pub use document::{CreateDocument, DocumentList};

mod error;
pub use error::Error;

mod query;
pub use query::{Filter, Order, Query};

mod user;
pub use user::{User, UserId};

/// Name of the comment field holding the owning post's id
pub const FIELD_POST_ID: &str = "postId";

/// Name of the comment field holding the author's id
pub const FIELD_USER_ID: &str = "userId";

/// Name of the comment field holding the creation timestamp
pub const FIELD_CREATED_AT: &str = "createdAt";

/// Checks the content of a comment before it is submitted
///
/// Callers run this before `add`, the comment store itself does not.
pub fn validate_content(content: &str) -> Result<(), Error> {
    if content.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}
