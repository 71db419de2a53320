use crate::{Time, UserId};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    /// Generates a fresh identifier, unique across the whole comment collection
    pub fn unique() -> CommentId {
        CommentId(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> PostId {
        PostId(id.into())
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields persisted for a comment
///
/// The author's name is not stored, it is joined from the user directory at
/// read time.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: Time,
}

/// A comment as stored by the backend
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentRecord {
    #[serde(rename = "$id")]
    pub id: CommentId,

    #[serde(flatten)]
    pub fields: NewComment,
}

impl CommentRecord {
    pub fn with_user_name(self, user_name: String) -> Comment {
        Comment {
            id: self.id,
            post_id: self.fields.post_id,
            user_id: self.fields.user_id,
            user_name,
            content: self.fields.content,
            created_at: self.fields.created_at,
        }
    }
}

/// A comment as displayed, with its author's name resolved
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "$id")]
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub user_name: String,
    pub content: String,
    pub created_at: Time,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_differ() {
        let a = CommentId::unique();
        let b = CommentId::unique();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 32);
    }

    #[test]
    fn record_wire_format() {
        let rec: CommentRecord = serde_json::from_value(serde_json::json!({
            "$id": "c1",
            "postId": "p1",
            "userId": "u1",
            "content": "hello",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "$collectionId": "comments",
        }))
        .expect("parsing comment record");
        assert_eq!(rec.id, CommentId(String::from("c1")));
        assert_eq!(rec.fields.post_id, PostId::new("p1"));
        assert_eq!(rec.fields.user_id, UserId::new("u1"));
        assert_eq!(rec.fields.content, "hello");

        let comment = rec.with_user_name(String::from("Alice"));
        assert_eq!(comment.user_name, "Alice");
        assert_eq!(comment.content, "hello");
    }
}
