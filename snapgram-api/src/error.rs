use anyhow::{anyhow, Context};
use serde_json::json;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Document not found {0}")]
    NotFound(String),

    #[error("Document already exists {0}")]
    AlreadyExists(String),

    #[error("Invalid query {0:?}")]
    InvalidQuery(String),

    #[error("Comment content is empty")]
    EmptyContent,
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        let code = self.status_code().as_u16();
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "code": code,
                "type": "general_unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "code": code,
                "type": "user_unauthorized",
            }),
            Error::NotFound(id) => json!({
                "message": "document not found",
                "code": code,
                "type": "document_not_found",
                "id": id,
            }),
            Error::AlreadyExists(id) => json!({
                "message": "a document with the requested id already exists",
                "code": code,
                "type": "document_already_exists",
                "id": id,
            }),
            Error::InvalidQuery(q) => json!({
                "message": "invalid query",
                "code": code,
                "type": "general_query_invalid",
                "query": q,
            }),
            Error::EmptyContent => json!({
                "message": "comment content is empty",
                "code": code,
                "type": "comment_empty",
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let string_field = |name: &str| {
            data.get(name)
                .and_then(|s| s.as_str())
                .map(String::from)
                .unwrap_or_default()
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "general_unknown" => Error::Unknown(string_field("message")),
                "user_unauthorized" => Error::PermissionDenied,
                "document_not_found" | "user_not_found" => Error::NotFound(string_field("id")),
                "document_already_exists" => Error::AlreadyExists(string_field("id")),
                "general_query_invalid" => Error::InvalidQuery(string_field("query")),
                "comment_empty" => Error::EmptyContent,
                // the backend has many more error kinds than the comments care about
                _ => Error::Unknown(string_field("message")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        for err in [
            Error::Unknown(String::from("boom")),
            Error::PermissionDenied,
            Error::NotFound(String::from("c1")),
            Error::AlreadyExists(String::from("c2")),
            Error::InvalidQuery(String::from("{}")),
            Error::EmptyContent,
        ] {
            assert_eq!(Error::parse(&err.contents()).expect("parsing error"), err);
        }
    }

    #[test]
    fn unknown_types_are_kept_as_unknown() {
        let body = br#"{"message":"rate limited","code":429,"type":"general_rate_limit_exceeded"}"#;
        assert_eq!(
            Error::parse(body).expect("parsing error"),
            Error::Unknown(String::from("rate limited"))
        );
        assert!(Error::parse(b"not json").is_err());
        assert!(Error::parse(br#"{"message":"no type"}"#).is_err());
    }
}
