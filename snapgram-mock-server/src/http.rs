use axum::{
    extract::{Path, Query as QueryParams, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use snapgram_api::{
    Backend, CommentId, CommentRecord, CreateDocument, DocumentList, Error, NewComment, Query,
    User, UserId,
};

use crate::MockBackend;

/// Collection ids the router answers for
#[derive(Clone, Debug)]
pub struct MockCollections {
    pub database: String,
    pub comments: String,
    pub users: String,
}

#[derive(Clone)]
struct RouterState {
    backend: MockBackend,
    collections: MockCollections,
}

struct ErrorResponse(Error);

impl From<anyhow::Error> for ErrorResponse {
    fn from(err: anyhow::Error) -> ErrorResponse {
        match err.downcast::<Error>() {
            Ok(err) => ErrorResponse(err),
            Err(err) => ErrorResponse(Error::Unknown(format!("{err:#}"))),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        tracing::info!("returning error to client: {}", self.0);
        (self.0.status_code(), self.0.contents()).into_response()
    }
}

impl RouterState {
    fn check(&self, db: &str, coll: &str, expected: &str) -> Result<(), ErrorResponse> {
        if db != self.collections.database || coll != expected {
            return Err(ErrorResponse(Error::NotFound(format!("{db}/{coll}"))));
        }
        Ok(())
    }
}

/// Serves `backend` over the same HTTP interface the real document service exposes
pub fn router(backend: MockBackend, collections: MockCollections) -> Router {
    Router::new()
        .route(
            "/databases/:db/collections/:coll/documents",
            post(create_document).get(list_documents),
        )
        .route(
            "/databases/:db/collections/:coll/documents/:id",
            get(get_document).delete(delete_document),
        )
        .with_state(RouterState {
            backend,
            collections,
        })
}

async fn create_document(
    State(state): State<RouterState>,
    Path((db, coll)): Path<(String, String)>,
    Json(body): Json<CreateDocument<NewComment>>,
) -> Result<(StatusCode, Json<CommentRecord>), ErrorResponse> {
    state.check(&db, &coll, &state.collections.comments)?;
    let record = state
        .backend
        .create_comment(CommentId(body.document_id), body.data)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_documents(
    State(state): State<RouterState>,
    Path((db, coll)): Path<(String, String)>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
) -> Result<Json<DocumentList<CommentRecord>>, ErrorResponse> {
    state.check(&db, &coll, &state.collections.comments)?;
    let clauses = params
        .iter()
        .filter(|(k, _)| k == "queries[]")
        .map(|(_, v)| v)
        .collect::<Vec<_>>();
    let query = Query::from_clauses(&clauses).map_err(ErrorResponse)?;
    let documents = state.backend.query_comments(query).await?;
    Ok(Json(DocumentList {
        total: documents.len(),
        documents,
    }))
}

async fn get_document(
    State(state): State<RouterState>,
    Path((db, coll, id)): Path<(String, String, String)>,
) -> Result<Response, ErrorResponse> {
    if coll == state.collections.comments {
        state.check(&db, &coll, &state.collections.comments)?;
        let record = state
            .backend
            .with_server(|s| s.get_comment(&CommentId(id)))
            .map_err(ErrorResponse)?;
        return Ok(Json(record).into_response());
    }
    state.check(&db, &coll, &state.collections.users)?;
    let user: User = state.backend.get_user(&UserId(id)).await?;
    Ok(Json(user).into_response())
}

async fn delete_document(
    State(state): State<RouterState>,
    Path((db, coll, id)): Path<(String, String, String)>,
) -> Result<StatusCode, ErrorResponse> {
    state.check(&db, &coll, &state.collections.comments)?;
    state.backend.delete_comment(&CommentId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
