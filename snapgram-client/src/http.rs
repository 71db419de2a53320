use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use snapgram_api::{
    Backend, CommentId, CommentRecord, CreateDocument, DocumentList, Error as ApiError,
    NewComment, Query, User, UserId,
};

use crate::BackendConfig;

/// `Backend` reached over the document service's REST api
///
/// Reads and comment creations are retried on transient failures. A retried
/// creation whose first attempt did land gets `AlreadyExists` for its own id,
/// in which case the stored document is read back. Deletions are sent once,
/// as a retry could not tell a lost response from a missing comment.
pub struct HttpBackend {
    client: ClientWithMiddleware,
    once: ClientWithMiddleware,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> HttpBackend {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = reqwest::Client::new();
        let client = ClientBuilder::new(http.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        let once = ClientBuilder::new(http).build();
        HttpBackend {
            client,
            once,
            config,
        }
    }

    fn documents_url(&self, collection: &str, id: Option<&str>) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.config.endpoint)
            .with_context(|| format!("parsing endpoint {:?}", self.config.endpoint))?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("endpoint {:?} cannot take a path", self.config.endpoint))?
            .pop_if_empty()
            .extend([
                "databases",
                self.config.database_id.as_str(),
                "collections",
                collection,
                "documents",
            ])
            .extend(id);
        Ok(url)
    }

    fn authenticate(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("X-Appwrite-Project", &self.config.project_id);
        match &self.config.api_key {
            Some(key) => req.header("X-Appwrite-Key", key),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> anyhow::Result<reqwest::Response> {
        let resp = self
            .authenticate(req)
            .send()
            .await
            .with_context(|| format!("sending {what} request"))?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("reading error body of {what} response"))?;
        match ApiError::parse(&body) {
            Ok(err) => Err(anyhow::Error::new(err)),
            Err(parse_err) => Err(parse_err.context(format!(
                "{what} request failed with status {status}, body {body:?}"
            ))),
        }
    }

    async fn get_comment(&self, id: &CommentId) -> anyhow::Result<CommentRecord> {
        let url = self.documents_url(&self.config.comments_collection_id, Some(&id.0))?;
        self.send(self.client.get(url), "comment fetch")
            .await?
            .json()
            .await
            .context("parsing fetched comment")
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_comment(
        &self,
        id: CommentId,
        data: NewComment,
    ) -> anyhow::Result<CommentRecord> {
        let url = self.documents_url(&self.config.comments_collection_id, None)?;
        let req = self.client.post(url).json(&CreateDocument {
            document_id: id.0.clone(),
            data: data.clone(),
        });
        let err = match self.send(req, "comment creation").await {
            Ok(resp) => return resp.json().await.context("parsing created comment"),
            Err(err) => err,
        };
        if !matches!(err.downcast_ref::<ApiError>(), Some(ApiError::AlreadyExists(_))) {
            return Err(err);
        }
        // an earlier attempt may have been stored with its response lost
        match self.get_comment(&id).await {
            Ok(record) if record.fields == data => {
                tracing::debug!(%id, "comment creation was retried after being stored");
                Ok(record)
            }
            Ok(_) => Err(err),
            Err(fetch_err) => {
                tracing::warn!(%id, "failed to read back conflicting comment: {:?}", fetch_err);
                Err(err)
            }
        }
    }

    async fn query_comments(&self, query: Query) -> anyhow::Result<Vec<CommentRecord>> {
        let params = query
            .to_clauses()
            .into_iter()
            .map(|c| ("queries[]", c))
            .collect::<Vec<_>>();
        let url = self.documents_url(&self.config.comments_collection_id, None)?;
        let req = self.client.get(url).query(&params);
        let list: DocumentList<CommentRecord> = self
            .send(req, "comment listing")
            .await?
            .json()
            .await
            .context("parsing comment list")?;
        Ok(list.documents)
    }

    async fn delete_comment(&self, id: &CommentId) -> anyhow::Result<()> {
        let url = self.documents_url(&self.config.comments_collection_id, Some(&id.0))?;
        self.send(self.once.delete(url), "comment deletion").await?;
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> anyhow::Result<User> {
        let url = self.documents_url(&self.config.users_collection_id, Some(&id.0))?;
        self.send(self.client.get(url), "user lookup")
            .await?
            .json()
            .await
            .context("parsing user")
    }
}
