use std::{
    collections::{btree_map, BTreeMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use snapgram_api::{
    Backend, CommentId, CommentRecord, Error, Filter, NewComment, Order, Query, User, UserId,
    FIELD_CREATED_AT, FIELD_POST_ID, FIELD_USER_ID,
};

mod http;
pub use http::{router, MockCollections};

/// In-memory model of the document service
pub struct MockServer {
    users: BTreeMap<UserId, User>,

    // in insertion order
    comments: Vec<CommentRecord>,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            comments: Vec::new(),
        }
    }

    /// Return the current number of comments, across all posts
    pub fn test_num_comments(&self) -> usize {
        self.comments.len()
    }

    pub fn admin_create_user(&mut self, u: User) -> Result<(), Error> {
        match self.users.entry(u.id.clone()) {
            btree_map::Entry::Occupied(_) => Err(Error::AlreadyExists(u.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(u);
                Ok(())
            }
        }
    }

    pub fn admin_delete_user(&mut self, id: &UserId) -> Result<(), Error> {
        self.users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.0.clone()))
    }

    pub fn create_comment(
        &mut self,
        id: CommentId,
        data: NewComment,
    ) -> Result<CommentRecord, Error> {
        if self.comments.iter().any(|c| c.id == id) {
            return Err(Error::AlreadyExists(id.0));
        }
        let record = CommentRecord { id, fields: data };
        self.comments.push(record.clone());
        Ok(record)
    }

    pub fn query_comments(&self, q: &Query) -> Result<Vec<CommentRecord>, Error> {
        for f in &q.filters {
            match f {
                Filter::Equal(attr, _) if attr == FIELD_POST_ID || attr == FIELD_USER_ID => (),
                Filter::Equal(attr, _) => return Err(Error::InvalidQuery(attr.clone())),
            }
        }
        let mut res = self
            .comments
            .iter()
            .filter(|c| {
                q.filters.iter().all(|f| match f {
                    Filter::Equal(attr, value) if attr == FIELD_POST_ID => {
                        c.fields.post_id.0 == *value
                    }
                    Filter::Equal(_, value) => c.fields.user_id.0 == *value,
                })
            })
            .cloned()
            .collect::<Vec<_>>();
        match &q.order {
            None => (),
            Some(Order::Asc(attr)) if attr == FIELD_CREATED_AT => {
                res.sort_by_key(|c| c.fields.created_at)
            }
            Some(Order::Desc(attr)) if attr == FIELD_CREATED_AT => {
                res.sort_by(|a, b| b.fields.created_at.cmp(&a.fields.created_at))
            }
            Some(Order::Asc(attr)) | Some(Order::Desc(attr)) => {
                return Err(Error::InvalidQuery(attr.clone()))
            }
        }
        if let Some(limit) = q.limit {
            res.truncate(limit);
        }
        Ok(res)
    }

    pub fn get_comment(&self, id: &CommentId) -> Result<CommentRecord, Error> {
        self.comments
            .iter()
            .find(|c| c.id == *id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.0.clone()))
    }

    pub fn delete_comment(&mut self, id: &CommentId) -> Result<(), Error> {
        match self.comments.iter().position(|c| c.id == *id) {
            Some(idx) => {
                self.comments.remove(idx);
                Ok(())
            }
            None => Err(Error::NotFound(id.0.clone())),
        }
    }

    pub fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.0.clone()))
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

#[derive(Default)]
struct Faults {
    fail_creates: bool,
    fail_queries: bool,
    fail_deletes: bool,
    failing_users: HashSet<UserId>,
    latency: Option<Duration>,
}

struct Shared {
    server: Mutex<MockServer>,
    faults: Mutex<Faults>,
    lookups_in_flight: AtomicUsize,
    max_lookups_in_flight: AtomicUsize,
}

/// A `MockServer` usable as a `Backend`, with failure injection
#[derive(Clone)]
pub struct MockBackend(Arc<Shared>);

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockBackend {
    pub fn new() -> MockBackend {
        MockBackend(Arc::new(Shared {
            server: Mutex::new(MockServer::new()),
            faults: Mutex::new(Faults::default()),
            lookups_in_flight: AtomicUsize::new(0),
            max_lookups_in_flight: AtomicUsize::new(0),
        }))
    }

    /// Run `f` on the underlying server state
    pub fn with_server<R>(&self, f: impl FnOnce(&mut MockServer) -> R) -> R {
        f(&mut self.0.server.lock())
    }

    pub fn add_user(&self, id: &str, name: &str) {
        self.with_server(|s| {
            s.admin_create_user(User {
                id: UserId::new(id),
                name: String::from(name),
            })
        })
        .unwrap_or_else(|e| panic!("adding user {id}: {e}"))
    }

    pub fn fail_creates(&self, fail: bool) {
        self.0.faults.lock().fail_creates = fail;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.0.faults.lock().fail_queries = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.0.faults.lock().fail_deletes = fail;
    }

    /// Make lookups of `user` fail as if the service was unreachable
    pub fn fail_lookups_of(&self, user: UserId) {
        self.0.faults.lock().failing_users.insert(user);
    }

    /// Delay every request by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.0.faults.lock().latency = latency;
    }

    /// Highest number of user lookups that were running at the same time
    pub fn max_concurrent_lookups(&self) -> usize {
        self.0.max_lookups_in_flight.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = self.0.faults.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn injected(what: &str) -> anyhow::Error {
        anyhow::Error::new(Error::Unknown(format!("injected {what} failure")))
    }
}

impl Default for MockBackend {
    fn default() -> MockBackend {
        MockBackend::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn create_comment(
        &self,
        id: CommentId,
        data: NewComment,
    ) -> anyhow::Result<CommentRecord> {
        self.delay().await;
        if self.0.faults.lock().fail_creates {
            return Err(Self::injected("create"));
        }
        Ok(self.with_server(|s| s.create_comment(id, data))?)
    }

    async fn query_comments(&self, query: Query) -> anyhow::Result<Vec<CommentRecord>> {
        self.delay().await;
        if self.0.faults.lock().fail_queries {
            return Err(Self::injected("query"));
        }
        Ok(self.with_server(|s| s.query_comments(&query))?)
    }

    async fn delete_comment(&self, id: &CommentId) -> anyhow::Result<()> {
        self.delay().await;
        if self.0.faults.lock().fail_deletes {
            return Err(Self::injected("delete"));
        }
        Ok(self.with_server(|s| s.delete_comment(id))?)
    }

    async fn get_user(&self, id: &UserId) -> anyhow::Result<User> {
        let now = self.0.lookups_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.0.lookups_in_flight);
        self.0.max_lookups_in_flight.fetch_max(now, Ordering::SeqCst);
        self.delay().await;
        if self.0.faults.lock().failing_users.contains(id) {
            tracing::debug!(?id, "injecting user lookup failure");
            return Err(Self::injected("lookup"));
        }
        Ok(self.with_server(|s| s.get_user(id))?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use snapgram_api::PostId;

    use super::*;

    fn comment(post: &str, user: &str, content: &str, secs: i64) -> NewComment {
        NewComment {
            post_id: PostId::new(post),
            user_id: UserId::new(user),
            content: String::from(content),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn ids_are_unique_across_posts() {
        let mut s = MockServer::new();
        let id = CommentId::unique();
        s.create_comment(id.clone(), comment("p1", "u1", "a", 1))
            .expect("first creation");
        assert_eq!(
            s.create_comment(id.clone(), comment("p2", "u1", "b", 2)),
            Err(Error::AlreadyExists(id.0)),
        );
        assert_eq!(s.test_num_comments(), 1);
    }

    #[test]
    fn query_filters_and_sorts() {
        let mut s = MockServer::new();
        for (post, content, secs) in [("p1", "late", 30), ("p2", "other", 10), ("p1", "early", 5)] {
            s.create_comment(CommentId::unique(), comment(post, "u1", content, secs))
                .expect("creating comment");
        }
        let res = s
            .query_comments(&Query::comments_of(&PostId::new("p1")))
            .expect("querying comments");
        let contents = res.iter().map(|c| &c.fields.content as &str).collect::<Vec<_>>();
        assert_eq!(contents, vec!["early", "late"]);

        let mut q = Query::comments_of(&PostId::new("p1"));
        q.order = Some(Order::Desc(String::from(FIELD_CREATED_AT)));
        q.limit = Some(1);
        let res = s.query_comments(&q).expect("querying comments");
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].fields.content, "late");

        q.filters = vec![Filter::Equal(String::from("content"), String::from("late"))];
        assert!(matches!(s.query_comments(&q), Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn delete_missing_comment() {
        let mut s = MockServer::new();
        let id = CommentId::unique();
        assert_eq!(s.delete_comment(&id), Err(Error::NotFound(id.0.clone())));
        let created = s
            .create_comment(id.clone(), comment("p1", "u1", "a", 1))
            .expect("creating comment");
        assert_eq!(s.get_comment(&id), Ok(created));
        assert_eq!(s.delete_comment(&id), Ok(()));
        assert_eq!(s.get_comment(&id), Err(Error::NotFound(id.0.clone())));
        assert_eq!(s.delete_comment(&id), Err(Error::NotFound(id.0.clone())));
    }

    #[tokio::test]
    async fn injected_failures_are_api_errors() {
        let b = MockBackend::new();
        b.add_user("u1", "Alice");
        assert_eq!(
            b.get_user(&UserId::new("u1")).await.expect("getting user").name,
            "Alice"
        );
        b.fail_lookups_of(UserId::new("u1"));
        let err = b.get_user(&UserId::new("u1")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Unknown(_))));
        let err = b.get_user(&UserId::new("u2")).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::NotFound(String::from("u2")))
        );
        assert_eq!(b.max_concurrent_lookups(), 1);
    }
}
