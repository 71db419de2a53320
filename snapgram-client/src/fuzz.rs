#![cfg(test)]

use std::{collections::HashSet, panic::AssertUnwindSafe};

use chrono::{TimeZone, Utc};
use snapgram_api::{validate_content, CommentId, NewComment, PostId, UserId};
use snapgram_mock_server::MockBackend;

use crate::{CommentList, CommentStore, StoreConfig};

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            if std::env::var("RUST_LOG").is_ok() {
                let _ = tracing_subscriber::fmt::try_init();
            }
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

fn store() -> CommentStore<MockBackend> {
    CommentStore::with_config(MockBackend::new(), StoreConfig::default())
}

// keeps generated inputs to a size that runs quickly
fn first<T>(mut v: Vec<T>, n: usize) -> Vec<T> {
    v.truncate(n);
    v
}

do_tokio_test!(
    added_comment_is_listed,
    (String, String, String, String),
    |(post, user, name, content): (String, String, String, String)| async move {
        if validate_content(&content).is_err() {
            return;
        }
        let store = store();
        let (post, user) = (PostId(post), UserId(user));
        let call_time = Utc::now();
        let added = store
            .add(&post, &user, &name, &content)
            .await
            .expect("adding comment");
        assert_eq!(added.user_name, name);

        let listed = store.list(&post).await;
        let matching = listed
            .iter()
            .filter(|c| c.post_id == post && c.user_id == user && c.content == content)
            .collect::<Vec<_>>();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, added.id);
        assert!(matching[0].created_at >= call_time);
    }
);

do_tokio_test!(
    delete_removes_exactly_one,
    (Vec<String>, usize),
    |(contents, victim): (Vec<String>, usize)| async move {
        let contents = first(contents, 16);
        if contents.is_empty() {
            return;
        }
        let store = store();
        let post = PostId::new("p");
        let user = UserId::new("u");
        let mut ids = Vec::new();
        for c in &contents {
            let added = store.add(&post, &user, "name", c).await.expect("adding comment");
            ids.push(added.id);
        }
        let victim = ids.remove(victim % ids.len());
        assert!(store.delete(&victim).await);

        let listed = store
            .list(&post)
            .await
            .into_iter()
            .map(|c| c.id)
            .collect::<Vec<_>>();
        assert!(!listed.contains(&victim));
        assert_eq!(listed, ids);
    }
);

do_tokio_test!(
    listing_is_sorted_by_creation,
    Vec<(u32, String)>,
    |comments: Vec<(u32, String)>| async move {
        let store = store();
        let post = PostId::new("p");
        let mut seen = HashSet::new();
        for (secs, content) in first(comments, 32) {
            if !seen.insert(secs) {
                continue;
            }
            let data = NewComment {
                post_id: post.clone(),
                user_id: UserId::new("u"),
                content,
                created_at: Utc.timestamp_opt(i64::from(secs), 0).unwrap(),
            };
            store
                .backend()
                .with_server(|s| s.create_comment(CommentId::unique(), data))
                .expect("creating comment");
        }
        let listed = store.list(&post).await;
        assert_eq!(listed.len(), seen.len());
        assert!(listed
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));
    }
);

do_tokio_test!(
    unresolved_authors_do_not_fail_listing,
    Vec<(bool, bool)>,
    |authors: Vec<(bool, bool)>| async move {
        let store = store();
        let post = PostId::new("p");
        let mut expected = Vec::new();
        for (i, (known, failing)) in first(authors, 16).into_iter().enumerate() {
            let user = UserId(format!("u{i}"));
            if known {
                store.backend().add_user(&user.0, "Known");
            }
            if failing {
                store.backend().fail_lookups_of(user.clone());
            }
            store
                .add(&post, &user, "Given", "text")
                .await
                .expect("adding comment");
            expected.push(match known && !failing {
                true => "Known",
                false => "Unknown User",
            });
        }
        let names = store
            .list(&post)
            .await
            .into_iter()
            .map(|c| c.user_name)
            .collect::<Vec<_>>();
        assert_eq!(names, expected);
    }
);

do_tokio_test!(
    failed_add_leaves_no_phantom,
    (Vec<String>, String),
    |(existing, content): (Vec<String>, String)| async move {
        let store = store();
        let post = PostId::new("p");
        let user = UserId::new("u");
        for c in first(existing, 8) {
            store.add(&post, &user, "name", &c).await.expect("adding comment");
        }
        let mut local = CommentList::new(post.clone());
        local.replace(store.list(&post).await);
        let before = local.clone();

        store.backend().fail_creates(true);
        let added = store.add(&post, &user, "name", &content).await;
        assert_eq!(added, None);
        assert!(!local.apply_added(added));
        assert_eq!(local, before);

        store.backend().fail_creates(false);
        assert_eq!(store.list(&post).await, before.comments());
    }
);

do_tokio_test!(
    delete_of_unknown_id_is_harmless,
    (Vec<String>, String),
    |(existing, unknown): (Vec<String>, String)| async move {
        let store = store();
        let post = PostId::new("p");
        let user = UserId::new("u");
        for c in first(existing, 8) {
            store.add(&post, &user, "name", &c).await.expect("adding comment");
        }
        let before = store.list(&post).await;
        let unknown = CommentId(unknown);
        if before.iter().any(|c| c.id == unknown) {
            return;
        }
        assert!(!store.delete(&unknown).await);
        assert!(!store.delete(&unknown).await);
        assert_eq!(store.list(&post).await, before);
    }
);
