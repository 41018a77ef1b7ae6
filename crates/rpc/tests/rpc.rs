//! Read-façade behavior against a projected store.

use std::sync::Arc;

use hivemind_chain::mock::MockAdapter;
use hivemind_indexer::{projector, PermissivePolicy};
use hivemind_rpc::{api::HiveApiServer, HiveApi};
use hivemind_store::{post_cache::CachedPost, posts, Store};
use hivemind_types::{Block, Operation, SignedTransaction};
use serde_json::{json, Value};

fn block(num: u32, timestamp: &str, ops: Vec<(&str, Value)>) -> Block {
    Block {
        block_id:     format!("{num:08x}{:032x}", num as u64),
        previous:     format!("{:08x}{:032x}", num - 1, (num - 1) as u64),
        timestamp:    timestamp.to_string(),
        transactions: vec![SignedTransaction {
            operations: ops
                .into_iter()
                .map(|(kind, body)| Operation(kind.to_string(), body))
                .collect()
        }]
    }
}

fn follow(actor: &str, body: Value) -> (&'static str, Value) {
    ("custom_json", json!({
        "id": "follow",
        "required_posting_auths": [actor],
        "required_active_auths": [],
        "json": body.to_string()
    }))
}

async fn seeded_api() -> (HiveApi, Store) {
    let store = Store::in_memory().await.unwrap();
    store.ensure_schema().await.unwrap();

    let blocks = [
        block(1, "2016-03-24T16:05:00", vec![
            ("account_create", json!({ "new_account_name": "alice" })),
            (
                "comment",
                json!({
                    "author": "alice", "permlink": "hello",
                    "parent_author": "", "parent_permlink": "life",
                    "json_metadata": "{}"
                })
            ),
        ]),
        block(2, "2016-03-24T16:05:03", vec![
            follow("carol", json!(["follow", {
                "follower": "carol", "following": "alice", "what": ["blog"]
            }])),
            follow("dave", json!(["follow", {
                "follower": "dave", "following": "alice", "what": ["blog"]
            }])),
        ]),
        block(3, "2016-03-24T16:05:06", vec![
            follow("eve", json!(["reblog", {
                "account": "eve", "author": "alice", "permlink": "hello"
            }])),
            follow("carol", json!(["follow", {
                "follower": "carol", "following": "eve", "what": ["blog"]
            }])),
        ]),
    ];

    let mut tx = store.begin().await.unwrap();
    for b in &blocks {
        projector::process_block(&mut tx, b, &PermissivePolicy)
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let adapter = Arc::new(MockAdapter::new());
    adapter.set_head(10);
    (HiveApi::new(store.clone(), adapter), store)
}

#[tokio::test]
async fn head_state_reports_lag() {
    let (api, store) = seeded_api().await;
    let state = api.head_state().await.unwrap();
    assert_eq!(state.chain, 10);
    assert_eq!(state.db, store.db_last_block().await.unwrap());
    assert_eq!(state.diff, 7);
}

#[tokio::test]
async fn followers_and_counts_reflect_follow_state() {
    let (api, _store) = seeded_api().await;

    let followers = api
        .get_followers("alice".into(), None, None)
        .await
        .unwrap();
    assert_eq!(followers.len(), 2);
    assert!(followers.contains(&"carol".to_string()));
    assert!(followers.contains(&"dave".to_string()));

    let count = api.get_follow_count("alice".into()).await.unwrap();
    assert_eq!(count.follower_count, 2);
    assert_eq!(count.following_count, 0);

    let following = api
        .get_following("carol".into(), None, None)
        .await
        .unwrap();
    assert_eq!(following.len(), 2);
}

#[tokio::test]
async fn blog_feed_lists_roots_and_reblogs() {
    let (api, _store) = seeded_api().await;

    let alice_blog = api.get_blog_feed("alice".into(), None, None).await.unwrap();
    assert_eq!(alice_blog.len(), 1);
    assert_eq!(alice_blog[0].author, "alice");
    assert_eq!(alice_blog[0].permlink, "hello");

    // eve's blog carries the reblog of alice's post
    let eve_blog = api.get_blog_feed("eve".into(), None, None).await.unwrap();
    assert_eq!(eve_blog.len(), 1);
    assert_eq!(eve_blog[0].author, "alice");
}

#[tokio::test]
async fn user_feed_merges_followed_accounts() {
    let (api, _store) = seeded_api().await;

    // carol follows alice and eve; alice's post appears once even though
    // eve also reblogged it
    let feed = api.get_user_feed("carol".into(), None, None).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].author, "alice");
    assert_eq!(feed[0].permlink, "hello");

    // dave follows only alice
    let feed = api.get_user_feed("dave".into(), None, None).await.unwrap();
    assert_eq!(feed.len(), 1);

    // eve follows nobody
    let feed = api.get_user_feed("eve".into(), None, None).await.unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn pagination_caps_and_skips() {
    let (api, _store) = seeded_api().await;

    let first = api
        .get_followers("alice".into(), None, Some(1))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let rest = api
        .get_followers("alice".into(), Some(1), Some(1))
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert_ne!(first[0], rest[0]);

    let none = api
        .get_followers("alice".into(), Some(2), Some(1))
        .await
        .unwrap();
    assert!(none.is_empty());
}

fn comment(author: &str, permlink: &str, category: &str) -> (&'static str, Value) {
    ("comment", json!({
        "author": author, "permlink": permlink,
        "parent_author": "", "parent_permlink": category,
        "json_metadata": "{}"
    }))
}

/// Store with three cached root posts: two by alice under "life", one by
/// bob under "photos"; alice's first post already paid out.
async fn discussion_api() -> HiveApi {
    let store = Store::in_memory().await.unwrap();
    store.ensure_schema().await.unwrap();

    let b = block(1, "2016-03-24T16:05:00", vec![
        ("account_create", json!({ "new_account_name": "alice" })),
        ("account_create", json!({ "new_account_name": "bob" })),
        comment("alice", "hello", "life"),
        comment("alice", "second", "life"),
        comment("bob", "world", "photos"),
    ]);
    let mut tx = store.begin().await.unwrap();
    projector::process_block(&mut tx, &b, &PermissivePolicy)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut conn = store.conn().await.unwrap();
    let cached = [
        ("alice", "hello", "Hello", 10.0, true, 3.0),
        ("alice", "second", "Second", 1.5, false, 2.0),
        ("bob", "world", "World", 5.0, false, 1.0),
    ];
    for (author, permlink, title, payout, is_paidout, sc_trend) in cached {
        let post = posts::by_url(&mut conn, author, permlink)
            .await
            .unwrap()
            .unwrap();
        hivemind_store::post_cache::upsert(&mut conn, &CachedPost {
            post_id: post.id,
            author: author.to_string(),
            permlink: permlink.to_string(),
            title: title.to_string(),
            payout,
            payout_at: "2016-04-01T00:00:00".to_string(),
            is_paidout,
            sc_trend,
            sc_hot: sc_trend,
            ..Default::default()
        })
        .await
        .unwrap();
    }
    drop(conn);

    HiveApi::new(store, Arc::new(MockAdapter::new()))
}

#[tokio::test]
async fn discussions_sort_by_payout_and_trending() {
    let api = discussion_api().await;

    let by_payout = api
        .get_discussions("payout".into(), None, None, None)
        .await
        .unwrap();
    let permlinks: Vec<&str> = by_payout.iter().map(|d| d.permlink.as_str()).collect();
    assert_eq!(permlinks, vec!["hello", "world", "second"]);

    let trending = api
        .get_discussions("trending".into(), None, None, None)
        .await
        .unwrap();
    let permlinks: Vec<&str> = trending.iter().map(|d| d.permlink.as_str()).collect();
    assert_eq!(permlinks, vec!["hello", "second", "world"]);
    assert_eq!(trending[0].title, "Hello");
}

#[tokio::test]
async fn discussions_filter_by_tag() {
    let api = discussion_api().await;

    let life = api
        .get_discussions("payout".into(), Some("life".into()), None, None)
        .await
        .unwrap();
    assert_eq!(life.len(), 2);
    assert!(life.iter().all(|d| d.author == "alice"));

    let photos = api
        .get_discussions("created".into(), Some("photos".into()), None, None)
        .await
        .unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].permlink, "world");
}

#[tokio::test]
async fn unknown_sort_is_rejected() {
    let api = discussion_api().await;
    assert!(api
        .get_discussions("promoted".into(), None, None, None)
        .await
        .is_err());
}

#[tokio::test]
async fn related_posts_share_author_and_category() {
    let api = discussion_api().await;

    let related = api
        .get_related_posts("alice".into(), "hello".into())
        .await
        .unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].permlink, "second");

    // unknown posts relate to nothing
    let none = api
        .get_related_posts("ghost".into(), "nothing".into())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn payout_stats_sum_closed_payouts() {
    let api = discussion_api().await;
    let stats = api.get_payout_stats().await.unwrap();
    // only alice/hello is paid out, and long before any 24h window
    assert_eq!(stats.total, 10.0);
    assert_eq!(stats.last_24h, 0.0);
}
