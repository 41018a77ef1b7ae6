//! Applies one block's effects to the store. Callers wrap every call in a
//! transaction; nothing here commits.

use std::collections::HashSet;

use hivemind_store::{
    accounts, blocks, feed_cache, follows, post_cache, posts, reblogs, SqliteConnection
};
use hivemind_types::{is_valid_account_name, Block, DirtySet};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    community::CommunityPolicy,
    ops::{self, CommentOp, CustomJsonOp, DeleteCommentOp},
    IndexerError
};

/// Follow ops below this height may arrive as a bare object instead of
/// the `[cmd, data]` envelope.
const LEGACY_FOLLOW_WRAP_BLOCK: u32 = 6_000_000;
/// Community ops are not live before this height.
const COMMUNITY_START_BLOCK: u32 = 13_000_000;

/// Process a single block end-to-end and return the `(author, permlink)`
/// pairs its comments and votes touched.
pub async fn process_block(
    conn: &mut SqliteConnection,
    block: &Block,
    policy: &dyn CommunityPolicy
) -> Result<DirtySet, IndexerError> {
    let num = block.num()?;
    let date = block.timestamp.as_str();

    blocks::insert(
        conn,
        num,
        &block.block_id,
        &block.previous,
        block.transactions.len(),
        date
    )
    .await?;

    let ops = ops::gather(block);

    register_accounts(conn, &ops.accounts, date).await?;
    register_posts(conn, &ops.comments, date, policy).await?;
    delete_posts(conn, &ops.deletes).await?;
    apply_custom_json(conn, &ops.custom_json, num, date, policy).await?;

    Ok(ops.dirty)
}

/// Insert any names this block introduced. Names are stored as the
/// upstream presents them; validation happens where they are referenced.
async fn register_accounts(
    conn: &mut SqliteConnection,
    names: &HashSet<String>,
    date: &str
) -> Result<(), IndexerError> {
    for name in names {
        if accounts::id_by_name(conn, name).await?.is_none() {
            accounts::register(conn, name, date).await?;
        }
    }
    Ok(())
}

/// Register new posts and reinstate deleted ones; edits are left to the
/// dirty-set refresh.
async fn register_posts(
    conn: &mut SqliteConnection,
    comments: &[CommentOp],
    date: &str,
    policy: &dyn CommunityPolicy
) -> Result<(), IndexerError> {
    for op in comments {
        let reinstated = match posts::by_url(conn, &op.author, &op.permlink).await? {
            // the post exists and is live, thus this is an edit. ignore.
            Some(post) if !post.is_deleted => continue,
            // deleted post being re-registered (rare): keep its id
            Some(post) => Some(post.id),
            None => None
        };

        // parentage and inherited attributes
        let (parent_id, depth, category, mut community) = if op.parent_author.is_empty() {
            let community = ops::op_community(op).unwrap_or_else(|| op.author.clone());
            (None, 0, op.parent_permlink.clone(), community)
        } else {
            let Some(parent) =
                posts::parent_meta(conn, &op.parent_author, &op.parent_permlink).await?
            else {
                return Err(IndexerError::Integrity(format!(
                    "parent {}/{} missing for {}/{}",
                    op.parent_author, op.parent_permlink, op.author, op.permlink
                )))
            };
            (Some(parent.id), parent.depth + 1, parent.category, parent.community)
        };

        // community must name an existing account
        if !is_valid_account_name(&community)
            || accounts::id_by_name(conn, &community).await?.is_none()
        {
            debug!(
                target: "projector",
                author = %op.author, permlink = %op.permlink, %community,
                "unknown community, falling back to author"
            );
            community = op.author.clone();
        }

        let is_valid = policy.is_community_post_valid(&community, op);
        if !is_valid {
            info!(
                target: "projector",
                author = %op.author, permlink = %op.permlink, %community,
                "post rejected by community policy"
            );
        }

        let row = posts::NewPost {
            author: &op.author,
            permlink: &op.permlink,
            parent_id,
            category: &category,
            community: &community,
            depth,
            is_valid,
            created_at: date
        };

        let id = match reinstated {
            Some(id) => {
                posts::reinstate(conn, id, &row).await?;
                // a stale feed entry from the pre-delete life must not survive
                feed_cache::delete_entry(conn, &op.author, id).await?;
                id
            }
            None => posts::insert(conn, &row).await?
        };

        if depth == 0 {
            feed_cache::insert_ignore(conn, &op.author, id, date).await?;
        }
    }
    Ok(())
}

/// Mark posts deleted and evict them from both caches. A delete for a
/// post we never saw is a no-op.
async fn delete_posts(
    conn: &mut SqliteConnection,
    deletes: &[DeleteCommentOp]
) -> Result<(), IndexerError> {
    for op in deletes {
        let Some(post) = posts::by_url(conn, &op.author, &op.permlink).await? else {
            debug!(
                target: "projector",
                author = %op.author, permlink = %op.permlink,
                "delete for unknown post"
            );
            continue
        };
        posts::mark_deleted(conn, post.id).await?;
        post_cache::delete_post(conn, post.id).await?;
        feed_cache::delete_post(conn, post.id).await?;
    }
    Ok(())
}

/// Route `follow` and `com.steemit.community` custom-json ops. The sole
/// posting auth is the acting account every impersonation check runs
/// against.
async fn apply_custom_json(
    conn: &mut SqliteConnection,
    ops: &[CustomJsonOp],
    block_num: u32,
    date: &str,
    policy: &dyn CommunityPolicy
) -> Result<(), IndexerError> {
    for op in ops {
        if op.id != "follow" && op.id != "com.steemit.community" {
            continue
        }
        if op.required_posting_auths.len() != 1 {
            warn!(target: "projector", id = %op.id, auths = op.required_posting_auths.len(), "unexpected auths");
            continue
        }
        let account = op.required_posting_auths[0].as_str();
        let mut body: Value = serde_json::from_str(&op.json).unwrap_or_else(|_| json!({}));

        if op.id == "follow" {
            if block_num < LEGACY_FOLLOW_WRAP_BLOCK && !body.is_array() {
                // legacy compat
                body = json!(["follow", body]);
            }
            process_follow_op(conn, account, &body, date).await?;
        } else if block_num > COMMUNITY_START_BLOCK {
            policy.process_community_op(account, &body, date);
        }
    }
    Ok(())
}

/// Legacy follow-plugin ops: `["follow", {...}]` state changes and
/// `["reblog", {...}]` shares. Anything off-shape is skipped.
async fn process_follow_op(
    conn: &mut SqliteConnection,
    account: &str,
    body: &Value,
    date: &str
) -> Result<(), IndexerError> {
    let Some(pair) = body.as_array() else { return Ok(()) };
    if pair.len() != 2 {
        return Ok(())
    }
    let (Some(cmd), Some(data)) = (pair[0].as_str(), pair[1].as_object()) else {
        return Ok(())
    };

    match cmd {
        "follow" => {
            let Some(what) = data.get("what").and_then(Value::as_array) else {
                return Ok(())
            };
            let what = what.first().and_then(Value::as_str).unwrap_or("clear");
            let state = match what {
                "clear" => 0,
                "blog" => 1,
                "ignore" => 2,
                _ => return Ok(())
            };

            let follower = data.get("follower").and_then(Value::as_str);
            let following = data.get("following").and_then(Value::as_str);
            let (Some(follower), Some(following)) = (follower, following) else {
                warn!(target: "projector", %date, "bad follow op");
                return Ok(())
            };

            if follower != account {
                return Ok(()) // impersonation
            }
            if !is_valid_account_name(follower) || !is_valid_account_name(following) {
                return Ok(())
            }

            follows::upsert(conn, follower, following, state, date).await?;
        }
        "reblog" => {
            let blogger = data.get("account").and_then(Value::as_str);
            let author = data.get("author").and_then(Value::as_str);
            let permlink = data.get("permlink").and_then(Value::as_str);
            let (Some(blogger), Some(author), Some(permlink)) = (blogger, author, permlink)
            else {
                warn!(target: "projector", %date, "bad reblog op");
                return Ok(())
            };

            if blogger != account {
                return Ok(()) // impersonation
            }
            if !is_valid_account_name(author) || !is_valid_account_name(blogger) {
                return Ok(())
            }

            let Some((post_id, depth)) = posts::id_and_depth(conn, author, permlink).await? else {
                warn!(target: "projector", %author, %permlink, "reblog of unknown post");
                return Ok(())
            };
            if depth > 0 {
                return Ok(()) // only root posts can be reblogged
            }

            if data.get("delete").and_then(Value::as_str) == Some("delete") {
                reblogs::delete_one(conn, blogger, post_id).await?;
                feed_cache::delete_entry(conn, blogger, post_id).await?;
            } else {
                reblogs::insert_ignore(conn, blogger, post_id, date).await?;
                feed_cache::insert_ignore(conn, blogger, post_id, date).await?;
            }
        }
        _ => {}
    }
    Ok(())
}
