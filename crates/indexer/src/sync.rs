//! Sync driver: checkpoint replay, range backfill against the
//! irreversible height, then a live tail that trails the upstream head.
//! Exactly one driver may write to a store at a time.

use std::{
    cmp::min,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant}
};

use futures::Future;
use hivemind_chain::{AdapterError, ChainAdapter};
use hivemind_store::{post_cache, Store};
use hivemind_types::{Block, DirtySet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{cache, checkpoints, community::CommunityPolicy, projector, IndexerError};

/// Blocks per checkpoint-replay transaction.
const CHECKPOINT_CHUNK: usize = 250;
/// Blocks per backfill fetch window (and transaction).
const RANGE_WINDOW: u32 = 1000;
/// Pause between upstream polls and transient-failure retries.
const POLL_SLEEP: Duration = Duration::from_millis(500);
/// A live block taking longer than this is worth an operator's attention.
const SLOW_BLOCK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory scanned for `<end_block>.json.lst` files.
    pub checkpoints_dir: PathBuf,
    /// How far behind the upstream head the live tail stays.
    pub trail_blocks:    u32
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { checkpoints_dir: PathBuf::from("checkpoints"), trail_blocks: 2 }
    }
}

/// Owns the projection pipeline's collaborators for the lifetime of one
/// sync run.
pub struct SyncDriver {
    store:    Store,
    adapter:  Arc<dyn ChainAdapter>,
    policy:   Arc<dyn CommunityPolicy>,
    config:   SyncConfig,
    shutdown: CancellationToken
}

impl SyncDriver {
    pub fn new(
        store: Store,
        adapter: Arc<dyn ChainAdapter>,
        policy: Arc<dyn CommunityPolicy>,
        config: SyncConfig
    ) -> Self {
        Self { store, adapter, policy, config, shutdown: CancellationToken::new() }
    }

    /// Token that stops the driver: the in-flight block transaction
    /// completes (or rolls back) and the loops exit at their next sleep
    /// or chunk boundary.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the full pipeline: init, checkpoint replay, range backfill,
    /// initial-sync finalization, then follow the head until stopped.
    pub async fn run(&self) -> Result<(), IndexerError> {
        match self.run_inner().await {
            Err(IndexerError::Cancelled) => {
                info!(target: "sync", "stopped");
                Ok(())
            }
            other => other
        }
    }

    async fn run_inner(&self) -> Result<(), IndexerError> {
        if !self.store.has_schema().await? {
            info!(target: "sync", "no tables found, initializing db");
            self.store.ensure_schema().await?;
        }

        // batch cache updates until the very end of the first full sync
        let is_initial_sync = {
            let mut conn = self.store.conn().await?;
            post_cache::is_empty(&mut conn).await?
        };

        if is_initial_sync {
            info!(target: "sync", "initial sync");
        } else {
            // repair any partially-filled cache from an unclean exit
            cache::cache_missing_posts(&self.store, self.adapter.as_ref()).await?;
        }

        self.sync_from_checkpoints().await?;
        self.sync_from_chain(is_initial_sync).await?;

        if is_initial_sync {
            info!(target: "sync", "initial sync complete, building caches");
            cache::cache_missing_posts(&self.store, self.adapter.as_ref()).await?;
            cache::rebuild_feed_cache(&self.store).await?;
        }

        self.listen().await
    }

    /// Replay local checkpoint files up to their highest end block,
    /// skipping whatever the store already has.
    async fn sync_from_checkpoints(&self) -> Result<(), IndexerError> {
        let mut last_block = self.store.db_last_block().await?;
        let files = checkpoints::checkpoint_files(&self.config.checkpoints_dir)?;

        let mut last_read = 0;
        for (num, path) in files {
            if last_block < num {
                info!(
                    target: "sync",
                    file = %path.display(), last_block, "loading checkpoint"
                );
                let skip = (last_block - last_read) as usize;
                self.sync_from_file(&path, skip, CHECKPOINT_CHUNK).await?;
                last_block = num;
            }
            last_read = num;
        }
        Ok(())
    }

    /// Stream one checkpoint file, one transaction per chunk of lines.
    async fn sync_from_file(
        &self,
        path: &Path,
        skip_lines: usize,
        chunk_size: usize
    ) -> Result<(), IndexerError> {
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut lines = reader.lines().skip(skip_lines);
        loop {
            self.bail_if_stopped()?;
            let chunk: Vec<String> = lines
                .by_ref()
                .take(chunk_size)
                .collect::<Result<_, _>>()?;
            if chunk.is_empty() {
                return Ok(())
            }
            let blocks = chunk
                .iter()
                .map(|line| serde_json::from_str(line))
                .collect::<Result<Vec<Block>, _>>()?;
            self.process_blocks(&blocks).await?;
        }
    }

    /// Backfill from the store's last block to the upstream's
    /// irreversible height in fixed windows, one transaction per window.
    ///
    /// The loop condition intentionally leaves `ubound` itself to the
    /// live tail.
    async fn sync_from_chain(&self, is_initial_sync: bool) -> Result<(), IndexerError> {
        let mut dirty = DirtySet::new();
        let mut lbound = self.store.db_last_block().await? + 1;
        let ubound = self
            .retry(|| self.adapter.last_irreversible_block_num())
            .await?;

        info!(
            target: "sync",
            blocks = (ubound + 1).saturating_sub(lbound), from = lbound,
            "blocks to batch sync"
        );

        while lbound < ubound {
            self.bail_if_stopped()?;
            let to = min(lbound + RANGE_WINDOW, ubound);

            let fetch_started = Instant::now();
            let blocks = self.retry(|| self.adapter.get_blocks_range(lbound, to)).await?;
            let write_started = Instant::now();
            dirty.extend(self.process_blocks(&blocks).await?);
            let done = Instant::now();

            let count = (to - lbound) as f64;
            let rate = count / (done - fetch_started).as_secs_f64();
            info!(
                target: "sync",
                block = to - 1,
                blocks_per_sec = rate,
                rps = (count / (write_started - fetch_started).as_secs_f64()) as u64,
                wps = (count / (done - write_started).as_secs_f64()) as u64,
                remaining_min = (ubound - to) as f64 / rate / 60.0,
                "batch synced"
            );

            lbound = to;
        }

        // batch-update the post cache now that we are near the head
        if !is_initial_sync {
            let date = self.retry(|| self.adapter.head_time()).await?;
            let mut tx = self.store.begin().await?;

            let edited = cache::urls_to_tuples(&mut tx, &dirty).await?;
            info!(target: "sync", edits = edited.len(), "updating edited posts");
            cache::update_posts_batch(&mut tx, self.adapter.as_ref(), &edited, None).await?;

            let paidout = post_cache::select_paidout(&mut tx, &date).await?;
            info!(target: "sync", payouts = paidout.len(), %date, "processing payouts");
            cache::update_posts_batch(&mut tx, self.adapter.as_ref(), &paidout, Some(&date))
                .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    /// Follow the upstream head, `trail_blocks` behind, one block per
    /// transaction, verifying that each block links to the previous one.
    async fn listen(&self) -> Result<(), IndexerError> {
        let trail = self.config.trail_blocks;
        let mut curr_block = self.store.db_last_block().await?;
        let mut last_hash: Option<String> = None;

        loop {
            self.bail_if_stopped()?;
            curr_block += 1;

            // if trailing too close, take a pause
            if trail > 0 {
                loop {
                    let head = self.retry(|| self.adapter.head_block()).await?;
                    if curr_block + trail <= head {
                        break
                    }
                    self.idle(POLL_SLEEP).await?;
                }
            }

            // fetch the target block; if it does not exist yet, retry
            let block = loop {
                match self.adapter.get_block(curr_block).await {
                    Ok(Some(block)) => break block,
                    Ok(None) => {}
                    Err(AdapterError::Transient(err)) => {
                        warn!(target: "sync", %err, "upstream unavailable, retrying")
                    }
                    Err(err) => return Err(err.into())
                }
                self.idle(POLL_SLEEP).await?;
            };

            let num = block.num()?;

            // the received block must link to the last one we applied
            if let Some(have) = &last_hash {
                if *have != block.previous {
                    return Err(IndexerError::ForkDetected {
                        have:     have.clone(),
                        got:      block.previous.clone(),
                        block_id: block.block_id.clone()
                    })
                }
            }
            last_hash = Some(block.block_id.clone());

            let started = Instant::now();
            let mut tx = self.store.begin().await?;

            let dirty = projector::process_block(&mut tx, &block, self.policy.as_ref()).await?;
            let edited = cache::urls_to_tuples(&mut tx, &dirty).await?;
            cache::update_posts_batch(
                &mut tx,
                self.adapter.as_ref(),
                &edited,
                Some(&block.timestamp)
            )
            .await?;

            let paidout = post_cache::select_paidout(&mut tx, &block.timestamp).await?;
            cache::update_posts_batch(
                &mut tx,
                self.adapter.as_ref(),
                &paidout,
                Some(&block.timestamp)
            )
            .await?;

            tx.commit().await?;

            info!(
                target: "sync",
                num,
                time = %block.timestamp,
                txs = block.transactions.len(),
                edits = edited.len(),
                payouts = paidout.len(),
                "got block"
            );

            let took = started.elapsed();
            if took > SLOW_BLOCK {
                warn!(target: "sync", num, ?took, "slow block");
            }
        }
    }

    /// Apply a batch of blocks in one transaction, in ascending order,
    /// and collect the posts they touched.
    async fn process_blocks(&self, blocks: &[Block]) -> Result<DirtySet, IndexerError> {
        let mut dirty = DirtySet::new();
        let mut tx = self.store.begin().await?;
        for block in blocks {
            dirty.extend(projector::process_block(&mut tx, block, self.policy.as_ref()).await?);
        }
        tx.commit().await?;
        Ok(dirty)
    }

    /// Retry an adapter call while its failures stay transient.
    async fn retry<T, F, Fut>(&self, mut call: F) -> Result<T, IndexerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AdapterError>>
    {
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(AdapterError::Transient(err)) => {
                    warn!(target: "sync", %err, "upstream unavailable, retrying");
                    self.idle(POLL_SLEEP).await?;
                }
                Err(err) => return Err(err.into())
            }
        }
    }

    /// Sleep, or bail out early when a stop was requested.
    async fn idle(&self, duration: Duration) -> Result<(), IndexerError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(IndexerError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(())
        }
    }

    fn bail_if_stopped(&self) -> Result<(), IndexerError> {
        if self.shutdown.is_cancelled() {
            return Err(IndexerError::Cancelled)
        }
        Ok(())
    }
}
