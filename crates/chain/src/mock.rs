//! In-memory [`ChainAdapter`] for tests: blocks, head state and post
//! content are plain maps the test sets up front.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex
};

use hivemind_types::Block;

use crate::adapter::{AdapterError, ChainAdapter, PostContent};

#[derive(Default)]
struct Inner {
    blocks:       BTreeMap<u32, Block>,
    head:         u32,
    irreversible: u32,
    head_time:    String,
    content:      HashMap<(String, String), PostContent>
}

#[derive(Default)]
pub struct MockAdapter {
    inner: Mutex<Inner>
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block and advance both head and irreversible height to it.
    pub fn push_irreversible(&self, block: Block) {
        let num = block.num().expect("mock block id");
        let mut inner = self.inner.lock().unwrap();
        inner.head = inner.head.max(num);
        inner.irreversible = inner.irreversible.max(num);
        inner.head_time = block.timestamp.clone();
        inner.blocks.insert(num, block);
    }

    /// Insert a block without touching the advertised heights.
    pub fn stage_block(&self, block: Block) {
        let num = block.num().expect("mock block id");
        self.inner.lock().unwrap().blocks.insert(num, block);
    }

    pub fn set_head(&self, head: u32) {
        self.inner.lock().unwrap().head = head;
    }

    pub fn set_head_time(&self, time: &str) {
        self.inner.lock().unwrap().head_time = time.to_string();
    }

    pub fn set_content(&self, author: &str, permlink: &str, content: PostContent) {
        self.inner
            .lock()
            .unwrap()
            .content
            .insert((author.to_string(), permlink.to_string()), content);
    }
}

#[async_trait::async_trait]
impl ChainAdapter for MockAdapter {
    async fn head_block(&self) -> Result<u32, AdapterError> {
        Ok(self.inner.lock().unwrap().head)
    }

    async fn last_irreversible_block_num(&self) -> Result<u32, AdapterError> {
        Ok(self.inner.lock().unwrap().irreversible)
    }

    async fn head_time(&self) -> Result<String, AdapterError> {
        Ok(self.inner.lock().unwrap().head_time.clone())
    }

    async fn get_block(&self, num: u32) -> Result<Option<Block>, AdapterError> {
        Ok(self.inner.lock().unwrap().blocks.get(&num).cloned())
    }

    async fn get_blocks_range(&self, lo: u32, hi: u32) -> Result<Vec<Block>, AdapterError> {
        let inner = self.inner.lock().unwrap();
        (lo..hi)
            .map(|num| {
                inner
                    .blocks
                    .get(&num)
                    .cloned()
                    .ok_or_else(|| AdapterError::Transient(format!("block {num} not yet available")))
            })
            .collect()
    }

    async fn get_content(
        &self,
        author: &str,
        permlink: &str
    ) -> Result<Option<PostContent>, AdapterError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .content
            .get(&(author.to_string(), permlink.to_string()))
            .cloned())
    }
}
