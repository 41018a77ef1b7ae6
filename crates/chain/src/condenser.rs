use futures::future::try_join_all;
use hivemind_types::Block;
use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params
};
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::{AdapterError, ChainAdapter, PostContent};

#[derive(Debug, Deserialize)]
struct DynamicGlobalProps {
    head_block_number:           u32,
    last_irreversible_block_num: u32,
    time:                        String
}

/// JSON-RPC adapter over the node's condenser API.
pub struct CondenserAdapter {
    client: HttpClient
}

impl CondenserAdapter {
    pub fn new(url: &str) -> Result<Self, AdapterError> {
        let client = HttpClientBuilder::default()
            .build(url)
            .map_err(|e| AdapterError::Transient(e.to_string()))?;
        Ok(Self { client })
    }

    async fn request(&self, method: &str, params: jsonrpsee::core::params::ArrayParams) -> Result<Value, AdapterError> {
        self.client
            .request(method, params)
            .await
            .map_err(|e: ClientError| AdapterError::Transient(e.to_string()))
    }

    async fn dynamic_global_properties(&self) -> Result<DynamicGlobalProps, AdapterError> {
        let raw = self
            .request("condenser_api.get_dynamic_global_properties", rpc_params![])
            .await?;
        Ok(serde_json::from_value(raw)?)
    }
}

#[async_trait::async_trait]
impl ChainAdapter for CondenserAdapter {
    async fn head_block(&self) -> Result<u32, AdapterError> {
        Ok(self.dynamic_global_properties().await?.head_block_number)
    }

    async fn last_irreversible_block_num(&self) -> Result<u32, AdapterError> {
        Ok(self
            .dynamic_global_properties()
            .await?
            .last_irreversible_block_num)
    }

    async fn head_time(&self) -> Result<String, AdapterError> {
        Ok(self.dynamic_global_properties().await?.time)
    }

    async fn get_block(&self, num: u32) -> Result<Option<Block>, AdapterError> {
        let raw = self.request("condenser_api.get_block", rpc_params![num]).await?;
        if raw.is_null() {
            return Ok(None)
        }
        Ok(Some(serde_json::from_value(raw)?))
    }

    async fn get_blocks_range(&self, lo: u32, hi: u32) -> Result<Vec<Block>, AdapterError> {
        let blocks = try_join_all((lo..hi).map(|num| self.get_block(num))).await?;
        blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                block.ok_or_else(|| {
                    AdapterError::Transient(format!("block {} not yet available", lo + i as u32))
                })
            })
            .collect()
    }

    async fn get_content(
        &self,
        author: &str,
        permlink: &str
    ) -> Result<Option<PostContent>, AdapterError> {
        let raw = self
            .request("condenser_api.get_content", rpc_params![author, permlink])
            .await?;
        if raw.is_null() {
            return Ok(None)
        }
        let content: PostContent = serde_json::from_value(raw)?;
        // the node answers with an empty shell (id 0) for unknown posts
        if content.id == 0 && content.author.is_empty() {
            return Ok(None)
        }
        Ok(Some(content))
    }
}
