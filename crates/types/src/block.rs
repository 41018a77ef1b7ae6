use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockIdError {
    #[error("block id `{0}` is shorter than 8 hex chars")]
    Truncated(String),
    #[error("block id `{0}` does not start with a hex block number")]
    NotHex(String)
}

/// An irreversible block as the upstream node serializes it. Timestamps
/// stay in the upstream's ISO-8601 string form; they are only ever
/// stored and compared, never re-interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_id:     String,
    pub previous:     String,
    pub timestamp:    String,
    pub transactions: Vec<SignedTransaction>
}

impl Block {
    /// Block height, encoded upstream as the 32-bit big-endian prefix of
    /// the block id.
    pub fn num(&self) -> Result<u32, BlockIdError> {
        let prefix = self
            .block_id
            .get(..8)
            .ok_or_else(|| BlockIdError::Truncated(self.block_id.clone()))?;
        u32::from_str_radix(prefix, 16).map_err(|_| BlockIdError::NotHex(self.block_id.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(default)]
    pub operations: Vec<Operation>
}

/// One `[op_type, body]` pair inside a transaction. The body is kept as
/// untyped JSON; extraction of semantic fields happens at classification
/// time so a malformed payload can never poison a whole block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation(pub String, pub Value);

impl Operation {
    pub fn kind(&self) -> &str {
        &self.0
    }

    pub fn body(&self) -> &Value {
        &self.1
    }
}
