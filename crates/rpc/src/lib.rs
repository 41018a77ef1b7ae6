//! Read-only JSON-RPC façade over the derived tables. It consumes
//! `db_last_block()` and the projector-owned tables and never writes.

pub mod api;
mod impls;
pub mod types;

pub use impls::HiveApi;
