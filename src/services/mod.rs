//! # Services Module
//!
//! External service integrations for chansweep.
//!
//! ## Components
//!
//! - **Explorer Client**: Esplora-compatible API for broadcast and
//!   output-spentness queries
//! - **RPC Client**: Bitcoin Core RPC broadcast path

pub mod explorer_client;
pub mod rpc_client;

pub use explorer_client::ExplorerApi;
pub use rpc_client::BitcoindClient;
