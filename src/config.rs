//! # Configuration Constants
//!
//! Default values and environment names used throughout chansweep.

/// Network and API configuration
pub mod network {
    use std::time::Duration;

    /// Default Esplora-compatible explorer API
    pub const DEFAULT_API_URL: &str = "https://blockstream.info/api";

    /// Request timeout for network operations
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default bitcoind RPC host
    pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";

    /// Default bitcoind RPC port
    pub const DEFAULT_RPC_PORT: &str = "8332";

    /// Default RPC username
    pub const DEFAULT_RPC_USER: &str = "user";

    /// Default RPC password
    pub const DEFAULT_RPC_PASSWORD: &str = "password";
}

/// Sweep operation constants
pub mod sweep {
    /// Default fee rate for the sweep transaction in sat/vByte.
    pub const DEFAULT_FEE_RATE: u16 = 2;

    /// Default upper bound for the CSV delay search, roughly two weeks
    /// of blocks. Old channels negotiated delays well below this.
    pub const DEFAULT_CSV_LIMIT: u16 = 2016;

    /// Minimum relay value for the P2WPKH sweep output in satoshis.
    pub const P2WPKH_DUST_LIMIT: u64 = 294;
}

/// File paths and names
pub mod files {
    /// Directory summary reports are written to
    pub const RESULTS_DIR: &str = "results";
}

/// Environment variable names
pub mod env {
    /// RPC URL override
    pub const RPC_URL: &str = "RPC_URL";

    /// RPC port override
    pub const RPC_PORT: &str = "RPC_PORT";

    /// RPC username override
    pub const RPC_USER: &str = "RPC_USER";

    /// RPC password override
    pub const RPC_PASSWORD: &str = "RPC_PASSWORD";
}
