// FILES
pub const CONFIG_FILE_PATH: &str = "data/config.toml";
pub const RECIPIENTS_FILE_PATH: &str = "address.txt";
pub const LOGS_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "autosender";
pub const LOG_FILE_SUFFIX: &str = "log";

// DEFAULTS
pub const DEFAULT_RPC_URL: &str = "https://tea-sepolia.g.alchemy.com/public";
pub const DEFAULT_MIN_AMOUNT: &str = "0.001";
pub const DEFAULT_MAX_AMOUNT: &str = "0.01";
pub const DEFAULT_INTERVAL_MINUTES: u64 = 1;
pub const MAX_INTERVAL_MINUTES: u64 = u64::MAX / 60;
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.tea.xyz";
pub const DEFAULT_TOKEN_SYMBOL: &str = "TEA";

// TRANSFERS
pub const NATIVE_TRANSFER_GAS_LIMIT: u64 = 21_000;
pub const REQUIRED_CONFIRMATIONS: u64 = 1;
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

// RPC retry layer: max rate limit retries, initial backoff ms, compute units per second
pub const RPC_MAX_RETRIES: u32 = 10;
pub const RPC_INITIAL_BACKOFF_MS: u64 = 500;
pub const RPC_COMPUTE_UNITS_PER_SECOND: u64 = 330;
