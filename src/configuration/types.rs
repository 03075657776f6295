//! Default values for [`Config`](super::Config) fields.

/// Executable looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_TSHARK_PATH: &str = "tshark";

pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const DEFAULT_PORT: u16 = 3000;

/// Wall-clock limit for file-based invocations. `0` disables the limit.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Extra time granted to a live capture on top of its requested duration.
pub const DEFAULT_CAPTURE_GRACE_SECS: u64 = 5;

/// Bound recorded for listing and statistics operations, which do not take
/// a `max_packets` argument.
pub const DEFAULT_LISTING_MAX_PACKETS: u64 = 5000;
