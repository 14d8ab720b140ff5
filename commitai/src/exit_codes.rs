//! Stable exit codes for commitai CLI commands.

/// Command succeeded; for batches, no group failed (skips are fine).
pub const OK: i32 = 0;
/// Fatal error before or instead of execution: bad input, empty batch,
/// config, git or reasoning-service failure.
pub const INVALID: i32 = 1;
/// The batch ran and at least one group failed.
pub const COMMIT_FAILED: i32 = 2;
