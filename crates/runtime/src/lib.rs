//! Process plumbing shared by the binaries: shutdown handling, health checks and request
//! rate limiting.

/// `/health` route
pub mod health;
/// Per-client request limiter
pub mod rate_limiter;
/// Signal handling and task draining
pub mod shutdown;
