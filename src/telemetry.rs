//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder; without one, all metric
//! calls are no-ops.
//!
//! All metrics are prefixed with `acebot_`. Counters end in `_total`.

/// Requests finished by the rotator.
///
/// Labels: `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "acebot_requests_total";

/// Times the rotator moved off a credential after a failure.
///
/// Labels: `reason` ("invalid" | "rate_limited" | "overloaded" | "other").
pub const ROTATIONS_TOTAL: &str = "acebot_rotations_total";

/// Credentials added to the blacklist.
pub const BLACKLISTED_TOTAL: &str = "acebot_blacklisted_credentials_total";

/// Response cache hits.
///
/// Labels: `kind`.
pub const CACHE_HITS_TOTAL: &str = "acebot_cache_hits_total";

/// Response cache misses.
///
/// Labels: `kind`.
pub const CACHE_MISSES_TOTAL: &str = "acebot_cache_misses_total";

/// Full cache wipes after the store ran out of quota.
pub const CACHE_WIPES_TOTAL: &str = "acebot_cache_wipes_total";
