/// Middleware for the API server
///
/// - `rate_limit`: fixed-window request limiting keyed by client address

pub mod rate_limit;
