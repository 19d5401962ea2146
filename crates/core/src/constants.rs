/// Quantity below which a lot is considered fully consumed.
pub const QUANTITY_EPSILON: &str = "0.00000001";

/// Minimum adjustment magnitude, in base-currency minor units, below which
/// a revaluation posts nothing.
pub const MATERIALITY_THRESHOLD: &str = "0.01";

/// Upper bound on concurrent price lookups during revaluation prefetch.
pub const PRICE_FETCH_CONCURRENCY: usize = 8;
