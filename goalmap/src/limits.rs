// Ingestion limits for graphs arriving from share links and storage

// Graph size caps
pub const MAX_NODES: usize = 10_000;
pub const MAX_EDGES: usize = 40_000;
pub const MAX_TAGS_PER_NODE: usize = 64;

// Share tokens
pub const MAX_SHARE_TOKEN_BYTES: usize = 4 * 1024 * 1024;

// Id allocation
pub const MAX_ID_ATTEMPTS: usize = 8;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 = 10_000_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && (COORD_MIN..=COORD_MAX).contains(&x) }
