//! Constants used throughout the Quill market-making engine.

/// Maximum number of book depth levels carried in a `MarketTick`
pub const MAX_DEPTH_LEVELS: usize = 10;

/// Number of exponential kernels in the Hawkes intensity engine
pub const KERNEL_COUNT: usize = 4;

/// Input dimension of the microstructure feature vector
pub const FEATURE_DIM: usize = 12;

/// Nanoseconds per microsecond
pub const NS_PER_US: u64 = 1_000;

/// Nanoseconds per millisecond
pub const NS_PER_MS: u64 = 1_000_000;

/// Nanoseconds per second
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Default fixed inference latency in nanoseconds
pub const DEFAULT_FIXED_LATENCY_NS: i64 = 400;

/// Maximum elapsed time fed into kernel decay, in seconds.
/// Larger gaps underflow exp(-beta * dt) for the fast kernels.
pub const MAX_HAWKES_DT_SECS: f64 = 60.0;

/// Excitation accumulators below this are snapped back to zero
pub const HAWKES_EPSILON: f64 = 1e-12;

/// Uniform guard against division by near-zero in feature extraction
pub const DIV_EPSILON: f64 = 1e-10;

/// Default per-side quote size in contracts
pub const DEFAULT_QUOTE_SIZE: f64 = 10.0;

/// Latency budget floor in microseconds
pub const MIN_LATENCY_BUDGET_US: f64 = 100.0;

/// Latency budget ceiling in microseconds
pub const MAX_LATENCY_BUDGET_US: f64 = 10_000.0;

/// Consecutive heartbeat timeouts before a venue is marked disconnected
pub const DISCONNECT_TIMEOUT_COUNT: u64 = 3;
