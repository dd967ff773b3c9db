// Time Provider Port - wall clock for per-request job timing

/// Clock used to time the jobs of one request
///
/// Executors read it once before and once after each job; the difference
/// goes into the job's completion log line.
pub trait TimeProvider: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;

    /// Milliseconds elapsed since `started_ms`, never negative
    fn elapsed_millis(&self, started_ms: i64) -> i64 {
        (self.now_millis() - started_ms).max(0)
    }
}

/// Wall clock backed by chrono
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
