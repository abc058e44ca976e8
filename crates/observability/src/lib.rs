//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init();
}

/// Install a compact subscriber that writes through the test harness, so logs
/// only show up for failing tests. Safe to call from every test.
pub fn init_for_tests() {
    subscriber::init_for_tests();
}

/// Subscriber configuration (filters, formatters).
pub mod subscriber;
