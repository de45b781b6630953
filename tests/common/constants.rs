//! Shared constants for end-to-end tests

/// Regular test user (created in every test database)
pub const TEST_USER: &str = "alice";
pub const TEST_PASS: &str = "alice-password";

/// Second test user, for ownership and notification scenarios
pub const OTHER_USER: &str = "bob";
pub const OTHER_PASS: &str = "bob-password";

/// How long to wait for the test server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
