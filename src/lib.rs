// Library surface for the binary and for headless/integration tests.
pub mod api;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod leaderboard;
pub mod lifecycle;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod throttle;
pub mod typing_policy;
pub mod words;
