// Library surface for headless/integration tests
// Expose internal modules so tests can drive capture and reporting without a TTY.

pub mod app_dirs;
pub mod capture;
pub mod email;
pub mod practice;
pub mod report;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod toggles;
