// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod achievements;
pub mod annotation;
pub mod app_dirs;
pub mod article;
pub mod celebration;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod history;
pub mod runtime;
pub mod session;
pub mod store;
pub mod util;
