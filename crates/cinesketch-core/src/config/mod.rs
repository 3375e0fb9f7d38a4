//! Configuration system: schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use cinesketch_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Analyze model: {}", cfg.providers.gemini.analyze_model);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_config_path, load_config, save_config};
pub use schema::{Config, DoubaoConfig, GeminiConfig, OpenAiConfig, RetryConfig, TimeoutConfig};
