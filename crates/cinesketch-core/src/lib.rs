//! Cinesketch core: types, errors, configuration, and helpers shared by the
//! provider adapters and the studio orchestrator.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod wav;

pub use error::{Disposition, ErrorKind, ProviderError};
pub use types::{ImageSize, InlineImage, PromptIdea, ProviderId, UsageRecord};
