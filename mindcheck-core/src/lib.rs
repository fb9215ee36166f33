//! MindCheck core: classify journal entries, keep them per subject and turn a
//! subject's history into insight reports.

pub mod commands;
pub mod config;
pub mod services;
pub mod utils;

pub use affect;
pub use commands::{Analysis, MindCheck};
pub use config::CoreConfig;
