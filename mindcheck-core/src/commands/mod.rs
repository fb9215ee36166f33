// src/commands/mod.rs
pub mod init;
mod api;

pub use api::{Analysis, MindCheck};

pub use init::{ensure_root, InitReport};
