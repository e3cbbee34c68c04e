pub mod config;
pub mod runner;

pub use config::SessionConfig;
pub use runner::{Runner, SlotSource};
