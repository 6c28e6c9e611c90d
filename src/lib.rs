pub mod command;
pub mod config;
pub mod format;
pub mod probe;
pub mod system;
