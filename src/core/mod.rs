pub mod capability;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod negotiation;
pub mod screen;
pub mod simulate;
