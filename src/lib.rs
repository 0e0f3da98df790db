pub mod analysis;
pub mod aws;
pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod resolve;
pub mod template;
