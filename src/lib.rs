pub mod commands;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod git;
pub mod replay;
pub mod utils;
