#![forbid(unsafe_code)]

pub mod app;
pub mod browse;
pub mod cli;
pub mod compile;
pub mod demo;
pub mod formats;
pub mod json_file;
pub mod library;
pub mod logging;
pub mod naming;
pub mod progress;
pub mod reader;
pub mod session;
pub mod transcript;
