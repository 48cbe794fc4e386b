// Library for the binary and integration tests

pub mod assembler;
pub mod backend;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod output;
pub mod report;
pub mod series;
pub mod version;
