pub mod config;
pub mod domain;
pub mod error;
pub mod eutils;
pub mod fetcher;
pub mod output;
