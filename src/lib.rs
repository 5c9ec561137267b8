//! jitflow - JIT liquidity candidate analytics over a polled swap feed

pub mod analytics;
pub mod config;
pub mod driver;
pub mod feed;
pub mod sink;
