pub mod commands;
pub mod config;
pub mod context;
pub mod export;
pub mod http;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod transactions;
pub mod wallet;
