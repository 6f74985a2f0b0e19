pub mod client;
pub mod config;
pub mod error;
pub mod pages;
pub mod proxy;
pub mod rewrite;
pub mod routes;
pub mod state;
