pub mod cli;
pub mod config;
pub mod database;
pub mod dns;
pub mod error;
pub mod handlers;
pub mod hestia;
pub mod middleware;
pub mod provisioning;
pub mod server;
pub mod services;
pub mod types;

#[cfg(test)]
pub mod testing;
