pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod tools;
