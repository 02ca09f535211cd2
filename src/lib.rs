pub mod auth;
pub mod background;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod server;
pub mod state;
pub mod validator;

#[cfg(test)]
pub mod testing;
