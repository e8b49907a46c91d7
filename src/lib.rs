pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod reconcile;
pub mod security;
pub mod services;
pub mod state;
