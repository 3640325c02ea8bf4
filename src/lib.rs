pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod graphql;
pub mod memory;
pub mod models;
pub mod render;
pub mod services;
pub mod state;
pub mod storage;
