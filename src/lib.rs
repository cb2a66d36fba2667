// src/lib.rs

pub mod config;
pub mod content;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod scoring;
pub mod speech;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_router;
