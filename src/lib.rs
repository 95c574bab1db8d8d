pub mod assets;
pub mod cache;
pub mod config;
pub mod database;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
pub mod web;
