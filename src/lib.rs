//! DeviceVault Backend Library
//!
//! Wallet challenge/response authentication and the device intake API.

pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod maintenance;
pub mod middleware;
pub mod models;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
