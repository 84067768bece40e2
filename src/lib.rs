pub mod chat;
pub mod config;
pub mod detector;
pub mod error;
pub mod handlers;
pub mod models;
pub mod preview;
pub mod state;
