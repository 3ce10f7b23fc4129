pub mod admin;
pub mod api;
mod config;
pub mod db;

pub use config::Config;
