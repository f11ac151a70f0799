pub mod api;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod identity;
pub mod models;
pub mod services;
pub mod state;
pub mod validation;
