pub mod app_state;
pub mod clients;
pub mod collection;
pub mod config;
pub mod drafts;
pub mod models;
pub mod session;
