pub mod api;
pub mod auth;
pub mod digest;
pub mod health;
pub mod pages;
pub mod serve;
pub mod settings;
pub mod themes;
pub mod users;
