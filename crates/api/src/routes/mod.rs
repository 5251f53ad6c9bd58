//! HTTP route handlers.

pub mod app_settings;
pub mod customize_setting;
pub mod health;
pub mod users;
