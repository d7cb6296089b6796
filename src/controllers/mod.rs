pub mod auth_controller;
pub mod menu_controller;
