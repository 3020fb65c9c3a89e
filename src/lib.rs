// ABOUTME: Library module for ocdskingfisher-views
// ABOUTME: Exports configuration resolution, commands and database helpers

pub mod commands;
pub mod config;
pub mod error;
pub mod pgpass;
pub mod postgres;
pub mod utils;
pub mod views;
