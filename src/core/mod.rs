//! Core functionality for line storage, command classification, file
//! operations, and configuration

pub mod command;
pub mod config;
pub mod file_system;
pub mod line_store;
