// src/core/mod.rs

pub mod env;
pub mod parsers;
pub mod settings;
pub mod tasks_file;
pub mod west;
