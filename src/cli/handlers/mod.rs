// src/cli/handlers/mod.rs

// One thin handler per CLI action; shared setup lives in commons.

pub mod build;
pub mod commons;
pub mod flash;
pub mod listings;
pub mod runners;
pub mod spdx;
pub mod target;
pub mod tasks;
pub mod workspace;
