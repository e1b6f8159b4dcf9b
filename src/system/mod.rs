pub mod executor;
pub mod shell;
