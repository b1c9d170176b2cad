pub mod command;
pub mod execution;
pub mod intelligence;
pub mod task;
