pub mod engine;
pub mod parser;
pub mod registry;
