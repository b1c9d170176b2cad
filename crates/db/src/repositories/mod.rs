pub mod memory;
pub mod operations;

pub use memory::InMemoryOperationsStore;
pub use operations::SqlOperationsStore;
