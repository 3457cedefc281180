//! Port implementations.

pub mod json_file;
pub mod memory;
pub mod process;

pub use json_file::JsonFileTaskPersistence;
pub use memory::InMemoryTaskPersistence;
pub use process::TokioProcessRunner;
