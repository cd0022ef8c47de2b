//! Record storage for the Cornerstone console.
//!
//! Every console record lives in a named collection behind the
//! [`Repository`] trait. Two backends are provided:
//!
//! - [`JsonFileRepository`]: one pretty-printed JSON array per collection,
//!   rewritten atomically on every mutation
//! - [`MemoryRepository`]: a map held in memory, for tests and ephemeral runs
//!
//! Single documents (the tenant settings) use [`DocumentStore`].

pub mod document;
mod fs;
pub mod json_file;
pub mod memory;
pub mod repository;

pub use document::DocumentStore;
pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;
pub use repository::{Edit, Repository};
