//! Document backend implementations

mod memory;
mod traits;

pub use memory::MemoryBackend;
pub use traits::{BackendError, DeleteFilter, Document, DocumentBackend};
