//! In-memory collaborator implementations for testing and development.
//!
//! Each mock keeps its state behind an `Arc`, so clones share it: hand one
//! clone to the code under test and keep another to script failures and
//! inspect calls.

pub mod assigner;
pub mod navigator;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use assigner::MockTagAssigner;
pub use navigator::RecordingNavigator;
pub use registry::MockRegistry;
pub use store::MemoryDeviceStore;
