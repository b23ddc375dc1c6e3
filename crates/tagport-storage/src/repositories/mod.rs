pub mod client_store;
pub mod reader;
pub mod tag;

pub use client_store::SqliteDeviceStore;
pub use reader::{ReaderRepository, SqliteReaderRepository};
pub use tag::{SqliteTagRepository, TagRepository};
