pub mod reader;
pub mod tag;

pub use reader::{NewReader, Reader};
pub use tag::{Partner, Tag, TagStatus, Vehicle};
