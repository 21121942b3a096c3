pub mod store;
pub mod types;

pub use store::{ShortTag, Tag, TagStore};
pub use types::{CipType, PcccType};
