pub mod clock;
pub mod error;
pub mod ids;
pub mod page;
pub mod path;

pub use error::CoreError;
pub use ids::PageId;
pub use page::{EncodedData, MAX_DATA_DEPTH, PageData, PageRecord, PageSummary};
pub use path::PagePath;
