pub mod editors;
pub mod site;

pub use editors::EditorPool;
pub use site::TestSite;
