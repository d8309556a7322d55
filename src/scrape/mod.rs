pub mod chunk;
pub mod clean;
pub mod fetch;

pub use chunk::{split_text, ChunkingConfig};
pub use clean::clean_html;
pub use fetch::{HttpPageFetcher, PageFetcher};
