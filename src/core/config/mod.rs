pub mod paths;
pub mod runtime;
pub mod service;

pub use paths::AppPaths;
pub use runtime::{FetchConfig, IndexConfig, ModelConfig, RuntimeConfig, ServerConfig};
pub use service::ConfigService;
