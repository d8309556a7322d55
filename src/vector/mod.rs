pub mod pinecone;
pub mod sqlite;
pub mod store;

pub use pinecone::PineconeIndex;
pub use sqlite::SqliteVectorIndex;
pub use store::{IndexedRecord, ScoredText, VectorIndex};
