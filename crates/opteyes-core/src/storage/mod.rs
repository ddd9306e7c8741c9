pub mod models;
pub mod queries;
pub mod sqlite;

pub use models::{Datapoint, DatapointUpdate, Dataset};
pub use queries::IndexStore;
pub use sqlite::{Database, IndexTx};
