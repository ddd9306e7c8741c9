pub mod labels;
pub mod walk;

pub use labels::{Label, LabelCache};
pub use walk::{
    parse_datapoint_id, DatapointIter, DatasetDir, DatasetIter, DiscoveredDatapoint, Scanner,
};
