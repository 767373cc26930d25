pub mod api;
pub mod client;
pub mod mock;
pub mod types;
pub mod watcher;

pub use api::ClusterApi;
pub use client::K8sClient;
pub use mock::MockCluster;
pub use types::ProbeOutput;
pub use watcher::{PodEvent, PodWatcher};
