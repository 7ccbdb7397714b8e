mod attributes;
mod elements_cache;
mod error;
mod position;
mod registry;
mod scheduler;
mod segment;
mod snapshot;

pub use attributes::{Illumination, Visibility};
pub use elements_cache::{ElementsCache, HttpElementsSource};
pub use error::FetchError;
pub use position::HttpPositionSource;
pub use registry::{SubscriberRegistry, Subscription};
pub use scheduler::{BroadcastScheduler, Supervisor};
pub use segment::segment;
pub use snapshot::TelemetrySnapshot;

#[cfg(test)]
pub(crate) use elements_cache::tests::ScriptedElements;
#[cfg(test)]
pub(crate) use position::PositionSample;
#[cfg(test)]
pub(crate) use snapshot::Published;
