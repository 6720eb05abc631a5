// Local implementations of the collaborator ports: an in-memory device for
// hosts without a registry, tracing and channel notifiers, and memory or
// JSON-file recommendation stores.

mod device;
mod notify;
mod state;

pub use device::{Availability, DeviceSnapshot, MemoryDevice};
pub use notify::{ChannelNotifier, LogNotifier, Notification};
pub use state::{FileStateStore, MemoryStateStore};
