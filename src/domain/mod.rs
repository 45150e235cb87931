mod device;
mod device_event;
mod filter;

pub use device::{Device, DeviceDirectory};
pub use device_event::{DeviceEvent, EventId};
pub use filter::Filter;
