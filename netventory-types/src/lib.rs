pub mod device;
pub mod risk;
pub mod scan;
pub mod service;

pub use device::{Device, HardwareInfo};
pub use risk::{DeviceType, Severity, TrafficLight, Vulnerability};
pub use scan::{Intensity, ScanConfig};
pub use service::{PortState, Service};
