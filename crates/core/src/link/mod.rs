pub mod link_monitor;

pub use link_monitor::{
    LinkError, LinkMonitor, LinkProbe, LinkStatus, OnlineSwitch, SerialDeviceProbe,
};
