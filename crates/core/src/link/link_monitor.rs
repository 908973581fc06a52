//! Health of the lighting interface link.
//!
//! The monitor polls a [`LinkProbe`] on its own task and publishes the
//! latest [`LinkStatus`] through a `watch` channel. Readers never block and
//! only see the newest value.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Poll period while the show is offline.
pub const OFFLINE_POLL: Duration = Duration::from_millis(250);
/// Backoff after the device could not be opened.
pub const OPEN_RETRY: Duration = Duration::from_millis(500);
/// Poll period while the link is healthy.
pub const HEALTHY_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkStatus {
    Up,
    #[default]
    Down,
}

impl LinkStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("cannot open {device}: {source}")]
    Open {
        device: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write to {device} failed: {source}")]
    Write {
        device: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("link device is not open")]
    NotOpen,
}

/// Something that can tell whether the lighting interface answers.
pub trait LinkProbe: Send + 'static {
    fn open(&mut self) -> Result<(), LinkError>;
    fn poke(&mut self) -> Result<(), LinkError>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Probes a serial device node by holding it open and flushing writes to it.
pub struct SerialDeviceProbe {
    device: PathBuf,
    handle: Option<File>,
}

impl SerialDeviceProbe {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            handle: None,
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

impl LinkProbe for SerialDeviceProbe {
    fn open(&mut self) -> Result<(), LinkError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.device)
            .map_err(|source| LinkError::Open {
                device: self.device.clone(),
                source,
            })?;
        self.handle = Some(file);
        Ok(())
    }

    fn poke(&mut self) -> Result<(), LinkError> {
        let file = self.handle.as_mut().ok_or(LinkError::NotOpen)?;
        file.write_all(&[])
            .and_then(|_| file.flush())
            .map_err(|source| LinkError::Write {
                device: self.device.clone(),
                source,
            })
    }

    fn close(&mut self) {
        self.handle = None;
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

/// Shared on/off switch for link monitoring.
#[derive(Debug, Clone)]
pub struct OnlineSwitch(Arc<AtomicBool>);

impl OnlineSwitch {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Flips the switch and returns the new setting.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::Relaxed)
    }
}

pub struct LinkMonitor<P: LinkProbe> {
    probe: P,
    online: OnlineSwitch,
    status: watch::Sender<LinkStatus>,
}

impl<P: LinkProbe> LinkMonitor<P> {
    pub fn new(probe: P, online: bool) -> (Self, watch::Receiver<LinkStatus>) {
        let (status, rx) = watch::channel(LinkStatus::Down);
        let monitor = Self {
            probe,
            online: OnlineSwitch::new(online),
            status,
        };
        (monitor, rx)
    }

    pub fn online_switch(&self) -> OnlineSwitch {
        self.online.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }

    /// Runs one poll and returns how long to wait before the next.
    pub fn step(&mut self) -> Duration {
        if !self.online.is_online() {
            if self.probe.is_open() {
                self.probe.close();
            }
            self.publish(LinkStatus::Down);
            return OFFLINE_POLL;
        }

        if !self.probe.is_open() {
            if let Err(e) = self.probe.open() {
                log::debug!("Link probe: {}", e);
                self.publish(LinkStatus::Down);
                return OPEN_RETRY;
            }
        }

        match self.probe.poke() {
            Ok(()) => self.publish(LinkStatus::Up),
            Err(e) => {
                log::warn!("Link probe: {}", e);
                self.probe.close();
                self.publish(LinkStatus::Down);
            }
        }
        HEALTHY_POLL
    }

    fn publish(&self, status: LinkStatus) {
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            log::info!("Lighting link {:?}", status);
            *current = status;
            true
        });
    }

    /// Polls until `shutdown` turns true or its sender goes away. Probe I/O
    /// runs in place on a runtime worker, so this needs the multi-thread
    /// runtime.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!("Link monitor started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let wait = tokio::task::block_in_place(|| self.step());

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.probe.close();
        self.publish(LinkStatus::Down);
        log::info!("Link monitor stopped");
    }
}
