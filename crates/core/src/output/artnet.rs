use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use artnet_protocol::{ArtCommand, Output, PortAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sink::FixtureSink;
use crate::program::FixtureColorFrame;

pub const ARTNET_PORT: u16 = 6454;
const DMX_UNIVERSE_SIZE: usize = 512;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
    #[error("cannot encode Art-Net packet: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtNetMode {
    Broadcast(u16),
    /// Destination node address.
    Unicast(SocketAddr),
}

impl ArtNetMode {
    fn destination(&self) -> SocketAddr {
        match self {
            Self::Broadcast(port) => SocketAddr::from((Ipv4Addr::BROADCAST, *port)),
            Self::Unicast(addr) => *addr,
        }
    }
}

/// Three DMX channels per fixture from channel 1, padded to the even length
/// Art-Net requires and capped at one universe.
pub fn frame_to_dmx(frame: &FixtureColorFrame) -> Vec<u8> {
    let mut dmx = frame.to_rgb_bytes();
    dmx.truncate(DMX_UNIVERSE_SIZE);
    if dmx.len() % 2 == 1 {
        dmx.push(0);
    }
    if dmx.len() < 2 {
        dmx.resize(2, 0);
    }
    dmx
}

/// Sends each frame as an ArtDMX packet to one universe.
pub struct ArtNetSink {
    socket: UdpSocket,
    destination: SocketAddr,
    universe: u8,
    sequence: u8,
    failing: bool,
}

impl ArtNetSink {
    pub fn new(mode: ArtNetMode, universe: u8) -> Result<Self, OutputError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        let destination = mode.destination();
        match mode {
            ArtNetMode::Broadcast(_) => {
                socket.set_broadcast(true)?;
                log::debug!("Art-Net broadcast to {}", destination);
            }
            ArtNetMode::Unicast(_) => {
                log::debug!("Art-Net unicast to {}", destination);
            }
        }

        Ok(Self {
            socket,
            destination,
            universe,
            sequence: 0,
            failing: false,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    fn next_sequence(&mut self) -> u8 {
        // 0 disables sequencing on the receiver
        self.sequence = self.sequence.wrapping_add(1).max(1);
        self.sequence
    }

    pub fn packet(&mut self, frame: &FixtureColorFrame) -> Result<Vec<u8>, OutputError> {
        let command = ArtCommand::Output(Output {
            sequence: self.next_sequence(),
            port_address: PortAddress::from(self.universe),
            data: frame_to_dmx(frame).into(),
            ..Output::default()
        });
        command
            .write_to_buffer()
            .map_err(|e| OutputError::Encode(format!("{:?}", e)))
    }

    pub fn try_send(&mut self, frame: &FixtureColorFrame) -> Result<(), OutputError> {
        let bytes = self.packet(frame)?;
        self.socket.send_to(&bytes, self.destination)?;
        Ok(())
    }
}

impl FixtureSink for ArtNetSink {
    fn send(&mut self, frame: &FixtureColorFrame) {
        match self.try_send(frame) {
            Ok(()) => {
                if self.failing {
                    log::info!("Art-Net output to {} recovered", self.destination);
                    self.failing = false;
                }
            }
            Err(e) => {
                if !self.failing {
                    log::warn!("Art-Net output to {} failed: {}", self.destination, e);
                    self.failing = true;
                }
            }
        }
    }
}
