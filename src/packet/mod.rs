//! Traits shared by every packet of the codec.

mod rx;
mod tx;

pub use rx::{RxError, RxPacket};
pub use tx::{TxError, TxPacket};

use crate::header::PacketType;

/// Marker for a decoded or encodable MQTT control packet.
pub trait Packet {
    /// The packet type in the fixed header.
    const PACKET_TYPE: PacketType;
}
