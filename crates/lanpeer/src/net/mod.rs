mod endpoint;
mod protocol;
pub mod quantize;
mod stats;

pub use endpoint::{LanEndpoint, Transport, TransportError};
pub use protocol::{
    checksum, LanPacket, PacketError, WireName, DEFAULT_PORT, NAME_BYTES, PACKET_SIZE,
    RECV_BUFFER_SIZE,
};
pub use stats::NetworkStats;
