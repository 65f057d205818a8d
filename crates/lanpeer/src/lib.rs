pub mod net;
pub mod peer;
pub mod sync;

pub use net::{
    DEFAULT_PORT, LanEndpoint, LanPacket, NetworkStats, PACKET_SIZE, PacketError, Transport,
    TransportError, WireName,
};
pub use peer::{Admission, EvictedPeer, HitscanOutcome, MAX_PEERS, Peer, PeerFlags, PeerId, PeerTable};
pub use sync::{
    DamageIntent, EventKind, GameMode, IncomingEvent, LocalPlayer, OutgoingIntents, PendingEvent,
    Perks, ShareIndicator, SyncConfig, SyncEngine, TickReport,
};
