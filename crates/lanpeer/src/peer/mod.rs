mod flags;
mod table;

pub use flags::PeerFlags;
pub use table::{
    Admission, EvictedPeer, HitscanOutcome, MAX_PEERS, PEER_RESPAWN_SECS, PEER_TIMEOUT_SECS, Peer,
    PeerId, PeerTable,
};
