mod config;
mod engine;
pub mod hitscan;
mod local;
mod relay;

pub use config::{GameMode, SyncConfig};
pub use engine::{DamageIntent, OutgoingIntents, SyncEngine, TickReport};
pub use local::{LocalPlayer, Perks, ShareIndicator};
pub use relay::{
    DamageBurst, EventKind, IncomingEvent, OutgoingRelay, PendingEvent, accept_id,
};
