use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use crate::net::DEFAULT_PORT;
use crate::peer::PEER_TIMEOUT_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    Zombies,
    #[default]
    FreeForAll,
    TeamDeathmatch,
}

impl GameMode {
    pub fn is_multiplayer(&self) -> bool {
        !matches!(self, Self::Zombies)
    }

    pub fn is_team(&self) -> bool {
        matches!(self, Self::TeamDeathmatch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zombies => "Zombies",
            Self::FreeForAll => "Free-for-all",
            Self::TeamDeathmatch => "Team Deathmatch",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub bind_addr: SocketAddr,
    /// Subnet broadcast target. Also used to discover which local address
    /// our own broadcasts come from.
    pub broadcast_addr: SocketAddr,
    pub player_name: String,
    pub use_checksum: bool,
    pub mode: GameMode,
    pub broadcast_interval_secs: f32,
    pub peer_timeout_secs: f64,
    pub arrival_smoothing_rate: f32,
    pub steady_smoothing_rate: f32,
    pub catch_up_window_secs: u16,
    pub catch_up_cash: i32,
    pub catch_up_score: i32,
    pub share_indicator_secs: f32,
    pub damage_cooldown_secs: f32,
    pub damage_burst_ttl_secs: f32,
}

impl SyncConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            broadcast_addr: SocketAddr::from((Ipv4Addr::BROADCAST, port)),
            ..Default::default()
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            broadcast_addr: SocketAddr::from((Ipv4Addr::BROADCAST, DEFAULT_PORT)),
            player_name: String::new(),
            use_checksum: true,
            mode: GameMode::default(),
            broadcast_interval_secs: 0.18,
            peer_timeout_secs: PEER_TIMEOUT_SECS,
            arrival_smoothing_rate: 8.0,
            steady_smoothing_rate: 6.0,
            catch_up_window_secs: 8,
            catch_up_cash: 20,
            catch_up_score: 20,
            share_indicator_secs: 1.6,
            damage_cooldown_secs: 0.6,
            damage_burst_ttl_secs: 0.3,
        }
    }
}
