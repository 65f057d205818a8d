use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::ValueEnum;
use lanpeer::{DEFAULT_PORT, GameMode, SyncConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Zombies,
    Ffa,
    Tdm,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Zombies => GameMode::Zombies,
            ModeArg::Ffa => GameMode::FreeForAll,
            ModeArg::Tdm => GameMode::TeamDeathmatch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub broadcast: IpAddr,
    pub name: String,
    pub mode: ModeArg,
    pub use_checksum: bool,
    pub tick_rate: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            broadcast: IpAddr::V4(Ipv4Addr::BROADCAST),
            name: String::new(),
            mode: ModeArg::Ffa,
            use_checksum: true,
            tick_rate: 60,
        }
    }
}

impl NodeConfig {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            bind_addr: SocketAddr::new(self.bind, self.port),
            broadcast_addr: SocketAddr::new(self.broadcast, self.port),
            player_name: self.name.clone(),
            use_checksum: self.use_checksum,
            mode: self.mode.into(),
            ..SyncConfig::with_port(self.port)
        }
    }

    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
