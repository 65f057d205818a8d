use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use lanpeer::{GameMode, NetworkStats, SyncEngine, Transport, WireName};

use crate::bot::Bot;
use crate::config::NodeConfig;
use crate::events::{EventLevel, NodeEvent};

/// Fixed-cadence loop driving the bot and, when the socket could be set
/// up, the LAN sync engine.
pub struct Session {
    engine: Option<SyncEngine>,
    bot: Bot,
    config: NodeConfig,
    mode: GameMode,
    clock: Instant,
    last_tick_time: Instant,
    accumulator: Duration,
    tick_duration: Duration,
    tick: u64,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<NodeEvent>,
}

impl Session {
    /// Never fails: a bind error leaves the session running offline.
    pub fn new(config: NodeConfig) -> Self {
        let engine = match SyncEngine::bind(config.sync_config(), 0.0) {
            Ok(engine) => Some(engine),
            Err(e) => {
                log::warn!("LAN play disabled: {}", e);
                None
            }
        };
        Self::with_engine(config, engine)
    }

    fn with_engine(config: NodeConfig, engine: Option<SyncEngine>) -> Self {
        let tick_duration = Duration::from_secs_f32(config.tick_seconds());
        let mode: GameMode = config.mode.into();
        let team = if mode == GameMode::TeamDeathmatch {
            (std::process::id() % 2) as u8
        } else {
            0
        };
        let now = Instant::now();

        Self {
            engine,
            bot: Bot::new(team, (std::process::id() % 628) as f32 / 100.0),
            mode,
            config,
            clock: now,
            last_tick_time: now,
            accumulator: Duration::ZERO,
            tick_duration,
            tick: 0,
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
        }
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = NodeEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            for event in self.pending_events.drain(..) {
                match event.level() {
                    EventLevel::Info => log::info!("{}", event.message()),
                    EventLevel::Warn => log::warn!("{}", event.message()),
                }
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_tick_time;
        self.last_tick_time = now;
        self.accumulator += delta;

        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.tick();
        }
    }

    fn tick(&mut self) {
        let dt = self.tick_duration.as_secs_f32();
        let now = self.clock.elapsed().as_secs_f64();
        self.tick += 1;

        let bot_tick = self.bot.update(dt, self.engine.as_mut());
        if let Some(name) = bot_tick.fragged {
            self.pending_events.push_back(NodeEvent::Fragged { name });
        }
        if bot_tick.respawned {
            self.pending_events.push_back(NodeEvent::LocalRespawn);
        }

        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let report = engine.tick(dt, now, &mut self.bot.player, bot_tick.intents);
        self.pending_events
            .extend(NodeEvent::from_report(&report, engine.peers()));
    }

    pub fn toggle_checksum(&mut self) -> bool {
        self.config.use_checksum = !self.config.use_checksum;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_checksum(self.config.use_checksum);
        }
        self.config.use_checksum
    }

    /// Renames the local player from the next broadcast on. Returns the name
    /// as it will appear on the wire.
    pub fn rename(&mut self, name: &str) -> String {
        let name = WireName::new(name.trim()).to_string_lossy();
        self.config.name = name.clone();
        if let Some(engine) = self.engine.as_mut() {
            engine.set_player_name(name.clone());
        }
        name
    }

    pub fn stats(&self) -> SessionStats {
        let local = &self.bot.player;
        let share = self
            .engine
            .as_ref()
            .filter(|engine| engine.share_indicator().is_visible())
            .map(|engine| engine.share_indicator().values());

        SessionStats {
            tick: self.tick,
            uptime_secs: self.clock.elapsed().as_secs(),
            name: self.config.name.clone(),
            mode: self.mode,
            online: self.engine.is_some(),
            self_addr: self.engine.as_ref().map(|engine| engine.transport().self_addr()),
            use_checksum: self.config.use_checksum,
            peer_count: self
                .engine
                .as_ref()
                .map_or(0, |engine| engine.peers().active_count()),
            health: local.health,
            cash: local.cash,
            score: local.score,
            ammo: local.ammo,
            downed: local.downed,
            share,
            network_stats: self
                .engine
                .as_ref()
                .map(|engine| engine.stats().clone())
                .unwrap_or_default(),
        }
    }

    pub fn peer_rows(&self) -> Vec<PeerRow> {
        let Some(engine) = self.engine.as_ref() else {
            return Vec::new();
        };
        let now = self.clock.elapsed().as_secs_f64();

        engine
            .peers()
            .iter()
            .map(|(_, peer)| PeerRow {
                name: peer.name.clone(),
                addr: peer.addr,
                team: peer.display_team(),
                status: if peer.is_downed() {
                    "DOWN"
                } else if peer.is_reviving() {
                    "REV"
                } else {
                    "OK"
                },
                weapon_index: peer.weapon_index,
                ammo: peer.ammo,
                health: peer.health,
                cash: peer.cash,
                score: peer.score,
                join_age_secs: peer.join_age_secs,
                silent_secs: (now - peer.last_heard).max(0.0),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SessionStats {
    pub tick: u64,
    pub uptime_secs: u64,
    pub name: String,
    pub mode: GameMode,
    pub online: bool,
    pub self_addr: Option<SocketAddr>,
    pub use_checksum: bool,
    pub peer_count: usize,
    pub health: f32,
    pub cash: i32,
    pub score: i32,
    pub ammo: i32,
    pub downed: bool,
    pub share: Option<(i32, i32)>,
    pub network_stats: NetworkStats,
}

#[derive(Debug, Clone)]
pub struct PeerRow {
    pub name: String,
    pub addr: SocketAddr,
    pub team: u8,
    pub status: &'static str,
    pub weapon_index: u8,
    pub ammo: u16,
    pub health: f32,
    pub cash: u16,
    pub score: u16,
    pub join_age_secs: u16,
    pub silent_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_session_keeps_running() {
        let mut session = Session::with_engine(NodeConfig::default(), None);
        let start = session.bot.player.position;
        for _ in 0..30 {
            session.tick();
        }

        let stats = session.stats();
        assert!(!stats.online);
        assert_eq!(stats.tick, 30);
        assert_eq!(stats.peer_count, 0);
        assert!(stats.self_addr.is_none());
        assert_ne!(session.bot.player.position, start);
        assert!(session.peer_rows().is_empty());
    }

    #[test]
    fn test_checksum_toggle_offline() {
        let mut session = Session::with_engine(NodeConfig::default(), None);
        assert!(!session.toggle_checksum());
        assert!(!session.stats().use_checksum);
        assert!(session.toggle_checksum());
    }

    #[test]
    fn test_rename_offline_truncates_to_wire_width() {
        let mut session = Session::with_engine(NodeConfig::default(), None);
        assert_eq!(session.rename("  Nova  "), "Nova");
        assert_eq!(session.stats().name, "Nova");
        assert_eq!(session.rename("Andromedarius"), "Andromedari");
    }

    #[test]
    fn test_rename_reaches_the_engine() {
        let config = NodeConfig {
            bind: "127.0.0.1".parse().unwrap(),
            port: 0,
            broadcast: "127.0.0.1".parse().unwrap(),
            name: "Nova".to_string(),
            ..Default::default()
        };
        let engine = SyncEngine::bind(config.sync_config(), 0.0).unwrap();
        let mut session = Session::with_engine(config, Some(engine));

        session.rename("Vega");
        let engine = session.engine.as_ref().unwrap();
        assert_eq!(engine.config().player_name, "Vega");
        assert_eq!(session.stats().name, "Vega");
    }
}
