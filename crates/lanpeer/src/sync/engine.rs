use std::net::SocketAddr;

use glam::Vec3;

use super::config::{GameMode, SyncConfig};
use super::hitscan::{PLAYER_HIT_RADIUS, ray_hits_sphere};
use super::local::{LocalPlayer, ShareIndicator};
use super::relay::{EventKind, IncomingEvent, OutgoingRelay, PendingEvent, accept_id};
use crate::net::quantize::{clamp_counter, clamp_join_seconds, quantize_health, quantize_vec3};
use crate::net::{
    LanEndpoint, LanPacket, NetworkStats, PACKET_SIZE, Transport, TransportError, WireName,
};
use crate::peer::{Admission, EvictedPeer, HitscanOutcome, PeerId, PeerTable};

/// Hit ray produced by gameplay this frame, to be relayed to peers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageIntent {
    pub origin: Vec3,
    pub dir: Vec3,
    pub damage: f32,
}

/// What gameplay wants to tell peers this frame.
#[derive(Debug, Clone, Default)]
pub struct OutgoingIntents {
    pub share_cash: i32,
    pub share_score: i32,
    pub event: Option<PendingEvent>,
    pub damage: Option<DamageIntent>,
}

/// Side effects of one tick, already applied to the local player.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub broadcast: bool,
    pub admitted: Vec<PeerId>,
    pub evicted: Vec<EvictedPeer>,
    pub refused: u32,
    pub cash_received: i32,
    pub score_received: i32,
    pub damage_taken: f32,
    pub hits_taken: u32,
    pub events: Vec<IncomingEvent>,
    pub catch_up_credits: u32,
    /// Id assigned to a damage burst staged this tick.
    pub damage_id: Option<u8>,
}

pub struct SyncEngine<T: Transport = LanEndpoint> {
    transport: T,
    config: SyncConfig,
    peers: PeerTable,
    relay: OutgoingRelay,
    broadcast_accumulator: f32,
    join_time: f64,
    last_packet: Option<[u8; PACKET_SIZE]>,
    share_indicator: ShareIndicator,
    stats: NetworkStats,
}

impl SyncEngine<LanEndpoint> {
    pub fn bind(config: SyncConfig, now: f64) -> Result<Self, TransportError> {
        let endpoint = LanEndpoint::bind(config.bind_addr, config.broadcast_addr)?;
        log::info!(
            "LAN sync bound to {} (self {}), broadcasting to {}",
            endpoint.local_addr(),
            endpoint.self_addr(),
            endpoint.broadcast_addr()
        );
        Ok(Self::with_transport(endpoint, config, now))
    }
}

impl<T: Transport> SyncEngine<T> {
    pub fn with_transport(transport: T, config: SyncConfig, now: f64) -> Self {
        Self {
            transport,
            config,
            peers: PeerTable::new(),
            relay: OutgoingRelay::new(),
            broadcast_accumulator: 0.0,
            join_time: now,
            last_packet: None,
            share_indicator: ShareIndicator::default(),
            stats: NetworkStats::default(),
        }
    }

    /// Runs one frame: broadcast when due, merge everything received, evict
    /// silent peers and smooth the rest. `now` is monotonic seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        now: f64,
        local: &mut LocalPlayer,
        intents: OutgoingIntents,
    ) -> TickReport {
        let mut report = TickReport::default();

        self.relay.advance(dt);
        self.stage_intents(intents, &mut report);

        self.broadcast_accumulator += dt;
        if self.broadcast_accumulator > self.config.broadcast_interval_secs {
            self.broadcast_accumulator = 0.0;
            self.broadcast(now, local);
            report.broadcast = true;
        }

        self.receive(dt, now, local, &mut report);

        report.evicted = self.peers.evict(now, self.config.peer_timeout_secs);
        for peer in &report.evicted {
            log::info!("Peer {} ({}) timed out", peer.name, peer.addr);
        }

        for peer in self.peers.iter_mut() {
            peer.smooth(dt, self.config.steady_smoothing_rate);
            if !peer.catch_up_sent && peer.join_age_secs < self.config.catch_up_window_secs {
                self.relay
                    .stage_welcome(self.config.catch_up_cash, self.config.catch_up_score);
                peer.catch_up_sent = true;
                report.catch_up_credits += 1;
            }
        }

        if self.config.mode.is_multiplayer() {
            self.peers.tick_respawns(dt);
        }
        self.share_indicator.advance(dt);

        report
    }

    fn stage_intents(&mut self, intents: OutgoingIntents, report: &mut TickReport) {
        if intents.share_cash != 0 || intents.share_score != 0 {
            self.relay.stage_share(intents.share_cash, intents.share_score);
        }
        if let Some(event) = intents.event {
            self.relay.stage_event(event);
        }
        if let Some(damage) = intents.damage {
            let id = self.relay.stage_damage(
                damage.origin,
                damage.dir,
                damage.damage,
                self.config.damage_burst_ttl_secs,
            );
            report.damage_id = Some(id);
        }
    }

    fn build_packet(&mut self, now: f64, local: &LocalPlayer) -> LanPacket {
        let mut packet = LanPacket {
            position: quantize_vec3(local.position),
            weapon_index: local.weapon_index,
            ammo: clamp_counter(local.ammo),
            health: quantize_health(local.health),
            cash: clamp_counter(local.cash),
            score: clamp_counter(local.score),
            flags: local.flags(self.config.mode),
            name: WireName::new(&self.config.player_name),
            join_seconds: clamp_join_seconds(now - self.join_time),
            ..Default::default()
        };
        self.relay.load(&mut packet);
        packet
    }

    fn broadcast(&mut self, now: f64, local: &LocalPlayer) {
        let packet = self.build_packet(now, local);
        let bytes = packet.encode(self.config.use_checksum);
        self.last_packet = Some(bytes);

        match self.transport.broadcast(&bytes) {
            Ok(sent) => self.stats.record_send(sent),
            Err(e) => {
                self.stats.send_failures += 1;
                log::debug!("Broadcast failed: {}", e);
            }
        }
    }

    fn receive(&mut self, dt: f32, now: f64, local: &mut LocalPlayer, report: &mut TickReport) {
        let self_addr = self.transport.self_addr();

        for (data, from) in self.transport.poll_incoming() {
            self.stats.record_receive(data.len());

            let packet = match LanPacket::decode(&data, self.config.use_checksum) {
                Ok(packet) => packet,
                Err(e) => {
                    self.stats.decode_failures += 1;
                    log::debug!("Dropped datagram from {}: {}", from, e);
                    continue;
                }
            };

            if from == self_addr {
                self.stats.self_dropped += 1;
                continue;
            }

            let id = match self.peers.find_or_admit(from, &packet, now) {
                Admission::Existing(id) => {
                    if let Some(peer) = self.peers.get_mut(id) {
                        peer.apply_update(&packet, now);
                        peer.smooth(dt, self.config.arrival_smoothing_rate);
                    }
                    id
                }
                Admission::Admitted(id) => {
                    self.welcome(id, from);
                    report.admitted.push(id);
                    id
                }
                Admission::Full => {
                    self.stats.admissions_refused += 1;
                    report.refused += 1;
                    log::debug!("Peer table full, ignoring {}", from);
                    continue;
                }
            };

            self.apply_relayed(id, &packet, local, report);
        }
    }

    /// Unicasts the cached snapshot so a newcomer sees us before our next
    /// broadcast.
    fn welcome(&mut self, id: PeerId, addr: SocketAddr) {
        if let Some(peer) = self.peers.get(id) {
            log::info!("Peer {} joined from {}", peer.name, addr);
        }

        let Some(bytes) = self.last_packet else {
            return;
        };
        match self.transport.send_to(&bytes, addr) {
            Ok(sent) => {
                self.stats.record_send(sent);
                self.stats.catch_up_resends += 1;
            }
            Err(e) => {
                self.stats.send_failures += 1;
                log::debug!("Catch-up send to {} failed: {}", addr, e);
            }
        }
    }

    fn apply_relayed(
        &mut self,
        id: PeerId,
        packet: &LanPacket,
        local: &mut LocalPlayer,
        report: &mut TickReport,
    ) {
        let Some(peer) = self.peers.get_mut(id) else {
            return;
        };

        let cash = packet.cash_delta as i32;
        let score = packet.score_delta as i32;
        local.credit(cash, score);
        if cash != 0 || score != 0 {
            self.share_indicator
                .arm(cash, score, self.config.share_indicator_secs);
            report.cash_received += cash;
            report.score_received += score;
        }

        if self.config.mode.is_multiplayer()
            && packet.ray_damage > 0
            && accept_id(&mut peer.last_damage_id, packet.damage_id)
        {
            let hit = ray_hits_sphere(
                packet.ray_origin(),
                packet.ray_dir(),
                local.position,
                PLAYER_HIT_RADIUS,
            );
            if hit {
                let damage = packet.ray_damage as f32;
                local.take_damage(damage, self.config.damage_cooldown_secs);
                report.damage_taken += damage;
                report.hits_taken += 1;
            }
        }

        if let Some(kind) = EventKind::from_wire(packet.event_kind) {
            if accept_id(&mut peer.last_event_id, packet.event_id) {
                let actor = if peer.name.is_empty() {
                    "Peer".to_string()
                } else {
                    peer.name.clone()
                };
                report.events.push(IncomingEvent {
                    kind,
                    team: peer.team(),
                    id: packet.event_id,
                    actor,
                    target: packet.event_target.to_string_lossy(),
                });
            }
        }
    }

    /// Tests a local shot against every peer. Outside multiplayer modes
    /// peers are not targets; in team mode `shooter_team` is spared.
    pub fn hitscan_peers(
        &mut self,
        origin: Vec3,
        dir: Vec3,
        damage: f32,
        range: f32,
        shooter_team: u8,
    ) -> HitscanOutcome {
        if !self.config.mode.is_multiplayer() {
            return HitscanOutcome::default();
        }
        let friendly_team = self.config.mode.is_team().then_some(shooter_team);
        self.peers.hitscan(origin, dir, damage, range, friendly_team)
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn share_indicator(&self) -> &ShareIndicator {
        &self.share_indicator
    }

    pub fn relay(&self) -> &OutgoingRelay {
        &self.relay
    }

    pub fn set_checksum(&mut self, enabled: bool) {
        self.config.use_checksum = enabled;
    }

    pub fn set_player_name(&mut self, name: impl Into<String>) {
        self.config.player_name = name.into();
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.config.mode = mode;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
