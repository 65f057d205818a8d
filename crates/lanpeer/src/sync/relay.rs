use glam::Vec3;

use crate::net::quantize::{clamp_delta, quantize_vec3};
use crate::net::{LanPacket, WireName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Frag,
    Assist,
}

impl EventKind {
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Frag),
            2 => Some(Self::Assist),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> u8 {
        match self {
            Self::Frag => 1,
            Self::Assist => 2,
        }
    }
}

/// Frag or assist waiting for the next broadcast tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub kind: EventKind,
    pub team: u8,
    pub target: String,
}

/// Hit ray re-sent on every broadcast while its time to live lasts. The id
/// stays fixed for the lifetime of the burst so receivers apply it once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageBurst {
    pub origin: Vec3,
    pub dir: Vec3,
    pub damage: f32,
    pub ttl: f32,
    pub id: u8,
}

/// Event surfaced from a peer, already de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingEvent {
    pub kind: EventKind,
    pub team: u8,
    pub id: u8,
    pub actor: String,
    pub target: String,
}

/// Single-slot outgoing staging for everything piggybacked on the state
/// broadcast: the share delta, one event and one damage burst. Staging a
/// second event or burst before the next tick replaces the first.
#[derive(Debug, Clone)]
pub struct OutgoingRelay {
    share_cash: i32,
    share_score: i32,
    event: Option<PendingEvent>,
    damage: Option<DamageBurst>,
    next_event_id: u8,
    next_damage_id: u8,
}

impl Default for OutgoingRelay {
    fn default() -> Self {
        Self {
            share_cash: 0,
            share_score: 0,
            event: None,
            damage: None,
            next_event_id: 1,
            next_damage_id: 1,
        }
    }
}

impl OutgoingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_event(&mut self, event: PendingEvent) {
        if self.event.is_some() {
            log::debug!("Pending event replaced before broadcast");
        }
        self.event = Some(event);
    }

    /// Starts a new damage burst and returns the id it will travel under.
    pub fn stage_damage(&mut self, origin: Vec3, dir: Vec3, damage: f32, ttl: f32) -> u8 {
        let id = self.next_damage_id;
        self.next_damage_id = self.next_damage_id.wrapping_add(1);
        self.damage = Some(DamageBurst {
            origin,
            dir,
            damage,
            ttl,
            id,
        });
        id
    }

    /// Accumulates gameplay shares. The total is clamped to the wire range
    /// only when the packet is built.
    pub fn stage_share(&mut self, cash: i32, score: i32) {
        self.share_cash = self.share_cash.saturating_add(cash);
        self.share_score = self.share_score.saturating_add(score);
    }

    /// Adds a welcome credit for a newly joined peer, clamped immediately.
    pub fn stage_welcome(&mut self, cash: i32, score: i32) {
        self.share_cash = clamp_delta(self.share_cash.saturating_add(cash)) as i32;
        self.share_score = clamp_delta(self.share_score.saturating_add(score)) as i32;
    }

    pub fn advance(&mut self, dt: f32) {
        if let Some(burst) = self.damage.as_mut() {
            burst.ttl -= dt;
            if burst.ttl <= 0.0 {
                self.damage = None;
            }
        }
    }

    /// Moves staged items into `packet`. The share and event are consumed;
    /// a live damage burst stays staged for the following ticks.
    pub fn load(&mut self, packet: &mut LanPacket) {
        packet.cash_delta = clamp_delta(self.share_cash);
        packet.score_delta = clamp_delta(self.share_score);
        self.share_cash = 0;
        self.share_score = 0;

        if let Some(event) = self.event.take() {
            packet.event_kind = event.kind.as_wire();
            packet.event_team = event.team;
            packet.event_id = self.next_event_id;
            packet.event_target = WireName::new(&event.target);
            self.next_event_id = self.next_event_id.wrapping_add(1);
        }

        if let Some(burst) = self.damage {
            packet.ray_origin = quantize_vec3(burst.origin);
            packet.ray_dir = quantize_vec3(burst.dir);
            packet.ray_damage = burst.damage.clamp(0.0, 255.0) as u8;
            packet.damage_id = burst.id;
        }
    }

    pub fn pending_share(&self) -> (i32, i32) {
        (self.share_cash, self.share_score)
    }

    pub fn pending_event(&self) -> Option<&PendingEvent> {
        self.event.as_ref()
    }

    pub fn damage(&self) -> Option<&DamageBurst> {
        self.damage.as_ref()
    }
}

/// Duplicate test for a per-peer cursor: an id is new when it differs from
/// the last one applied. Records the id when accepted.
pub fn accept_id(cursor: &mut Option<u8>, id: u8) -> bool {
    if *cursor == Some(id) {
        return false;
    }
    *cursor = Some(id);
    true
}
