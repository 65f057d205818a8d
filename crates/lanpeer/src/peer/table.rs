use std::net::{IpAddr, SocketAddr};

use glam::Vec3;

use super::flags::PeerFlags;
use crate::net::LanPacket;
use crate::net::quantize::MAX_HEALTH;
use crate::sync::hitscan::{PLAYER_HIT_RADIUS, ray_sphere};

pub const MAX_PEERS: usize = 8;
pub const PEER_TIMEOUT_SECS: f64 = 3.0;
pub const PEER_RESPAWN_SECS: f32 = 1.5;

/// Slot index in the peer table. Only meaningful while the slot stays
/// occupied by the same peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(usize);

impl PeerId {
    pub fn slot(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Peer {
    pub addr: SocketAddr,
    /// Last received position, exact after dequantization.
    pub position: Vec3,
    /// Smoothed toward `position` for display.
    pub render_position: Vec3,
    pub weapon_index: u8,
    pub ammo: u16,
    pub health: f32,
    pub flags: PeerFlags,
    pub cash: u16,
    pub score: u16,
    pub join_age_secs: u16,
    pub catch_up_sent: bool,
    pub name: String,
    pub respawn_timer: f32,
    pub last_heard: f64,
    pub last_damage_id: Option<u8>,
    pub last_event_id: Option<u8>,
}

impl Peer {
    fn admit(addr: SocketAddr, packet: &LanPacket, now: f64) -> Self {
        let position = packet.position();
        let mut peer = Self {
            addr,
            position,
            render_position: position,
            weapon_index: 0,
            ammo: 0,
            health: MAX_HEALTH,
            flags: PeerFlags::empty(),
            cash: 0,
            score: 0,
            join_age_secs: 0,
            catch_up_sent: false,
            name: String::new(),
            respawn_timer: 0.0,
            last_heard: now,
            last_damage_id: None,
            last_event_id: None,
        };
        peer.apply_update(packet, now);
        if peer.name.is_empty() {
            peer.name = fallback_name(addr);
        }
        peer
    }

    /// Overwrites every authoritative field from `packet` (last writer wins)
    /// and refreshes liveness. The render position is left to smoothing.
    pub fn apply_update(&mut self, packet: &LanPacket, now: f64) {
        self.position = packet.position();
        self.weapon_index = packet.weapon_index;
        self.ammo = packet.ammo;
        self.health = packet.health();
        self.flags = packet.flags;
        self.cash = packet.cash;
        self.score = packet.score;
        self.join_age_secs = packet.join_seconds;
        if !packet.name.is_empty() {
            self.name = packet.name.to_string_lossy();
        }
        self.last_heard = now;
    }

    /// Moves the render position `min(1, dt * rate)` of the remaining way.
    pub fn smooth(&mut self, dt: f32, rate: f32) {
        let t = (dt * rate).clamp(0.0, 1.0);
        self.render_position = self.render_position.lerp(self.position, t);
    }

    pub fn is_downed(&self) -> bool {
        self.flags.contains(PeerFlags::DOWNED)
    }

    pub fn is_reviving(&self) -> bool {
        self.flags.contains(PeerFlags::REVIVING)
    }

    pub fn team_mode(&self) -> bool {
        self.flags.contains(PeerFlags::TEAM_MODE)
    }

    pub fn team(&self) -> u8 {
        self.flags.team()
    }

    /// Team used for display. Outside team mode this is derived from the
    /// address and carries no game meaning.
    pub fn display_team(&self) -> u8 {
        if self.team_mode() {
            return self.team();
        }
        last_octet(self.addr) % 2
    }

    pub fn is_silent(&self, now: f64, timeout: f64) -> bool {
        now - self.last_heard > timeout
    }
}

fn last_octet(addr: SocketAddr) -> u8 {
    match addr.ip() {
        IpAddr::V4(ip) => ip.octets()[3],
        IpAddr::V6(ip) => ip.octets()[15],
    }
}

fn fallback_name(addr: SocketAddr) -> String {
    format!("P-{:02}", last_octet(addr))
}

#[derive(Debug, Clone, Default)]
struct PeerSlot {
    active: bool,
    peer: Option<Peer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Existing(PeerId),
    Admitted(PeerId),
    /// Every slot is taken; the sender stays untracked.
    Full,
}

#[derive(Debug, Clone)]
pub struct EvictedPeer {
    pub id: PeerId,
    pub addr: SocketAddr,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitscanOutcome {
    pub hits: u32,
    pub fragged: Option<PeerId>,
}

/// Fixed-capacity registry of remote participants keyed by source address.
#[derive(Debug)]
pub struct PeerTable {
    slots: [PeerSlot; MAX_PEERS],
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerTable {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| PeerSlot::default()),
        }
    }

    pub fn find(&self, addr: SocketAddr) -> Option<PeerId> {
        self.iter()
            .find(|(_, peer)| peer.addr == addr)
            .map(|(id, _)| id)
    }

    /// Looks up `addr` among active slots, otherwise claims the first free
    /// slot and seeds it from `packet`. Never evicts to make room.
    pub fn find_or_admit(&mut self, addr: SocketAddr, packet: &LanPacket, now: f64) -> Admission {
        if let Some(id) = self.find(addr) {
            return Admission::Existing(id);
        }

        let Some(index) = self.slots.iter().position(|slot| !slot.active) else {
            return Admission::Full;
        };

        self.slots[index] = PeerSlot {
            active: true,
            peer: Some(Peer::admit(addr, packet, now)),
        };
        Admission::Admitted(PeerId(index))
    }

    pub fn apply_update(&mut self, id: PeerId, packet: &LanPacket, now: f64) {
        if let Some(peer) = self.get_mut(id) {
            peer.apply_update(packet, now);
        }
    }

    /// Deactivates every peer silent for longer than `timeout` seconds.
    pub fn evict(&mut self, now: f64, timeout: f64) -> Vec<EvictedPeer> {
        let mut evicted = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            let Some(peer) = slot.peer.take_if(|peer| peer.is_silent(now, timeout)) else {
                continue;
            };
            slot.active = false;
            evicted.push(EvictedPeer {
                id: PeerId(index),
                addr: peer.addr,
                name: peer.name,
            });
        }

        evicted
    }

    pub fn smooth_all(&mut self, dt: f32, rate: f32) {
        for peer in self.iter_mut() {
            peer.smooth(dt, rate);
        }
    }

    pub fn tick_respawns(&mut self, dt: f32) {
        for peer in self.iter_mut() {
            if peer.respawn_timer <= 0.0 {
                continue;
            }
            peer.respawn_timer -= dt;
            if peer.respawn_timer <= 0.0 {
                peer.respawn_timer = 0.0;
                peer.health = MAX_HEALTH;
            }
        }
    }

    /// Local hit test of a shot against every active peer's render position.
    /// Peers on `friendly_team` and peers already waiting to respawn are
    /// skipped. A peer whose health drops to zero starts its respawn
    /// countdown and is reported as fragged.
    pub fn hitscan(
        &mut self,
        origin: Vec3,
        dir: Vec3,
        damage: f32,
        range: f32,
        friendly_team: Option<u8>,
    ) -> HitscanOutcome {
        let mut outcome = HitscanOutcome::default();
        let Some(dir) = dir.try_normalize() else {
            return outcome;
        };

        for index in 0..MAX_PEERS {
            let id = PeerId(index);
            let Some(peer) = self.get_mut(id) else {
                continue;
            };
            if peer.respawn_timer > 0.0 || friendly_team == Some(peer.team()) {
                continue;
            }

            let hit = ray_sphere(origin, dir, peer.render_position, PLAYER_HIT_RADIUS)
                .is_some_and(|t| t <= range);
            if !hit {
                continue;
            }

            outcome.hits += 1;
            peer.health -= damage;
            if peer.health <= 0.0 {
                peer.health = 0.0;
                peer.respawn_timer = PEER_RESPAWN_SECS;
                outcome.fragged = Some(id);
            }
        }

        outcome
    }

    pub fn get(&self, id: PeerId) -> Option<&Peer> {
        let slot = self.slots.get(id.0)?;
        if !slot.active {
            return None;
        }
        slot.peer.as_ref()
    }

    pub fn get_mut(&mut self, id: PeerId) -> Option<&mut Peer> {
        let slot = self.slots.get_mut(id.0)?;
        if !slot.active {
            return None;
        }
        slot.peer.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeerId, &Peer)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            if slot.active {
                slot.peer.as_ref().map(|peer| (PeerId(index), peer))
            } else {
                None
            }
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Peer> {
        self.slots
            .iter_mut()
            .filter(|slot| slot.active)
            .filter_map(|slot| slot.peer.as_mut())
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    pub fn is_full(&self) -> bool {
        self.active_count() == MAX_PEERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use crate::net::WireName;
    use crate::net::quantize::quantize_vec3;

    fn addr(octet: u8) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, octet)), 27015)
    }

    fn packet_at(position: Vec3) -> LanPacket {
        LanPacket {
            position: quantize_vec3(position),
            health: 255,
            ..Default::default()
        }
    }

    #[test]
    fn test_admission_caps_at_capacity() {
        let mut table = PeerTable::new();
        let packet = packet_at(Vec3::ZERO);

        for octet in 1..=MAX_PEERS as u8 {
            assert!(matches!(
                table.find_or_admit(addr(octet), &packet, 0.0),
                Admission::Admitted(_)
            ));
        }
        assert!(table.is_full());
        assert_eq!(table.find_or_admit(addr(100), &packet, 1.0), Admission::Full);
        assert!(table.find(addr(100)).is_none());
        assert!(matches!(
            table.find_or_admit(addr(3), &packet, 1.0),
            Admission::Existing(_)
        ));
    }

    #[test]
    fn test_slot_reused_after_eviction() {
        let mut table = PeerTable::new();
        let packet = packet_at(Vec3::ZERO);

        for octet in 1..=MAX_PEERS as u8 {
            table.find_or_admit(addr(octet), &packet, 0.0);
        }
        for octet in 2..=MAX_PEERS as u8 {
            let id = table.find(addr(octet)).unwrap();
            table.apply_update(id, &packet, 2.0);
        }

        let evicted = table.evict(3.5, PEER_TIMEOUT_SECS);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].addr, addr(1));

        assert_eq!(
            table.find_or_admit(addr(100), &packet, 3.5),
            Admission::Admitted(evicted[0].id)
        );
    }

    #[test]
    fn test_eviction_threshold() {
        let mut table = PeerTable::new();
        let packet = packet_at(Vec3::ZERO);
        table.find_or_admit(addr(1), &packet, 0.0);
        table.find_or_admit(addr(2), &packet, 0.1);

        assert!(table.evict(2.9, PEER_TIMEOUT_SECS).is_empty());
        assert_eq!(table.active_count(), 2);

        let evicted = table.evict(3.05, PEER_TIMEOUT_SECS);
        assert_eq!(evicted.len(), 1);
        assert!(table.find(addr(1)).is_none());
        assert!(table.find(addr(2)).is_some());
    }

    #[test]
    fn test_update_overwrites_fields() {
        let mut table = PeerTable::new();
        let Admission::Admitted(id) = table.find_or_admit(addr(7), &packet_at(Vec3::ZERO), 0.0)
        else {
            panic!("expected admission");
        };
        assert_eq!(table.get(id).unwrap().name, "P-07");

        let mut update = packet_at(Vec3::new(1.0, 0.9, 2.0));
        update.ammo = 30;
        update.cash = 500;
        update.flags = PeerFlags::DOWNED | PeerFlags::TEAM_MODE | PeerFlags::TEAM;
        update.name = WireName::new("Nova");
        update.join_seconds = 12;
        table.apply_update(id, &update, 1.0);

        let peer = table.get(id).unwrap();
        assert_eq!(peer.position, Vec3::new(1.0, 0.9, 2.0));
        assert_eq!(peer.render_position, Vec3::ZERO);
        assert_eq!(peer.ammo, 30);
        assert_eq!(peer.cash, 500);
        assert!(peer.is_downed());
        assert_eq!(peer.display_team(), 1);
        assert_eq!(peer.name, "Nova");
        assert_eq!(peer.join_age_secs, 12);
        assert_eq!(peer.last_heard, 1.0);

        update.name = WireName::new("");
        table.apply_update(id, &update, 1.5);
        assert_eq!(table.get(id).unwrap().name, "Nova");
    }

    #[test]
    fn test_admitted_name_and_cursors() {
        let mut table = PeerTable::new();
        let mut packet = packet_at(Vec3::new(4.0, 0.0, 0.0));
        packet.name = WireName::new("Kit");
        let Admission::Admitted(id) = table.find_or_admit(addr(9), &packet, 0.0) else {
            panic!("expected admission");
        };

        let peer = table.get(id).unwrap();
        assert_eq!(peer.name, "Kit");
        assert_eq!(peer.render_position, peer.position);
        assert_eq!(peer.last_damage_id, None);
        assert_eq!(peer.last_event_id, None);
        assert!(!peer.catch_up_sent);
    }

    #[test]
    fn test_display_team_falls_back_to_address() {
        let mut table = PeerTable::new();
        let mut packet = packet_at(Vec3::ZERO);
        packet.flags = PeerFlags::TEAM;
        let Admission::Admitted(id) = table.find_or_admit(addr(4), &packet, 0.0) else {
            panic!("expected admission");
        };
        let peer = table.get(id).unwrap();
        assert_eq!(peer.team(), 1);
        assert_eq!(peer.display_team(), 0);
    }

    #[test]
    fn test_smoothing_converges_without_overshoot() {
        let mut table = PeerTable::new();
        let Admission::Admitted(id) = table.find_or_admit(addr(1), &packet_at(Vec3::ZERO), 0.0)
        else {
            panic!("expected admission");
        };
        let target = Vec3::new(1.0, 0.9, 2.0);
        table.apply_update(id, &packet_at(target), 0.1);

        let mut previous = table.get(id).unwrap().render_position.distance(target);
        for _ in 0..30 {
            table.smooth_all(1.0 / 60.0, 6.0);
            let peer = table.get(id).unwrap();
            let distance = peer.render_position.distance(target);
            assert!(distance <= previous);
            assert!(peer.render_position.x <= target.x + 1e-5);
            previous = distance;
        }
        assert!(previous < 0.2);

        table.smooth_all(1.0, 8.0);
        assert!(table.get(id).unwrap().render_position.distance(target) < 1e-5);
    }

    #[test]
    fn test_hitscan_frags_and_respawns() {
        let mut table = PeerTable::new();
        let mut enemy = packet_at(Vec3::new(0.0, 0.0, 5.0));
        enemy.flags = PeerFlags::TEAM_MODE.with_team(1);
        let mut friend = packet_at(Vec3::new(0.0, 0.0, 8.0));
        friend.flags = PeerFlags::TEAM_MODE.with_team(0);
        table.find_or_admit(addr(1), &enemy, 0.0);
        table.find_or_admit(addr(2), &friend, 0.0);

        let outcome = table.hitscan(Vec3::ZERO, Vec3::Z, 40.0, 50.0, Some(0));
        assert_eq!(outcome.hits, 1);
        assert_eq!(outcome.fragged, None);

        let outcome = table.hitscan(Vec3::ZERO, Vec3::Z, 80.0, 50.0, Some(0));
        let fragged = outcome.fragged.unwrap();
        let peer = table.get(fragged).unwrap();
        assert_eq!(peer.addr, addr(1));
        assert_eq!(peer.health, 0.0);
        assert_eq!(peer.respawn_timer, PEER_RESPAWN_SECS);

        let outcome = table.hitscan(Vec3::ZERO, Vec3::Z, 80.0, 50.0, Some(0));
        assert_eq!(outcome.hits, 0);

        table.tick_respawns(1.0);
        assert_eq!(table.get(fragged).unwrap().health, 0.0);
        table.tick_respawns(0.6);
        assert_eq!(table.get(fragged).unwrap().health, MAX_HEALTH);
    }

    #[test]
    fn test_hitscan_respects_range() {
        let mut table = PeerTable::new();
        table.find_or_admit(addr(1), &packet_at(Vec3::new(0.0, 0.0, 20.0)), 0.0);
        assert_eq!(table.hitscan(Vec3::ZERO, Vec3::Z, 10.0, 10.0, None).hits, 0);
        assert_eq!(table.hitscan(Vec3::ZERO, Vec3::Z, 10.0, 30.0, None).hits, 1);
    }
}
