use glam::Vec3;

use super::config::GameMode;
use crate::net::quantize::{ECONOMY_MAX, MAX_HEALTH};
use crate::peer::PeerFlags;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perks {
    pub quickfire: bool,
    pub speed: bool,
    pub revive: bool,
}

/// The local player as gameplay owns it. The sync engine reads it to build
/// outgoing packets and only writes cash, score and health (through
/// [`LocalPlayer::credit`] and [`LocalPlayer::take_damage`]).
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub position: Vec3,
    pub weapon_index: u8,
    pub ammo: i32,
    pub health: f32,
    pub downed: bool,
    pub revive_progress: f32,
    pub damage_cooldown: f32,
    pub score: i32,
    pub cash: i32,
    pub perks: Perks,
    pub team: u8,
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            weapon_index: 0,
            ammo: 0,
            health: MAX_HEALTH,
            downed: false,
            revive_progress: 0.0,
            damage_cooldown: 0.0,
            score: 0,
            cash: 0,
            perks: Perks::default(),
            team: 0,
        }
    }
}

impl LocalPlayer {
    /// Adds a received economy delta, keeping both totals in `0..=60000`.
    pub fn credit(&mut self, cash: i32, score: i32) {
        self.cash = (self.cash + cash).clamp(0, ECONOMY_MAX);
        self.score = (self.score + score).clamp(0, ECONOMY_MAX);
    }

    pub fn take_damage(&mut self, amount: f32, cooldown: f32) {
        self.health = (self.health - amount).max(0.0);
        self.damage_cooldown = cooldown;
    }

    pub fn advance(&mut self, dt: f32) {
        self.damage_cooldown = (self.damage_cooldown - dt).max(0.0);
    }

    pub fn flags(&self, mode: GameMode) -> PeerFlags {
        let mut flags = PeerFlags::empty();
        flags.set(PeerFlags::DOWNED, self.downed);
        flags.set(PeerFlags::PERK_QUICKFIRE, self.perks.quickfire);
        flags.set(PeerFlags::PERK_SPEED, self.perks.speed);
        flags.set(PeerFlags::PERK_REVIVE, self.perks.revive);
        flags.set(PeerFlags::REVIVING, self.revive_progress > 0.0);
        flags.set(PeerFlags::TEAM_MODE, mode.is_team());
        flags.with_team(self.team)
    }
}

/// HUD pip shown after peers shared cash or score with us.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShareIndicator {
    timer: f32,
    cash: i32,
    score: i32,
}

impl ShareIndicator {
    pub fn arm(&mut self, cash: i32, score: i32, duration: f32) {
        self.timer = duration;
        self.cash = cash;
        self.score = score;
    }

    pub fn advance(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
    }

    pub fn is_visible(&self) -> bool {
        self.timer > 0.0
    }

    pub fn values(&self) -> (i32, i32) {
        (self.cash, self.score)
    }
}
