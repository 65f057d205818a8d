use glam::Vec3;

use lanpeer::{
    DamageIntent, EventKind, LocalPlayer, OutgoingIntents, PendingEvent, SyncEngine, Transport,
};

const MOVE_SPEED: f32 = 2.5;
const PATROL_RADIUS: f32 = 6.0;
const EYE_HEIGHT: f32 = 1.5;

const WEAPON_INDEX: u8 = 1;
const WEAPON_DAMAGE: f32 = 34.0;
const WEAPON_RANGE: f32 = 40.0;
const MAGAZINE: i32 = 30;
const FIRE_INTERVAL: f32 = 1.2;

const RESPAWN_SECS: f32 = 3.0;
const FRAG_CASH: i32 = 50;
const FRAG_SCORE: i32 = 100;
const SHARE_INTERVAL: f32 = 15.0;
const SHARE_CASH: i32 = 10;

/// Stand-in for the gameplay layer: patrols a circle, shoots at the nearest
/// hostile peer and shares a little cash now and then.
pub struct Bot {
    pub player: LocalPlayer,
    yaw: f32,
    center: Vec3,
    fire_timer: f32,
    share_timer: f32,
    respawn_timer: f32,
}

#[derive(Debug, Default)]
pub struct BotTick {
    pub intents: OutgoingIntents,
    pub fragged: Option<String>,
    pub respawned: bool,
}

impl Bot {
    pub fn new(team: u8, phase: f32) -> Self {
        let mut bot = Self {
            player: LocalPlayer {
                weapon_index: WEAPON_INDEX,
                ammo: MAGAZINE,
                cash: 500,
                team,
                ..Default::default()
            },
            yaw: phase,
            center: Vec3::ZERO,
            fire_timer: FIRE_INTERVAL,
            share_timer: SHARE_INTERVAL,
            respawn_timer: 0.0,
        };
        bot.player.position = bot.patrol_point();
        bot
    }

    fn patrol_point(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.center + Vec3::new(cos_yaw, 0.0, sin_yaw) * PATROL_RADIUS
    }

    pub fn update<T: Transport>(
        &mut self,
        dt: f32,
        engine: Option<&mut SyncEngine<T>>,
    ) -> BotTick {
        let mut tick = BotTick::default();
        self.player.advance(dt);

        if self.player.health <= 0.0 && !self.player.downed {
            self.player.downed = true;
            self.respawn_timer = RESPAWN_SECS;
        }
        if self.player.downed {
            self.respawn_timer -= dt;
            self.player.revive_progress = (1.0 - self.respawn_timer / RESPAWN_SECS).max(0.0);
            if self.respawn_timer <= 0.0 {
                self.player.downed = false;
                self.player.revive_progress = 0.0;
                self.player.health = 100.0;
                tick.respawned = true;
            }
            return tick;
        }

        self.yaw += MOVE_SPEED / PATROL_RADIUS * dt;
        self.player.position = self.patrol_point();

        self.share_timer -= dt;
        if self.share_timer <= 0.0 {
            self.share_timer = SHARE_INTERVAL;
            if self.player.cash >= SHARE_CASH {
                self.player.cash -= SHARE_CASH;
                tick.intents.share_cash = SHARE_CASH;
            }
        }

        self.fire_timer -= dt;
        if self.fire_timer <= 0.0 {
            self.fire_timer = FIRE_INTERVAL;
            if let Some(engine) = engine {
                self.fire(engine, &mut tick);
            }
        }

        tick
    }

    fn fire<T: Transport>(&mut self, engine: &mut SyncEngine<T>, tick: &mut BotTick) {
        if !engine.config().mode.is_multiplayer() {
            return;
        }

        let origin = self.player.position + Vec3::Y * EYE_HEIGHT;
        let Some(target) = self.nearest_target(engine, origin) else {
            return;
        };
        let Some(dir) = (target - origin).try_normalize() else {
            return;
        };

        self.player.ammo -= 1;
        if self.player.ammo <= 0 {
            self.player.ammo = MAGAZINE;
        }

        let outcome =
            engine.hitscan_peers(origin, dir, WEAPON_DAMAGE, WEAPON_RANGE, self.player.team);
        tick.intents.damage = Some(DamageIntent {
            origin,
            dir,
            damage: WEAPON_DAMAGE,
        });

        let Some(id) = outcome.fragged else {
            return;
        };
        let Some(name) = engine.peers().get(id).map(|peer| peer.name.clone()) else {
            return;
        };
        self.player.cash += FRAG_CASH;
        self.player.score += FRAG_SCORE;
        tick.intents.event = Some(PendingEvent {
            kind: EventKind::Frag,
            team: self.player.team,
            target: name.clone(),
        });
        tick.fragged = Some(name);
    }

    fn nearest_target<T: Transport>(&self, engine: &SyncEngine<T>, origin: Vec3) -> Option<Vec3> {
        let team_mode = engine.config().mode.is_team();
        engine
            .peers()
            .iter()
            .map(|(_, peer)| peer)
            .filter(|peer| peer.respawn_timer <= 0.0)
            .filter(|peer| !team_mode || peer.team() != self.player.team)
            .map(|peer| peer.render_position)
            .filter(|position| position.distance(origin) <= WEAPON_RANGE)
            .min_by(|a, b| a.distance(origin).total_cmp(&b.distance(origin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::net::SocketAddr;

    use lanpeer::net::quantize::quantize_vec3;
    use lanpeer::{GameMode, LanPacket, SyncConfig, WireName};

    #[derive(Default)]
    struct LoopTransport {
        inbox: VecDeque<(Vec<u8>, SocketAddr)>,
    }

    impl Transport for LoopTransport {
        fn broadcast(&mut self, data: &[u8]) -> io::Result<usize> {
            Ok(data.len())
        }

        fn send_to(&mut self, data: &[u8], _addr: SocketAddr) -> io::Result<usize> {
            Ok(data.len())
        }

        fn poll_incoming(&mut self) -> Vec<(Vec<u8>, SocketAddr)> {
            self.inbox.drain(..).collect()
        }

        fn self_addr(&self) -> SocketAddr {
            "10.0.0.1:27015".parse().unwrap()
        }
    }

    fn engine_with_peer(mode: GameMode, position: Vec3) -> SyncEngine<LoopTransport> {
        let config = SyncConfig {
            mode,
            ..Default::default()
        };
        let mut engine = SyncEngine::with_transport(LoopTransport::default(), config, 0.0);
        let packet = LanPacket {
            position: quantize_vec3(position),
            health: 255,
            name: WireName::new("Target"),
            join_seconds: 60,
            ..Default::default()
        };
        engine
            .transport_mut()
            .inbox
            .push_back((packet.encode(true).to_vec(), "10.0.0.2:27015".parse().unwrap()));
        let mut local = LocalPlayer::default();
        engine.tick(0.01, 0.0, &mut local, OutgoingIntents::default());
        engine
    }

    #[test]
    fn test_patrol_stays_on_circle() {
        let mut bot = Bot::new(0, 0.0);
        for _ in 0..200 {
            bot.update::<LoopTransport>(1.0 / 60.0, None);
            assert!((bot.player.position.length() - PATROL_RADIUS).abs() < 0.001);
        }
    }

    #[test]
    fn test_respawns_after_death() {
        let mut bot = Bot::new(0, 0.0);
        bot.player.take_damage(150.0, 0.6);

        let tick = bot.update::<LoopTransport>(0.1, None);
        assert!(bot.player.downed);
        assert!(!tick.respawned);

        let mut respawned = false;
        for _ in 0..40 {
            respawned |= bot.update::<LoopTransport>(0.1, None).respawned;
        }
        assert!(respawned);
        assert!(!bot.player.downed);
        assert_eq!(bot.player.health, 100.0);
    }

    #[test]
    fn test_frags_nearby_peer() {
        let mut engine = engine_with_peer(GameMode::FreeForAll, Vec3::ZERO);
        let mut bot = Bot::new(0, 0.0);

        let mut fragged = None;
        let mut shots = 0;
        for _ in 0..5 {
            let tick = bot.update(FIRE_INTERVAL, Some(&mut engine));
            if tick.intents.damage.is_some() {
                shots += 1;
            }
            if let Some(name) = tick.fragged {
                assert_eq!(tick.intents.event.unwrap().target, "Target");
                fragged = Some(name);
                break;
            }
        }

        assert_eq!(fragged.as_deref(), Some("Target"));
        assert_eq!(shots, 3);
        assert_eq!(bot.player.score, FRAG_SCORE);
    }

    #[test]
    fn test_holds_fire_in_zombies() {
        let mut engine = engine_with_peer(GameMode::Zombies, Vec3::ZERO);
        let mut bot = Bot::new(0, 0.0);
        let tick = bot.update(FIRE_INTERVAL, Some(&mut engine));
        assert!(tick.intents.damage.is_none());
        assert_eq!(bot.player.ammo, MAGAZINE);
    }
}
