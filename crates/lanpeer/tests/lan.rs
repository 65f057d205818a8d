use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec3;
use lanpeer::{
    GameMode, LanPacket, LocalPlayer, OutgoingIntents, PACKET_SIZE, SyncConfig, SyncEngine,
    Transport, WireName,
};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
}

fn loopback(port: u16) -> SocketAddr {
    format!("127.0.0.1:{}", port).parse().unwrap()
}

fn engine(port: u16, target: u16, name: &str) -> SyncEngine {
    let config = SyncConfig {
        bind_addr: loopback(port),
        broadcast_addr: loopback(target),
        player_name: name.to_string(),
        mode: GameMode::FreeForAll,
        ..SyncConfig::with_port(port)
    };
    SyncEngine::bind(config, 0.0).unwrap()
}

/// Ticks `engine` in real time until `done` holds or `timeout_ms` passes.
fn tick_until(
    engine: &mut SyncEngine,
    local: &mut LocalPlayer,
    clock: Instant,
    timeout_ms: u64,
    mut done: impl FnMut(&SyncEngine) -> bool,
) -> bool {
    let start = Instant::now();
    let mut last = start;
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;
        engine.tick(
            dt,
            clock.elapsed().as_secs_f64(),
            local,
            OutgoingIntents::default(),
        );
        if done(engine) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

fn wait_for_datagram(socket: &UdpSocket, timeout_ms: u64) -> Option<(Vec<u8>, SocketAddr)> {
    let mut buf = [0u8; 128];
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        match socket.recv_from(&mut buf) {
            Ok((size, from)) => return Some((buf[..size].to_vec(), from)),
            Err(_) => thread::sleep(Duration::from_millis(1)),
        }
    }
    None
}

#[test]
fn test_engines_discover_each_other() {
    let port = next_port();
    let mut a = engine(port, port + 1, "Alpha");
    let mut b = engine(port + 1, port, "Bravo");
    let clock = Instant::now();

    let mut local_a = LocalPlayer::default();
    let mut local_b = LocalPlayer {
        position: Vec3::new(2.0, 0.0, 1.5),
        ..Default::default()
    };

    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(2000) {
        let now = clock.elapsed().as_secs_f64();
        a.tick(0.02, now, &mut local_a, OutgoingIntents::default());
        b.tick(0.02, now, &mut local_b, OutgoingIntents::default());
        if a.peers().active_count() == 1 && b.peers().active_count() == 1 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    let (_, bravo) = a.peers().iter().next().expect("a never saw b");
    assert_eq!(bravo.name, "Bravo");
    assert_eq!(bravo.addr, loopback(port + 1));
    assert_eq!(bravo.position, Vec3::new(2.0, 0.0, 1.5));

    let (_, alpha) = b.peers().iter().next().expect("b never saw a");
    assert_eq!(alpha.name, "Alpha");
    assert_eq!(a.stats().decode_failures, 0);
}

#[test]
fn test_newcomer_receives_cached_snapshot() {
    let port = next_port();
    let mut host = engine(port, port + 1, "Host");
    let mut local = LocalPlayer {
        cash: 750,
        ..Default::default()
    };
    let clock = Instant::now();

    let broadcast = tick_until(&mut host, &mut local, clock, 1000, |e| e.stats().packets_sent > 0);
    assert!(broadcast);

    let newcomer = UdpSocket::bind(loopback(port + 2)).unwrap();
    newcomer.set_nonblocking(true).unwrap();
    let hello = LanPacket {
        name: WireName::new("Newbie"),
        health: 255,
        join_seconds: 30,
        ..Default::default()
    };
    newcomer
        .send_to(&hello.encode(true), host.transport().self_addr())
        .unwrap();

    let admitted = tick_until(&mut host, &mut local, clock, 1000, |e| {
        e.peers().active_count() == 1
    });
    assert!(admitted);

    let (data, from) = wait_for_datagram(&newcomer, 500).expect("no catch-up snapshot");
    assert_eq!(from, loopback(port));
    assert_eq!(data.len(), PACKET_SIZE);
    let snapshot = LanPacket::decode(&data, true).unwrap();
    assert_eq!(snapshot.name.to_string_lossy(), "Host");
    assert_eq!(snapshot.cash, 750);
    assert_eq!(host.stats().catch_up_resends, 1);
}

#[test]
fn test_corrupted_datagram_is_rejected() {
    let port = next_port();
    let mut host = engine(port, port + 1, "Host");
    let mut local = LocalPlayer::default();
    let clock = Instant::now();

    let sender = UdpSocket::bind(loopback(port + 2)).unwrap();
    let mut bytes = LanPacket {
        name: WireName::new("Mallory"),
        health: 200,
        ..Default::default()
    }
    .encode(true);
    bytes[13] ^= 0x40;
    sender.send_to(&bytes, loopback(port)).unwrap();
    sender.send_to(&bytes[..40], loopback(port)).unwrap();

    let rejected = tick_until(&mut host, &mut local, clock, 1000, |e| {
        e.stats().decode_failures == 2
    });
    assert!(rejected);
    assert_eq!(host.peers().active_count(), 0);
}
