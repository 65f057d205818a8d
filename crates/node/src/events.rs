use std::net::SocketAddr;

use lanpeer::{EventKind, PeerTable, TickReport};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    PeerJoined { name: String, addr: SocketAddr },
    PeerTimedOut { name: String, addr: SocketAddr },
    PeerRefused { count: u32 },
    ShareReceived { cash: i32, score: i32 },
    CatchUpCredited { peers: u32 },
    DamageTaken { amount: f32, hits: u32 },
    Feed { kind: EventKind, actor: String, target: String },
    Fragged { name: String },
    LocalRespawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
}

impl NodeEvent {
    /// Turns the side effects of one engine tick into log-worthy events.
    pub fn from_report(report: &TickReport, peers: &PeerTable) -> Vec<NodeEvent> {
        let mut events = Vec::new();

        for id in &report.admitted {
            if let Some(peer) = peers.get(*id) {
                events.push(NodeEvent::PeerJoined {
                    name: peer.name.clone(),
                    addr: peer.addr,
                });
            }
        }
        for peer in &report.evicted {
            events.push(NodeEvent::PeerTimedOut {
                name: peer.name.clone(),
                addr: peer.addr,
            });
        }
        if report.refused > 0 {
            events.push(NodeEvent::PeerRefused {
                count: report.refused,
            });
        }
        if report.cash_received != 0 || report.score_received != 0 {
            events.push(NodeEvent::ShareReceived {
                cash: report.cash_received,
                score: report.score_received,
            });
        }
        if report.catch_up_credits > 0 {
            events.push(NodeEvent::CatchUpCredited {
                peers: report.catch_up_credits,
            });
        }
        if report.hits_taken > 0 {
            events.push(NodeEvent::DamageTaken {
                amount: report.damage_taken,
                hits: report.hits_taken,
            });
        }
        for event in &report.events {
            events.push(NodeEvent::Feed {
                kind: event.kind,
                actor: event.actor.clone(),
                target: event.target.clone(),
            });
        }

        events
    }

    pub fn level(&self) -> EventLevel {
        match self {
            NodeEvent::PeerRefused { .. } | NodeEvent::DamageTaken { .. } => EventLevel::Warn,
            _ => EventLevel::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            NodeEvent::PeerJoined { name, addr } => format!("{} joined from {}", name, addr),
            NodeEvent::PeerTimedOut { name, addr } => format!("{} ({}) timed out", name, addr),
            NodeEvent::PeerRefused { count } => {
                format!("Peer table full, ignored {} datagram(s)", count)
            }
            NodeEvent::ShareReceived { cash, score } => {
                format!("Shared with us: {:+} cash, {:+} score", cash, score)
            }
            NodeEvent::CatchUpCredited { peers } => {
                format!("Welcome credit queued for {} new peer(s)", peers)
            }
            NodeEvent::DamageTaken { amount, hits } => {
                format!("Took {:.0} damage from {} hit(s)", amount, hits)
            }
            NodeEvent::Feed { kind, actor, target } => match kind {
                EventKind::Frag => format!("{} fragged {}", actor, target),
                EventKind::Assist => format!("{} assisted on {}", actor, target),
            },
            NodeEvent::Fragged { name } => format!("We fragged {}", name),
            NodeEvent::LocalRespawn => "Respawned".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanpeer::IncomingEvent;

    #[test]
    fn test_empty_report_has_no_events() {
        let events = NodeEvent::from_report(&TickReport::default(), &PeerTable::new());
        assert!(events.is_empty());
    }

    #[test]
    fn test_report_side_effects_become_events() {
        let report = TickReport {
            refused: 2,
            cash_received: 20,
            score_received: 0,
            damage_taken: 30.0,
            hits_taken: 1,
            events: vec![IncomingEvent {
                kind: EventKind::Frag,
                team: 0,
                id: 1,
                actor: "Nova".to_string(),
                target: "Vega".to_string(),
            }],
            ..Default::default()
        };

        let events = NodeEvent::from_report(&report, &PeerTable::new());
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].level(), EventLevel::Warn);
        assert_eq!(events[1].message(), "Shared with us: +20 cash, +0 score");
        assert_eq!(events[3].message(), "Nova fragged Vega");
    }
}
