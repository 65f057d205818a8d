use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table};

use lanpeer::MAX_PEERS;
use lanpeer::net::NAME_BYTES;

use crate::session::{PeerRow, SessionStats};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: LogLevel,
    pub uptime_secs: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct TuiState {
    logs: VecDeque<LogLine>,
    scroll: usize,
    uptime_secs: u64,
    name_input: Option<String>,
}

impl TuiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_uptime(&mut self, secs: u64) {
        self.uptime_secs = secs;
    }

    fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.logs.len() == MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(LogLine {
            level,
            uptime_secs: self.uptime_secs,
            message: message.into(),
        });
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    /// Scrolls back toward older lines. Zero means pinned to the newest.
    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    pub fn is_editing_name(&self) -> bool {
        self.name_input.is_some()
    }

    pub fn begin_name_edit(&mut self) {
        self.name_input = Some(String::new());
    }

    pub fn push_name_char(&mut self, c: char) {
        if let Some(input) = self.name_input.as_mut() {
            if !c.is_control() && input.len() + c.len_utf8() < NAME_BYTES {
                input.push(c);
            }
        }
    }

    pub fn pop_name_char(&mut self) {
        if let Some(input) = self.name_input.as_mut() {
            input.pop();
        }
    }

    pub fn cancel_name_edit(&mut self) {
        self.name_input = None;
    }

    /// Ends editing and hands back what was typed.
    pub fn finish_name_edit(&mut self) -> Option<String> {
        self.name_input.take()
    }

    /// Lines to show in a pane `height` rows tall, oldest first.
    fn visible_logs(&self, height: usize) -> impl Iterator<Item = &LogLine> {
        let end = self.logs.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        self.logs.range(start..end)
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &SessionStats, peers: &[PeerRow]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(MAX_PEERS as u16 + 3),
            Constraint::Length(6),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_peer_gauge(frame, chunks[1], stats);
    render_roster(frame, chunks[2], peers);
    render_network(frame, chunks[3], stats);
    render_logs(frame, chunks[4], state);
    render_help(frame, chunks[5], state);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &SessionStats) {
    let name = if stats.name.is_empty() {
        "(unnamed)"
    } else {
        stats.name.as_str()
    };
    let title = format!(
        " LAN Peer - {} - {} - Uptime: {} ",
        name,
        stats.mode,
        format_duration(stats.uptime_secs)
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let address = match (stats.online, stats.self_addr) {
        (true, Some(addr)) => addr.to_string(),
        _ => "offline".to_string(),
    };
    let mut spans = vec![
        Span::styled(address, Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(
            format!("HP {:.0}", stats.health),
            Style::default().fg(if stats.downed { Color::Red } else { Color::White }),
        ),
        Span::raw(format!(
            "  Cash {}  Score {}  Ammo {}",
            stats.cash, stats.score, stats.ammo
        )),
    ];
    if let Some((cash, score)) = stats.share {
        spans.push(Span::styled(
            format!("  [shared {:+}/{:+}]", cash, score),
            Style::default().fg(Color::Green),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_peer_gauge(frame: &mut Frame, area: Rect, stats: &SessionStats) {
    let checksum = if stats.use_checksum { "on" } else { "off" };
    let block = Block::default()
        .title(format!(" Peers (checksum {}) ", checksum))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let ratio = stats.peer_count as f64 / MAX_PEERS as f64;
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.min(1.0))
        .label(format!("{}/{} peers", stats.peer_count, MAX_PEERS));

    frame.render_widget(gauge, area);
}

fn render_roster(frame: &mut Frame, area: Rect, peers: &[PeerRow]) {
    let header = Row::new(
        ["Name", "Team", "Status", "Wpn", "Ammo", "HP", "Cash", "Score", "Age", "Heard"]
            .into_iter()
            .map(|title| Cell::from(title).style(Style::default().fg(Color::Gray))),
    );

    let rows = peers.iter().map(|peer| {
        let status_color = match peer.status {
            "DOWN" => Color::Red,
            "REV" => Color::Yellow,
            _ => Color::Green,
        };
        Row::new(vec![
            Cell::from(peer.name.clone()),
            Cell::from(if peer.team == 0 { "A" } else { "B" }),
            Cell::from(peer.status).style(Style::default().fg(status_color)),
            Cell::from(peer.weapon_index.to_string()),
            Cell::from(peer.ammo.to_string()),
            Cell::from(format!("{:.0}", peer.health)),
            Cell::from(peer.cash.to_string()),
            Cell::from(peer.score.to_string()),
            Cell::from(format!("{}s", peer.join_age_secs)),
            Cell::from(format!("{:.1}s", peer.silent_secs)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Roster ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    frame.render_widget(table, area);
}

fn render_network(frame: &mut Frame, area: Rect, stats: &SessionStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let net = &stats.network_stats;
    let failure_percent = net.decode_failure_percent();
    let lines = vec![
        Line::from(vec![
            Span::styled("Packets: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} sent / {} recv", net.packets_sent, net.packets_received),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Bytes: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} sent / {} recv",
                    format_bytes(net.bytes_sent),
                    format_bytes(net.bytes_received)
                ),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Rejected: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} undecodable ({:.1}%), {} from self, {} refused",
                    net.decode_failures, failure_percent, net.self_dropped, net.admissions_refused
                ),
                Style::default().fg(if failure_percent > 5.0 {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Send failures: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{}  |  catch-up resends: {}",
                    net.send_failures, net.catch_up_resends
                ),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .visible_logs(height)
        .map(|line| {
            let (tag, color) = match line.level {
                LogLevel::Info => ("INFO", Color::White),
                LogLevel::Warn => ("WARN", Color::Yellow),
                LogLevel::Error => ("ERR ", Color::Red),
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", format_duration(line.uptime_secs)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{} ", tag), Style::default().fg(color)),
                Span::raw(line.message.clone()),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect, state: &TuiState) {
    if let Some(input) = &state.name_input {
        let block = Block::default()
            .title(" New name (Enter to apply, ESC to cancel) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let text = Paragraph::new(format!("{}_", input)).block(block);
        frame.render_widget(text, area);
        return;
    }

    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(
        "'q'/ESC quit  |  'c' toggle checksum  |  'n' rename  |  PgUp/PgDn/End scroll log",
    )
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut state = TuiState::new();
        for i in 0..MAX_LOG_LINES + 20 {
            state.log_info(format!("line {}", i));
        }
        assert_eq!(state.logs.len(), MAX_LOG_LINES);
        assert_eq!(state.logs.front().unwrap().message, "line 20");
    }

    #[test]
    fn test_scrolling_window() {
        let mut state = TuiState::new();
        for i in 0..20 {
            state.log_warn(format!("line {}", i));
        }

        let newest: Vec<_> = state.visible_logs(3).map(|l| l.message.as_str()).collect();
        assert_eq!(newest, ["line 17", "line 18", "line 19"]);

        state.scroll_up();
        let older: Vec<_> = state.visible_logs(3).map(|l| l.message.as_str()).collect();
        assert_eq!(older, ["line 12", "line 13", "line 14"]);

        state.scroll_down();
        state.scroll_down();
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn test_name_edit_respects_wire_width() {
        let mut state = TuiState::new();
        state.push_name_char('x');
        assert!(!state.is_editing_name());

        state.begin_name_edit();
        for c in "Andromedarius".chars() {
            state.push_name_char(c);
        }
        state.push_name_char('\n');
        state.pop_name_char();
        assert_eq!(state.finish_name_edit().as_deref(), Some("Andromedar"));
        assert!(!state.is_editing_name());

        state.begin_name_edit();
        state.push_name_char('V');
        state.cancel_name_edit();
        assert_eq!(state.finish_name_edit(), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2048), "2.0KB");
    }
}
