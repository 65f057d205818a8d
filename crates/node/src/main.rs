mod bot;
mod config;
mod events;
mod session;
mod tui;

use std::io;
use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::{ModeArg, NodeConfig};
use events::EventLevel;
use session::Session;
use tui::TuiState;

#[derive(Parser)]
#[command(name = "lanpeer-node")]
#[command(about = "LAN peer sync node")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    #[arg(short, long, default_value_t = lanpeer::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value = "255.255.255.255", help = "Subnet broadcast address")]
    broadcast: IpAddr,

    #[arg(short, long, default_value = "", help = "Player name (max 11 bytes)")]
    name: String,

    #[arg(short, long, value_enum, default_value_t = ModeArg::Ffa)]
    mode: ModeArg,

    #[arg(long, help = "Send and accept packets without checksum verification")]
    no_checksum: bool,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = NodeConfig {
        bind: args.bind,
        port: args.port,
        broadcast: args.broadcast,
        name: args.name,
        mode: args.mode,
        use_checksum: !args.no_checksum,
        tick_rate: args.tick_rate,
    };

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let mut session = Session::new(config);
        log::info!("Node started ({})", session.stats().mode);
        session.run();
        log::info!("Node shutting down");
    } else {
        let mut session = Session::new(config);
        run_with_tui(&mut session)?;
    }

    Ok(())
}

fn run_with_tui(session: &mut Session) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = session.running();
    let mut tui_state = TuiState::new();

    let stats = session.stats();
    match stats.self_addr {
        Some(addr) if stats.online => {
            tui_state.log_info(format!("Node started on {} ({})", addr, stats.mode));
        }
        _ => tui_state.log_error("Could not open the LAN socket, running offline"),
    }

    while running.load(Ordering::SeqCst) {
        session.tick_once();
        tui_state.set_uptime(session.stats().uptime_secs);

        for event in session.drain_events() {
            match event.level() {
                EventLevel::Info => tui_state.log_info(event.message()),
                EventLevel::Warn => tui_state.log_warn(event.message()),
            }
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && tui_state.is_editing_name() {
                    match key.code {
                        KeyCode::Enter => {
                            if let Some(input) = tui_state.finish_name_edit() {
                                let name = session.rename(&input);
                                tui_state.log_info(format!("Now playing as '{}'", name));
                            }
                        }
                        KeyCode::Esc => tui_state.cancel_name_edit(),
                        KeyCode::Backspace => tui_state.pop_name_char(),
                        KeyCode::Char(c) => tui_state.push_name_char(c),
                        _ => {}
                    }
                } else if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            let enabled = session.toggle_checksum();
                            tui_state.log_info(format!(
                                "Checksum {}",
                                if enabled { "enabled" } else { "disabled" }
                            ));
                        }
                        KeyCode::Char('n') | KeyCode::Char('N') => tui_state.begin_name_edit(),
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        let stats = session.stats();
        let peers = session.peer_rows();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats, &peers);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
