mod config;
mod coord;
mod data;
mod interaction;
mod legend;
mod loader;
mod map_draw;
mod menu;
mod popup;
mod session;
mod state;
mod style;
mod transport;
mod ui;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use state::AppState;
use transport::HttpTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let args = config::Args::parse();
    let regions = config::load_regions(&args.regions)?;
    let transport = HttpTransport::new(&args.base_url, args.timeout())?;
    info!("{} regions, backend {}", regions.len(), args.base_url);

    let mut state = AppState::new(regions, Arc::new(transport));
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        state.tick();
        terminal.draw(|f| ui::draw(f, state))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) => {
                    if state.handle_input(code) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => state.handle_mouse(mouse),
                _ => {}
            }
        }
    }
}
