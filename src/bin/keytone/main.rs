//! keytone - terminal keyboard for the synth engine
//!
//! Run with: cargo run --bin keytone
//!
//! The terminal is an input-surface adapter: it owns the key-to-note binding
//! table and key-repeat suppression, and talks to the engine only through the
//! control handle.

mod app;
mod ui;

use app::App;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let mut app = App::new()?;
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
