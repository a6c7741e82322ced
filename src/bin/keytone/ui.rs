//! Status panel: engine settings on top, the key map below.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use keytone::fx::EffectKind;

use super::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Oscillators
            Constraint::Length(4), // Effect + params
            Constraint::Length(3), // Held notes
            Constraint::Min(6),    // Key map
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    render_oscillators(frame, chunks[0], app);
    render_effect(frame, chunks[1], app);
    render_held(frame, chunks[2], app);
    render_keymap(frame, chunks[3]);

    let help = Paragraph::new(
        " [q] quit  [space] stop (double-tap: hard reset)  [z/x] octave  [1/2] waves  [[/]] effect  [-/=] mix  [arrows] params",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[4]);
}

fn render_oscillators(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let block = Block::default().title(" keytone ").borders(Borders::ALL);

    let wave2 = app
        .wave2
        .map_or("disabled".to_string(), |w| w.name().to_string());

    let line = Line::from(vec![
        Span::styled(
            format!(" octave: {}  ", app.octave),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("osc1: {}  ", app.wave1.name()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!("osc2: {wave2}  "),
            Style::default().fg(if app.wave2.is_some() {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            if app.release_events {
                "release: keys"
            } else {
                "release: timed"
            },
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_effect(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let block = Block::default().title(" effect ").borders(Borders::ALL);

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!(" {}  ", app.effect.name()),
            Style::default().fg(Color::Magenta),
        ),
        if app.effect == EffectKind::None {
            Span::styled("(dry passthrough)", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(
                format!("mix: {:.0}% wet", app.mix * 100.0),
                Style::default().fg(Color::White),
            )
        },
    ])];

    if !app.sliders.is_empty() {
        let mut spans = vec![Span::raw(" ")];
        for (i, slider) in app.sliders.iter().enumerate() {
            let style = if i == app.selected_slider {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(
                format!("{}: {:.2}   ", slider.name, slider.value),
                style,
            ));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_held(frame: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let block = Block::default().title(" sounding ").borders(Borders::ALL);

    let mut notes: Vec<String> = app
        .held
        .iter()
        .map(|&(class, octave)| format!("{class}{octave}"))
        .collect();
    notes.sort();

    let line = if notes.is_empty() {
        Line::from(Span::styled(" -", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(Span::styled(
            format!(" {}", notes.join("  ")),
            Style::default().fg(Color::Green),
        ))
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_keymap(frame: &mut Frame, area: ratatui::layout::Rect) {
    let block = Block::default().title(" keys ").borders(Borders::ALL);

    let rows = vec![
        Line::from(Span::raw("  black:   w  e     t  y  u     o  p")),
        Line::from(Span::raw("  white:  a  s  d  f  g  h  j  k  l  ;  '")),
        Line::from(Span::raw("          C  D  E  F  G  A  B  C+ D+ E+ F+")),
    ];

    frame.render_widget(Paragraph::new(rows).block(block), area);
}
