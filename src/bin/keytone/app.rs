//! keytone - application state and event loop

use std::collections::HashSet;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use ratatui::DefaultTerminal;
use rtrb::Consumer;

use keytone::fx::EffectKind;
use keytone::io::OutputDevice;
use keytone::music::PitchClass;
use keytone::{EngineConfig, EngineHandle, Waveform};

use super::ui;

/// Without key-release reporting, a pressed key plays this long.
const FALLBACK_NOTE_LEN: Duration = Duration::from_millis(250);
/// Two stop presses inside this window escalate to the hard reset.
const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(400);

/// Map a key to (pitch class, octave offset), mirroring two piano rows on the
/// letter rows of a qwerty layout.
fn key_to_note(c: char) -> Option<(PitchClass, i32)> {
    use PitchClass::*;
    let note = match c {
        // Bottom row: white keys
        'a' => (C, 0),
        's' => (D, 0),
        'd' => (E, 0),
        'f' => (F, 0),
        'g' => (G, 0),
        'h' => (A, 0),
        'j' => (B, 0),
        'k' => (C, 1),
        'l' => (D, 1),
        ';' => (E, 1),
        '\'' => (F, 1),
        // Middle row: black keys
        'w' => (Cs, 0),
        'e' => (Ds, 0),
        't' => (Fs, 0),
        'y' => (Gs, 0),
        'u' => (As, 0),
        'o' => (Cs, 1),
        'p' => (Ds, 1),
        _ => return None,
    };
    Some(note)
}

/// Parameter rows the UI can step through for each effect, with their
/// adjustment increments. Values shadow what was last sent to the engine,
/// the way a control surface tracks its own sliders.
pub struct ParamSlider {
    pub name: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

fn sliders_for(effect: EffectKind) -> Vec<ParamSlider> {
    let slider = |name, value, min, max, step| ParamSlider {
        name,
        value,
        min,
        max,
        step,
    };
    match effect {
        EffectKind::None => Vec::new(),
        EffectKind::Delay | EffectKind::Echo => vec![
            slider("time", 0.3, 0.05, 5.0, 0.05),
            slider("feedback", 0.4, 0.0, 0.9, 0.05),
        ],
        EffectKind::Reverb => vec![slider("time", 2.0, 0.5, 5.0, 0.1)],
        EffectKind::Distortion => vec![slider("amount", 50.0, 0.0, 400.0, 10.0)],
        EffectKind::Filter => vec![
            slider("frequency", 1_000.0, 40.0, 12_000.0, 100.0),
            slider("resonance", 0.0, 0.0, 0.95, 0.05),
        ],
    }
}

pub struct App {
    device: OutputDevice,
    handle: EngineHandle,
    /// Recorder tap; drained so the queue never saturates. A real recording
    /// collaborator would consume this instead.
    tap: Consumer<f32>,

    pub octave: i32,
    pub wave1: Waveform,
    pub wave2: Option<Waveform>,
    pub effect: EffectKind,
    pub mix: f32,
    pub sliders: Vec<ParamSlider>,
    pub selected_slider: usize,
    pub held: HashSet<(PitchClass, i32)>,
    pub release_events: bool,

    pending_release: Vec<(Instant, PitchClass, i32)>,
    last_stop: Option<Instant>,
    should_quit: bool,
}

impl App {
    pub fn new() -> EyreResult<Self> {
        let (device, mut handle, tap) = OutputDevice::open(EngineConfig::default())?;

        // Push the engine defaults so UI and engine agree from the start.
        handle.set_waveform1(Waveform::Sine);
        handle.set_waveform2(None);

        let release_events = matches!(
            crossterm::terminal::supports_keyboard_enhancement(),
            Ok(true)
        );

        Ok(Self {
            device,
            handle,
            tap,
            octave: 4,
            wave1: Waveform::Sine,
            wave2: None,
            effect: EffectKind::None,
            mix: 0.5,
            sliders: Vec::new(),
            selected_slider: 0,
            held: HashSet::new(),
            release_events,
            pending_release: Vec::new(),
            last_stop: None,
            should_quit: false,
        })
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        if self.release_events {
            crossterm::execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(terminal);

        if self.release_events {
            let _ = crossterm::execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.drain_tap();
            self.flush_pending_releases();

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        self.handle.stop_all();
        Ok(())
    }

    fn drain_tap(&mut self) {
        while self.tap.pop().is_ok() {}
    }

    /// In fallback mode (no release reporting) notes end on a timer.
    fn flush_pending_releases(&mut self) {
        let now = Instant::now();
        let handle = &mut self.handle;
        let held = &mut self.held;
        self.pending_release.retain(|&(deadline, class, octave)| {
            if now >= deadline {
                handle.note_off(class, octave);
                held.remove(&(class, octave));
                false
            } else {
                true
            }
        });
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Press => self.handle_press(key.code),
            KeyEventKind::Release => self.handle_release(key.code),
            // Key repeat is suppressed: a held key is one note-on.
            KeyEventKind::Repeat => {}
        }
    }

    fn handle_press(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,

            KeyCode::Char(' ') => self.stop_pressed(),

            KeyCode::Char('z') => self.octave = (self.octave - 1).max(0),
            KeyCode::Char('x') => self.octave = (self.octave + 1).min(8),

            KeyCode::Char('1') => self.cycle_wave1(),
            KeyCode::Char('2') => self.cycle_wave2(),

            KeyCode::Char('[') => self.cycle_effect(-1),
            KeyCode::Char(']') => self.cycle_effect(1),

            KeyCode::Char('-') => self.adjust_mix(-0.05),
            KeyCode::Char('=') => self.adjust_mix(0.05),

            KeyCode::Up => self.adjust_slider(1.0),
            KeyCode::Down => self.adjust_slider(-1.0),
            KeyCode::Left => {
                self.selected_slider = self.selected_slider.saturating_sub(1);
            }
            KeyCode::Right => {
                if !self.sliders.is_empty() {
                    self.selected_slider = (self.selected_slider + 1).min(self.sliders.len() - 1);
                }
            }

            KeyCode::Char(c) => {
                if let Some((class, offset)) = key_to_note(c) {
                    self.note_pressed(class, self.octave + offset);
                }
            }
            _ => {}
        }
    }

    fn handle_release(&mut self, code: KeyCode) {
        if let KeyCode::Char(c) = code {
            if let Some((class, offset)) = key_to_note(c) {
                let octave = self.octave + offset;
                self.handle.note_off(class, octave);
                self.held.remove(&(class, octave));
            }
        }
    }

    fn note_pressed(&mut self, class: PitchClass, octave: i32) {
        if !self.held.insert((class, octave)) {
            return; // repeat of a key we already hold
        }

        // Autoplay-policy shape: every note-on re-resumes the device.
        self.device.resume();
        self.handle.note_on(class, octave);

        if !self.release_events {
            self.pending_release
                .push((Instant::now() + FALLBACK_NOTE_LEN, class, octave));
        }
    }

    fn stop_pressed(&mut self) {
        let now = Instant::now();
        let double_tap = self
            .last_stop
            .is_some_and(|last| now.duration_since(last) < DOUBLE_TAP_WINDOW);

        if double_tap {
            self.handle.hard_stop();
        } else {
            self.handle.stop_all();
        }
        self.last_stop = Some(now);
        self.held.clear();
        self.pending_release.clear();
    }

    fn cycle_wave1(&mut self) {
        let all = Waveform::ALL;
        let idx = all.iter().position(|&w| w == self.wave1).unwrap_or(0);
        self.wave1 = all[(idx + 1) % all.len()];
        self.handle.set_waveform1(self.wave1);

        // Mirror the engine's exclusivity rule in the shadow state.
        if self.wave2 == Some(self.wave1) {
            self.wave2 = None;
        }
    }

    fn cycle_wave2(&mut self) {
        // Cycle through: disabled, then every type except oscillator 1's.
        let mut options: Vec<Option<Waveform>> = vec![None];
        options.extend(
            Waveform::ALL
                .iter()
                .filter(|&&w| w != self.wave1)
                .map(|&w| Some(w)),
        );

        let idx = options.iter().position(|&w| w == self.wave2).unwrap_or(0);
        self.wave2 = options[(idx + 1) % options.len()];
        self.handle.set_waveform2(self.wave2);
    }

    fn cycle_effect(&mut self, direction: i32) {
        let all = EffectKind::ALL;
        let idx = all.iter().position(|&k| k == self.effect).unwrap_or(0) as i32;
        let next = (idx + direction).rem_euclid(all.len() as i32) as usize;

        self.effect = all[next];
        self.handle.set_effect(self.effect);
        self.sliders = sliders_for(self.effect);
        self.selected_slider = 0;
        self.mix = 0.5;
    }

    fn adjust_mix(&mut self, delta: f32) {
        if self.effect == EffectKind::None {
            return;
        }
        self.mix = (self.mix + delta).clamp(0.0, 1.0);
        self.handle.set_mix(self.mix);
    }

    fn adjust_slider(&mut self, direction: f32) {
        let Some(slider) = self.sliders.get_mut(self.selected_slider) else {
            return;
        };
        slider.value = (slider.value + direction * slider.step).clamp(slider.min, slider.max);
        self.handle.set_parameter(slider.name, slider.value);
    }
}
