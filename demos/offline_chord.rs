//! Demonstrates the voice lifecycle without real-time audio:
//! note-on, retrigger, note-off, safety timeout, stop-all.
//!
//! Run with: cargo run --example offline_chord

use keytone::music::{PitchClass, PitchSpec};
use keytone::{Engine, EngineConfig, Waveform};

fn render_secs(engine: &mut Engine, secs: f32) -> f32 {
    let total = (secs * engine.sample_rate()) as usize;
    let mut block = [0.0f32; 256];
    let mut peak = 0.0f32;

    let mut rendered = 0;
    while rendered < total {
        let n = (total - rendered).min(block.len());
        engine.render_block(&mut block[..n]);
        peak = block[..n].iter().fold(peak, |acc, &x| acc.max(x.abs()));
        rendered += n;
    }
    peak
}

fn main() {
    println!("=== Offline Chord Demo ===\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.set_waveform1(Waveform::Sine);
    engine.set_waveform2(Some(Waveform::Square));

    // Play a C major chord.
    println!("Note on: C4, E4, G4 (sine + square per note)");
    for class in [PitchClass::C, PitchClass::E, PitchClass::G] {
        engine.note_on(PitchSpec::new(class, 4));
    }

    let peak = render_secs(&mut engine, 0.5);
    println!(
        "  active voices: {}, peak after 500ms: {peak:.3}\n",
        engine.active_voices()
    );

    // Retrigger C4 while it is sounding.
    println!("Retrigger: note on C4 again");
    engine.note_on(PitchSpec::new(PitchClass::C, 4));
    render_secs(&mut engine, 0.1);
    println!(
        "  active: {} (old C4 released on the fast ramp, replacement took over)\n",
        engine.active_voices()
    );

    // Release two notes.
    println!("Note off: E4, G4");
    engine.note_off(PitchSpec::new(PitchClass::E, 4));
    engine.note_off(PitchSpec::new(PitchClass::G, 4));
    render_secs(&mut engine, 0.5);
    println!(
        "  active: {}, releasing: {}\n",
        engine.active_voices(),
        engine.releasing_voices()
    );

    // Leave C4 stuck; the safety ceiling releases it.
    println!("No note-off for C4: waiting out the 5s safety ceiling...");
    render_secs(&mut engine, 5.2);
    println!(
        "  active: {} (safety timeout forced the release)\n",
        engine.active_voices()
    );

    // Stop everything.
    println!("stop_all()");
    engine.stop_all();
    let peak = render_secs(&mut engine, 0.5);
    println!(
        "  active: {}, releasing: {}, peak during teardown: {peak:.3}",
        engine.active_voices(),
        engine.releasing_voices()
    );
    let peak = render_secs(&mut engine, 0.2);
    println!("  peak after teardown: {peak:.3} (silence)\n");

    println!("=== Lifecycle ===");
    println!("note-on  -> attack ramp, safety deadline armed");
    println!("retrigger -> fast release of the old voice, replacement scheduled after");
    println!("note-off -> rapid or held release by note age");
    println!("stop-all -> release everything, then rebuild the output stage");
}
