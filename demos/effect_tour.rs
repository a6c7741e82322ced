//! Walks the effect catalog offline: selection, mix, parameter mutation.
//!
//! Run with: cargo run --example effect_tour

use keytone::fx::{EffectKind, ParamValue};
use keytone::music::{PitchClass, PitchSpec};
use keytone::{Engine, EngineConfig};

fn render_peak(engine: &mut Engine, secs: f32) -> f32 {
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
    println!("=== Effect Tour ===\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.note_on(PitchSpec::new(PitchClass::A, 3));
    render_peak(&mut engine, 0.1);

    for kind in [
        EffectKind::None,
        EffectKind::Delay,
        EffectKind::Echo,
        EffectKind::Reverb,
        EffectKind::Distortion,
        EffectKind::Filter,
    ] {
        engine.set_effect(kind);
        let (dry, wet) = engine.mix_state();
        let peak = render_peak(&mut engine, 0.3);

        println!("{:<12} dry {dry:.2} / wet {wet:.2}   peak {peak:.3}", kind.name());
        for param in engine.parameters() {
            match param.value {
                ParamValue::Float(v) => println!("    {} = {v}", param.name),
                ParamValue::Shape(s) => println!("    {} = {}", param.name, s.name()),
            }
        }

        // The safety ceiling would cut the drone eventually; retrigger it
        // so every effect gets a live input.
        engine.note_on(PitchSpec::new(PitchClass::A, 3));
        render_peak(&mut engine, 0.05);
    }

    println!("\nAdjusting delay while it runs:");
    engine.set_effect(EffectKind::Delay);
    engine.set_parameter("time", ParamValue::Float(0.5)).unwrap();
    engine
        .set_parameter("feedback", ParamValue::Float(0.6))
        .unwrap();
    engine.set_mix(0.7);
    let peak = render_peak(&mut engine, 0.5);
    println!("  time=0.5s feedback=0.6 mix=0.7  peak {peak:.3}");

    engine.stop_all();
    render_peak(&mut engine, 0.3);
    println!("\nDone.");
}
