//! Benchmarks for the synth engine.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Groups:
//!   - engine/voices   Full render path with N-note polyphony
//!   - engine/effects  Block cost of each effect topology

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use keytone::fx::{EffectKind, ParamValue};
use keytone::music::{PitchClass, PitchSpec};
use keytone::{Engine, EngineConfig, Waveform};

const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

fn chord(engine: &mut Engine, notes: usize) {
    let classes = [
        PitchClass::C,
        PitchClass::E,
        PitchClass::G,
        PitchClass::B,
        PitchClass::D,
        PitchClass::F,
        PitchClass::A,
        PitchClass::Cs,
    ];
    for (i, &class) in classes.iter().take(notes).enumerate() {
        engine.note_on(PitchSpec::new(class, 3 + (i as i32 % 3)));
    }
}

fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &polyphony in &[1usize, 4, 8] {
            let mut engine = Engine::new(EngineConfig::default());
            engine.set_waveform1(Waveform::Sawtooth);
            engine.set_waveform2(Some(Waveform::Square));
            chord(&mut engine, polyphony);
            // Move everything past its attack so we measure steady state.
            engine.render_block(&mut buffer);

            group.bench_with_input(
                BenchmarkId::new(format!("poly_{polyphony}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        engine.render_block(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/effects");

    let effects = [
        EffectKind::Delay,
        EffectKind::Echo,
        EffectKind::Reverb,
        EffectKind::Distortion,
        EffectKind::Filter,
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for &kind in &effects {
            let mut engine = Engine::new(EngineConfig::default());
            engine.set_effect(kind);
            if kind == EffectKind::Reverb {
                engine
                    .set_parameter("time", ParamValue::Float(2.0))
                    .unwrap();
            }
            chord(&mut engine, 2);
            engine.render_block(&mut buffer);

            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, _| {
                b.iter(|| {
                    engine.render_block(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_voices, bench_effects);
criterion_main!(benches);
