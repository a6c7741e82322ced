use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Pitch Model
===========

The keyboard surface speaks in pitch names ("C#", octave 4), not MIDI numbers,
so the engine keys everything on (pitch class, octave) pairs.

Frequency comes from twelve-tone equal temperament referenced to A4 = 440 Hz:

    freq = 440 * 2^(semitones_from_A4 / 12)

where semitones_from_A4 = 12 * (octave - 4) + (semitone_index - 9).
Every octave doubles the frequency; every semitone multiplies by 2^(1/12).
*/

/// Semitone index within an octave: C=0 .. B=11.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    pub fn semitone(self) -> i32 {
        match self {
            PitchClass::C => 0,
            PitchClass::Cs => 1,
            PitchClass::D => 2,
            PitchClass::Ds => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::Fs => 6,
            PitchClass::G => 7,
            PitchClass::Gs => 8,
            PitchClass::A => 9,
            PitchClass::As => 10,
            PitchClass::B => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Parse a pitch-class name as the input surface spells it ("C", "F#", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|pc| pc.name() == name)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete pitch: class plus octave. Any integer octave is valid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchSpec {
    pub class: PitchClass,
    pub octave: i32,
}

impl PitchSpec {
    pub fn new(class: PitchClass, octave: i32) -> Self {
        Self { class, octave }
    }

    /// Fundamental frequency in Hz (equal temperament, A4 = 440).
    pub fn frequency(self) -> f32 {
        let semitones_from_a4 = 12 * (self.octave - 4) + (self.class.semitone() - 9);
        440.0 * 2.0_f32.powf(semitones_from_a4 as f32 / 12.0)
    }

    pub fn id(self) -> VoiceId {
        VoiceId(self)
    }
}

impl fmt::Display for PitchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

/// Unique key for a sounding note: at most one live voice per VoiceId.
///
/// Displays as "{class}-{octave}" ("A-4", "C#-3").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(PitchSpec);

impl VoiceId {
    pub fn pitch(self) -> PitchSpec {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0.class, self.0.octave)
    }
}
