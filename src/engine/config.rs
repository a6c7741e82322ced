/// Engine-wide tuning. All timings in seconds unless noted.
///
/// The release constants encode a deliberate shape: notes released quickly
/// after they start get a short tail so fast passages stay crisp; held notes
/// get a longer tail so pads do not clip off. A retriggered note releases
/// faster still, since its replacement is already on the way.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sample_rate: f32,

    /// Nominal master gain feeding the effects chain.
    pub master_level: f32,
    /// Master crossfade window after an emergency reset.
    pub reset_ramp: f32,

    /// Operating gain of the primary oscillator.
    pub osc1_level: f32,
    /// Operating gain of the secondary oscillator.
    pub osc2_level: f32,

    /// Linear attack ramp from silence to operating gain.
    pub attack: f32,
    /// Release window for notes younger than `rapid_note_age`.
    pub release_rapid: f32,
    /// Release window for held notes.
    pub release_held: f32,
    /// Accelerated release applied to the predecessor on retrigger.
    pub release_retrigger: f32,
    /// Age below which a note counts as "rapid".
    pub rapid_note_age: f32,

    /// Hard ceiling on voice duration without a note-off.
    pub safety_timeout: f32,
    /// Frames between scheduling a retrigger release and creating the
    /// replacement voice.
    pub retrigger_gap_frames: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            master_level: 0.7,
            reset_ramp: 0.05,
            osc1_level: 0.5,
            osc2_level: 0.4,
            attack: 0.010,
            release_rapid: 0.050,
            release_held: 0.200,
            release_retrigger: 0.015,
            rapid_note_age: 1.0,
            safety_timeout: 5.0,
            retrigger_gap_frames: 64,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub(crate) fn secs_to_frames(&self, secs: f32) -> u64 {
        (secs * self.sample_rate) as u64
    }
}
