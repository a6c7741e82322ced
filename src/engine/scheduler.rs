use crate::music::{PitchSpec, VoiceId};

/*
Timer Queue
===========

The engine's only clock is the audio frame counter, so every deferred action -
safety stops, retrigger respawns, the stop-all cleanup - is an entry on this
queue: fire this event once the counter passes that deadline.

Two rules keep stale timers from acting on reused voice slots:

- Every scheduling site gets a token back. The moment a voice leaves `Active`
  by some other path, its pending timers are cancelled by token (or by
  predicate for events keyed on note identity).
- An entry fires exactly once: firing removes it.

Entries are drained at block boundaries, ordered by deadline so two events due
in the same block fire in schedule order.
*/

/// Cancellation handle for one scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerEvent {
    /// Hard ceiling on voice duration: force release if still sounding.
    SafetyStop(VoiceId),
    /// Deferred half of a retrigger: create the replacement voice.
    Respawn(PitchSpec),
    /// End of a stop-all release window: force-clear and rebuild the output.
    StopAllCleanup,
}

struct TimerEntry {
    deadline: u64,
    token: TimerToken,
    event: TimerEvent,
}

pub struct Scheduler {
    entries: Vec<TimerEntry>,
    next_token: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_token: 0,
        }
    }

    pub fn schedule(&mut self, deadline_frames: u64, event: TimerEvent) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.entries.push(TimerEntry {
            deadline: deadline_frames,
            token,
            event,
        });
        token
    }

    /// Remove one entry by token. Returns false if it already fired or was
    /// cancelled - callers treat that as "nothing pending", not an error.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.token != token);
        self.entries.len() != before
    }

    /// Remove every entry whose event matches the predicate.
    pub fn cancel_matching(&mut self, mut pred: impl FnMut(&TimerEvent) -> bool) {
        self.entries.retain(|e| !pred(&e.event));
    }

    /// Pop every entry due at or before `now` into `out`, oldest first.
    pub fn drain_due(&mut self, now: u64, out: &mut Vec<TimerEvent>) {
        let mut due: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(i, _)| i)
            .collect();
        due.sort_by_key(|&i| (self.entries[i].deadline, self.entries[i].token.0));

        for &i in &due {
            out.push(self.entries[i].event);
        }
        self.entries.retain(|e| e.deadline > now);
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
