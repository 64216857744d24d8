//! Scripted uniform source for integration testing.
//!
//! Replays a fixed list of draws so a whole match can be driven
//! deterministically from test code.

use parimutuel_sim::market::UniformSource;

/// Returns the scripted draws in order, then panics when exhausted.
pub struct ScriptedSource {
    draws: Vec<f64>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, next: 0 }
    }

    /// Draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.len() - self.next
    }
}

impl UniformSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        let u = self.draws[self.next];
        self.next += 1;
        u
    }
}
