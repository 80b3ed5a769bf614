//! The humanization transform
//!
//! Rewrites a command sequence in five ordered steps: mouse stripping, gap
//! re-synthesis, typo injection with correction, hesitation pauses, and the
//! structure flag. Randomness is drawn from an injected `Rng`, so a seeded
//! generator reproduces the exact output.

use rand::Rng;

use super::profile::HumanizationSettings;
use crate::command::{Command, CommandSequence, CommandType};

/// Hesitation pauses are this multiple of the scaled upper delay bound
pub const HESITATION_MULTIPLIER: f64 = 3.0;

/// Substitute typo key when the intended key has no QWERTY neighbor
const FALLBACK_TYPO_KEY: &str = "x";

const QWERTY_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

/// Applies a resolved settings bundle to command sequences
#[derive(Debug, Clone)]
pub struct Humanizer {
    settings: HumanizationSettings,
}

impl Humanizer {
    pub fn new(settings: HumanizationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &HumanizationSettings {
        &self.settings
    }

    /// Produce a humanized copy of the sequence.
    ///
    /// Rules, in order:
    /// 1. `remove_mouse_on_upload` drops every mouse command first.
    /// 2. Every inter-command gap becomes a synthesized delay drawn from
    ///    `[min_delay, max_delay]`, scaled by the extension factor, then
    ///    jittered by up to ±`delay_variation` percent and clamped to ≥ 0.
    ///    Original delay commands are re-synthesized the same way.
    /// 3. Each keystroke has a `typing_errors` percent chance of a wrong
    ///    neighboring key, a corrective backspace, then the original.
    /// 4. Each keyboard command has a `hesitation_pauses` percent chance of
    ///    a preceding thinking pause, sized well above the normal gap range.
    /// 5. `preserve_structure` is carried; reordering is unspecified
    ///    upstream and not performed.
    ///
    /// Keys listed in `excluded_keys` are exempt from rules 3 and 4.
    pub fn apply<R: Rng>(&self, sequence: &CommandSequence, rng: &mut R) -> CommandSequence {
        let settings = &self.settings;
        let source: Vec<&Command> = sequence
            .iter()
            .filter(|c| {
                !(settings.remove_mouse_on_upload && c.command_type == CommandType::Mouse)
            })
            .collect();

        let mut output: Vec<Command> = Vec::with_capacity(source.len() * 2);
        let mut gap_pending = false;
        for command in source {
            if command.command_type == CommandType::Delay {
                output.push(Command::delay(self.gap_delay(rng)));
                gap_pending = false;
                continue;
            }

            if gap_pending {
                output.push(Command::delay(self.gap_delay(rng)));
            }

            let key_excluded = command
                .key
                .as_deref()
                .is_some_and(|k| settings.is_excluded(k));

            if command.command_type == CommandType::Keyboard
                && !key_excluded
                && self.chance(settings.hesitation_pauses, rng)
            {
                output.push(Command::delay(self.hesitation_delay()));
            }

            if command.is_keystroke() && !key_excluded && self.chance(settings.typing_errors, rng) {
                let intended = command.key.as_deref().unwrap_or_default();
                let mut typo = command.clone();
                typo.key = Some(neighbor_key(intended, rng));
                output.push(typo);
                output.push(Command::delay(self.gap_delay(rng)));
                output.push(Command::keyboard(command.action.clone(), "backspace"));
                output.push(Command::delay(self.gap_delay(rng)));
            }

            output.push(command.clone());
            gap_pending = true;
        }

        CommandSequence::new(output)
    }

    /// One synthesized inter-command gap: bounded draw, stretched, jittered,
    /// clamped to ≥ 0
    fn gap_delay<R: Rng>(&self, rng: &mut R) -> u64 {
        let settings = &self.settings;
        let base = rng.gen_range(settings.min_delay..=settings.max_delay) as f64
            * settings.time_extension_factor;
        let jitter_pct = rng.gen_range(-settings.delay_variation..=settings.delay_variation);
        let value = base * (1.0 + jitter_pct / 100.0);
        value.max(0.0).round() as u64
    }

    /// A thinking pause, sized as a multiple of the scaled upper bound
    fn hesitation_delay(&self) -> u64 {
        let settings = &self.settings;
        (settings.max_delay as f64 * settings.time_extension_factor * HESITATION_MULTIPLIER)
            .round() as u64
    }

    fn chance<R: Rng>(&self, percent: f64, rng: &mut R) -> bool {
        percent > 0.0 && rng.gen_range(0.0..100.0) < percent
    }
}

/// Pick a QWERTY neighbor of the intended key, or a fixed substitute for
/// keys without one. Never returns the intended key itself.
fn neighbor_key<R: Rng>(intended: &str, rng: &mut R) -> String {
    let mut chars = intended.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return FALLBACK_TYPO_KEY.to_string();
    };
    let lower = letter.to_ascii_lowercase();
    for row in QWERTY_ROWS {
        if let Some(index) = row.find(lower) {
            // Every row letter has at least one horizontal neighbor
            let mut neighbors: Vec<char> = Vec::with_capacity(2);
            if index > 0 {
                neighbors.extend(row[..index].chars().last());
            }
            neighbors.extend(row[index + 1..].chars().next());
            return neighbors[rng.gen_range(0..neighbors.len())].to_string();
        }
    }
    FALLBACK_TYPO_KEY.to_string()
}
