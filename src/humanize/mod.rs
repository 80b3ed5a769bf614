//! Humanization
//!
//! Rewrites a command sequence according to a named profile's numeric
//! settings: synthesized delay jitter, typing-error injection with
//! correction, hesitation pauses, and mouse stripping. All randomness is
//! bounded by the settings and flows through an injected `Rng`, so the
//! transform is reproducible under a seeded generator.

pub mod profile;
pub mod transformer;

pub use profile::{
    HumanizationProfile, HumanizationSettings, ProfileStore, TypingSpeed,
};
pub use transformer::{Humanizer, HESITATION_MULTIPLIER};
