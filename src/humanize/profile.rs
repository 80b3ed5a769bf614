//! Humanization profiles and settings
//!
//! Settings are explicit validated structs; range constraints are checked
//! at the boundary and rejected, never silently clamped. The typing-speed
//! multiplier is applied only at the point of use via
//! [`HumanizationProfile::resolved_settings`], leaving the stored profile
//! untouched.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{Error, Result};

/// Coarse typing speed, scaling variation and hesitation at point of use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypingSpeed {
    Slow,
    Medium,
    Fast,
}

impl TypingSpeed {
    /// Multiplier applied to delay variation and hesitation chance
    pub fn multiplier(&self) -> f64 {
        match self {
            TypingSpeed::Slow => 1.5,
            TypingSpeed::Medium => 1.0,
            TypingSpeed::Fast => 0.6,
        }
    }
}

/// Numeric settings driving the humanization transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanizationSettings {
    /// Delay jitter, percent of the synthesized gap (1–100)
    pub delay_variation: f64,
    /// Chance per keystroke of an injected typo, percent (0–10)
    pub typing_errors: f64,
    /// Chance of a thinking pause before a keyboard command, percent (0–50)
    pub hesitation_pauses: f64,
    /// Keep the original relative ordering of non-injected commands.
    /// Only `true` has specified behavior; `false` is carried but does not
    /// reorder.
    pub preserve_structure: bool,
    /// Uniform stretch applied to every synthesized gap (1.0–5.0)
    pub time_extension_factor: f64,
    /// Lower bound of the synthesized inter-command gap, ms
    pub min_delay: u64,
    /// Upper bound of the synthesized inter-command gap, ms
    pub max_delay: u64,
    /// Keys exempt from typo injection and hesitation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_keys: Option<BTreeSet<String>>,
    /// Drop every mouse command before any other step
    pub remove_mouse_on_upload: bool,
}

impl Default for HumanizationSettings {
    fn default() -> Self {
        Self {
            delay_variation: 20.0,
            typing_errors: 2.0,
            hesitation_pauses: 10.0,
            preserve_structure: true,
            time_extension_factor: 1.0,
            min_delay: 50,
            max_delay: 500,
            excluded_keys: None,
            remove_mouse_on_upload: false,
        }
    }
}

impl HumanizationSettings {
    /// Validate range constraints, rejecting the first out-of-range field
    pub fn validate(&self) -> Result<()> {
        if !(1.0..=100.0).contains(&self.delay_variation) {
            return Err(Error::Validation(format!(
                "delay_variation must be in [1, 100], got {}",
                self.delay_variation
            )));
        }
        if !(0.0..=10.0).contains(&self.typing_errors) {
            return Err(Error::Validation(format!(
                "typing_errors must be in [0, 10], got {}",
                self.typing_errors
            )));
        }
        if !(0.0..=50.0).contains(&self.hesitation_pauses) {
            return Err(Error::Validation(format!(
                "hesitation_pauses must be in [0, 50], got {}",
                self.hesitation_pauses
            )));
        }
        if !(1.0..=5.0).contains(&self.time_extension_factor) {
            return Err(Error::Validation(format!(
                "time_extension_factor must be in [1.0, 5.0], got {}",
                self.time_extension_factor
            )));
        }
        if self.min_delay > self.max_delay {
            return Err(Error::Validation(format!(
                "min_delay ({}) must not exceed max_delay ({})",
                self.min_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Check whether a key is exempt from typo and hesitation injection
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded_keys
            .as_ref()
            .is_some_and(|keys| keys.contains(key))
    }
}

/// A named humanization profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanizationProfile {
    /// Unique profile name
    pub name: String,
    pub typing_speed: TypingSpeed,
    /// Mouse accuracy in [0, 1]; carried for collaborators that replay
    /// pointer paths
    pub mouse_accuracy: f64,
    /// At most one profile in a store holds this flag
    pub is_default: bool,
    pub settings: HumanizationSettings,
}

impl HumanizationProfile {
    /// A medium-speed profile with default settings
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typing_speed: TypingSpeed::Medium,
            mouse_accuracy: 0.9,
            is_default: false,
            settings: HumanizationSettings::default(),
        }
    }

    /// Validate the profile and its settings
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("profile name must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.mouse_accuracy) {
            return Err(Error::Validation(format!(
                "mouse_accuracy must be in [0, 1], got {}",
                self.mouse_accuracy
            )));
        }
        self.settings.validate()
    }

    /// Settings with the typing-speed multiplier applied.
    ///
    /// The stored profile is never mutated; scaled values are clamped back
    /// into their valid ranges so a slow profile cannot push variation past
    /// its bound.
    pub fn resolved_settings(&self) -> HumanizationSettings {
        let multiplier = self.typing_speed.multiplier();
        let mut settings = self.settings.clone();
        settings.delay_variation = (settings.delay_variation * multiplier).clamp(1.0, 100.0);
        settings.hesitation_pauses = (settings.hesitation_pauses * multiplier).clamp(0.0, 50.0);
        settings
    }
}

/// In-memory profile storage keyed by name.
///
/// Upserting a profile with `is_default` set unsets the flag on every other
/// profile, so at most one default exists at any time.
#[derive(Default)]
pub struct ProfileStore {
    profiles: RwLock<HashMap<String, HumanizationProfile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a profile after boundary validation
    pub fn upsert(&self, profile: HumanizationProfile) -> Result<()> {
        profile.validate()?;
        let mut profiles = self.profiles.write();
        if profile.is_default {
            for existing in profiles.values_mut() {
                existing.is_default = false;
            }
        }
        profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Fetch a profile by name
    pub fn get(&self, name: &str) -> Result<HumanizationProfile> {
        self.profiles
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("profile {name:?}")))
    }

    /// The profile currently flagged as default, if any
    pub fn default_profile(&self) -> Option<HumanizationProfile> {
        self.profiles
            .read()
            .values()
            .find(|p| p.is_default)
            .cloned()
    }

    /// Delete a profile by name
    pub fn delete(&self, name: &str) -> Result<()> {
        self.profiles
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("profile {name:?}")))
    }

    /// All profiles, sorted by name
    pub fn list(&self) -> Vec<HumanizationProfile> {
        let mut profiles: Vec<HumanizationProfile> =
            self.profiles.read().values().cloned().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        HumanizationSettings::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_settings_are_rejected_not_clamped() {
        let mut settings = HumanizationSettings::default();
        settings.delay_variation = 0.5;
        assert!(matches!(settings.validate(), Err(Error::Validation(_))));

        let mut settings = HumanizationSettings::default();
        settings.typing_errors = 11.0;
        assert!(matches!(settings.validate(), Err(Error::Validation(_))));

        let mut settings = HumanizationSettings::default();
        settings.hesitation_pauses = 51.0;
        assert!(matches!(settings.validate(), Err(Error::Validation(_))));

        let mut settings = HumanizationSettings::default();
        settings.time_extension_factor = 0.9;
        assert!(matches!(settings.validate(), Err(Error::Validation(_))));

        let mut settings = HumanizationSettings::default();
        settings.min_delay = 600;
        settings.max_delay = 500;
        assert!(matches!(settings.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn profile_validation_covers_name_and_accuracy() {
        let mut profile = HumanizationProfile::named("");
        assert!(matches!(profile.validate(), Err(Error::Validation(_))));

        profile = HumanizationProfile::named("careful");
        profile.mouse_accuracy = 1.5;
        assert!(matches!(profile.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn resolved_settings_scale_without_mutating_the_profile() {
        let mut profile = HumanizationProfile::named("slow-typist");
        profile.typing_speed = TypingSpeed::Slow;
        profile.settings.delay_variation = 40.0;
        profile.settings.hesitation_pauses = 20.0;

        let resolved = profile.resolved_settings();
        assert_eq!(resolved.delay_variation, 60.0);
        assert_eq!(resolved.hesitation_pauses, 30.0);
        // Stored values unchanged
        assert_eq!(profile.settings.delay_variation, 40.0);
        assert_eq!(profile.settings.hesitation_pauses, 20.0);

        // Scaling clamps back into range instead of escaping it
        profile.settings.delay_variation = 90.0;
        assert_eq!(profile.resolved_settings().delay_variation, 100.0);

        profile.typing_speed = TypingSpeed::Fast;
        profile.settings.hesitation_pauses = 50.0;
        assert_eq!(profile.resolved_settings().hesitation_pauses, 30.0);
    }

    #[test]
    fn at_most_one_default_profile() {
        let store = ProfileStore::new();

        let mut first = HumanizationProfile::named("first");
        first.is_default = true;
        store.upsert(first).unwrap();

        let mut second = HumanizationProfile::named("second");
        second.is_default = true;
        store.upsert(second).unwrap();

        let defaults: Vec<_> = store.list().into_iter().filter(|p| p.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "second");
        assert_eq!(store.default_profile().unwrap().name, "second");
    }

    #[test]
    fn upsert_rejects_invalid_profiles() {
        let store = ProfileStore::new();
        let mut bad = HumanizationProfile::named("bad");
        bad.settings.typing_errors = 99.0;
        assert!(matches!(store.upsert(bad), Err(Error::Validation(_))));
        assert!(store.list().is_empty());
    }

    #[test]
    fn get_and_delete_unknown_profiles_are_not_found() {
        let store = ProfileStore::new();
        assert!(matches!(store.get("ghost"), Err(Error::NotFound(_))));
        assert!(matches!(store.delete("ghost"), Err(Error::NotFound(_))));
    }
}
