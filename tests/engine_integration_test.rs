//! Engine Integration Tests
//!
//! Exercise the full pipeline end to end: raw bytes -> command model ->
//! mining / transition analysis / humanization -> serialized output, with
//! the cache in the loop.

use std::sync::Arc;

use macro_humanizer::cache::{keys, CacheHandle, MemoryCache};
use macro_humanizer::command::{Command, CommandSequence, CommandType};
use macro_humanizer::humanize::{HumanizationProfile, HumanizationSettings, TypingSpeed};
use macro_humanizer::Engine;

// ============================================================================
// Helper Functions
// ============================================================================

fn engine() -> Engine {
    Engine::new(CacheHandle::new(Arc::new(MemoryCache::new())))
}

/// A login-like recording: keystrokes with delays and a little mouse work
fn login_recording(delay: u64) -> CommandSequence {
    CommandSequence::new(vec![
        Command::mouse("move", 320.0, 240.0),
        Command::mouse("click", 320.0, 240.0),
        Command::keyboard("keydown", "a"),
        Command::delay(delay),
        Command::keyboard("keydown", "b"),
        Command::delay(delay + 10),
        Command::keyboard("keydown", "enter"),
    ])
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn bytes_to_patterns_to_humanized_output() {
    let engine = engine();

    let files: Vec<(String, Vec<u8>)> = (0..3u64)
        .map(|i| {
            let recording = login_recording(40 + i * 5);
            (
                format!("rec-{i}.json"),
                recording.to_json_bytes().unwrap(),
            )
        })
        .collect();

    // Mine across the three recordings
    let patterns = engine.mine_recordings(&files, 2, 2).await.unwrap();
    assert!(!patterns.is_empty());
    for pattern in &patterns {
        assert!(pattern.frequency >= 2);
        assert!((0.0..=1.0).contains(&pattern.confidence));
        assert_eq!(pattern.version, 1);
    }

    // The keystroke run appears in every file despite differing delays
    let keystroke_run = patterns
        .iter()
        .find(|p| p.name.as_deref() == Some("Pattern: a-b"))
        .expect("a-b keystroke pattern");
    assert_eq!(keystroke_run.source_file_ids.len(), 3);

    // Humanize one parsed recording with mouse stripping
    let sequence = engine.parse_recording(&files[0].1).await.unwrap();
    let settings = HumanizationSettings {
        remove_mouse_on_upload: true,
        ..HumanizationSettings::default()
    };
    let humanized = engine.humanize_with_settings(&sequence, &settings).unwrap();
    assert_eq!(humanized.count_of_type(CommandType::Mouse), 0);
    assert!(humanized.count_of_type(CommandType::Keyboard) >= 3);

    // And the output serializes back to bytes
    let bytes = humanized.to_json_bytes().unwrap();
    let reparsed = CommandSequence::from_json_bytes(&bytes).unwrap();
    assert_eq!(reparsed.len(), humanized.len());
}

#[tokio::test]
async fn warm_cache_makes_mining_idempotent() {
    let engine = engine();
    let files: Vec<(String, Vec<u8>)> = (0..2)
        .map(|i| {
            (
                format!("rec-{i}.json"),
                login_recording(50).to_json_bytes().unwrap(),
            )
        })
        .collect();

    let first = engine.mine_recordings(&files, 2, 2).await.unwrap();
    let second = engine.mine_recordings(&files, 2, 2).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.frequency, b.frequency);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.canonical_key(), b.canonical_key());
    }
}

#[tokio::test]
async fn transition_analysis_predicts_the_common_successor() {
    let engine = engine();
    let sequences: Vec<CommandSequence> = (0..5)
        .map(|_| {
            CommandSequence::new(vec![
                Command::keyboard("keydown", "a"),
                Command::keyboard("keydown", "b"),
            ])
        })
        .chain((0..2).map(|_| {
            CommandSequence::new(vec![
                Command::keyboard("keydown", "a"),
                Command::keyboard("keydown", "c"),
            ])
        }))
        .collect();

    let table = engine.analyze_transitions(&sequences);
    assert_eq!(
        table.outgoing("keyboard:a").unwrap().get("keyboard:b"),
        Some(&5)
    );
    let predicted = table.predict_next(&Command::keyboard("keydown", "a"));
    assert_eq!(predicted.as_deref(), Some("keyboard:b"));
}

// ============================================================================
// Profiles and pattern lifecycle
// ============================================================================

#[tokio::test]
async fn default_profile_flag_stays_unique_and_drives_humanize() {
    let engine = engine();

    let mut relaxed = HumanizationProfile::named("relaxed");
    relaxed.typing_speed = TypingSpeed::Slow;
    relaxed.is_default = true;
    engine.upsert_profile(relaxed).unwrap();

    let mut brisk = HumanizationProfile::named("brisk");
    brisk.typing_speed = TypingSpeed::Fast;
    brisk.is_default = true;
    engine.upsert_profile(brisk).unwrap();

    let defaults: Vec<_> = engine
        .profiles()
        .list()
        .into_iter()
        .filter(|p| p.is_default)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].name, "brisk");

    // No profile name: the default applies
    let sequence = login_recording(50);
    let humanized = engine.humanize(&sequence, None).unwrap();
    assert!(!humanized.is_empty());

    // A named profile still resolves directly
    let humanized = engine.humanize(&sequence, Some("relaxed")).unwrap();
    assert!(!humanized.is_empty());
}

#[tokio::test]
async fn usage_recording_updates_pattern_and_cache_tally() {
    let engine = engine();
    let sources = vec![
        (
            "f1".to_string(),
            CommandSequence::new(vec![
                Command::keyboard("keydown", "x"),
                Command::keyboard("keydown", "y"),
            ]),
        ),
        (
            "f2".to_string(),
            CommandSequence::new(vec![
                Command::keyboard("keydown", "x"),
                Command::keyboard("keydown", "y"),
            ]),
        ),
    ];
    let patterns = engine.mine_patterns(&sources, 2, 2).await.unwrap();
    let id = patterns[0].id;

    engine.record_pattern_usage(id, true).await.unwrap();
    let updated = engine.record_pattern_usage(id, true).await.unwrap();
    assert_eq!(updated.metadata.times_used, 2);
    assert_eq!(updated.metadata.success_rate, 1.0);
    assert_eq!(updated.version, 3);

    // Best-effort tally lands in the cache alongside the record
    let tally: Option<u64> = engine
        .cache()
        .get(&keys::pattern_usage_key(&id.to_string()))
        .await;
    assert_eq!(tally, Some(2));
}

#[tokio::test]
async fn similarity_lookup_ranks_closest_patterns_first() {
    let engine = engine();
    let sources = vec![
        (
            "f1".to_string(),
            CommandSequence::new(vec![
                Command::keyboard("keydown", "a"),
                Command::keyboard("keydown", "b"),
                Command::keyboard("keydown", "c"),
            ]),
        ),
        (
            "f2".to_string(),
            CommandSequence::new(vec![
                Command::keyboard("keydown", "a"),
                Command::keyboard("keydown", "b"),
                Command::keyboard("keydown", "c"),
            ]),
        ),
    ];
    engine.mine_patterns(&sources, 2, 2).await.unwrap();

    let probe = CommandSequence::new(vec![
        Command::keyboard("keydown", "a"),
        Command::keyboard("keydown", "b"),
        Command::keyboard("keydown", "c"),
    ]);
    let similar = engine.find_similar_patterns(&probe, 0.5);
    assert!(!similar.is_empty());
    // Exact canonical match ranks first
    assert_eq!(similar[0].1, 1.0);
    for window in similar.windows(2) {
        assert!(window[0].1 >= window[1].1);
    }
}

// ============================================================================
// Fail-open cache behavior
// ============================================================================

#[tokio::test]
async fn operations_complete_without_any_cache_backend() {
    let engine = Engine::new(CacheHandle::disabled());
    let files: Vec<(String, Vec<u8>)> = (0..2)
        .map(|i| {
            (
                format!("rec-{i}.json"),
                login_recording(50).to_json_bytes().unwrap(),
            )
        })
        .collect();

    // Everything still works, just without memoization
    let patterns = engine.mine_recordings(&files, 2, 2).await.unwrap();
    assert!(!patterns.is_empty());

    let sequence = engine.parse_recording(&files[0].1).await.unwrap();
    let humanized = engine
        .humanize_with_settings(&sequence, &HumanizationSettings::default())
        .unwrap();
    assert!(!humanized.is_empty());
}
