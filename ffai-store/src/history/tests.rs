//! Tests for the history store.

use super::*;
use crate::clock::ManualClock;
use ffai_types::{ExportFormat, FfaiError, ImportSummary};

const NOW: i64 = 1_700_000_000_000;

fn init() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn store_at(now: i64) -> (HistoryStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let store = HistoryStore::in_memory().with_clock(clock.clone());
    (store, clock)
}

fn add(store: &mut HistoryStore, prompt: &str, command: &str) -> String {
    store
        .add(NewEntry::new(prompt, command, "openai").model(Some("gpt-4o-mini")))
        .unwrap()
}

#[test]
fn repeated_submission_merges() -> anyhow::Result<()> {
    init();
    let (mut store, clock) = store_at(NOW);

    let first = add(&mut store, "Convert a.mp4 to webm", "ffmpeg -i a.mp4 a.webm");
    clock.advance(1_000);
    let second = add(&mut store, "convert A.MP4 TO WEBM", "ffmpeg -i a.mp4 a.webm");
    clock.advance(1_000);
    let third = add(&mut store, "CONVERT a.mp4 to webm", "ffmpeg -i a.mp4 a.webm");

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(store.len(), 1);

    let entry = store.get(&first).unwrap();
    assert_eq!(entry.execution_count, 3);
    assert_eq!(entry.timestamp, NOW + 2_000);
    // the original casing and tags survive the merge
    assert_eq!(entry.prompt, "Convert a.mp4 to webm");
    assert!(entry.has_tag("conversion"));
    Ok(())
}

#[test]
fn different_command_is_a_new_entry() {
    let (mut store, _) = store_at(NOW);
    add(&mut store, "shrink it", "ffmpeg -i a.mp4 -crf 28 b.mp4");
    add(&mut store, "shrink it", "ffmpeg -i a.mp4 -crf 30 b.mp4");
    assert_eq!(store.len(), 2);
}

#[test]
fn new_entries_go_to_the_head_with_defaults() {
    let (mut store, _) = store_at(NOW);
    add(&mut store, "extract audio as mp3", "ffmpeg -i a.mp4 -vn a.mp3");
    let id = store
        .add(
            NewEntry::new("make a gif", "", "openai")
                .category(Some("gif"))
                .error(Some("network down")),
        )
        .unwrap();

    let head = &store.entries()[0];
    assert_eq!(head.id, id);
    assert_eq!(head.command, "");
    assert_eq!(head.error.as_deref(), Some("network down"));
    assert_eq!(head.category.as_deref(), Some("gif"));
    assert_eq!(head.execution_count, 1);
    assert!(!head.is_favorite);
    assert_eq!(head.tags, vec!["gif"]);

    assert_eq!(store.entries()[1].tags, vec!["audio", "extraction"]);
}

#[test]
fn word_tag_matching_is_opt_in() {
    let mut store = HistoryStore::in_memory().with_tag_matching(TagMatching::Word);
    let id = add(&mut store, "blur the photos", "ffmpeg -i a.mp4 -vf boxblur b.mp4");
    assert!(store.get(&id).unwrap().tags.is_empty());
}

#[test]
fn recent_orders_by_timestamp() {
    let (mut store, clock) = store_at(NOW);
    let a = add(&mut store, "a", "ffmpeg a");
    clock.advance(10);
    let b = add(&mut store, "b", "ffmpeg b");
    clock.advance(10);
    let c = add(&mut store, "c", "ffmpeg c");
    clock.advance(10);
    // reusing "a" makes it the most recent
    add(&mut store, "a", "ffmpeg a");

    let recent: Vec<&str> = store.get_recent(10).iter().map(|e| e.id.as_str()).collect();
    assert_eq!(recent, vec![a.as_str(), c.as_str(), b.as_str()]);
    assert_eq!(store.get_recent(2).len(), 2);
}

#[test]
fn favorites_and_most_used() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let once = add(&mut store, "once", "ffmpeg once");
    let twice = add(&mut store, "twice", "ffmpeg twice");
    add(&mut store, "twice", "ffmpeg twice");
    let thrice = add(&mut store, "thrice", "ffmpeg thrice");
    add(&mut store, "thrice", "ffmpeg thrice");
    add(&mut store, "thrice", "ffmpeg thrice");

    store.toggle_favorite(&once)?;
    store.toggle_favorite(&thrice)?;

    let favorites: Vec<&str> = store.get_favorites().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(favorites, vec![thrice.as_str(), once.as_str()]);

    let used: Vec<&str> = store.get_most_used(10).iter().map(|e| e.id.as_str()).collect();
    assert_eq!(used, vec![thrice.as_str(), twice.as_str()]);
    assert_eq!(store.get_most_used(1).len(), 1);
    Ok(())
}

#[test]
fn search_covers_prompt_command_tags_and_category() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let gif = add(&mut store, "make a gif", "ffmpeg -i a.mp4 a.gif");
    let hls = add(&mut store, "package for the web", "ffmpeg -i a.mp4 -f hls out.m3u8");
    let cat = add(&mut store, "loudness fix", "ffmpeg -i a.wav -af loudnorm b.wav");
    store.set_category(&cat, "Podcast")?;

    assert_eq!(store.search("GIF").len(), 1);
    assert_eq!(store.search("m3u8")[0].id, hls);
    assert_eq!(store.search("podcast")[0].id, cat);
    // "gif" tag
    assert!(store.search("gif").iter().any(|e| e.id == gif));
    assert_eq!(store.search("").len(), 3);
    assert!(store.search("nothing-like-this").is_empty());

    assert_eq!(store.get_by_tag("GIF")[0].id, gif);
    assert_eq!(store.get_by_category("podcast")[0].id, cat);
    assert!(store.get_by_category("pod").is_empty());
    Ok(())
}

#[test]
fn toggle_favorite_reports_not_found() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let id = add(&mut store, "a", "ffmpeg a");

    assert_eq!(store.toggle_favorite("missing")?, FavoriteToggle::NotFound);
    assert_eq!(store.toggle_favorite(&id)?, FavoriteToggle::Toggled(true));
    assert_eq!(store.toggle_favorite(&id)?, FavoriteToggle::Toggled(false));
    Ok(())
}

#[test]
fn add_tags_unions_without_duplicates() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let id = add(&mut store, "make a gif", "ffmpeg -i a.mp4 a.gif");

    assert!(store.add_tags(&id, &["gif", "loop", "loop", " "])?);
    assert_eq!(store.get(&id).unwrap().tags, vec!["gif", "loop"]);
    assert!(!store.add_tags("missing", &["x"])?);
    assert!(!store.set_category("missing", "x")?);
    Ok(())
}

#[test]
fn delete_and_clear() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let id = add(&mut store, "a", "ffmpeg a");
    add(&mut store, "b", "ffmpeg b");

    assert!(store.delete(&id)?);
    assert!(!store.delete(&id)?);
    assert_eq!(store.len(), 1);

    store.clear()?;
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn pruning_keeps_favorites() -> anyhow::Result<()> {
    init();
    let (mut store, clock) = store_at(NOW);
    let old_fav = add(&mut store, "old favorite", "ffmpeg 1");
    let old = add(&mut store, "old", "ffmpeg 2");
    clock.advance(20 * DAY_MILLIS);
    let recent = add(&mut store, "recent", "ffmpeg 3");
    store.toggle_favorite(&old_fav)?;

    clock.advance(DAY_MILLIS);
    let removed = store.clear_old_entries(7)?;

    assert_eq!(removed, 1);
    assert!(store.get(&old).is_none());
    assert!(store.get(&old_fav).is_some());
    assert!(store.get(&recent).is_some());
    Ok(())
}

#[test]
fn capacity_keeps_most_recent() {
    init();
    let (mut store, clock) = store_at(NOW);
    for i in 0..1500 {
        add(&mut store, &format!("prompt {i}"), &format!("ffmpeg {i}"));
        clock.advance(1);
    }

    assert_eq!(store.len(), DEFAULT_MAX_ENTRIES);
    let oldest_kept = store.entries().iter().map(|e| e.timestamp).min().unwrap();
    assert_eq!(oldest_kept, NOW + 500);
    assert!(store.search("prompt 499").is_empty());
    assert_eq!(store.search("prompt 500").len(), 1);
}

#[test]
fn capacity_does_not_spare_favorites() -> anyhow::Result<()> {
    let (store, clock) = store_at(NOW);
    let mut store = store.with_max_entries(2);
    let fav = add(&mut store, "first", "ffmpeg 1");
    store.toggle_favorite(&fav)?;
    clock.advance(1);
    add(&mut store, "second", "ffmpeg 2");
    clock.advance(1);
    add(&mut store, "third", "ffmpeg 3");

    assert_eq!(store.len(), 2);
    assert!(store.get(&fav).is_none());
    Ok(())
}

#[test]
fn stats_are_computed_from_entries() -> anyhow::Result<()> {
    let (mut store, clock) = store_at(NOW);
    let a = store.add(NewEntry::new("a", "ffmpeg a", "groq").category(Some("gif")))?;
    clock.advance(10 * DAY_MILLIS);
    store.add(NewEntry::new("b", "ffmpeg b", "openai").category(Some("audio")))?;
    store.add(NewEntry::new("c", "ffmpeg c", "openai").category(Some("gif")))?;
    clock.advance(2 * DAY_MILLIS);
    store.add(NewEntry::new("d", "ffmpeg d", "groq"))?;
    store.toggle_favorite(&a)?;

    let stats = store.get_stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.favorites, 1);
    // groq and openai tie at two; groq is first in store order
    assert_eq!(stats.most_used_provider.as_deref(), Some("groq"));
    assert_eq!(stats.most_used_category.as_deref(), Some("gif"));
    assert_eq!(stats.last_day, 1);
    assert_eq!(stats.last_week, 3);
    assert_eq!(stats.last_month, 4);
    Ok(())
}

#[test]
fn empty_stats() {
    let store = HistoryStore::in_memory();
    let stats = store.get_stats();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.most_used_provider, None);
    assert_eq!(stats.most_used_category, None);
}

#[test]
fn most_common_prefers_first_seen_on_tie() {
    assert_eq!(
        most_common(["b", "a", "a", "b"].into_iter()).as_deref(),
        Some("b")
    );
    assert_eq!(most_common(std::iter::empty()), None);
}

#[test]
fn json_export_import_round_trip() -> anyhow::Result<()> {
    let (mut source, clock) = store_at(NOW);
    add(&mut source, "convert video.mp4 to webm", "ffmpeg -i video.mp4 video.webm");
    clock.advance(5);
    let fav = add(&mut source, "extract audio as mp3", "ffmpeg -i a.mp4 -vn a.mp3");
    source.toggle_favorite(&fav)?;
    source.add(NewEntry::new("broken", "", "openai").error(Some("timeout")))?;

    let exported = source.export_history(ExportFormat::Json)?;

    let (mut target, _) = store_at(NOW + 1_000_000);
    let summary = target.import_history(&exported, ExportFormat::Json)?;
    assert_eq!(summary.valid, 3);
    assert_eq!(summary.inserted, 3);
    assert_eq!(target.entries(), source.entries());

    let again = target.import_history(&exported, ExportFormat::Json)?;
    assert_eq!(again.valid, 3);
    assert_eq!(again.inserted, 0);
    assert_eq!(again.skipped(), 3);
    assert_eq!(target.len(), 3);
    Ok(())
}

#[test]
fn import_fills_defaults_and_drops_incomplete_records() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let data = r#"[
        {"prompt": "make a gif", "command": "ffmpeg -i a.mp4 a.gif", "provider": "openai"},
        {"prompt": "no provider", "command": "ffmpeg x"},
        {"command": "ffmpeg y", "provider": "openai"},
        "not an object"
    ]"#;

    let summary = store.import_history(data, ExportFormat::Json)?;
    assert_eq!(summary, ImportSummary { valid: 1, inserted: 1 });

    let entry = &store.entries()[0];
    assert!(!entry.id.is_empty());
    assert_eq!(entry.timestamp, NOW);
    assert_eq!(entry.execution_count, 1);
    assert_eq!(entry.tags, vec!["gif"]);
    assert!(!entry.is_favorite);
    Ok(())
}

#[test]
fn import_rejects_bad_payloads() {
    let (mut store, _) = store_at(NOW);

    let err = store.import_history("[]", ExportFormat::Csv).unwrap_err();
    assert!(matches!(err, FfaiError::NotImplemented(_)));

    let err = store.import_history("{oops", ExportFormat::Json).unwrap_err();
    assert!(matches!(err, FfaiError::Validation(_)));

    let err = store
        .import_history(r#"{"entries": []}"#, ExportFormat::Json)
        .unwrap_err();
    assert!(matches!(err, FfaiError::Validation(_)));
}

#[test]
fn csv_export_shape() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let id = add(&mut store, r#"say "hi", then cut"#, "ffmpeg -i a.mp4 -t 5 b.mp4");
    store.toggle_favorite(&id)?;

    let csv = store.export_history(ExportFormat::Csv)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Execution Count"));
    assert!(lines[1].contains(r#""say ""hi"", then cut""#));

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    assert_eq!(reader.headers()?.len(), 8);
    let row = reader.records().next().unwrap()?;
    assert_eq!(row.len(), 8);
    assert_eq!(&row[0], "2023-11-14T22:13:20.000Z");
    assert_eq!(&row[1], r#"say "hi", then cut"#);
    assert_eq!(&row[4], "gpt-4o-mini");
    assert_eq!(&row[6], "Yes");
    assert_eq!(&row[7], "1");
    Ok(())
}

#[test]
fn persists_and_reloads() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");

    let id = {
        let mut store = HistoryStore::open(&path);
        assert_eq!(store.load_status(), &LoadStatus::Fresh);
        let id = add(&mut store, "make a gif", "ffmpeg -i a.mp4 a.gif");
        store.toggle_favorite(&id)?;
        id
    };

    let store = HistoryStore::open(&path);
    assert_eq!(store.load_status(), &LoadStatus::Loaded(1));
    assert!(store.get(&id).unwrap().is_favorite);
    Ok(())
}

#[test]
fn corrupt_file_recovers_empty() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    std::fs::write(&path, "[{\"id\": ")?;

    let mut store = HistoryStore::open(&path);
    assert!(store.load_status().is_recovered());
    assert!(store.is_empty());

    // the store stays usable and overwrites the broken file
    add(&mut store, "a", "ffmpeg a");
    assert_eq!(HistoryStore::open(&path).len(), 1);
    Ok(())
}

#[test]
fn non_utf8_history_file_recovers_empty() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    std::fs::write(&path, [0x5b, 0xff, 0xfe, 0x5d])?;

    let mut store = HistoryStore::open(&path);
    assert!(store.load_status().is_recovered());
    assert!(store.is_empty());

    add(&mut store, "a", "ffmpeg a");
    assert_eq!(HistoryStore::open(&path).len(), 1);
    Ok(())
}

#[test]
fn unreadable_history_path_recovers_empty() -> anyhow::Result<()> {
    init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    std::fs::create_dir(&path)?;

    let store = HistoryStore::open(&path);
    assert!(store.load_status().is_recovered());
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn tag_lookup_folds_non_ascii_case() -> anyhow::Result<()> {
    let (mut store, _) = store_at(NOW);
    let id = add(&mut store, "a", "ffmpeg a");
    store.add_tags(&id, ["Übersicht"].as_slice())?;

    assert_eq!(store.get_by_tag("übersicht").len(), 1);
    assert_eq!(store.get_by_tag("ÜBERSICHT").len(), 1);
    assert!(store.get_by_tag("uebersicht").is_empty());
    Ok(())
}
