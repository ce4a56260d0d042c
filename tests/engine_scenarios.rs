use std::collections::BTreeSet;
use std::sync::Arc;
use chrono::{Duration, TimeZone, Utc};
use smartlist::index::text::TextMatch;
use smartlist::{
    DateOperand, Engine, EngineConfig, ErrorKind, Field, FilePropertyRule, NumericMetadataRule, Operator,
    Plan, PlayStatisticsRule, Rule, SortField, Sorting, StringMetadataRule, TimeUnit, Track, TrackId,
};

fn ids(tracks: &[Arc<Track>]) -> Vec<u64> {
    tracks.iter().map(|t| t.id.0).collect()
}

fn id_set(tracks: &[Arc<Track>]) -> BTreeSet<u64> {
    tracks.iter().map(|t| t.id.0).collect()
}

fn artist_contains(value: &str) -> Rule {
    StringMetadataRule::new(Field::Artist, Operator::Contains, value, false).unwrap().into()
}

fn played() -> Rule {
    PlayStatisticsRule::count(Field::PlayCount, Operator::GreaterThan, 0.0).unwrap().into()
}

fn small_library() -> Engine {
    let engine = Engine::default();
    engine.insert(Track::new(1).with_artist("Queen").with_play_count(5));
    engine.insert(Track::new(2).with_artist("queen").with_play_count(0));
    engine.insert(Track::new(3).with_artist("Bowie").with_play_count(10));
    engine
}

#[test]
fn case_insensitive_contains_uses_the_index() {
    let engine = small_library();
    let rule = artist_contains("que");

    assert!(matches!(engine.explain(&rule), Plan::TextSeek { mode: TextMatch::Contains, .. }));
    assert_eq!(id_set(&engine.evaluate(&rule, None, None)), BTreeSet::from([1, 2]));
}

#[test]
fn play_count_sorted_descending() {
    let engine = small_library();
    let sorting = Sorting::descending(SortField::PlayCount);
    assert_eq!(ids(&engine.evaluate(&played(), Some(&sorting), None)), vec![3, 1]);
}

#[test]
fn and_combines_text_and_statistics() {
    let engine = small_library();
    let rule = Rule::and(vec![artist_contains("que"), played()]);
    assert_eq!(ids(&engine.evaluate(&rule, None, None)), vec![1]);
}

#[test]
fn removed_tracks_leave_the_index() {
    let engine = small_library();
    assert!(engine.remove(TrackId(2)));
    assert_eq!(ids(&engine.evaluate(&artist_contains("que"), None, None)), vec![1]);
    assert_eq!(ids(&engine.evaluate(&artist_contains("queen"), None, None)), vec![1]);
    engine.verify_consistency().unwrap();
}

#[test]
fn removing_twice_is_the_same_as_once() {
    let engine = small_library();
    assert!(engine.remove(TrackId(3)));
    let after_first = engine.stats();
    assert!(!engine.remove(TrackId(3)));
    let after_second = engine.stats();

    assert_eq!(after_first.tracks, after_second.tracks);
    assert_eq!(after_first.text_keys, after_second.text_keys);
    assert_eq!(after_first.value_entries, after_second.value_entries);
    assert_eq!(after_first.version, after_second.version);
    engine.verify_consistency().unwrap();
}

#[test]
fn update_replaces_every_field() {
    let engine = small_library();
    engine.update(Track::new(1).with_artist("Freddie Mercury").with_play_count(7));

    assert!(engine.evaluate(&artist_contains("queen"), None, None).iter().all(|t| t.id != TrackId(1)));
    let freddie = engine.evaluate(&artist_contains("mercury"), None, None);
    assert_eq!(ids(&freddie), vec![1]);
    assert_eq!(freddie[0].play_count, Some(7));

    // Absent id behaves as insert
    engine.update(Track::new(9).with_artist("Queen"));
    assert_eq!(id_set(&engine.evaluate(&artist_contains("queen"), None, None)), BTreeSet::from([2, 9]));
    engine.verify_consistency().unwrap();
}

#[test]
fn equal_sort_keys_keep_store_order() {
    let engine = Engine::default();
    for (id, genre) in [(5, "rock"), (2, "jazz"), (8, "rock"), (1, "jazz"), (3, "rock")] {
        engine.insert(Track::new(id).with_genre(genre).with_play_count(1));
    }
    let all = Rule::and(vec![]);

    let by_genre = engine.evaluate(&all, Some(&Sorting::ascending(SortField::PlayCount)), None);
    assert_eq!(ids(&by_genre), vec![5, 2, 8, 1, 3]);

    let genre_rule: Rule = StringMetadataRule::new(Field::Genre, Operator::StartsWith, "ROCK", false)
        .unwrap()
        .into();
    let indexed = engine.evaluate(&genre_rule, Some(&Sorting::descending(SortField::PlayCount)), None);
    assert_eq!(ids(&indexed), vec![5, 8, 3]);
}

#[test]
fn limit_is_a_prefix_of_the_sorted_result() {
    let engine = Engine::default();
    for id in 0..20u64 {
        engine.insert(Track::new(id).with_year(1960 + (id as i32 * 7) % 40).with_title(format!("t{}", id)));
    }
    let all = Rule::and(vec![]);
    let sorting = Sorting::ascending(SortField::Year);

    let full = engine.evaluate(&all, Some(&sorting), None);
    for n in [0, 1, 5, 20, 50] {
        let limited = engine.evaluate(&all, Some(&sorting), Some(n));
        assert!(limited.len() <= n);
        assert_eq!(ids(&limited), ids(&full)[..n.min(full.len())].to_vec());
    }
}

#[test]
fn and_is_intersection_and_or_is_union() {
    let engine = Engine::default();
    for id in 0..30u64 {
        let mut track = Track::new(id).with_play_count((id % 4) as u32);
        if id % 3 == 0 {
            track = track.with_artist("Queen");
        }
        if id % 5 == 0 {
            track = track.with_artist("Bowie");
        }
        engine.insert(track);
    }
    let a = artist_contains("queen");
    let b = played();
    let set_a = id_set(&engine.evaluate(&a, None, None));
    let set_b = id_set(&engine.evaluate(&b, None, None));

    let and = id_set(&engine.evaluate(&Rule::and(vec![a.clone(), b.clone()]), None, None));
    let or = id_set(&engine.evaluate(&Rule::or(vec![a, b]), None, None));

    assert_eq!(and, set_a.intersection(&set_b).copied().collect());
    assert_eq!(or, set_a.union(&set_b).copied().collect());
}

#[test]
fn relative_and_absolute_dates() {
    let engine = Engine::default();
    let now = Utc::now();
    engine.insert(Track::new(1).with_last_played(now - Duration::hours(2)));
    engine.insert(Track::new(2).with_last_played(now - Duration::days(40)));
    engine.insert(Track::new(3));
    engine.insert(Track::new(4).with_date_added(Utc.with_ymd_and_hms(2020, 3, 1, 8, 0, 0).unwrap()));

    let recent: Rule = PlayStatisticsRule::last_played(Operator::GreaterThan, DateOperand::ago(1, TimeUnit::Weeks))
        .unwrap()
        .into();
    assert_eq!(ids(&engine.evaluate(&recent, None, None)), vec![1]);

    let not_recent = recent.clone().negate();
    assert_eq!(ids(&engine.evaluate(&not_recent, None, None)), vec![2, 3, 4]);

    let added: Rule = FilePropertyRule::date_added_between(
        DateOperand::at(Utc.with_ymd_and_hms(2020, 12, 31, 0, 0, 0).unwrap()),
        DateOperand::at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
    )
    .unwrap()
    .into();
    assert_eq!(ids(&engine.evaluate(&added, None, None)), vec![4]);
}

#[test]
fn invalid_rules_fail_at_construction() {
    let err = NumericMetadataRule::new(Field::Year, Operator::Contains, 1.0).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperator);

    let err = StringMetadataRule::new(Field::Year, Operator::Equals, "1999", false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidField);

    let err = FilePropertyRule::format_in(Vec::<String>::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingOperand);

    let json = r#"{"type":"numericMetadata","field":"bpm","operator":"between","value":120.0}"#;
    let rule: Rule = serde_json::from_str(json).unwrap();
    assert_eq!(rule.validate().unwrap_err().kind, ErrorKind::MissingOperand);
}

#[test]
fn repeated_queries_hit_the_cache_until_a_mutation() {
    let engine = small_library();
    let rule = artist_contains("que");

    let first = engine.evaluate(&rule, None, None);
    let second = engine.evaluate(&rule, None, None);
    assert_eq!(first, second);
    assert_eq!(engine.stats().cache_stats.hit_count, 1);

    engine.insert(Track::new(4).with_artist("Queensryche"));
    assert_eq!(engine.evaluate(&rule, None, None).len(), 3);
    let stats = engine.stats();
    assert_eq!(stats.cache_stats.hit_count, 1);
    assert_eq!(stats.cache_stats.miss_count, 2);
}

#[test]
fn non_finite_operands_do_not_share_cached_results() {
    let engine = Engine::default();
    engine.insert(Track::new(1).with_bpm(120.0));
    engine.insert(Track::new(2).with_bpm(90.0));

    let below = |value: f64| -> Rule { NumericMetadataRule::new(Field::Bpm, Operator::LessThan, value).unwrap().into() };
    let above = |value: f64| -> Rule { NumericMetadataRule::new(Field::Bpm, Operator::GreaterThan, value).unwrap().into() };

    assert_eq!(ids(&engine.evaluate(&below(f64::INFINITY), None, None)), vec![1, 2]);
    assert!(engine.evaluate(&below(f64::NAN), None, None).is_empty());
    assert!(engine.evaluate(&below(f64::NEG_INFINITY), None, None).is_empty());
    assert_eq!(ids(&engine.evaluate(&above(f64::NEG_INFINITY), None, None)), vec![1, 2]);
    assert!(engine.evaluate(&above(f64::NAN), None, None).is_empty());

    let between: Rule = NumericMetadataRule::between(Field::Bpm, 100.0, f64::INFINITY).unwrap().into();
    assert_eq!(ids(&engine.evaluate(&between, None, None)), vec![1]);
    let between: Rule = NumericMetadataRule::between(Field::Bpm, 100.0, f64::NAN).unwrap().into();
    assert!(engine.evaluate(&between, None, None).is_empty());

    // Non-finite queries bypass the cache entirely
    let stats = engine.stats().cache_stats;
    assert_eq!(stats.hit_count + stats.miss_count, 0);
}

#[test]
fn value_index_ranges_match_the_scan() {
    let indexed = Engine::new(EngineConfig { value_index_ranges: true, ..EngineConfig::default() });
    let scanned = Engine::new(EngineConfig { cache_size: 0, ..EngineConfig::default() });
    for id in 0..50u64 {
        let mut track = Track::new(id).with_rating((id % 6) as u8);
        if id % 7 != 0 {
            track = track.with_bpm(60.0 + id as f64 * 3.5);
        }
        indexed.insert(track.clone());
        scanned.insert(track);
    }

    let rules: Vec<Rule> = vec![
        NumericMetadataRule::new(Field::Bpm, Operator::GreaterThan, 130.0).unwrap().into(),
        NumericMetadataRule::new(Field::Bpm, Operator::LessThanOrEqual, 95.0).unwrap().into(),
        NumericMetadataRule::between(Field::Bpm, 150.0, 100.0).unwrap().into(),
        PlayStatisticsRule::count(Field::Rating, Operator::GreaterThanOrEqual, 4.0).unwrap().into(),
        PlayStatisticsRule::count_between(Field::Rating, 1.0, 2.0).unwrap().into(),
    ];
    for rule in &rules {
        assert!(matches!(indexed.explain(rule), Plan::ValueRange { .. }));
        assert_eq!(
            ids(&indexed.evaluate(rule, None, None)),
            ids(&scanned.evaluate(rule, None, None)),
            "{:?}",
            rule
        );
    }
}

#[test]
fn replace_all_rebuilds_everything() {
    let engine = small_library();
    engine.replace_all(vec![
        Track::new(10).with_artist("Queen"),
        Track::new(11).with_artist("Blur"),
        Track::new(10).with_artist("Queen II"),
    ]);

    assert_eq!(engine.len(), 2);
    let hits = engine.evaluate(&artist_contains("queen"), None, None);
    assert_eq!(ids(&hits), vec![10]);
    assert_eq!(hits[0].artist.as_deref(), Some("Queen II"));
    engine.verify_consistency().unwrap();
}
