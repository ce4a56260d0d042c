/// Example: smart playlists over a small in-memory library
///
/// Run with `RUST_LOG=debug` to see planning and re-evaluation decisions.

use chrono::{Duration, Utc};
use smartlist::{
    DateOperand, Engine, EngineConfig, Field, FilePropertyRule, Operator, PlayStatisticsRule, Rule,
    SmartPlaylist, SortField, Sorting, StringMetadataRule, TimeUnit, Track, TrackId, UpdateKind,
};

fn create_track(id: u64, title: &str, artist: &str, genre: &str, plays: u32) -> Track {
    Track::new(id)
        .with_title(title)
        .with_artist(artist)
        .with_genre(genre)
        .with_format("flac")
        .with_play_count(plays)
        .with_date_added(Utc::now() - Duration::days(id as i64 * 10))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Smart Playlist Engine ===\n");

    // Step 1: LOAD - Fill the library
    println!("Step 1: LOAD - Importing library...");
    let engine = Engine::new(EngineConfig::default());
    engine.replace_all(vec![
        create_track(1, "Bohemian Rhapsody", "Queen", "rock", 42),
        create_track(2, "Killer Queen", "queen", "rock", 0),
        create_track(3, "Heroes", "David Bowie", "art rock", 17),
        create_track(4, "Go With the Flow", "Queens of the Stone Age", "stoner rock", 8),
        create_track(5, "Teardrop", "Massive Attack", "trip hop", 25),
    ]);
    println!("  {} tracks loaded\n", engine.len());

    // Step 2: QUERY - One-off evaluations
    println!("Step 2: QUERY - One-off rules...");
    let queen: Rule = StringMetadataRule::new(Field::Artist, Operator::Contains, "que", false)?.into();
    println!("  plan for artist contains 'que': {:?}", engine.explain(&queen));
    for track in engine.evaluate(&queen, None, None) {
        println!("  {:?} {:?}", track.id, track.title);
    }

    let popular = Rule::and(vec![
        StringMetadataRule::new(Field::Genre, Operator::Contains, "rock", false)?.into(),
        PlayStatisticsRule::count(Field::PlayCount, Operator::GreaterThan, 0.0)?.into(),
    ]);
    let by_plays = Sorting::descending(SortField::PlayCount);
    let top = engine.evaluate(&popular, Some(&by_plays), Some(2));
    println!("  top rock tracks: {:?}\n", top.iter().map(|t| t.title.as_deref()).collect::<Vec<_>>());

    // Step 3: REGISTER - Live playlists
    println!("Step 3: REGISTER - Live playlists...");
    let mut updates = engine.subscribe();

    let recent: Rule = FilePropertyRule::date_added(Operator::GreaterThan, DateOperand::ago(3, TimeUnit::Weeks))?.into();
    let recently_added = SmartPlaylist::new("Recently added", recent)?
        .with_sorting(Sorting::descending(SortField::DateAdded));
    let queen_playlist = SmartPlaylist::new("Queen", queen)?.with_sorting(Sorting::ascending(SortField::Title));
    let queen_id = queen_playlist.id;

    println!("  definition: {}", queen_playlist.to_json()?);
    engine.register(recently_added)?;
    engine.register(queen_playlist)?;

    // Step 4: MUTATE - Watch the playlists follow the library
    println!("\nStep 4: MUTATE - Editing the library...");
    engine.insert(create_track(6, "Somebody to Love", "Queen", "rock", 3));
    engine.update(create_track(2, "Killer Queen", "Queen", "glam rock", 1));
    engine.remove(TrackId(1));

    while let Some(update) = updates.try_next() {
        match update.kind {
            UpdateKind::Full(tracks) => {
                println!("  {} full: {:?}", update.playlist_id.0, tracks.iter().map(|t| t.id.0).collect::<Vec<_>>())
            }
            UpdateKind::Incremental { added, removed } => println!(
                "  {} +{:?} -{:?}",
                update.playlist_id.0,
                added.iter().map(|t| t.id.0).collect::<Vec<_>>(),
                removed
            ),
        }
    }
    if let Some(tracks) = engine.playlist_tracks(queen_id) {
        println!("  Queen now: {:?}", tracks.iter().map(|t| t.title.as_deref()).collect::<Vec<_>>());
    }

    // Step 5: STATS
    println!("\nStep 5: STATS");
    engine.verify_consistency()?;
    let stats = engine.stats();
    println!("  tracks: {}", stats.tracks);
    println!("  text index keys: {}", stats.text_keys);
    println!("  value index entries: {}", stats.value_entries);
    println!("  playlists: {}", stats.registered_playlists);
    println!("  cache hit rate: {:.1}%", stats.cache_stats.hit_rate() * 100.0);

    Ok(())
}
