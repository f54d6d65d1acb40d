//! # Standings Board Scenarios
//!
//! Replays a short contest through the standings engine: tie places,
//! the positional change highlighting (including the drift a removed row
//! causes), the live filter, and the standalone board writing its table to
//! disk.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use lib_abacus::feeds::{StandingsFeed, StandingsFeedConfig};
use lib_abacus::{ColumnLayout, Snapshot, StandingsBoard};

fn positional(rows: &[(&str, i64, i64)]) -> anyhow::Result<Snapshot> {
    let mut text = String::from("Contestant\tA\tB\tSolved\tTotal time\n");
    for (name, solved, time) in rows {
        text.push_str(&format!("{}\t0\t0\t{}\t{}\n", name, solved, time));
    }
    Ok(Snapshot::parse_tsv(&text, ColumnLayout::Positional, false)?)
}

fn main() -> anyhow::Result<()> {
    println!("--- Starting Standings Board Scenarios ---");
    let mut board = StandingsBoard::new();

    // --- TEST 1: Places with ties ---
    println!("\n[Test 1] Initial ranking...");
    let view = board.update_standings(Some(positional(&[
        ("alice", 3, 200),
        ("bob", 3, 200),
        ("carol", 2, 90),
        ("dave", 2, 90),
        ("erin", 0, 0),
    ])?));
    assert_eq!(view.places, vec![1, 1, 3, 3, 5]);
    assert!(view.highlighted.is_empty());
    println!("✅ Places: {:?}", view.places);

    // --- TEST 2: A score change flags its row only ---
    println!("\n[Test 2] Single score change...");
    let view = board.update_standings(Some(positional(&[
        ("alice", 3, 200),
        ("bob", 3, 200),
        ("carol", 3, 250),
        ("dave", 2, 90),
        ("erin", 0, 0),
    ])?));
    assert_eq!(view.highlighted, vec!["carol".to_string()]);
    assert_eq!(view.places, vec![1, 1, 3, 4, 5]);
    println!("✅ Highlighted: {:?}", view.highlighted);

    // --- TEST 3: A removed row shifts the alignment ---
    println!("\n[Test 3] Row removal drift...");
    let view = board.update_standings(Some(positional(&[
        ("bob", 3, 200),
        ("carol", 3, 250),
        ("dave", 2, 90),
        ("erin", 0, 0),
    ])?));
    // Every row compares against the missing first one.
    assert_eq!(view.highlighted.len(), 4);
    println!("✅ Drift preserved: {:?}", view.highlighted);

    // --- TEST 4: Filter ---
    println!("\n[Test 4] Live filter...");
    let view = board.set_filter("^[bc]");
    assert!(view.highlighted.is_empty());
    assert_eq!(view.matched, vec!["bob".to_string(), "carol".to_string()]);
    let view = board.set_filter("[");
    assert!(view.filter_invalid);
    assert_eq!(view.matched, vec!["bob".to_string(), "carol".to_string()]);
    let view = board.set_filter("");
    assert!(view.matched.is_empty());
    println!("✅ Filter matched, kept on invalid input, cleared");

    // --- TEST 5: Standalone board output ---
    println!("\n[Test 5] Board file output...");
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("standings.html");
    let mut feed = StandingsFeed::new(StandingsFeedConfig {
        output: output.clone(),
        ..Default::default()
    });
    let header = "id\tusername\tfriendlyname\tgroup\tcontestant\tsolved\ttime\tA\tB\n";
    feed.ingest(&format!(
        "{}1\talice\tAlice\tred\t1\t1\t30\t1\t0\r\n2\tjury\tJury\tstaff\t0\t2\t0\t1\t1\r\n3\tbob\tBob\tblue\t1\t0\t0\t0\t0\r\n",
        header
    ))?;
    let html = std::fs::read_to_string(&output)?;
    assert!(html.contains("alice"));
    assert!(!html.contains("jury"));

    let view = feed.ingest(&format!(
        "{}3\tbob\tBob\tblue\t1\t2\t70\t1\t1\n1\talice\tAlice\tred\t1\t1\t30\t1\t0\n",
        header
    ))?;
    assert_eq!(view.places, vec![1, 2]);
    assert!(view.highlighted.contains(&"3".to_string()));

    let broken = feed.ingest(&format!("{}3\tbob\tBob\tblue\t1\tx\t70\t1\t1\n", header));
    assert!(broken.is_err());
    assert_eq!(std::fs::read_to_string(&output)?.matches("<tr").count(), html.matches("<tr").count());
    println!("✅ Contestants written; a bad body left the file alone");

    println!("\n--- All Standings Board Scenarios Passed ---");
    Ok(())
}
