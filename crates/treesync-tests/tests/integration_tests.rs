//! Integration tests for treesync
//!
//! These tests run whole cycles against real scratch trees and check that the
//! destination converges with the fewest mutations.

use proptest::prelude::*;
use std::fs;
use std::path::PathBuf;
use treesync_config::{Config, ConfigLoader};
use treesync_sync::{Scheduler, TreeScanner};
use treesync_tests::test_utils::{generate_test_data, FsCall, RecordingFs, TestTrees};
use treesync_types::{CycleOutcome, ErrorKind};

/// Populate the source, run one cycle, and forget the calls it made
fn synced_trees(files: &[(&str, &[u8])]) -> (TestTrees, RecordingFs) {
    let trees = TestTrees::new();
    for (path, content) in files {
        trees.write_source(path, content);
    }
    let recorder = RecordingFs::new();
    trees.engine(&recorder).run_cycle().unwrap();
    assert!(trees.converged());
    recorder.clear();
    (trees, recorder)
}

#[test]
fn test_initial_sync_uses_fast_path() {
    let trees = TestTrees::new();
    trees.write_source("photos/2024/a.jpg", generate_test_data(10_000, 1));
    trees.write_source("photos/2024/b.jpg", generate_test_data(20_000, 2));
    trees.write_source("notes.txt", b"notes");
    fs::create_dir_all(trees.source.join("photos/2025")).unwrap();
    let recorder = RecordingFs::new();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.outcome, CycleOutcome::FullCopy);
    assert_eq!(report.stats.source_files, 0);
    assert_eq!(report.stats.destination_files, 0);
    assert_eq!(recorder.copies(), 3);
    assert_eq!(recorder.renames(), 0);
    assert_eq!(report.stats.bytes_copied, 30_005);
    assert!(trees.converged());
}

#[test]
fn test_unchanged_trees_need_no_mutations() {
    let (trees, recorder) = synced_trees(&[("a/one", b"1"), ("a/two", b"2"), ("three", b"3")]);

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Reconciled);
    assert!(recorder.calls().is_empty());
    assert_eq!(report.stats.files_passed, 3);
}

#[test]
fn test_moved_file_is_renamed_not_copied() {
    let big = generate_test_data(256 * 1024, 9);
    let (trees, recorder) = synced_trees(&[("inbox/video.bin", &big), ("other.txt", b"x")]);
    fs::create_dir_all(trees.source.join("archive/2024")).unwrap();
    fs::rename(
        trees.source.join("inbox/video.bin"),
        trees.source.join("archive/2024/video-final.bin"),
    )
    .unwrap();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(recorder.copies(), 0);
    assert_eq!(recorder.renames(), 1);
    assert_eq!(report.stats.files_renamed, 1);
    assert_eq!(report.stats.bytes_copied, 0);
    assert!(trees.converged());
}

#[test]
fn test_duplicates_are_aligned_by_pass_then_rename() {
    let trees = TestTrees::new();
    trees.write_source("a/x", b"same");
    trees.write_source("b/y", b"same");
    trees.write_destination("a/x", b"same");
    trees.write_destination("c/z", b"same");
    let recorder = RecordingFs::new();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.stats.files_passed, 1);
    assert!(recorder.calls().contains(&FsCall::Rename(
        trees.destination.join("c/z"),
        trees.destination.join("b/y"),
    )));
    assert_eq!(recorder.copies(), 0);
    assert_eq!(report.stats.directories_removed, 1);
    assert!(trees.converged());
}

#[test]
fn test_stale_files_and_obsolete_directories_are_removed() {
    let (trees, recorder) = synced_trees(&[
        ("keep/file", b"keep"),
        ("drop/deep/file", b"drop"),
        ("stale", b"stale"),
    ]);
    fs::create_dir(trees.source.join("empty-but-present")).unwrap();
    fs::create_dir(trees.destination.join("empty-but-present")).unwrap();
    fs::create_dir(trees.destination.join("empty-obsolete")).unwrap();
    fs::remove_dir_all(trees.source.join("drop")).unwrap();
    fs::remove_file(trees.source.join("stale")).unwrap();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.stats.files_deleted, 2);
    assert_eq!(report.stats.directories_removed, 2);
    assert!(trees.destination.join("empty-but-present").is_dir());
    assert!(!trees.destination.join("empty-obsolete").exists());
    assert!(trees.converged());
}

#[test]
fn test_swapped_names_converge_without_data_loss() {
    let (trees, recorder) = synced_trees(&[("left", b"LEFT"), ("right", b"RIGHT")]);
    fs::rename(trees.source.join("left"), trees.source.join("tmp")).unwrap();
    fs::rename(trees.source.join("right"), trees.source.join("left")).unwrap();
    fs::rename(trees.source.join("tmp"), trees.source.join("right")).unwrap();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.stats.errors, 0);
    assert!(recorder.copies() <= 1);
    assert!(trees.converged());
    assert_eq!(fs::read(trees.destination.join("left")).unwrap(), b"RIGHT");
}

#[test]
fn test_edited_file_is_replaced() {
    let (trees, recorder) = synced_trees(&[("doc.txt", b"draft")]);
    trees.write_source("doc.txt", b"final version");

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.stats.files_deleted, 1);
    assert_eq!(report.stats.files_copied, 1);
    assert_eq!(
        fs::read(trees.destination.join("doc.txt")).unwrap(),
        b"final version"
    );
}

#[test]
fn test_emptied_source_empties_destination() {
    let (trees, recorder) = synced_trees(&[("a/b/c", b"c"), ("d", b"d")]);
    fs::remove_dir_all(trees.source.join("a")).unwrap();
    fs::remove_file(trees.source.join("d")).unwrap();

    trees.engine(&recorder).run_cycle().unwrap();

    assert!(trees.converged());
    assert_eq!(fs::read_dir(&trees.destination).unwrap().count(), 0);
}

#[test]
fn test_missing_source_aborts_without_touching_destination() {
    let (trees, recorder) = synced_trees(&[("a", b"a")]);
    fs::remove_dir_all(&trees.source).unwrap();

    let err = trees.engine(&recorder).run_cycle().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Scan);
    assert!(recorder.calls().is_empty());
    assert!(trees.destination.join("a").exists());
}

#[test]
fn test_shifted_names_are_renamed_not_copied() {
    let (trees, recorder) = synced_trees(&[("a", b"first"), ("b", b"second"), ("c", b"third")]);
    fs::rename(trees.source.join("c"), trees.source.join("d")).unwrap();
    fs::rename(trees.source.join("b"), trees.source.join("c")).unwrap();
    fs::rename(trees.source.join("a"), trees.source.join("b")).unwrap();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(recorder.copies(), 0);
    assert_eq!(recorder.removals(), 0);
    assert_eq!(report.stats.files_renamed, 3);
    assert!(trees.converged());
}

#[cfg(unix)]
#[test]
fn test_destination_symlink_is_replaced_not_written_through() {
    let trees = TestTrees::new();
    let outside = trees.scratch().join("outside.txt");
    fs::write(&outside, b"precious").unwrap();
    std::os::unix::fs::symlink(&outside, trees.destination.join("f")).unwrap();
    trees.write_source("f", b"NEW CONTENT");
    let recorder = RecordingFs::new();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(report.stats.errors, 0);
    assert_eq!(fs::read(&outside).unwrap(), b"precious");
    assert!(!fs::symlink_metadata(trees.destination.join("f"))
        .unwrap()
        .file_type()
        .is_symlink());
    assert_eq!(fs::read(trees.destination.join("f")).unwrap(), b"NEW CONTENT");
    assert!(trees.converged());

    recorder.clear();
    let second = trees.engine(&recorder).run_cycle().unwrap();
    assert_eq!(second.stats.mutations(), 0);
}

#[tokio::test]
async fn test_scheduler_runs_cycles_through_blocking_pool() {
    let trees = TestTrees::new();
    trees.write_source("file", b"content");
    let scheduler = Scheduler::new(trees.engine(RecordingFs::new()));

    let first = scheduler.run_once().await.unwrap();
    let second = scheduler.run_once().await.unwrap();

    assert_eq!(first.outcome, CycleOutcome::FullCopy);
    assert_eq!(second.outcome, CycleOutcome::Reconciled);
    assert_ne!(first.cycle_id, second.cycle_id);
    assert_eq!(scheduler.engine().filesystem().copies(), 1);
    assert!(trees.converged());
}

#[test]
fn test_configuration_file_drives_engine() {
    let trees = TestTrees::new();
    trees.write_source("from-config", b"ok");
    let config_path = trees.scratch().join("treesync.yaml");

    let mut config = Config::default();
    config.sync.source = Some(trees.source.clone());
    config.sync.destination = Some(trees.destination.clone());
    config.sync.interval = 30;
    config.logging.log_dir = trees.scratch().join("logs");
    ConfigLoader::save_to_file(&config, &config_path).unwrap();

    let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
    let sync_config = loaded.to_sync_config().unwrap();
    let engine = treesync_sync::SyncEngine::new(sync_config, RecordingFs::new());
    engine.run_cycle().unwrap();

    assert_eq!(engine.config().interval().as_duration().as_secs(), 1800);
    assert!(trees.converged());
}

#[test]
fn test_scan_table_matches_tree_contents() {
    let (trees, _) = synced_trees(&[("x/1", b"one"), ("x/2", b"two"), ("3", b"one")]);
    let scanner = TreeScanner::default();

    let source = scanner.scan(&trees.source).unwrap();
    let destination = scanner.scan(&trees.destination).unwrap();

    assert_eq!(source.table.fingerprint(), destination.table.fingerprint());
    assert_eq!(source.directories, destination.directories);
}

const PATHS: [&str; 6] = ["f1", "f2", "d1/f1", "d1/f2", "d2/f1", "d1/d3/f1"];
const CONTENTS: [&[u8]; 4] = [b"alpha", b"beta", b"gamma", b""];

fn tree_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    proptest::collection::vec((0..PATHS.len(), 0..CONTENTS.len()), 0..PATHS.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_any_trees_converge_in_one_cycle(
        source in tree_strategy(),
        destination in tree_strategy(),
    ) {
        let trees = TestTrees::new();
        for (path, content) in &source {
            trees.write_source(PATHS[*path], CONTENTS[*content]);
        }
        for (path, content) in &destination {
            trees.write_destination(PATHS[*path], CONTENTS[*content]);
        }
        let recorder = RecordingFs::new();
        let engine = trees.engine(&recorder);

        let first = engine.run_cycle().unwrap();
        prop_assert_eq!(first.stats.errors, 0);
        prop_assert!(trees.converged());

        recorder.clear();
        let second = engine.run_cycle().unwrap();
        prop_assert_eq!(second.stats.mutations(), 0);
        prop_assert_eq!(recorder.calls(), Vec::<FsCall>::new());
    }
}

#[test]
fn test_renamed_directory_moves_every_file() {
    let (trees, recorder) = synced_trees(&[
        ("project/src/main.rs", b"fn main() {}"),
        ("project/src/lib.rs", b"pub mod x;"),
        ("project/README", b"readme"),
    ]);
    fs::rename(trees.source.join("project"), trees.source.join("project-v2")).unwrap();

    let report = trees.engine(&recorder).run_cycle().unwrap();

    assert_eq!(recorder.copies(), 0);
    assert_eq!(report.stats.files_renamed, 3);
    assert_eq!(report.stats.directories_removed, 1);
    assert!(trees.converged());
    let expected: Vec<PathBuf> = vec![
        PathBuf::from("project-v2"),
        PathBuf::from("project-v2/src"),
    ];
    assert_eq!(trees.destination_snapshot().directories, expected);
}

#[test]
fn test_scan_error_is_reported_per_cycle() {
    let trees = TestTrees::new();
    fs::remove_dir(&trees.source).unwrap();
    let scheduler = Scheduler::new(trees.engine(RecordingFs::new()));

    let err = tokio_test::block_on(scheduler.run_once()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Scan);
    assert!(!err.is_fatal());
}
