use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

use dupehound_core::store::Index;
use dupehound_core::{
    CancelToken, DuplicateGroup, Error, HashComponents, InteractOutcome, RunOutcome, RunSummary,
    ScanEngine, ScanOptions, SilentReporter,
};

fn options(root: &Path, db: &Path, content: bool) -> ScanOptions {
    let mut components = HashComponents::default();
    components.set(HashComponents::CONTENT, content);
    ScanOptions {
        root: root.to_path_buf(),
        db_path: db.to_path_buf(),
        components,
        workers: 2,
        full_scan: false,
        ignore_patterns: vec![],
    }
}

fn run_and_collect(engine: &ScanEngine) -> (RunSummary, Vec<DuplicateGroup>) {
    let mut groups = Vec::new();
    let summary = engine
        .run(&SilentReporter, &CancelToken::new(), |_total, stream| {
            for group in stream {
                groups.push(group?);
            }
            Ok(InteractOutcome::Finished)
        })
        .unwrap();
    (summary, groups)
}

/// Scan generations are second-granular; tests that depend on a run being a
/// distinct generation wait out the boundary.
fn next_generation() {
    std::thread::sleep(Duration::from_millis(1100));
}

#[test]
fn test_identical_triplet_forms_one_group() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    for name in ["a", "b", "c"] {
        fs::write(root.join(name), "hello\n").unwrap();
    }

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let (summary, groups) = run_and_collect(&engine);

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.groups, 1);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 3);
    assert_eq!(groups[0].size, 6);
}

#[test]
fn test_size_only_groups_different_content() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("one.bin"), vec![0xAAu8; 100 * 1024]).unwrap();
    fs::write(root.join("two.bin"), vec![0xBBu8; 100 * 1024]).unwrap();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), false));
    let (_, groups) = run_and_collect(&engine);

    // Same size is all the default asks for.
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_content_bit_rejects_different_content() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("one.bin"), vec![0xAAu8; 100 * 1024]).unwrap();
    fs::write(root.join("two.bin"), vec![0xBBu8; 100 * 1024]).unwrap();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let (summary, groups) = run_and_collect(&engine);

    assert_eq!(groups.len(), 0);
    assert_eq!(summary.groups, 0);
}

#[test]
fn test_larger_group_streams_first_on_size_tie() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("file1"), "foo").unwrap();
    fs::write(root.join("file2"), "foo").unwrap();
    fs::write(root.join("file3"), "bar").unwrap();
    fs::write(root.join("file4"), "bar").unwrap();
    fs::write(root.join("file5"), "bar").unwrap();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let (_, groups) = run_and_collect(&engine);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].files.len(), 3, "bigger bucket first on size tie");
    assert_eq!(groups[1].files.len(), 2);
}

#[test]
fn test_recursion_reaches_nested_duplicates() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    let deep = root.join("one").join("two").join("three");
    fs::create_dir_all(&deep).unwrap();
    fs::write(root.join("one").join("x"), "baz").unwrap();
    fs::write(root.join("one").join("two").join("y"), "baz").unwrap();
    fs::write(deep.join("z"), "baz").unwrap();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let (_, groups) = run_and_collect(&engine);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 3);
}

#[test]
fn test_rerun_after_deletion_uses_cache() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    for name in ["a", "b", "c"] {
        fs::write(root.join(name), "hello\n").unwrap();
    }
    let db = tmp.path().join("idx.db");

    let engine = ScanEngine::new(options(&root, &db, true));
    let (_, groups) = run_and_collect(&engine);
    assert_eq!(groups[0].files.len(), 3);

    fs::remove_file(root.join("c")).unwrap();
    next_generation();

    let engine = ScanEngine::new(options(&root, &db, true));
    let (summary, groups) = run_and_collect(&engine);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(summary.totals.skipped, 2, "survivors come from the cache");
    assert_eq!(summary.totals.updated, 0);
}

#[test]
fn test_unchanged_second_run_is_all_cache_hits() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "alpha").unwrap();
    fs::write(root.join("b"), "beta content").unwrap();
    fs::write(root.join("c"), "gamma!").unwrap();
    let db = tmp.path().join("idx.db");

    let engine = ScanEngine::new(options(&root, &db, false));
    let (first, _) = run_and_collect(&engine);
    assert_eq!(first.totals.updated, 3);
    assert_eq!(first.totals.skipped, 0);

    let engine = ScanEngine::new(options(&root, &db, false));
    let (second, _) = run_and_collect(&engine);
    assert_eq!(second.totals.updated, 0);
    assert_eq!(second.totals.skipped, 3);
    assert_eq!(second.totals.scanned, 3);
}

#[test]
fn test_component_change_forces_full_rescan() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "same").unwrap();
    fs::write(root.join("b"), "same").unwrap();
    let db = tmp.path().join("idx.db");

    let engine = ScanEngine::new(options(&root, &db, false));
    let (first, _) = run_and_collect(&engine);
    assert_eq!(first.totals.updated, 2);

    // Same tree, new mask: the cache must not short-circuit.
    let engine = ScanEngine::new(options(&root, &db, true));
    let (second, groups) = run_and_collect(&engine);
    assert_eq!(second.totals.updated, 2);
    assert_eq!(second.totals.skipped, 0);
    assert_eq!(groups.len(), 1);
}

#[test]
fn test_full_scan_flag_ignores_cache() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "data").unwrap();
    let db = tmp.path().join("idx.db");

    let engine = ScanEngine::new(options(&root, &db, false));
    run_and_collect(&engine);

    let mut opts = options(&root, &db, false);
    opts.full_scan = true;
    let engine = ScanEngine::new(opts);
    let (summary, _) = run_and_collect(&engine);
    assert_eq!(summary.totals.updated, 1);
    assert_eq!(summary.totals.skipped, 0);
}

#[test]
fn test_name_component_is_case_folded() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("REPORT.txt"), "same bytes").unwrap();
    fs::write(root.join("report.TXT"), "same bytes").unwrap();
    fs::write(root.join("other.txt"), "same bytes").unwrap();

    let mut opts = options(&root, &tmp.path().join("idx.db"), true);
    opts.components.set(HashComponents::FILE_NAME, true);
    let engine = ScanEngine::new(opts);
    let (_, groups) = run_and_collect(&engine);

    // Case-insensitively equal names group; the differently named file
    // stays out despite identical bytes.
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_ignore_patterns_exclude_subtrees() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    let cache_dir = root.join("cache");
    fs::create_dir_all(&cache_dir).unwrap();
    fs::write(root.join("a"), "dup").unwrap();
    fs::write(root.join("b"), "dup").unwrap();
    fs::write(cache_dir.join("c"), "dup").unwrap();

    let mut opts = options(&root, &tmp.path().join("idx.db"), true);
    opts.ignore_patterns = vec!["**/cache".to_string()];
    let engine = ScanEngine::new(opts);
    let (_, groups) = run_and_collect(&engine);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_empty_tree_completes_with_no_groups() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let (summary, groups) = run_and_collect(&engine);
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.groups, 0);
    assert!(groups.is_empty());
}

#[test]
fn test_missing_root_aborts_cleanly() {
    let tmp = TempDir::new().unwrap();
    let engine = ScanEngine::new(options(
        &tmp.path().join("nope"),
        &tmp.path().join("idx.db"),
        false,
    ));
    let result = engine.run(&SilentReporter, &CancelToken::new(), |_, _| {
        Ok(InteractOutcome::Finished)
    });
    assert!(matches!(result, Err(Error::RootNotFound(_))));
}

#[test]
fn test_cancellation_before_start() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "x").unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let summary = engine
        .run(&SilentReporter, &cancel, |_, _| {
            panic!("consumer must not run after cancellation")
        })
        .unwrap();
    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.totals.scanned, 0);
}

#[test]
fn test_quitting_consumer_still_sweeps() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a"), "dup").unwrap();
    fs::write(root.join("b"), "dup").unwrap();

    let engine = ScanEngine::new(options(&root, &tmp.path().join("idx.db"), true));
    let summary = engine
        .run(&SilentReporter, &CancelToken::new(), |_, mut stream| {
            let first = stream.next();
            assert!(first.is_some());
            Ok(InteractOutcome::Quit)
        })
        .unwrap();
    assert_eq!(summary.outcome, RunOutcome::Quit);
}

#[test]
fn test_stale_generations_are_swept() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("keeper"), "kept").unwrap();
    fs::write(root.join("goner"), "gone soon").unwrap();
    let db = tmp.path().join("idx.db");

    run_and_collect(&ScanEngine::new(options(&root, &db, false)));

    // Generation two: goner disappears, mid shows up.
    fs::remove_file(root.join("goner")).unwrap();
    fs::write(root.join("mid"), "transient").unwrap();
    next_generation();
    run_and_collect(&ScanEngine::new(options(&root, &db, false)));
    {
        // Only two distinct generations in the table, so even the goner's
        // record is still within the retained window.
        let index = Index::open(&db).unwrap();
        assert!(index.get_by_path(&abs(&root, "goner")).unwrap().is_some());
    }

    // Generation three: mid disappears too. Now three distinct generations
    // exist and the sweep keeps the two newest — goner's falls out.
    fs::remove_file(root.join("mid")).unwrap();
    next_generation();
    run_and_collect(&ScanEngine::new(options(&root, &db, false)));
    {
        let index = Index::open(&db).unwrap();
        assert!(index.get_by_path(&abs(&root, "goner")).unwrap().is_none());
        assert!(index.get_by_path(&abs(&root, "mid")).unwrap().is_some());
        assert!(index.get_by_path(&abs(&root, "keeper")).unwrap().is_some());
    }
}

fn abs(root: &Path, name: &str) -> String {
    fs::canonicalize(root)
        .unwrap()
        .join(name)
        .to_string_lossy()
        .into_owned()
}
