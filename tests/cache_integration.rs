mod common;

use common::{analyze_snippet, mixed_module, write_py};
use connascence::{AnalysisConfig, CacheConfig, FileCache, ParallelAnalyzer, ParallelConfig};
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

#[test]
fn test_round_trip_returns_identical_violations() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let code = mixed_module(0);
    let path = write_py(project.path(), "service.py", &code);
    let violations = analyze_snippet(&code);
    assert!(!violations.is_empty());

    let mut cache = FileCache::new(cache_dir.path(), 1000).unwrap();
    cache.set(&path, &violations);

    assert_eq!(cache.get(&path), Some(violations.clone()));

    let mut fresh = FileCache::new(cache_dir.path(), 1000).unwrap();
    assert_eq!(fresh.get(&path), Some(violations));
}

#[test]
fn test_single_byte_change_forces_miss() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let path = write_py(project.path(), "service.py", "x = 42\n");

    let mut cache = FileCache::new(cache_dir.path(), 1000).unwrap();
    cache.set(&path, &[]);
    assert_eq!(cache.get(&path), Some(vec![]));

    fs::write(&path, "x = 43\n").unwrap();
    assert_eq!(cache.get(&path), None);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_modification_time_change_forces_miss() {
    let project = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let path = write_py(project.path(), "service.py", "x = 42\n");

    let mut cache = FileCache::new(cache_dir.path(), 1000).unwrap();
    cache.set(&path, &[]);

    let later = SystemTime::now() + Duration::from_secs(120);
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(later)
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "x = 42\n");
    assert_eq!(cache.get(&path), None);
}

#[test]
fn test_deleting_cache_directory_only_forces_reanalysis() {
    let project = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    let files: Vec<_> = (0..3)
        .map(|i| write_py(project.path(), &format!("m{i}.py"), &mixed_module(i)))
        .collect();

    let config = AnalysisConfig::default()
        .with_cache(CacheConfig::in_directory(cache_root.path().join("results")))
        .with_parallel(ParallelConfig::sequential());
    let analyzer = ParallelAnalyzer::new(config).unwrap();

    let first = analyzer.analyze_files(&files).unwrap();
    fs::remove_dir_all(cache_root.path().join("results")).unwrap();
    let second = analyzer.analyze_files(&files).unwrap();

    assert_eq!(second.metrics.cache_hits, 0);
    assert_eq!(first.sorted_violations(), second.sorted_violations());
}

#[test]
fn test_parallel_workers_share_disk_tier() {
    let project = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    let files: Vec<_> = (0..8)
        .map(|i| write_py(project.path(), &format!("m{i}.py"), &mixed_module(i)))
        .collect();

    let config = AnalysisConfig::default()
        .with_cache(CacheConfig::in_directory(cache_root.path()))
        .with_parallel(ParallelConfig::with_workers(4));
    let analyzer = ParallelAnalyzer::new(config).unwrap();

    let cold = analyzer.analyze_files(&files).unwrap();
    let warm = analyzer.analyze_files(&files).unwrap();

    assert_eq!(cold.metrics.cache_misses, 8);
    assert_eq!(warm.metrics.cache_hits, 8);
    assert_eq!(warm.metrics.cache_hit_rate(), 1.0);
    assert_eq!(cold.sorted_violations(), warm.sorted_violations());
}

#[test]
fn test_entries_are_bound_to_the_requested_path() {
    let project = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    let path = write_py(project.path(), "pkg/service.py", &mixed_module(0));
    let dotted = project.path().join("pkg/./service.py");

    let config = AnalysisConfig::default()
        .with_cache(CacheConfig::in_directory(cache_root.path()))
        .with_parallel(ParallelConfig::sequential());
    let analyzer = ParallelAnalyzer::new(config).unwrap();
    let uncached = ParallelAnalyzer::new(
        AnalysisConfig::default()
            .with_cache(CacheConfig::disabled())
            .with_parallel(ParallelConfig::sequential()),
    )
    .unwrap();

    analyzer.analyze_files(&[dotted]).unwrap();
    let second = analyzer.analyze_files(&[path.clone()]).unwrap();

    assert_eq!(second.metrics.cache_hits, 0);
    let requested = path.to_string_lossy();
    assert!(second
        .violations
        .iter()
        .all(|v| v.file_path() == requested.as_ref()));
    assert_eq!(
        second.sorted_violations(),
        uncached.analyze_files(&[path.clone()]).unwrap().sorted_violations()
    );

    let moved = project.path().join("other/service.py");
    fs::create_dir_all(moved.parent().unwrap()).unwrap();
    fs::rename(&path, &moved).unwrap();
    let after_move = analyzer.analyze_files(&[moved.clone()]).unwrap();
    assert_eq!(after_move.metrics.cache_hits, 0);
    let moved_name = moved.to_string_lossy();
    assert!(after_move
        .violations
        .iter()
        .all(|v| v.file_path() == moved_name.as_ref()));
}
