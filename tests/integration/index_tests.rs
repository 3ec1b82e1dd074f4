use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;
use wallstash::dispatch::MainLoop;
use wallstash::local::{DiskStorage, LocalPhotoIndex, SortKey};
use wallstash::model::Resolution;

use super::support::{write_image, GatedStorage, WAIT};

fn open(dir: &std::path::Path) -> Arc<LocalPhotoIndex> {
    Arc::new(LocalPhotoIndex::open(dir, Arc::new(DiskStorage::new())).unwrap())
}

fn set_age(path: &std::path::Path, unix_secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

fn ids(index: &LocalPhotoIndex) -> Vec<String> {
    index
        .list()
        .iter()
        .map(|e| e.photo_id().to_string())
        .collect()
}

#[test]
fn test_index_initialization_from_directory() {
    let dir = tempdir().unwrap();
    write_image(dir.path(), "abc123.jpg", 1920, 1080);

    let index = open(dir.path());

    assert!(index.contains("abc123"));
    assert_eq!(index.len(), 1);
    let entry = index.entry_at(0).unwrap();
    assert_eq!(entry.photo_id(), "abc123");
    assert_eq!(entry.resolution(), Some(Resolution::new(1920, 1080)));
    assert_eq!(entry.path(), dir.path().join("abc123.jpg"));
}

#[test]
fn test_missing_directory_gives_empty_index() {
    let dir = tempdir().unwrap();
    let index = open(&dir.path().join("not-yet-created"));
    assert!(index.is_empty());
}

#[test]
fn test_list_is_newest_first() {
    let dir = tempdir().unwrap();
    for (name, age) in [("old.png", 1_000), ("new.png", 3_000), ("mid.png", 2_000)] {
        write_image(dir.path(), name, 4, 4);
        set_age(&dir.path().join(name), age);
    }

    let index = open(dir.path());
    assert_eq!(ids(&index), vec!["new", "mid", "old"]);
}

#[test]
fn test_odd_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
    fs::write(dir.path().join("README"), b"no dot").unwrap();
    fs::write(dir.path().join(".hidden"), b"empty id").unwrap();
    fs::create_dir(dir.path().join("sub.d")).unwrap();

    let index = open(dir.path());

    // Non-images are indexed, just without bounds.
    assert_eq!(ids(&index), vec!["notes"]);
    assert_eq!(index.get("notes").unwrap().resolution(), None);
}

#[test]
fn test_add_then_remove_matches_files() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());

    write_image(dir.path(), "abc123.webp", 10, 20);
    assert!(index.add("abc123", ".webp"));
    assert!(!index.add("abc123", ".webp"));
    assert_eq!(
        index.get("abc123").unwrap().resolution(),
        Some(Resolution::new(10, 20))
    );

    assert!(index.remove("abc123"));
    assert!(!index.contains("abc123"));
    assert!(index.is_empty());
}

#[test]
fn test_remove_at_checks_identity() {
    let dir = tempdir().unwrap();
    for (name, age) in [("a.png", 1_000), ("b.png", 2_000), ("c.png", 3_000)] {
        write_image(dir.path(), name, 2, 2);
        set_age(&dir.path().join(name), age);
    }
    let index = open(dir.path());
    // c, b, a

    assert!(!index.remove_at("a", 0));
    assert!(!index.remove_at("a", 3));
    assert_eq!(index.len(), 3);

    assert!(index.remove_at("b", 1));
    assert_eq!(ids(&index), vec!["c", "a"]);

    let a = index.get("a").unwrap();
    assert!(!index.remove_entry_at(&a, 0));
    assert!(index.remove_entry_at(&a, 1));
    assert_eq!(ids(&index), vec!["c"]);
}

#[test]
fn test_sort_by_size() {
    let dir = tempdir().unwrap();
    write_image(dir.path(), "wide.png", 64, 8);
    write_image(dir.path(), "tall.png", 8, 64);
    write_image(dir.path(), "square.png", 32, 32);
    let index = open(dir.path());

    index.sort_by(SortKey::Width);
    assert_eq!(ids(&index), vec!["wide", "square", "tall"]);

    index.sort_by(SortKey::Height);
    assert_eq!(ids(&index), vec!["tall", "square", "wide"]);
}

#[test]
fn test_reload_runs_callback_on_main_loop() {
    let dir = tempdir().unwrap();
    write_image(dir.path(), "first.png", 2, 2);
    let index = open(dir.path());
    let main_loop = MainLoop::new();

    write_image(dir.path(), "second.png", 2, 2);
    fs::remove_file(dir.path().join("first.png")).unwrap();

    let ran_on = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&ran_on);
    index.reload(&main_loop.handle(), move || {
        *slot.lock().unwrap() = Some(thread::current().id());
    });

    assert!(main_loop.run_until(WAIT, || ran_on.lock().unwrap().is_some()));
    assert_eq!(*ran_on.lock().unwrap(), Some(thread::current().id()));
    assert_eq!(ids(&index), vec!["second"]);
}

#[test]
fn test_reloads_run_in_order() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    let main_loop = MainLoop::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..5 {
        let order = Arc::clone(&order);
        index.reload(&main_loop.handle(), move || order.lock().unwrap().push(i));
    }

    assert!(main_loop.run_until(WAIT, || order.lock().unwrap().len() == 5));
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_reload_of_deleted_directory_empties_index() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("walls");
    write_image(&target, "a.png", 2, 2);
    let index = open(&target);
    assert_eq!(index.len(), 1);

    fs::remove_dir_all(&target).unwrap();
    assert_eq!(index.reload_now().unwrap(), 0);
    assert!(index.is_empty());
}

#[test]
fn test_mutations_while_reading() {
    let dir = tempdir().unwrap();
    let index = open(dir.path());
    let stop = Arc::new(AtomicBool::new(false));

    let reader = {
        let index = Arc::clone(&index);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                let snapshot = index.list();
                assert!(snapshot.len() <= 200);
                let _ = index.entry_at(0);
            }
        })
    };

    for i in 0..200 {
        let id = format!("p{i}");
        assert!(index.add(&id, ".jpg"));
        if i % 2 == 0 {
            assert!(index.remove(&id));
        }
    }
    stop.store(true, Ordering::SeqCst);
    reader.join().unwrap();

    assert_eq!(index.len(), 100);
    for entry in index.list() {
        assert!(index.contains(entry.photo_id()));
    }
}

#[test]
fn test_add_during_reload_survives_the_swap() {
    let dir = tempdir().unwrap();
    let storage = Arc::new(GatedStorage::new());
    let index = Arc::new(LocalPhotoIndex::open(dir.path(), storage.clone()).unwrap());
    assert!(index.is_empty());

    storage.arm();
    let reloader = {
        let index = Arc::clone(&index);
        thread::spawn(move || index.reload_now().unwrap())
    };
    // The listing has already seen an empty directory.
    storage.wait_entered();

    write_image(dir.path(), "x.jpg", 3, 2);
    let adder = {
        let index = Arc::clone(&index);
        thread::spawn(move || index.add("x", ".jpg"))
    };
    thread::sleep(std::time::Duration::from_millis(50));
    storage.release();

    assert_eq!(reloader.join().unwrap(), 0);
    assert!(adder.join().unwrap());
    assert!(index.contains("x"));
    assert_eq!(index.len(), 1);
    assert_eq!(index.entry_at(0).unwrap().resolution(), Some(Resolution::new(3, 2)));
}
