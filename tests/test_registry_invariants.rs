// CLASSIFICATION: COMMUNITY
// Filename: test_registry_invariants.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use tagrelay::registry::codec::{decode, encode, validate};
use tagrelay::registry::{Layout, RegistryError, TagError, TagRegistry, MAX_TAGS};
use tagrelay::store::{FileStore, MemStore};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> TagRegistry<MemStore> {
    let mut reg = TagRegistry::new(MemStore::new(Layout::default().end())).unwrap();
    reg.clear_all().unwrap();
    reg
}

#[test]
fn insert_lookup_delete_scenario() {
    init_logger();
    let mut reg = registry();
    assert_eq!(reg.insert("123").unwrap(), 0);
    assert_eq!(reg.count().unwrap(), 1);
    assert_eq!(reg.list_canonical().unwrap(), vec!["00000000123".to_string()]);
    assert!(matches!(reg.insert("123"), Err(RegistryError::DuplicateTag)));
    assert!(matches!(reg.insert("00000000123"), Err(RegistryError::DuplicateTag)));
    assert_eq!(reg.count().unwrap(), 1);
    reg.delete("123").unwrap();
    assert_eq!(reg.count().unwrap(), 0);
    assert!(matches!(reg.delete("123"), Err(RegistryError::NotFound)));
}

#[test]
fn capacity_is_exact() {
    init_logger();
    let mut reg = registry();
    for n in 0..MAX_TAGS {
        reg.insert(&n.to_string()).unwrap();
    }
    assert_eq!(reg.count().unwrap(), MAX_TAGS);
    assert!(matches!(
        reg.insert("99999999999"),
        Err(RegistryError::RegistryFull { max: MAX_TAGS })
    ));
    assert_eq!(reg.verify().unwrap(), MAX_TAGS);
    // freeing one slot admits exactly one more tag
    reg.delete("150").unwrap();
    reg.insert("99999999999").unwrap();
    assert_eq!(reg.find("99999999999").unwrap(), Some(MAX_TAGS - 1));
}

#[test]
fn compaction_preserves_order() {
    init_logger();
    let mut reg = registry();
    for tag in ["1", "2", "3"] {
        reg.insert(tag).unwrap();
    }
    reg.delete("2").unwrap();
    assert_eq!(reg.list().unwrap(), vec!["1", "3"]);
    assert_eq!(reg.count().unwrap(), 2);
    assert_eq!(reg.find("2").unwrap(), None);
    assert_eq!(reg.find("3").unwrap(), Some(1));
}

#[test]
fn clear_all_empties_registry() {
    let mut reg = registry();
    reg.insert("5").unwrap();
    reg.insert("6").unwrap();
    reg.clear_all().unwrap();
    assert!(reg.list().unwrap().is_empty());
    assert_eq!(reg.count().unwrap(), 0);
    // stale slot bytes are unreachable, so the same tag is insertable again
    reg.insert("5").unwrap();
    assert_eq!(reg.count().unwrap(), 1);
}

#[test]
fn codec_round_trip_and_validation() {
    assert_eq!(decode(&encode("42")), "00000000042");
    assert_eq!(decode(&encode("12345678901")), "12345678901");
    assert!(matches!(
        validate("123456789012"),
        Err(TagError::InvalidLength { len: 12, .. })
    ));
    assert!(matches!(
        validate("12a"),
        Err(TagError::InvalidCharacter { ch: 'a', pos: 2 })
    ));
    assert!(validate("0").is_ok());
}

#[test]
fn independent_registries_coexist() {
    let mut a = registry();
    let mut b = TagRegistry::with_layout(MemStore::new(512), Layout::with_capacity(4)).unwrap();
    b.clear_all().unwrap();
    a.insert("1").unwrap();
    b.insert("2").unwrap();
    assert!(a.contains("1").unwrap() && !a.contains("2").unwrap());
    assert!(b.contains("2").unwrap() && !b.contains("1").unwrap());
}

#[test]
fn file_store_survives_reopen() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tags.img");
    {
        let store = FileStore::open(&path, 4096).unwrap();
        let mut reg = TagRegistry::new(store).unwrap();
        reg.clear_all().unwrap();
        reg.insert("700").unwrap();
        reg.insert("800").unwrap();
        reg.delete("700").unwrap();
    }
    let store = FileStore::open(&path, 4096).unwrap();
    let mut reg = TagRegistry::new(store).unwrap();
    assert_eq!(reg.list().unwrap(), vec!["800"]);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
}
