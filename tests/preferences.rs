use terminal_diary::PreferenceStore;

#[test]
fn flag_defaults_to_false_on_first_run() {
    let tmp = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open(tmp.path().join("prefs.json")).unwrap();
    assert!(!store.get_flag());
    assert!(!store.path().exists());
}

#[test]
fn set_flag_is_visible_and_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("prefs.json");

    let store = PreferenceStore::open(&path).unwrap();
    store.set_flag(true).unwrap();
    assert!(store.get_flag());
    drop(store);

    let reopened = PreferenceStore::open(&path).unwrap();
    assert!(reopened.get_flag());
    reopened.set_flag(false).unwrap();
    drop(reopened);

    assert!(!PreferenceStore::open(&path).unwrap().get_flag());
}

#[test]
fn existing_subscriber_observes_writes() {
    let tmp = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open(tmp.path().join("prefs.json")).unwrap();
    let mut rx = store.subscribe();
    assert!(!*rx.borrow_and_update());

    store.set_flag(true).unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(*rx.borrow_and_update());
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn new_subscriber_sees_latest_value_immediately() {
    let tmp = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open(tmp.path().join("prefs.json")).unwrap();
    store.set_flag(true).unwrap();

    let rx = store.subscribe();
    assert!(*rx.borrow());
}

#[test]
fn every_subscriber_gets_each_write() {
    let tmp = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open(tmp.path().join("prefs.json")).unwrap();
    let mut first = store.subscribe();
    let mut second = store.subscribe();

    store.toggle().unwrap();
    assert!(*first.borrow_and_update());
    assert!(*second.borrow_and_update());

    store.toggle().unwrap();
    assert!(!*first.borrow_and_update());
    assert!(!*second.borrow_and_update());
}

#[test]
fn corrupt_file_falls_back_to_default_and_is_replaced() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("prefs.json");
    std::fs::write(&path, "dark_mode=yes").unwrap();

    let store = PreferenceStore::open(&path).unwrap();
    assert!(!store.get_flag());

    store.set_flag(true).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["dark_mode"], serde_json::Value::Bool(true));
}

#[test]
fn file_without_the_key_means_light_mode() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("prefs.json");
    std::fs::write(&path, "{}").unwrap();
    assert!(!PreferenceStore::open(&path).unwrap().get_flag());
}
