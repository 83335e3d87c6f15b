use chrono::NaiveDate;
use terminal_diary::{DiaryError, NO_ENTRY_SENTINEL, NoteStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store() -> (tempfile::TempDir, NoteStore) {
    let tmp = tempfile::tempdir().unwrap();
    let store = NoteStore::open(tmp.path().join("entries")).unwrap();
    (tmp, store)
}

#[test]
fn save_read_blank_delete_scenario() {
    let (_tmp, store) = store();
    let day = date(2025, 4, 8);

    store.write(day, "Hello").unwrap();
    assert_eq!(store.read(day).unwrap(), "Hello");

    store.write(day, "").unwrap();
    assert_eq!(store.read(day).unwrap(), NO_ENTRY_SENTINEL);

    assert!(store.delete(day).unwrap());
    assert_eq!(store.read(day).unwrap(), NO_ENTRY_SENTINEL);
}

#[test]
fn write_then_read_returns_text_verbatim() {
    let (_tmp, store) = store();
    let day = date(2024, 2, 29);
    for text in [
        "one line",
        "two\nlines\n",
        "  leading and trailing  ",
        "unicode: héllo wörld ✓",
        "\n\nbody after blank lines",
    ] {
        store.write(day, text).unwrap();
        assert_eq!(store.read(day).unwrap(), text);
    }
}

#[test]
fn whitespace_only_text_reads_as_sentinel() {
    let (_tmp, store) = store();
    let day = date(2025, 1, 1);
    store.write(day, " \t\n  \r\n").unwrap();
    assert_eq!(store.read(day).unwrap(), NO_ENTRY_SENTINEL);
}

#[test]
fn unwritten_date_reads_as_sentinel() {
    let (_tmp, store) = store();
    assert_eq!(store.read(date(1999, 12, 31)).unwrap(), NO_ENTRY_SENTINEL);
    assert!(!store.exists(date(1999, 12, 31)));
}

#[test]
fn later_write_replaces_earlier_one() {
    let (_tmp, store) = store();
    let day = date(2025, 4, 8);
    store.write(day, "a much longer first version of the entry").unwrap();
    store.write(day, "short").unwrap();
    assert_eq!(store.read(day).unwrap(), "short");
    assert_eq!(store.dates().unwrap(), vec![day]);
}

#[test]
fn deleting_unwritten_date_returns_false_and_leaves_others() {
    let (_tmp, store) = store();
    let kept = date(2025, 4, 7);
    store.write(kept, "keep me").unwrap();

    assert!(!store.delete(date(2025, 4, 8)).unwrap());
    assert_eq!(store.read(kept).unwrap(), "keep me");
}

#[test]
fn delete_twice_reports_second_as_false() {
    let (_tmp, store) = store();
    let day = date(2025, 4, 8);
    store.write(day, "x").unwrap();
    assert!(store.delete(day).unwrap());
    assert!(!store.delete(day).unwrap());
}

#[test]
fn entries_are_files_named_by_iso_date() {
    let (tmp, store) = store();
    store.write(date(2025, 4, 8), "Hello").unwrap();
    let path = tmp.path().join("entries").join("2025-04-08.txt");
    assert_eq!(std::fs::read_to_string(path).unwrap(), "Hello");
}

#[test]
fn dates_are_sorted_and_ignore_foreign_files() {
    let (tmp, store) = store();
    store.write(date(2025, 4, 8), "b").unwrap();
    store.write(date(2024, 12, 31), "a").unwrap();
    store.write(date(2025, 5, 1), "c").unwrap();
    store.delete(date(2025, 5, 1)).unwrap();

    let dir = tmp.path().join("entries");
    std::fs::write(dir.join("notes.txt"), "not a date").unwrap();
    std::fs::write(dir.join("2025-04-09.md"), "wrong extension").unwrap();
    std::fs::create_dir(dir.join("2025-04-10.txt")).unwrap();

    assert_eq!(
        store.dates().unwrap(),
        vec![date(2024, 12, 31), date(2025, 4, 8)]
    );
}

#[cfg(unix)]
#[test]
fn entries_are_private_to_the_owner() {
    use std::os::unix::fs::PermissionsExt;

    let (_tmp, store) = store();
    let day = date(2025, 4, 8);
    store.write(day, "secret").unwrap();
    let mode = std::fs::metadata(store.path_for(day))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
    let dir_mode = std::fs::metadata(store.dir()).unwrap().permissions().mode();
    assert_eq!(dir_mode & 0o777, 0o700);
}

#[test]
fn write_into_unusable_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let store = NoteStore::open(tmp.path().join("entries")).unwrap();
    let day = date(2025, 4, 8);
    // A non-empty directory where the file should go blocks the rename.
    let blocker = store.path_for(day);
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("x"), "x").unwrap();

    assert!(matches!(store.write(day, "Hello"), Err(DiaryError::Io { .. })));
}
