//! File-backed datastores across reopen and simulated crashes.

use sheetstore_core::{
    Cell, CellKind, Config, CoreError, Datastore, Depth, HistoryLog, Namespace, SaveMode,
    SheetStore, WorksheetBody,
};
use sheetstore_testkit::{ident, ident_in, scenarios, IntegrationHarness};
use std::fs;
use tempfile::TempDir;

fn open(dir: &TempDir) -> SheetStore {
    SheetStore::open(&dir.path().join("store")).unwrap()
}

#[test]
fn everything_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let body = WorksheetBody {
        cells: vec![Cell::compute(0, "var('x'); solve(x^2 == 4, x)").with_output("[x == -2, x == 2]")],
    };
    {
        let store = open(&dir);
        store.save_users(&scenarios::user_directory(&["admin", "alice"])).unwrap();
        let history: HistoryLog = vec!["solve".to_string()].into();
        store.save_user_history("alice", &history).unwrap();

        let mut ws = store.create_worksheet(&ident_in("alice", 2, "algebra")).unwrap();
        ws.set_title("Quadratics");
        ws.body = body.clone();
        store.save_worksheet(&ws, SaveMode::Full).unwrap();
        store.close().unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.load_users().unwrap().len(), 2);
    assert_eq!(store.load_user_history("alice").unwrap().entries(), ["solve"]);
    let ws = store.load_worksheet(&ident_in("alice", 2, "algebra")).unwrap();
    assert_eq!(ws.title(), "Quadratics");
    assert_eq!(ws.body, body);
}

#[test]
fn tracked_state_matches_after_reopen() {
    let dir = TempDir::new().unwrap();
    let mut harness = IntegrationHarness::with_store(open(&dir));
    let body = WorksheetBody {
        cells: vec![Cell::compute(0, "factor(2^32 + 1)").with_output("641 * 6700417")],
    };
    harness.create(&ident("Alice", 0), "Fermat", body);
    harness.create(&ident("alice", 0), "Scratch", WorksheetBody::default());
    harness.create(&ident_in("alice", 1, "Drafts"), "Draft", WorksheetBody::default());
    harness.retitle(&ident("alice", 0), "Scratch pad");
    harness.verify_all();

    harness.store.close().unwrap();
    let closed = harness.replace_store(open(&dir));
    assert!(!closed.is_open());

    assert_eq!(harness.tracked_count(), 3);
    harness.verify_all();
}

#[test]
fn usernames_differing_in_case_get_distinct_directories() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.create_worksheet(&ident("alice", 1)).unwrap();
    store.create_worksheet(&ident("Alice", 1)).unwrap();

    // No two directory names differ only by case, so case-insensitive file
    // systems keep the owners apart too.
    let home = dir.path().join("store/data/home");
    assert!(home.join("alice/sheets/ws-1/conf").is_file());
    assert!(home.join("_alice/sheets/ws-1/conf").is_file());

    for owner in ["alice", "Alice"] {
        let listed = store.worksheets(owner, None, Depth::Recursive).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner().as_str(), owner);
    }
}

#[test]
fn layout_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.create_worksheet(&ident_in("alice", 3, "a/b")).unwrap();
    store.save_users(&scenarios::user_directory(&["alice"])).unwrap();

    let data = dir.path().join("store").join("data");
    assert!(dir.path().join("store").join("LOCK").is_file());
    assert!(data.join("users").is_file());
    let ws_dir = data.join("home/alice/sheets/a/b/ws-3");
    assert!(ws_dir.join("conf").is_file());
    assert!(ws_dir.join("body").is_file());
}

#[test]
fn crash_before_conf_leaves_no_visible_worksheet() {
    let dir = TempDir::new().unwrap();
    let id = ident("alice", 8);
    {
        let store = open(&dir);
        store.create_worksheet(&id).unwrap();
    }
    // Simulate a crash between writing the body and the conf.
    let ws_dir = dir.path().join("store/data/home/alice/sheets/ws-8");
    fs::remove_file(ws_dir.join("conf")).unwrap();

    let store = open(&dir);
    assert!(matches!(store.load_worksheet(&id), Err(CoreError::NotFound { .. })));
    assert!(store.worksheets("alice", None, Depth::Recursive).unwrap().is_empty());
    let mut ws = store.create_worksheet(&id).unwrap();
    ws.push_cell(CellKind::Compute, "retry");
    store.save_worksheet(&ws, SaveMode::Full).unwrap();
    assert_eq!(store.load_worksheet(&id).unwrap().body.cells.len(), 1);
}

#[test]
fn leftover_temp_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    let id = ident("alice", 0);
    {
        let store = open(&dir);
        store.create_worksheet(&id).unwrap();
    }
    let ws_dir = dir.path().join("store/data/home/alice/sheets/ws-0");
    fs::write(ws_dir.join(".conf.0123abcd.tmp"), b"half written").unwrap();

    let store = open(&dir);
    assert!(store.load_worksheet(&id).is_ok());
    assert_eq!(store.worksheets("alice", None, Depth::Recursive).unwrap().len(), 1);
}

#[test]
fn foreign_files_in_the_namespace_are_skipped() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.create_worksheet(&ident("alice", 0)).unwrap();
    }
    let sheets = dir.path().join("store/data/home/alice/sheets");
    fs::create_dir_all(sheets.join("ws-007")).unwrap();
    fs::write(sheets.join("ws-007/conf"), b"junk").unwrap();
    fs::write(sheets.join("README"), b"not a worksheet").unwrap();

    let store = open(&dir);
    let listed = store.worksheets("alice", None, Depth::Recursive).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), 0);
}

#[test]
fn corrupt_worksheet_is_reported_on_load_and_skipped_in_listing() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.create_worksheet(&ident("alice", 0)).unwrap();
        store.create_worksheet(&ident("alice", 1)).unwrap();
    }
    let conf = dir.path().join("store/data/home/alice/sheets/ws-1/conf");
    let mut bytes = fs::read(&conf).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&conf, bytes).unwrap();

    let store = open(&dir);
    let err = store.load_worksheet(&ident("alice", 1)).unwrap_err();
    assert!(matches!(err, CoreError::CorruptRecord { .. }), "{err}");
    assert_eq!(store.worksheets("alice", None, Depth::Recursive).unwrap().len(), 1);
}

#[test]
fn second_writer_is_locked_out() {
    let dir = TempDir::new().unwrap();
    let _first = open(&dir);
    let second = SheetStore::open(&dir.path().join("store"));
    assert!(matches!(second, Err(CoreError::DatastoreLocked)));
}

#[test]
fn read_only_handles_share_the_directory() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.create_worksheet(&ident("alice", 0)).unwrap();
    }
    let path = dir.path().join("store");
    let config = Config::default().read_only(true);
    let a = SheetStore::open_with_config(&path, config.clone()).unwrap();
    let b = SheetStore::open_with_config(&path, config).unwrap();
    assert!(a.load_worksheet(&ident("alice", 0)).is_ok());
    assert!(b.load_worksheet(&ident("alice", 0)).is_ok());
    assert!(matches!(SheetStore::open(&path), Err(CoreError::DatastoreLocked)));
}

#[test]
fn missing_datastore_without_create_is_not_found() {
    let dir = TempDir::new().unwrap();
    let config = Config::default().create_if_missing(false);
    let result = SheetStore::open_with_config(&dir.path().join("absent"), config);
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[test]
fn namespace_keys_match_files() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let id = ident_in("bob", 12, "x/y");
    store.create_worksheet(&id).unwrap();

    let key = Namespace::worksheet_conf(&id).unwrap();
    let mut path = dir.path().join("store/data");
    for segment in key.segments() {
        path.push(segment);
    }
    assert!(path.is_file());
    assert_eq!(Namespace::parse_worksheet_conf(&key), Some(id));
}
