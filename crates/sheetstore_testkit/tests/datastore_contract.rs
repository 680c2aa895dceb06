//! Contract tests run against every backend.

use sheetstore_core::{
    Cell, CellKind, CoreError, Datastore, Depth, ErrorKind, HistoryLog, OpenIdAssociations,
    SaveMode, ServerConfig, Subpath, UserDirectory, Username,
};
use sheetstore_testkit::{ident, ident_in, scenarios, with_each_backend};

#[test]
fn created_worksheet_loads_with_its_identity() {
    with_each_backend(|backend, store| {
        let id = ident_in("alice", 7, "projects/2024");
        let created = store.create_worksheet(&id).unwrap();
        let loaded = store.load_worksheet(&id).unwrap();
        assert_eq!(loaded.ident(), &id, "{backend}");
        assert_eq!(loaded, created, "{backend}");
    });
}

#[test]
fn second_create_fails_with_already_exists() {
    with_each_backend(|backend, store| {
        let id = ident("alice", 1);
        let mut ws = store.create_worksheet(&id).unwrap();
        ws.push_cell(CellKind::Compute, "keep me");
        store.save_worksheet(&ws, SaveMode::Full).unwrap();

        let err = store.create_worksheet(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists, "{backend}");
        // The existing worksheet is untouched.
        assert_eq!(store.load_worksheet(&id).unwrap().body.cells.len(), 1, "{backend}");
    });
}

#[test]
fn same_id_in_different_subpaths_are_distinct() {
    with_each_backend(|backend, store| {
        store.create_worksheet(&ident("alice", 1)).unwrap();
        store.create_worksheet(&ident_in("alice", 1, "a")).unwrap();
        store.create_worksheet(&ident_in("alice", 1, "a/b")).unwrap();
        store.create_worksheet(&ident("bob", 1)).unwrap();
        let listed = store.worksheets("alice", None, Depth::Recursive).unwrap();
        assert_eq!(listed.len(), 3, "{backend}");
    });
}

#[test]
fn load_of_missing_worksheet_is_not_found() {
    with_each_backend(|backend, store| {
        for id in [ident("alice", 0), ident("nobody", 3), ident_in("alice", 0, "x")] {
            let err = store.load_worksheet(&id).unwrap_err();
            assert!(matches!(err, CoreError::NotFound { .. }), "{backend}: {err}");
        }
        store.create_worksheet(&ident("alice", 0)).unwrap();
        assert!(store.load_worksheet(&ident("alice", 1)).is_err(), "{backend}");
    });
}

#[test]
fn listing_an_unknown_user_is_empty() {
    with_each_backend(|backend, store| {
        assert!(store.worksheets("ghost", None, Depth::Recursive).unwrap().is_empty(), "{backend}");
        let sub = Subpath::parse("deep/er").unwrap();
        assert!(store.worksheets("ghost", Some(&sub), Depth::Shallow).unwrap().is_empty(), "{backend}");
    });
}

#[test]
fn listing_rejects_malformed_usernames() {
    with_each_backend(|backend, store| {
        let err = store.worksheets("../etc", None, Depth::Recursive).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid, "{backend}");
    });
}

#[test]
fn listing_follows_subpaths_recursively() {
    with_each_backend(|backend, store| {
        for (id, sp) in [(0, ""), (1, "p"), (2, "p/q"), (3, "p/q/r"), (4, "s")] {
            store.create_worksheet(&ident_in("alice", id, sp)).unwrap();
        }
        let ids = |sp: &str, depth| -> Vec<u64> {
            let sub = Subpath::parse(sp).unwrap();
            store
                .worksheets("alice", Some(&sub), depth)
                .unwrap()
                .iter()
                .map(|ws| ws.id())
                .collect()
        };
        assert_eq!(ids("", Depth::Recursive), [0, 1, 2, 3, 4], "{backend}");
        assert_eq!(ids("p", Depth::Recursive), [1, 2, 3], "{backend}");
        assert_eq!(ids("p/q", Depth::Shallow), [2], "{backend}");
        assert_eq!(ids("", Depth::Shallow), [0], "{backend}");
        assert!(ids("q", Depth::Recursive).is_empty(), "{backend}");
    });
}

#[test]
fn listing_orders_ids_numerically() {
    with_each_backend(|backend, store| {
        for id in [10, 2, 1, 33] {
            store.create_worksheet(&ident("alice", id)).unwrap();
        }
        let ids: Vec<u64> = store
            .worksheets("alice", None, Depth::Recursive)
            .unwrap()
            .iter()
            .map(|ws| ws.id())
            .collect();
        assert_eq!(ids, [1, 2, 10, 33], "{backend}");
    });
}

#[test]
fn config_only_save_leaves_body_unchanged() {
    with_each_backend(|backend, store| {
        let id = ident("alice", 5);
        let mut ws = store.create_worksheet(&id).unwrap();
        ws.push_cell(CellKind::Compute, "integrate(x^2, x)");
        ws.body.cells[0].output = Some("1/3*x^3".into());
        store.save_worksheet(&ws, SaveMode::Full).unwrap();
        let body_before = ws.body.clone();

        ws.set_title("Calculus");
        ws.config.pretty_print = true;
        ws.push_cell(CellKind::Text, "never saved");
        store.save_worksheet(&ws, SaveMode::ConfigOnly).unwrap();

        let loaded = store.load_worksheet(&id).unwrap();
        assert_eq!(loaded.body, body_before, "{backend}");
        assert_eq!(loaded.title(), "Calculus", "{backend}");
        assert!(loaded.config.pretty_print, "{backend}");
    });
}

#[test]
fn full_save_replaces_body() {
    with_each_backend(|backend, store| {
        let id = ident("alice", 5);
        let mut ws = store.create_worksheet(&id).unwrap();
        ws.body.cells = vec![Cell::text(0, "intro"), Cell::compute(1, "x = 1")];
        store.save_worksheet(&ws, SaveMode::Full).unwrap();
        ws.body.cells.remove(0);
        store.save_worksheet(&ws, SaveMode::Full).unwrap();
        assert_eq!(store.load_worksheet(&id).unwrap().body, ws.body, "{backend}");
    });
}

#[test]
fn save_of_missing_worksheet_is_not_found() {
    with_each_backend(|backend, store| {
        let ws = store.create_worksheet(&ident("alice", 0)).unwrap();
        store.delete().unwrap();
        let err = store.save_worksheet(&ws, SaveMode::Full).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{backend}");
        assert!(store.load_worksheet(&ident("alice", 0)).is_err(), "{backend}");
    });
}

#[test]
fn empty_user_directory_roundtrips() {
    with_each_backend(|backend, store| {
        store.save_users(&scenarios::user_directory(&["admin", "alice"])).unwrap();
        store.save_users(&UserDirectory::new()).unwrap();
        assert!(store.load_users().unwrap().is_empty(), "{backend}");
    });
}

#[test]
fn user_directory_is_replaced_wholesale() {
    with_each_backend(|backend, store| {
        store.save_users(&scenarios::user_directory(&["admin", "alice", "bob"])).unwrap();
        store.save_users(&scenarios::user_directory(&["root"])).unwrap();
        let users = store.load_users().unwrap();
        assert_eq!(users.len(), 1, "{backend}");
        assert!(users.get("root").unwrap().is_admin(), "{backend}");
        assert!(!users.contains("alice"), "{backend}");
    });
}

#[test]
fn history_of_unknown_user_is_empty() {
    with_each_backend(|backend, store| {
        assert!(store.load_user_history("nobody").unwrap().is_empty(), "{backend}");
    });
}

#[test]
fn history_is_per_user() {
    with_each_backend(|backend, store| {
        let alice: HistoryLog = vec!["a1".to_string(), "a2".to_string()].into();
        let bob: HistoryLog = vec!["b1".to_string()].into();
        store.save_user_history("alice", &alice).unwrap();
        store.save_user_history("bob", &bob).unwrap();
        assert_eq!(store.load_user_history("alice").unwrap(), alice, "{backend}");
        assert_eq!(store.load_user_history("bob").unwrap(), bob, "{backend}");
    });
}

#[test]
fn history_does_not_collide_with_worksheets() {
    with_each_backend(|backend, store| {
        store.create_worksheet(&ident_in("alice", 0, "history")).unwrap();
        store
            .save_user_history("alice", &vec!["x".to_string()].into())
            .unwrap();
        assert_eq!(store.load_user_history("alice").unwrap().len(), 1, "{backend}");
        assert_eq!(store.worksheets("alice", None, Depth::Recursive).unwrap().len(), 1, "{backend}");
    });
}

#[test]
fn singleton_records_default_and_roundtrip() {
    with_each_backend(|backend, store| {
        assert!(store.load_server_conf().unwrap().is_empty(), "{backend}");
        assert!(store.load_openid().unwrap().is_empty(), "{backend}");

        let mut conf = ServerConfig::new();
        conf.set("accounts", true);
        conf.set("default_language", "en_US");
        store.save_server_conf(&conf).unwrap();
        assert_eq!(store.load_server_conf().unwrap(), conf, "{backend}");

        let mut ids = OpenIdAssociations::new();
        ids.bind("https://openid.example/alice", Username::new("alice").unwrap());
        store.save_openid(&ids).unwrap();
        assert_eq!(store.load_openid().unwrap(), ids, "{backend}");
    });
}

#[test]
fn delete_removes_everything() {
    with_each_backend(|backend, store| {
        store.create_worksheet(&ident("alice", 0)).unwrap();
        store.save_users(&scenarios::user_directory(&["alice"])).unwrap();
        let mut conf = ServerConfig::new();
        conf.set("accounts", false);
        store.save_server_conf(&conf).unwrap();

        store.delete().unwrap();
        assert!(store.load_users().unwrap().is_empty(), "{backend}");
        assert!(store.load_server_conf().unwrap().is_empty(), "{backend}");
        assert!(store.worksheets("alice", None, Depth::Recursive).unwrap().is_empty(), "{backend}");
    });
}
