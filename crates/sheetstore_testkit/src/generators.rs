//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;
use sheetstore_core::{
    Cell, CellKind, HistoryLog, Subpath, Username, WorksheetBody, WorksheetIdent,
};

/// Strategy for generating valid usernames.
pub fn username_strategy() -> impl Strategy<Value = Username> {
    prop::string::string_regex("[A-Za-z0-9_][A-Za-z0-9._@+-]{0,15}")
        .expect("Invalid regex")
        .prop_map(|name| Username::new(name).expect("Generated invalid username"))
}

/// Strategy for generating one valid subpath segment.
pub fn subpath_segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_-]{1,12}")
        .expect("Invalid regex")
        .prop_filter("Segment must not use the worksheet prefix", |s| {
            !s.starts_with("ws-")
        })
}

/// Strategy for generating subpaths up to three levels deep.
pub fn subpath_strategy() -> impl Strategy<Value = Subpath> {
    prop::collection::vec(subpath_segment_strategy(), 0..=3)
        .prop_map(|segments| Subpath::from_segments(segments).expect("Generated invalid subpath"))
}

/// Strategy for generating full worksheet identities.
pub fn worksheet_ident_strategy() -> impl Strategy<Value = WorksheetIdent> {
    (username_strategy(), any::<u64>(), subpath_strategy())
        .prop_map(|(owner, id, subpath)| WorksheetIdent::from_parts(owner, id, subpath))
}

/// Strategy for generating a single cell with the given id.
fn cell_strategy(id: u64) -> impl Strategy<Value = Cell> {
    (
        prop_oneof![Just(CellKind::Compute), Just(CellKind::Text)],
        ".{0,64}",
        prop::option::of(".{0,64}"),
        any::<bool>(),
    )
        .prop_map(move |(kind, input, output, hidden)| Cell {
            id,
            kind,
            input,
            output: if kind == CellKind::Compute { output } else { None },
            hidden,
        })
}

/// Strategy for generating worksheet bodies with unique, ascending cell ids.
pub fn worksheet_body_strategy() -> impl Strategy<Value = WorksheetBody> {
    (0usize..12)
        .prop_flat_map(|len| {
            (0..len as u64)
                .map(cell_strategy)
                .collect::<Vec<_>>()
        })
        .prop_map(|cells| WorksheetBody { cells })
}

/// Strategy for generating history logs.
pub fn history_strategy() -> impl Strategy<Value = HistoryLog> {
    prop::collection::vec(".{0,40}", 0..32).prop_map(HistoryLog::from)
}

/// Strategy for generating titles, including empty and non-ASCII ones.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z ]{1,30}",
        "\\PC{1,30}",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;
    use proptest::strategy::ValueTree;

    #[test]
    fn usernames_are_valid() {
        let mut runner = TestRunner::default();
        for _ in 0..100 {
            let name = username_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(!name.as_str().starts_with('.'));
        }
    }

    proptest! {
        #[test]
        fn bodies_have_unique_ids(body in worksheet_body_strategy()) {
            let ids: Vec<u64> = body.cells.iter().map(|c| c.id).collect();
            let expected: Vec<u64> = (0..body.cells.len() as u64).collect();
            prop_assert_eq!(ids, expected);
        }

        #[test]
        fn text_cells_have_no_output(body in worksheet_body_strategy()) {
            for cell in &body.cells {
                if cell.kind == CellKind::Text {
                    prop_assert!(cell.output.is_none());
                }
            }
        }
    }
}
