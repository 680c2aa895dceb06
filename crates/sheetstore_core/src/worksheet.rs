//! Worksheet model.
//!
//! A worksheet is stored as two records: a lightweight [`WorksheetConfig`]
//! and a [`WorksheetBody`] holding the cells. Keeping them apart lets a
//! config-only save skip rewriting a potentially large body.

use crate::identity::{Username, WorksheetIdent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Evaluation system assigned to new worksheets.
pub const DEFAULT_SYSTEM: &str = "sage";

/// Title assigned to new worksheets.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Milliseconds since the Unix epoch, saturating at zero for clocks set
/// before 1970.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Who last changed a worksheet, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastChange {
    /// The user that made the change.
    pub user: Username,
    /// Unix time in milliseconds.
    pub timestamp_ms: u64,
}

/// Lightweight worksheet metadata, saved independently of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetConfig {
    /// Display title.
    pub title: String,
    /// Evaluation system name.
    pub system: String,
    /// Whether outputs are pretty printed.
    pub pretty_print: bool,
    /// Users allowed to edit.
    pub collaborators: Vec<Username>,
    /// Users allowed to view.
    pub viewers: Vec<Username>,
    /// Per-user tag lists.
    pub tags: BTreeMap<Username, Vec<String>>,
    /// Id of the published copy, if any.
    pub published_id: Option<u64>,
    /// Most recent change.
    pub last_change: LastChange,
    /// Save log, oldest first.
    pub saved_by: Vec<LastChange>,
    /// Creation time, Unix milliseconds.
    pub created_at_ms: u64,
}

impl WorksheetConfig {
    /// Creates the configuration of a fresh worksheet owned by `owner`.
    #[must_use]
    pub fn new(owner: &Username) -> Self {
        let now = now_ms();
        Self {
            title: DEFAULT_TITLE.to_string(),
            system: DEFAULT_SYSTEM.to_string(),
            pretty_print: false,
            collaborators: Vec::new(),
            viewers: Vec::new(),
            tags: BTreeMap::new(),
            published_id: None,
            last_change: LastChange {
                user: owner.clone(),
                timestamp_ms: now,
            },
            saved_by: Vec::new(),
            created_at_ms: now,
        }
    }
}

/// Kind of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Rich text, not evaluated.
    Text,
    /// Code evaluated by the worksheet's system.
    Compute,
}

/// One cell of a worksheet body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Id, unique within the worksheet.
    pub id: u64,
    /// What the cell holds.
    pub kind: CellKind,
    /// Source text.
    pub input: String,
    /// Last evaluation result. Always `None` for text cells.
    pub output: Option<String>,
    /// Whether the input is collapsed.
    pub hidden: bool,
}

impl Cell {
    /// Creates a compute cell with no output.
    #[must_use]
    pub fn compute(id: u64, input: impl Into<String>) -> Self {
        Self {
            id,
            kind: CellKind::Compute,
            input: input.into(),
            output: None,
            hidden: false,
        }
    }

    /// Creates a text cell.
    #[must_use]
    pub fn text(id: u64, input: impl Into<String>) -> Self {
        Self {
            id,
            kind: CellKind::Text,
            input: input.into(),
            output: None,
            hidden: false,
        }
    }

    /// Sets the output.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// The cells of a worksheet, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetBody {
    /// Cells in order.
    pub cells: Vec<Cell>,
}

impl WorksheetBody {
    /// Returns `true` if there are no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A complete worksheet: identity, configuration and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    ident: WorksheetIdent,
    /// Metadata.
    pub config: WorksheetConfig,
    /// Cells.
    pub body: WorksheetBody,
}

impl Worksheet {
    /// Creates an empty worksheet shell.
    #[must_use]
    pub fn new(ident: WorksheetIdent) -> Self {
        let config = WorksheetConfig::new(ident.owner());
        Self {
            ident,
            config,
            body: WorksheetBody::default(),
        }
    }

    /// Assembles a worksheet from stored parts.
    #[must_use]
    pub fn from_parts(ident: WorksheetIdent, config: WorksheetConfig, body: WorksheetBody) -> Self {
        Self {
            ident,
            config,
            body,
        }
    }

    /// Returns the identity.
    #[must_use]
    pub fn ident(&self) -> &WorksheetIdent {
        &self.ident
    }

    /// Returns the owner.
    #[must_use]
    pub fn owner(&self) -> &Username {
        self.ident.owner()
    }

    /// Returns the numeric id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.ident.id()
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.config.title
    }

    /// Sets the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.config.title = title.into();
    }

    /// Records a change by `user` at the current time.
    pub fn touch(&mut self, user: &Username) {
        self.config.last_change = LastChange {
            user: user.clone(),
            timestamp_ms: now_ms(),
        };
    }

    /// Smallest id greater than every existing cell id.
    #[must_use]
    pub fn next_cell_id(&self) -> u64 {
        self.body
            .cells
            .iter()
            .map(|c| c.id.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Appends a cell with a fresh id and returns that id.
    pub fn push_cell(&mut self, kind: CellKind, input: impl Into<String>) -> u64 {
        let id = self.next_cell_id();
        let cell = match kind {
            CellKind::Compute => Cell::compute(id, input),
            CellKind::Text => Cell::text(id, input),
        };
        self.body.cells.push(cell);
        id
    }

    pub(crate) fn into_parts(self) -> (WorksheetIdent, WorksheetConfig, WorksheetBody) {
        (self.ident, self.config, self.body)
    }
}
