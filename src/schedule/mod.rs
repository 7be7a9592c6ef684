//! Weekly schedule pipeline.
//!
//! A week is stored as one CSV blob with a fixed 8-column header. The grid UI
//! tracks "Complete" toggles separately; before a save the toggles are turned
//! into [`intent::StatusIntent`]s and the merge engine patches them into the
//! `status` column of the matching rows.
//!
//! Leaf-first: [`codec`] -> [`row`] / [`key`] -> [`intent`] -> [`merge`] ->
//! [`payload`].

pub mod codec;
pub mod intent;
pub mod key;
pub mod merge;
pub mod payload;
pub mod row;

pub use intent::{CellEntry, GridCell, GridRow, GridState, Status, StatusIntent};
pub use key::{RowKey, Slot};
pub use merge::{MergeOutcome, MergeReport, Unchanged, apply, merge};
pub use payload::SavePayload;
pub use row::{HEADER_FIELDS, HEADER_LINE, ScheduleRow, SchemaVersion};
