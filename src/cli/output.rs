//! Plain-text tables for the status subcommands.

use std::io::{self, Write};

use comfy_table::{Cell, ContentArrangement, Table};

use crate::error::ReleaseError;

/// Marker for a present release note.
pub const HAS_NOTE: &str = "√";

/// Marker for a missing release note.
pub const NO_NOTE: &str = "x";

/// ASCII borders with `+` corners and a dashed rule under the header; rows
/// are not separated.
const TABLE_STYLE: &str = "||--+-++|    ++++++";

/// The marker for `present`.
#[must_use]
pub const fn flag(present: bool) -> &'static str {
    if present { HAS_NOTE } else { NO_NOTE }
}

/// A bordered ASCII table with the given column headings.
///
/// Columns are sized by display width, so wide glyphs stay aligned.
#[must_use]
pub fn status_table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(TABLE_STYLE)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header);
    table
}

/// Writes `table` followed by a newline.
///
/// # Errors
///
/// Returns [`ReleaseError::Io`] if writing fails.
pub fn write_table<W: Write>(table: &Table, writer: &mut W) -> Result<(), ReleaseError> {
    writeln!(writer, "{table}").map_err(|e| io_error(&e))
}

/// Converts an I/O error to a [`ReleaseError::Io`].
pub(crate) fn io_error(error: &io::Error) -> ReleaseError {
    ReleaseError::io(error, "write output")
}
