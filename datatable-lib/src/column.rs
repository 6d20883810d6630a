//! Column definitions and row access.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Header of the designated non-sortable actions column.
pub const ACTIONS_HEADER: &str = "Actions";

/// A column of the table as supplied by the embedding application.
///
/// The `accessor` is the key used both in the field list sent to the server
/// and to look up cells in the returned rows.
///
/// # Example
///
/// ```
/// use datatable_lib::ColumnSpec;
///
/// let columns = vec![
///     ColumnSpec::new("Name", "name"),
///     ColumnSpec::new("Email", "email"),
///     ColumnSpec::actions(),
/// ];
/// assert!(!columns[2].sortable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Text shown in the header cell.
    pub header: String,
    /// Field key in the row data.
    pub accessor: String,
    /// Whether clicking the header changes the sort.
    #[serde(default = "default_sortable")]
    pub sortable: bool,
}

fn default_sortable() -> bool {
    true
}

impl ColumnSpec {
    /// Creates a sortable column.
    pub fn new(header: impl Into<String>, accessor: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            accessor: accessor.into(),
            sortable: true,
        }
    }

    /// Creates the non-sortable actions column.
    pub fn actions() -> Self {
        Self {
            header: ACTIONS_HEADER.to_string(),
            accessor: "actions".to_string(),
            sortable: false,
        }
    }

    /// Marks the column as not sortable.
    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// Returns the unique accessors of `columns` in first-occurrence order.
pub fn field_list(columns: &[ColumnSpec]) -> Vec<String> {
    let mut fields: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        if !fields.iter().any(|f| f == &column.accessor) {
            fields.push(column.accessor.clone());
        }
    }
    fields
}

/// A single row returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    /// Creates a row from a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the raw value for a column accessor.
    pub fn get(&self, accessor: &str) -> Option<&Value> {
        self.0.get(accessor)
    }

    /// Returns the value for `accessor` as display text.
    ///
    /// Strings are returned unquoted; missing and null values are empty.
    pub fn cell_text(&self, accessor: &str) -> String {
        match self.get(accessor) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Returns the underlying fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
