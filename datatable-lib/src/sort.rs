//! Single-column sort state sent to the server.

use serde::Deserialize;
use serde::Serialize;

use crate::column::ColumnSpec;

/// Column the table sorts by before the user picks one.
pub const DEFAULT_SORT_COLUMN: &str = "id";

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Returns the wire name of the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// The one active sort of the table.
///
/// Serialized the way the endpoint expects it:
/// `{"_column": "name", "_direction": "asc"}`.
///
/// # Example
///
/// ```
/// use datatable_lib::{ColumnSpec, Direction, SortSpec};
///
/// let sort = SortSpec::default();
/// let name = ColumnSpec::new("Name", "name");
///
/// let sort = sort.toggled(&name).unwrap();
/// assert_eq!(sort, SortSpec::new("name", Direction::Asc));
///
/// let sort = sort.toggled(&name).unwrap();
/// assert_eq!(sort.direction, Direction::Desc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Accessor of the sorted column, or the default sentinel.
    #[serde(rename = "_column")]
    pub column: String,
    /// Sort direction.
    #[serde(rename = "_direction")]
    pub direction: Direction,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::asc(DEFAULT_SORT_COLUMN)
    }
}

impl SortSpec {
    /// Creates a sort on `column` in `direction`.
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Creates an ascending sort on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    /// Creates a descending sort on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }

    /// Returns the sort that results from clicking `column`'s header.
    ///
    /// Clicking the active column flips the direction; clicking another
    /// column sorts it ascending. Returns `None` for non-sortable columns.
    pub fn toggled(&self, column: &ColumnSpec) -> Option<SortSpec> {
        if !column.sortable {
            return None;
        }
        let sort = if column.accessor == self.column {
            Self::new(self.column.clone(), self.direction.flip())
        } else {
            Self::asc(column.accessor.clone())
        };
        Some(sort)
    }

    /// Returns the header marker for `column` under this sort.
    pub fn indicator(&self, column: &ColumnSpec) -> SortIndicator {
        if !column.sortable || column.accessor != self.column {
            return SortIndicator::None;
        }
        match self.direction {
            Direction::Asc => SortIndicator::Ascending,
            Direction::Desc => SortIndicator::Descending,
        }
    }
}

/// Visual marker for a column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    /// The column is the active ascending sort.
    Ascending,
    /// The column is the active descending sort.
    Descending,
    /// The column is not the active sort.
    None,
}

impl SortIndicator {
    /// Returns the suffix appended to the header text.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Ascending => " 🔼",
            Self::Descending => " 🔽",
            Self::None => "",
        }
    }
}
