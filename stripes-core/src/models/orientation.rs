use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

///
/// Which side of its anchor a stripe extends to.
///
/// In the upper triangle of the matrix (row < column) a `Right` stripe is a
/// vertical band: its anchor is a span of columns and it extends upstream along
/// the rows. A `Left` stripe is a horizontal band: its anchor is a span of rows
/// and it extends downstream along the columns.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Left,
    Right,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Left, Orientation::Right];

    /// Stable index, used to key per-orientation tables.
    pub fn index(self) -> usize {
        match self {
            Orientation::Left => 0,
            Orientation::Right => 1,
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Left => write!(f, "left"),
            Orientation::Right => write!(f, "right"),
        }
    }
}
