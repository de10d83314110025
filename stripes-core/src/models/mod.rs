pub mod candidate;
pub mod chromosome;
pub mod footprint;
pub mod orientation;
pub mod result;

// re-export for cleaner imports
pub use self::candidate::{CandidateTable, StripeCandidate};
pub use self::chromosome::Chromosome;
pub use self::footprint::{BinSpan, BoundingBox, Footprint};
pub use self::orientation::Orientation;
pub use self::result::{ResultRow, ResultTable};
