//! REAL Core: document paths, field values, clocks, and default document templates.

pub mod clock;
pub mod path;
pub mod templates;
pub mod types;

pub use clock::{ClockSource, FixedClock, SystemClock};
pub use path::{CollectionPath, DocumentPath, PathError};
pub use templates::{ContentKind, MediaKind, StructurePart};
pub use types::{fields, DocumentSnapshot, Fields, Value};
