pub mod dates;
pub mod fields;
pub mod record;

pub use dates::{parse_single, resolve_range, ResolvedRange};
pub use fields::{extract_fields, FieldMap};
pub use record::{assemble, TitlePolicy};
