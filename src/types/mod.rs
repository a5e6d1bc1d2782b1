mod extension;
mod marker;
pub mod timestamp;

pub use extension::Extension;
pub use marker::{Alignment, MarkerKind, MediaMarker};
