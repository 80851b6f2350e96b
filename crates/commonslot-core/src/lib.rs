//! Core types: identities, date windows, slots, intersection

pub mod error;
pub mod identity;
pub mod intersect;
pub mod slot;
pub mod tracing;
pub mod window;

pub use error::{AvailabilityError, AvailabilityResult, ErrorKind};
pub use identity::{DEFAULT_BOOKING_HOST, Identity, Resolver, resolve};
pub use intersect::intersect;
pub use slot::{DISPLAY_TIME_FORMAT, Slot, dedup_slots};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use window::{DATE_FORMAT, DateWindow, MAX_WINDOW_DAYS, RangeValidator, utc_offset, validate};
