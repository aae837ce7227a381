pub mod clock;
pub mod expiring;

pub use clock::{Clock, ManualClock, SystemClock};
pub use expiring::ExpiringStore;
