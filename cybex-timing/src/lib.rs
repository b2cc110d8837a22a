pub mod clock;
pub mod pacer;

pub use clock::{precision_sleep, Clock, MonotonicClock};
pub use pacer::{TickPacer, TickStats};
