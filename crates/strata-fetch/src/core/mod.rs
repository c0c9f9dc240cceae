//! Pure transformations for nested range downloads.
//!
//! Partitioning and status classification touch no I/O. The retry combinator
//! only suspends on a timer between attempts; what it retries is supplied by
//! the caller.

mod partition;
mod retry;
mod validation;

pub use partition::{Partition, partition};
pub use retry::RetryPolicy;
pub use validation::{accepts_range_status, is_success};
