//!  Storage is organized through [activity_log::ActivityLogImpl].
//!  The basic idea is:
//!   - There is a single append-only file with all the records.
//!   - Every line is one JSON encoded [entities::ActivityRecordEntity].
//!   - Lines are never rewritten. A line cut off by a crash is skipped on read and sealed on the
//!     next open.

pub mod activity_log;
pub mod entities;
