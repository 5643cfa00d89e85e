//! Everything between the parsed log and what the user sees.

pub mod aggregation;
pub mod calendar;
pub mod html;
pub mod palette;
