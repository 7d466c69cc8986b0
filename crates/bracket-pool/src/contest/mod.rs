pub mod entries;
pub mod window;

pub use window::{Clock, SubmissionWindow, SystemClock};
