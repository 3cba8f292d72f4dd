pub mod transitions;

pub use transitions::{next_status, Trigger};
