mod atomic;
mod interface;
mod lock;
mod spin;

pub use atomic::*;
pub use interface::*;
pub use lock::*;
pub use spin::{MAX_NODE_ID, checked_node_id};
pub(crate) use spin::{wait_for_clock, wait_past};
