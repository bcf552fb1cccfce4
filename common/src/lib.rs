pub mod lf_queue;
pub mod logging;
pub mod mem_pool;
pub mod time;
pub mod types;

pub use types::*;
