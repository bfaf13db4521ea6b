pub mod alert;
pub mod art;
pub mod cleanup;
pub mod config;
pub mod countdown;
pub mod frame;
pub mod input;
mod lock;
mod logging;
pub mod render_loop;
pub mod screen;
pub mod sounds;
pub mod terminal_restore;

pub(crate) use lock::lock_or_recover;
pub use logging::{
    crash_log_path, init_logging, log_debug, log_file_path, log_panic, trace_log_path,
};
