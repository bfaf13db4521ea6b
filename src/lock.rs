use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, taking the inner value back if a previous holder panicked.
///
/// Terminal output and temp-file state must stay usable from the cleanup
/// path even after a render thread panicked mid-frame.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            crate::log_debug(&format!("Mutex poisoned in {context}; recovering"));
            poisoned.into_inner()
        }
    }
}
