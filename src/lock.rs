use std::sync::{Mutex, MutexGuard};

/// Recovers from a poisoned mutex instead of propagating the panic that
/// poisoned it. FocusField never shares mutable state outside the Bus except
/// a handful of small registries (health gauges, the last-known `TargetLock`
/// cache the beamformer reads); a panicking reader of one of those should not
/// take every other component down with it.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(module = context, event = "mutex_poisoned_recovered");
            poisoned.into_inner()
        }
    }
}
