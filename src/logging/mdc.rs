//! Mapped diagnostic context
//!
//! Per-thread key/value pairs that are copied into every record logged on
//! that thread and can be rendered with `%X{key}`.

use std::cell::RefCell;
use std::collections::BTreeMap;

thread_local! {
    static CONTEXT: RefCell<BTreeMap<String, String>> = const { RefCell::new(BTreeMap::new()) };
}

/// Set `key` for the current thread, returning the previous value
pub fn put(key: impl Into<String>, value: impl Into<String>) -> Option<String> {
    CONTEXT.with(|ctx| ctx.borrow_mut().insert(key.into(), value.into()))
}

/// Get the current thread's value for `key`
pub fn get(key: &str) -> Option<String> {
    CONTEXT.with(|ctx| ctx.borrow().get(key).cloned())
}

/// Remove `key` from the current thread's context
pub fn remove(key: &str) -> Option<String> {
    CONTEXT.with(|ctx| ctx.borrow_mut().remove(key))
}

/// Remove every key from the current thread's context
pub fn clear() {
    CONTEXT.with(|ctx| ctx.borrow_mut().clear());
}

/// Copy of the current thread's context
pub fn snapshot() -> BTreeMap<String, String> {
    CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Set `key` until the returned guard is dropped
///
/// The previous value, if any, is restored on drop.
pub fn scoped(key: impl Into<String>, value: impl Into<String>) -> MdcGuard {
    let key = key.into();
    let previous = put(key.clone(), value);
    MdcGuard { key, previous }
}

/// Restores a context key when dropped
#[must_use = "the key is removed as soon as the guard is dropped"]
pub struct MdcGuard {
    key: String,
    previous: Option<String>,
}

impl Drop for MdcGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => {
                put(self.key.clone(), value);
            }
            None => {
                remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        clear();
        assert_eq!(put("originator", "sender"), None);
        assert_eq!(get("originator").as_deref(), Some("sender"));
        assert_eq!(remove("originator").as_deref(), Some("sender"));
        assert_eq!(get("originator"), None);
    }

    #[test]
    fn test_scoped_restores_previous() {
        clear();
        put("severity", "LOW");
        {
            let _guard = scoped("severity", "IMPORTANT");
            assert_eq!(get("severity").as_deref(), Some("IMPORTANT"));
        }
        assert_eq!(get("severity").as_deref(), Some("LOW"));
        clear();
    }

    #[test]
    fn test_scoped_removes_new_key() {
        clear();
        {
            let _guard = scoped("domainlog", "yes");
            assert_eq!(snapshot().len(), 1);
        }
        assert!(snapshot().is_empty());
    }

    #[test]
    fn test_context_is_per_thread() {
        clear();
        put("host", "main");
        let other = std::thread::spawn(|| get("host")).join().unwrap();
        assert_eq!(other, None);
        clear();
    }
}
