//! Debug-only reentrancy guard for container entry points.
//!
//! The containers call user code (`K: Eq`, `K: Hash`, `K: Ord`) while their
//! links are being walked or rewired. A key whose comparison calls back into
//! the same container would observe half-updated chains or a tree in the
//! middle of a rotation. In debug builds [`BusyFlag::enter`] panics on such a
//! nested call and names both operations; in release builds it is a no-op.

use core::cell::Cell;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

/// Tracks which public operation, if any, currently owns a container.
///
/// Holds a `Cell`, so containers embedding it are `!Sync`: shared access from
/// several threads needs an external lock.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    #[cfg(not(debug_assertions))]
    _unsync: PhantomData<Cell<()>>,
}

impl BusyFlag {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            #[cfg(not(debug_assertions))]
            _unsync: PhantomData,
        }
    }

    /// Marks `op` as running until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> BusyToken<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.active.replace(Some(op)) {
                panic!("reentrant call to `{op}` while `{running}` is in progress");
            }
            BusyToken { flag: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            BusyToken { _flag: PhantomData }
        }
    }
}

pub(crate) struct BusyToken<'a> {
    #[cfg(debug_assertions)]
    flag: &'a BusyFlag,
    #[cfg(not(debug_assertions))]
    _flag: PhantomData<&'a BusyFlag>,
}

impl Drop for BusyToken<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.flag.active.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::BusyFlag;

    #[test]
    fn sequential_entries_are_fine() {
        let flag = BusyFlag::new();
        {
            let _t = flag.enter("insert");
        }
        let _t = flag.enter("search");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_names_both_operations() {
        let flag = BusyFlag::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = flag.enter("insert");
            let _inner = flag.enter("contains");
        }));
        let payload = res.expect_err("nested entry must panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("`contains`"), "{msg}");
        assert!(msg.contains("`insert`"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let flag = BusyFlag::new();
        let _outer = flag.enter("insert");
        let _inner = flag.enter("contains");
    }
}
