//! The graph lock and version counters.
//!
//! [`GraphLock`] is a reentrant multi-reader/single-writer lock with writer
//! preference. It carries the locking *contract* of the store - reentrancy,
//! explicit unlock, the read-to-write upgrade error - while memory safety of
//! the data structures is independently guaranteed by the store's inner
//! `RwLock`. Single-threaded callers can disable auto-locking and drive this
//! lock manually (or not at all).
//!
//! [`GraphVersion`] holds the monotonic node/edge version counters observers
//! poll. Counters are written under the write path and read anywhere;
//! observers tolerate benign staleness.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use trellis_common::collections::FxHashMap;
use trellis_common::error::{GraphError, Result};

#[derive(Default)]
struct LockState {
    /// Read holds per thread; a thread may nest read locks.
    readers: FxHashMap<ThreadId, usize>,
    /// The thread currently holding the write lock, if any.
    writer: Option<ThreadId>,
    /// Write reentrancy depth.
    write_holds: usize,
    /// Writers blocked waiting for readers to drain.
    writers_waiting: usize,
}

/// Reentrant read/write lock with writer preference.
pub struct GraphLock {
    state: Mutex<LockState>,
    readers_done: Condvar,
    writer_done: Condvar,
}

impl GraphLock {
    /// Creates an unlocked graph lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            readers_done: Condvar::new(),
            writer_done: Condvar::new(),
        }
    }

    /// Acquires a read hold for the current thread. Nests freely; a thread
    /// holding the write lock may also take read holds.
    ///
    /// New readers wait while a writer is active or queued (writer
    /// preference), unless the thread already holds a read or write lock.
    pub fn read_lock(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            let reentrant =
                state.writer == Some(me) || state.readers.get(&me).copied().unwrap_or(0) > 0;
            let blocked = state.writer.is_some_and(|w| w != me)
                || (!reentrant && state.writers_waiting > 0);
            if !blocked {
                break;
            }
            self.writer_done.wait(&mut state);
        }
        *state.readers.entry(me).or_insert(0) += 1;
    }

    /// Releases one read hold of the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ProgrammingError`] if the thread holds no read
    /// lock.
    pub fn read_unlock(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        match state.readers.get_mut(&me) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    state.readers.remove(&me);
                    if state.readers.is_empty() {
                        self.readers_done.notify_all();
                    }
                }
                Ok(())
            }
            _ => Err(GraphError::ProgrammingError(
                "read_unlock without a matching read_lock",
            )),
        }
    }

    /// Releases every read hold of the current thread. Used by iterator
    /// cleanup on exceptional exit paths.
    pub fn read_unlock_all(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.readers.remove(&me).is_some() && state.readers.is_empty() {
            self.readers_done.notify_all();
        }
    }

    /// Acquires the write lock. Reentrant for the holding thread.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ProgrammingError`] if the calling thread holds
    /// read locks but no write ticket - a read hold cannot be upgraded.
    pub fn write_lock(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            state.write_holds += 1;
            return Ok(());
        }
        if state.readers.get(&me).copied().unwrap_or(0) > 0 {
            return Err(GraphError::ProgrammingError(
                "cannot upgrade a read lock to a write lock",
            ));
        }
        state.writers_waiting += 1;
        while state.writer.is_some() || !state.readers.is_empty() {
            self.readers_done.wait(&mut state);
        }
        state.writers_waiting -= 1;
        state.writer = Some(me);
        state.write_holds = 1;
        Ok(())
    }

    /// Releases one write hold of the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ProgrammingError`] if the thread does not hold
    /// the write lock.
    pub fn write_unlock(&self) -> Result<()> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer != Some(me) {
            return Err(GraphError::ProgrammingError(
                "write_unlock without holding the write lock",
            ));
        }
        state.write_holds -= 1;
        if state.write_holds == 0 {
            state.writer = None;
            // Wake queued writers first; waiting readers recheck too.
            self.readers_done.notify_all();
            self.writer_done.notify_all();
        }
        Ok(())
    }

    /// `true` if the current thread holds at least one read lock.
    #[must_use]
    pub fn is_read_held(&self) -> bool {
        let me = thread::current().id();
        self.state.lock().readers.get(&me).copied().unwrap_or(0) > 0
    }

    /// `true` if the current thread holds the write lock.
    #[must_use]
    pub fn is_write_held(&self) -> bool {
        let me = thread::current().id();
        self.state.lock().writer == Some(me)
    }
}

impl Default for GraphLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic node/edge version counters.
///
/// Bumped on every structural mutation that affects observers; readable
/// without any lock.
#[derive(Debug, Default)]
pub struct GraphVersion {
    node_version: AtomicU64,
    edge_version: AtomicU64,
}

impl GraphVersion {
    /// Creates counters starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current node version.
    #[inline]
    #[must_use]
    pub fn node_version(&self) -> u64 {
        self.node_version.load(Ordering::Acquire)
    }

    /// The current edge version.
    #[inline]
    #[must_use]
    pub fn edge_version(&self) -> u64 {
        self.edge_version.load(Ordering::Acquire)
    }

    /// Both counters as an atomic-enough snapshot pair.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> (u64, u64) {
        (self.node_version(), self.edge_version())
    }

    pub(crate) fn bump_node(&self) {
        self.node_version.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn bump_edge(&self) {
        self.edge_version.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_read_lock_nests() {
        let lock = GraphLock::new();
        lock.read_lock();
        lock.read_lock();
        assert!(lock.is_read_held());
        lock.read_unlock().unwrap();
        assert!(lock.is_read_held());
        lock.read_unlock().unwrap();
        assert!(!lock.is_read_held());
    }

    #[test]
    fn test_read_unlock_without_lock_errors() {
        let lock = GraphLock::new();
        assert!(matches!(
            lock.read_unlock(),
            Err(GraphError::ProgrammingError(_))
        ));
    }

    #[test]
    fn test_write_lock_reentrant() {
        let lock = GraphLock::new();
        lock.write_lock().unwrap();
        lock.write_lock().unwrap();
        assert!(lock.is_write_held());
        lock.write_unlock().unwrap();
        assert!(lock.is_write_held());
        lock.write_unlock().unwrap();
        assert!(!lock.is_write_held());
    }

    #[test]
    fn test_upgrade_is_rejected() {
        let lock = GraphLock::new();
        lock.read_lock();
        assert!(matches!(
            lock.write_lock(),
            Err(GraphError::ProgrammingError(_))
        ));
        lock.read_unlock().unwrap();
    }

    #[test]
    fn test_write_then_read_is_allowed() {
        let lock = GraphLock::new();
        lock.write_lock().unwrap();
        lock.read_lock();
        lock.read_unlock().unwrap();
        lock.write_unlock().unwrap();
    }

    #[test]
    fn test_read_unlock_all() {
        let lock = GraphLock::new();
        lock.read_lock();
        lock.read_lock();
        lock.read_lock();
        lock.read_unlock_all();
        assert!(!lock.is_read_held());
    }

    #[test]
    fn test_writer_excludes_other_readers() {
        let lock = Arc::new(GraphLock::new());
        lock.write_lock().unwrap();

        let other = Arc::clone(&lock);
        let handle = std::thread::spawn(move || {
            other.read_lock();
            other.read_unlock().unwrap();
            true
        });

        // Give the reader a moment to block, then release.
        std::thread::sleep(std::time::Duration::from_millis(20));
        lock.write_unlock().unwrap();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_version_counters() {
        let version = GraphVersion::new();
        assert_eq!(version.snapshot(), (0, 0));
        version.bump_node();
        version.bump_edge();
        version.bump_edge();
        assert_eq!(version.snapshot(), (1, 2));
    }
}
