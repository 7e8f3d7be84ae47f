//! The process-wide codec lock.
//!
//! Every sequence that touches a [`crate::CommandPort`] runs under one
//! reentrant lock shared by all codec instances and all driver roles. The
//! transport is not safe for concurrent register-level access, so independent
//! codecs are serialised against each other too.
//!
//! Reentrancy is required: profile resolution reads the layout id under the
//! lock and is itself called from already-locked attach paths, and command
//! execution runs inside the locked transition handler.

use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Guard returned by [`CodecLock::lock`]. Releases on drop.
pub type CodecLockGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Cloneable handle to the shared reentrant codec lock.
///
/// Constructed once at module load and passed by handle into every component
/// that touches hardware.
#[derive(Clone)]
pub struct CodecLock {
    inner: Arc<ReentrantMutex<()>>,
}

impl CodecLock {
    /// Allocate a new, unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Acquire the lock, blocking while another thread holds it.
    ///
    /// The calling thread may already hold it.
    pub fn lock(&self) -> CodecLockGuard<'_> {
        self.inner.lock()
    }

    /// Acquire the lock without blocking.
    pub fn try_lock(&self) -> Option<CodecLockGuard<'_>> {
        self.inner.try_lock()
    }

    /// Returns `true` if any thread currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Returns `true` if `self` and `other` are handles to the same lock.
    #[must_use]
    pub fn same_lock(&self, other: &CodecLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for CodecLock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CodecLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodecLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}
