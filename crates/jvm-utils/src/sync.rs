//! Basic synchronization primitives.
//!
//! This module provides a unified interface for synchronization primitives
//! that works across both single-threaded and multi-threaded configurations.
//! The class model depends on this without caring which one is selected.
#[cfg(not(feature = "multithreading"))]
pub mod compat {
    use std::cell::{Ref, RefCell, RefMut};
    use std::ops::{Deref, DerefMut};

    #[derive(Debug, Default)]
    pub struct Mutex<T>(RefCell<T>);
    impl<T> Mutex<T> {
        pub const fn new(t: T) -> Self {
            Self(RefCell::new(t))
        }
        pub fn lock(&self) -> MutexGuard<'_, T> {
            MutexGuard(self.0.borrow_mut())
        }
        pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
            self.0.try_borrow_mut().ok().map(MutexGuard)
        }
    }

    pub struct MutexGuard<'a, T>(RefMut<'a, T>);
    impl<T> Deref for MutexGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.0
        }
    }
    impl<T> DerefMut for MutexGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.0
        }
    }

    #[derive(Debug, Default)]
    pub struct RwLock<T>(RefCell<T>);
    impl<T> RwLock<T> {
        pub const fn new(t: T) -> Self {
            Self(RefCell::new(t))
        }
        pub fn read(&self) -> RwLockReadGuard<'_, T> {
            RwLockReadGuard(self.0.borrow())
        }
        pub fn write(&self) -> RwLockWriteGuard<'_, T> {
            RwLockWriteGuard(self.0.borrow_mut())
        }
    }

    // SAFETY: In single-threaded mode, we can safely share across "threads"
    // because there is only one.
    unsafe impl<T> Sync for Mutex<T> {}
    unsafe impl<T> Send for Mutex<T> {}
    unsafe impl<T> Sync for RwLock<T> {}
    unsafe impl<T> Send for RwLock<T> {}

    pub struct RwLockReadGuard<'a, T>(Ref<'a, T>);
    impl<T> Deref for RwLockReadGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.0
        }
    }

    pub struct RwLockWriteGuard<'a, T>(RefMut<'a, T>);
    impl<T> Deref for RwLockWriteGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            &self.0
        }
    }
    impl<T> DerefMut for RwLockWriteGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            &mut self.0
        }
    }
}

pub use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, AtomicU64, AtomicUsize, Ordering},
};

#[cfg(feature = "multithreading")]
pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(not(feature = "multithreading"))]
pub use compat::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutex_round_trip() {
        let m = Mutex::new(1u32);
        {
            let mut g = m.lock();
            *g += 1;
        }
        assert_eq!(*m.lock(), 2);
    }

    #[test]
    fn test_rwlock_read_after_write() {
        let l = RwLock::new(vec![1, 2]);
        l.write().push(3);
        assert_eq!(l.read().len(), 3);
    }
}
