//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Base-port allocation for concurrent sessions.
//!
//! A coordinating server that traces several applications at once needs a
//! distinct base port per session, spaced so the derived `P`, `P+1`, `P+2`
//! triples never overlap. [`PortPool`] hands out base ports from a stepped
//! range and takes them back when a session ends.

use parking_lot::Mutex;

/// A pool of base ports stepped across a range.
///
/// Ports run from `start` inclusive to `end` exclusive in increments of
/// `step`. With the usual three-service layout a step of at least 3 keeps
/// sessions from colliding.
///
/// # Examples
///
/// ```rust
/// use tracelink::ports::PortPool;
///
/// let pool = PortPool::new(6120, 10, 6160);
/// assert_eq!(pool.slots(), 4);
///
/// let base = pool.acquire().unwrap();
/// assert_eq!(base, 6120);
/// pool.release(base);
/// ```
pub struct PortPool {
    start: u16,
    step: u16,
    end: u16,
    used: Mutex<Vec<bool>>,
}

impl PortPool {
    /// Creates a pool over `[start, end)` stepped by `step`.
    ///
    /// # Panics
    ///
    /// Panics if `step` is zero or the range is empty.
    pub fn new(start: u16, step: u16, end: u16) -> Self {
        assert!(step > 0, "port step must be greater than zero");
        assert!(end > start, "port range must not be empty");
        let slots = ((end - start) as usize).div_ceil(step as usize);
        Self {
            start,
            step,
            end,
            used: Mutex::new(vec![false; slots]),
        }
    }

    /// Returns the number of ports in the pool.
    pub fn slots(&self) -> usize {
        self.used.lock().len()
    }

    /// Returns the number of ports currently handed out.
    pub fn in_use(&self) -> usize {
        self.used.lock().iter().filter(|used| **used).count()
    }

    /// Takes the lowest free port, or `None` when the pool is exhausted.
    pub fn acquire(&self) -> Option<u16> {
        let mut used = self.used.lock();
        let index = used.iter().position(|used| !used)?;
        used[index] = true;
        Some(self.start + self.step * index as u16)
    }

    /// Marks a specific port as in use.
    ///
    /// Returns `false` if the port lies outside the pool, is off-step, or
    /// is already taken.
    pub fn reserve(&self, port: u16) -> bool {
        let Some(index) = self.index_of(port) else {
            return false;
        };
        let mut used = self.used.lock();
        if used[index] {
            return false;
        }
        used[index] = true;
        true
    }

    /// Returns a port to the pool.
    ///
    /// Returns `false` if the port lies outside the pool or was not in use.
    pub fn release(&self, port: u16) -> bool {
        let Some(index) = self.index_of(port) else {
            return false;
        };
        let mut used = self.used.lock();
        if !used[index] {
            return false;
        }
        used[index] = false;
        true
    }

    fn index_of(&self, port: u16) -> Option<usize> {
        if port < self.start || port >= self.end {
            return None;
        }
        let offset = port - self.start;
        if offset % self.step != 0 {
            return None;
        }
        Some((offset / self.step) as usize)
    }
}

impl std::fmt::Debug for PortPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortPool")
            .field("start", &self.start)
            .field("step", &self.step)
            .field("end", &self.end)
            .field("in_use", &self.in_use())
            .finish()
    }
}
