//! Scope frames for the interpreter.
//!
//! Frames live in one arena and refer to their parent by index. A value
//! that must keep a frame alive past its block (a function, a class or an
//! instance) holds an `EnvGuard` for it. Guards are reference counted and
//! chain to the guard of the parent frame, so holding one keeps the whole
//! ancestry in place.
//!
//! A released frame whose guard is still held is retained. Retained frames
//! are swept in batches: a frame survives if something other than retained
//! frames refers to it, or if a surviving frame does. Closures stored in
//! the frame they close over form cycles that plain counting never frees;
//! the sweep does.

use rustc_hash::{FxHashMap, FxHashSet};

use std::rc::{Rc, Weak};

use crate::interpreter::Value;

/// Retained frames allowed before the first sweep.
const SWEEP_THRESHOLD: usize = 64;

/// Stable handle to a frame in `Environments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

/// Shared hold on a frame and, through `parent`, on its ancestors.
#[derive(Debug)]
pub struct EnvGuard {
    id: EnvId,
    /// Held only to keep the parent frame pinned.
    _parent: Option<Rc<EnvGuard>>,
}

impl EnvGuard {
    pub fn id(&self) -> EnvId {
        self.id
    }
}

#[derive(Debug, Default)]
struct Frame {
    bindings: FxHashMap<String, Value>,
    parent: Option<EnvId>,
    /// Target of `return` for everything evaluated beneath it.
    function_boundary: bool,
    return_value: Option<Value>,
    pin: Weak<EnvGuard>,
    /// The block or call that pushed this frame has finished with it.
    released: bool,
}

impl Frame {
    fn pinned(&self) -> bool {
        self.pin.strong_count() > 0
    }

    fn values(&self) -> impl Iterator<Item = &Value> {
        self.bindings.values().chain(self.return_value.iter())
    }
}

#[derive(Debug)]
pub struct Environments {
    frames: Vec<Frame>,
    free: Vec<usize>,
    /// Released frames still held by a guard.
    retained: usize,
    sweep_at: usize,
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}

impl Environments {
    /// Creates the arena with the global frame, which has no parent.
    pub fn new() -> Self {
        Environments {
            frames: vec![Frame::default()],
            free: vec![],
            retained: 0,
            sweep_at: SWEEP_THRESHOLD,
        }
    }

    pub fn global(&self) -> EnvId {
        EnvId(0)
    }

    pub fn push(&mut self, parent: EnvId, function_boundary: bool) -> EnvId {
        let frame = Frame {
            parent: Some(parent),
            function_boundary,
            ..Default::default()
        };
        let id = match self.free.pop() {
            Some(index) => {
                self.frames[index] = frame;
                index
            }
            None => {
                self.frames.push(frame);
                self.frames.len() - 1
            }
        };
        tracing::trace!(frame = id, parent = parent.0, function_boundary, "push frame");
        EnvId(id)
    }

    /// Called when the block or call that pushed `id` is done with it. The
    /// slot is recycled at once unless a guard still holds it.
    pub fn release(&mut self, id: EnvId) {
        if id == self.global() {
            return;
        }
        let frame = &mut self.frames[id.0];
        if !frame.pinned() {
            self.free_frames(&[id.0]);
            return;
        }
        frame.released = true;
        self.retained += 1;
        if self.retained >= self.sweep_at {
            self.sweep();
        }
    }

    /// A guard on `id`, shared with any guard already handed out for it.
    pub fn capture(&mut self, id: EnvId) -> Rc<EnvGuard> {
        if let Some(guard) = self.frames[id.0].pin.upgrade() {
            return guard;
        }
        let parent = self.frames[id.0].parent;
        let parent = parent.map(|parent| self.capture(parent));
        let guard = Rc::new(EnvGuard {
            id,
            _parent: parent,
        });
        self.frames[id.0].pin = Rc::downgrade(&guard);
        guard
    }

    /// Frees every retained frame that only other retained frames refer to.
    pub fn sweep(&mut self) {
        let retained: Vec<usize> = (0..self.frames.len())
            .filter(|&index| self.frames[index].released)
            .collect();

        // References to each retained frame's guard that come from inside
        // the retained set: stored values and child guards.
        let mut internal: FxHashMap<usize, usize> = FxHashMap::default();
        for &index in &retained {
            let frame = &self.frames[index];
            for value in frame.values() {
                if let Some(guard) = value.guard() {
                    *internal.entry(guard.id.0).or_default() += 1;
                }
            }
            if let Some(parent) = frame.parent.filter(|_| frame.pinned()) {
                *internal.entry(parent.0).or_default() += 1;
            }
        }

        let mut live = FxHashSet::default();
        let mut work: Vec<usize> = retained
            .iter()
            .copied()
            .filter(|&index| {
                let held = self.frames[index].pin.strong_count();
                held > internal.get(&index).copied().unwrap_or(0)
            })
            .collect();
        // parents of frames still in use stay too
        work.extend(
            self.frames
                .iter()
                .filter(|frame| !frame.released)
                .filter_map(|frame| frame.parent.map(|parent| parent.0)),
        );
        while let Some(index) = work.pop() {
            let frame = &self.frames[index];
            if !frame.released || !live.insert(index) {
                continue;
            }
            work.extend(frame.values().filter_map(|v| v.guard().map(|g| g.id.0)));
            work.extend(frame.parent.map(|parent| parent.0));
        }

        let garbage: Vec<usize> = retained
            .into_iter()
            .filter(|index| !live.contains(index))
            .collect();
        tracing::debug!(
            retained = self.retained,
            freed = garbage.len(),
            "sweep frames"
        );
        self.free_frames(&garbage);
        self.sweep_at = SWEEP_THRESHOLD.max(self.retained * 2);
    }

    /// Empties the slots before dropping their contents, so nothing dropped
    /// can observe a half-freed frame.
    fn free_frames(&mut self, indices: &[usize]) {
        let mut dropped = Vec::with_capacity(indices.len());
        for &index in indices {
            tracing::trace!(frame = index, "free frame");
            let frame = std::mem::take(&mut self.frames[index]);
            if frame.released {
                self.retained -= 1;
            }
            self.free.push(index);
            dropped.push(frame);
        }
        drop(dropped);
    }

    /// Inserts or overwrites a binding in `id` itself.
    pub fn define(&mut self, id: EnvId, name: impl Into<String>, value: Value) {
        self.frames[id.0].bindings.insert(name.into(), value);
    }

    /// Searches `id`, then its ancestors.
    pub fn get(&self, id: EnvId, name: &str) -> Option<&Value> {
        let mut next = Some(id);
        while let Some(current) = next {
            let frame = &self.frames[current.0];
            if let Some(value) = frame.bindings.get(name) {
                return Some(value);
            }
            next = frame.parent;
        }
        None
    }

    pub fn get_local(&self, id: EnvId, name: &str) -> Option<&Value> {
        self.frames[id.0].bindings.get(name)
    }

    /// Overwrites the nearest binding of `name`. Returns false if no frame
    /// in the chain binds it.
    pub fn assign(&mut self, id: EnvId, name: &str, value: Value) -> bool {
        let mut next = Some(id);
        while let Some(current) = next {
            let frame = &mut self.frames[current.0];
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            next = frame.parent;
        }
        false
    }

    /// The nearest function boundary at or above `id`, or the root of the
    /// chain when there is none.
    fn boundary(&self, id: EnvId) -> EnvId {
        let mut current = id;
        loop {
            let frame = &self.frames[current.0];
            match frame.parent {
                _ if frame.function_boundary => return current,
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    pub fn set_return(&mut self, id: EnvId, value: Value) {
        let boundary = self.boundary(id);
        self.frames[boundary.0].return_value = Some(value);
    }

    pub fn return_pending(&self, id: EnvId) -> bool {
        self.frames[self.boundary(id).0].return_value.is_some()
    }

    /// Clears and yields the value stored on `id` itself.
    pub fn take_return(&mut self, id: EnvId) -> Option<Value> {
        self.frames[id.0].return_value.take()
    }

    /// Number of frames currently in use.
    pub fn live_frames(&self) -> usize {
        self.frames.len() - self.free.len()
    }
}
