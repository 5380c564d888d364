//! Copy-on-write edit helpers and snapshot history.
//!
//! Every structural edit in the model is expressed through the helpers in
//! this module: they take a borrowed collection, never touch it, and return
//! a rebuilt one. Because the input is only borrowed, a failed edit leaves
//! the caller holding the original value.

use std::collections::VecDeque;
use std::sync::Arc;

use reelkit_core::{ValidationError, ValidationResult};
use uuid::Uuid;

use crate::project::Project;

/// An entity addressable by its identity within a collection.
pub trait Identified {
    /// Unique id of this entity.
    fn id(&self) -> Uuid;

    /// Entity name used in validation messages.
    const KIND: &'static str;
}

/// Append `item`, rejecting an id already present in `items`.
pub(crate) fn append_unique<T: Identified + Clone>(items: &[T], item: T) -> ValidationResult<Vec<T>> {
    if items.iter().any(|existing| existing.id() == item.id()) {
        return Err(ValidationError::new(format!(
            "{} {} is already present",
            T::KIND,
            item.id()
        )));
    }
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend_from_slice(items);
    out.push(item);
    Ok(out)
}

/// Copy of `items` without the entry matching `id`. `None` when absent.
pub(crate) fn remove_by_id<T: Identified + Clone>(items: &[T], id: Uuid) -> Option<Vec<T>> {
    let index = items.iter().position(|item| item.id() == id)?;
    let mut out = items.to_vec();
    out.remove(index);
    Some(out)
}

/// Copy of `items` with the entry matching `id` replaced by `transform(entry)`.
///
/// Returns `Ok(None)` when no entry matches. The transform must keep the
/// entity's identity.
pub(crate) fn update_by_id<T, F>(items: &[T], id: Uuid, transform: F) -> ValidationResult<Option<Vec<T>>>
where
    T: Identified + Clone,
    F: FnOnce(T) -> ValidationResult<T>,
{
    let Some(index) = items.iter().position(|item| item.id() == id) else {
        return Ok(None);
    };
    let updated = transform(items[index].clone())?;
    if updated.id() != id {
        return Err(ValidationError::new(format!(
            "{} update changed id {} to {}",
            T::KIND,
            id,
            updated.id()
        )));
    }
    let mut out = items.to_vec();
    out[index] = updated;
    Ok(Some(out))
}

// ── Snapshot history ────────────────────────────────────────────

/// Bounded undo/redo history over project snapshots.
///
/// Snapshots are shared via `Arc`, so readers holding an older snapshot
/// keep it alive independently of the history.
#[derive(Debug, Clone)]
pub struct History {
    current: Arc<Project>,
    undo_stack: VecDeque<Arc<Project>>,
    redo_stack: Vec<Arc<Project>>,
    max_depth: usize,
}

impl History {
    /// Start a history at `initial`, keeping at most `max_depth` undo steps.
    pub fn new(initial: Project, max_depth: usize) -> Self {
        Self {
            current: Arc::new(initial),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// The latest snapshot.
    pub fn current(&self) -> Arc<Project> {
        Arc::clone(&self.current)
    }

    /// Make `next` current. Clears the redo branch.
    pub fn commit(&mut self, next: Project) {
        let previous = std::mem::replace(&mut self.current, Arc::new(next));
        self.undo_stack.push_back(previous);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Apply a fallible edit to the current snapshot and commit the result.
    ///
    /// On error nothing is committed.
    pub fn apply<F>(&mut self, edit: F) -> ValidationResult<Arc<Project>>
    where
        F: FnOnce(&Project) -> ValidationResult<Project>,
    {
        let next = edit(&self.current)?;
        self.commit(next);
        Ok(self.current())
    }

    /// Step back one snapshot. Returns the new current snapshot.
    pub fn undo(&mut self) -> Option<Arc<Project>> {
        let previous = self.undo_stack.pop_back()?;
        let current = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(current);
        Some(self.current())
    }

    /// Re-apply the last undone snapshot.
    pub fn redo(&mut self) -> Option<Arc<Project>> {
        let next = self.redo_stack.pop()?;
        let current = std::mem::replace(&mut self.current, next);
        self.undo_stack.push_back(current);
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drop all undo/redo state, keeping the current snapshot.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
