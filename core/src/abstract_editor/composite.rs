//! Ordered groups of operations applied and undone as one transaction.

use std::fmt;

use super::operation::{Editable, Operation, OperationResult};

/// An ordered sequence of operations that behaves as a single operation.
///
/// Children are applied front to back and undone back to front. If a child
/// fails, the children already processed in this pass are reverted before
/// the error is returned, so the target is never left half-mutated.
pub struct CompositeOperation<T: Editable> {
    description: String,
    children: Vec<Box<dyn Operation<T>>>,
}

impl<T: Editable> CompositeOperation<T> {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, op: impl Operation<T> + 'static) -> Self {
        self.push(Box::new(op));
        self
    }

    pub fn push(&mut self, op: Box<dyn Operation<T>>) {
        self.children.push(op);
    }

    /// Appends every child of `other`, keeping their order.
    pub fn extend(&mut self, other: CompositeOperation<T>) {
        self.children.extend(other.children);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Descriptions of the children in application order.
    pub fn child_descriptions(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.description())
    }
}

impl<T: Editable> fmt::Debug for CompositeOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeOperation")
            .field("description", &self.description)
            .field("children", &self.children)
            .finish()
    }
}

impl<T: Editable> Operation<T> for CompositeOperation<T> {
    fn apply(&mut self, target: &mut T) -> OperationResult {
        for i in 0..self.children.len() {
            if let Err(err) = self.children[i].apply(target) {
                for done in self.children[..i].iter_mut().rev() {
                    if let Err(rollback) = done.undo(target) {
                        log::error!(
                            "rollback of '{}' failed while aborting '{}': {rollback}",
                            done.description(),
                            self.description
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut T) -> OperationResult {
        let len = self.children.len();
        for i in (0..len).rev() {
            if let Err(err) = self.children[i].undo(target) {
                for undone in self.children[i + 1..].iter_mut() {
                    if let Err(reapply) = undone.apply(target) {
                        log::error!(
                            "re-apply of '{}' failed while aborting undo of '{}': {reapply}",
                            undone.description(),
                            self.description
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn record(&self) -> T::Record {
        T::batch_record(
            &self.description,
            self.children.iter().map(|c| c.record()).collect(),
        )
    }

    fn is_recorded(&self) -> bool {
        self.children.iter().any(|c| c.is_recorded())
    }

    fn modifies_content(&self) -> bool {
        self.children.iter().any(|c| c.modifies_content())
    }
}
