//! Thread-safe queue for operations submitted through shared references.
//!
//! [`OperationQueue`] uses interior mutability so that code holding only
//! `&self` (property-grid rows, viewport tools, background loaders) can still
//! request a mutation. The owner of the [`OperationHistory`] drains the queue
//! on the mutation thread and executes the operations in submission order.
//!
//! [`OperationHistory`]: super::OperationHistory

use std::fmt;

use parking_lot::Mutex;

use super::operation::{Editable, Operation};

/// A queue of pending [`Operation`]s.
///
/// ```ignore
/// queue.push(Box::new(SetPropertyOperation::new(id, key, value)));
/// for op in queue.drain() {
///     history.execute(op, &mut model)?;
/// }
/// ```
pub struct OperationQueue<T: Editable> {
    queue: Mutex<Vec<Box<dyn Operation<T>>>>,
}

impl<T: Editable> OperationQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues an operation.
    pub fn push(&self, op: Box<dyn Operation<T>>) {
        self.queue.lock().push(op);
    }

    /// Drains all queued operations in submission order.
    pub fn drain(&self) -> Vec<Box<dyn Operation<T>>> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T: Editable> Default for OperationQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Editable> fmt::Debug for OperationQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationQueue")
            .field("pending", &self.len())
            .finish()
    }
}
