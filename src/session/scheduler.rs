//! Cancellable delayed actions
//!
//! Every task is tagged with the session generation it was scheduled in.
//! `teardown` bumps the generation, so anything still queued (or already
//! popped but not yet run) from an older session is dead.

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    id: u64,
    generation: u64,
}

impl TaskHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Task<A> {
    id: u64,
    generation: u64,
    due: f64,
    action: A,
}

/// An action popped from the queue, with the generation it belongs to
#[derive(Debug, Clone)]
pub struct DueTask<A> {
    pub generation: u64,
    pub action: A,
}

#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    tasks: Vec<Task<A>>,
    generation: u64,
    next_id: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            generation: 0,
            next_id: 1,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Queue `action` to run `delay` seconds after `now`
    pub fn schedule(&mut self, now: f64, delay: f64, action: A) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            generation: self.generation,
            due: now + delay.max(0.0),
            action,
        });
        TaskHandle {
            id,
            generation: self.generation,
        }
    }

    /// Drop a single task. Returns false if it already ran or was torn down.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != handle.id);
        before != self.tasks.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.id == handle.id)
    }

    /// Whether work tagged with `generation` may still run
    #[inline]
    pub fn is_live(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Invalidate every pending task and everything popped before this call
    pub fn teardown(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!("Cancelling {} pending task(s)", self.tasks.len());
        }
        self.tasks.clear();
        self.generation += 1;
    }

    /// Pop tasks due at `now`, earliest first (ties in scheduling order)
    pub fn take_due(&mut self, now: f64) -> Vec<DueTask<A>> {
        let mut due: Vec<Task<A>> = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].due <= now {
                due.push(self.tasks.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| {
            a.due
                .partial_cmp(&b.due)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        due.into_iter()
            .map(|t| DueTask {
                generation: t.generation,
                action: t.action,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_order() {
        let mut s = Scheduler::new();
        s.schedule(0.0, 2.0, "b");
        s.schedule(0.0, 1.0, "a");
        s.schedule(0.0, 5.0, "c");
        let due: Vec<_> = s.take_due(2.0).into_iter().map(|t| t.action).collect();
        assert_eq!(due, vec!["a", "b"]);
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let h = s.schedule(0.0, 1.0, 1);
        assert!(s.is_pending(h));
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(s.take_due(10.0).is_empty());
    }

    #[test]
    fn test_teardown_invalidates_popped() {
        let mut s = Scheduler::new();
        s.schedule(0.0, 1.0, "quit");
        s.schedule(0.0, 1.0, "recover");
        let due = s.take_due(1.0);
        assert_eq!(due.len(), 2);
        // first action tears the session down
        s.teardown();
        assert!(!s.is_live(due[1].generation));
        assert_eq!(s.pending(), 0);
    }
}
