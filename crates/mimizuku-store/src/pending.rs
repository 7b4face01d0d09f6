//! 未処理事実キュー

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

/// Which pending set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Queue {
    Subsumption,
    Role,
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Queue::Subsumption => write!(f, "subsumption"),
            Queue::Role => write!(f, "role"),
        }
    }
}

/// FIFO work list with set semantics: a fact is queued at most once at a time
#[derive(Debug, Clone)]
pub struct PendingQueue<T> {
    order: VecDeque<T>,
    members: HashSet<T>,
}

impl<T: Copy + Eq + Hash> PendingQueue<T> {
    pub fn new() -> Self {
        Self { order: VecDeque::new(), members: HashSet::new() }
    }

    /// Queue `item`; false if it is already pending
    pub fn push(&mut self, item: T) -> bool {
        if !self.members.insert(item) {
            return false;
        }
        self.order.push_back(item);
        true
    }

    pub fn pop(&mut self) -> Option<T> {
        let item = self.order.pop_front()?;
        self.members.remove(&item);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T: Copy + Eq + Hash> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
