//! In-memory address backend.
//!
//! Keeps its own entry stack so `go` works without any host address
//! mechanism. Used in non-interactive hosts and tests.

use std::sync::Mutex;

use crate::history::backend::AddressBackend;

#[derive(Debug)]
struct Stack {
    entries: Vec<String>,
    /// Index of the current entry; -1 before the first navigation.
    index: isize,
}

impl Default for Stack {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: -1,
        }
    }
}

/// Address backend with no external representation.
#[derive(Debug, Default)]
pub struct MemoryAddress {
    stack: Mutex<Stack>,
}

impl MemoryAddress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddressBackend for MemoryAddress {
    fn location(&self) -> String {
        let stack = self.stack.lock().unwrap_or_else(|e| e.into_inner());
        usize::try_from(stack.index)
            .ok()
            .and_then(|i| stack.entries.get(i).cloned())
            .unwrap_or_else(|| "/".to_string())
    }

    fn push_address(&self, full_path: &str) {
        let mut stack = self.stack.lock().unwrap_or_else(|e| e.into_inner());
        let keep = (stack.index + 1) as usize;
        stack.entries.truncate(keep);
        stack.entries.push(full_path.to_string());
        stack.index += 1;
    }

    fn replace_address(&self, full_path: &str) {
        let mut stack = self.stack.lock().unwrap_or_else(|e| e.into_inner());
        let keep = stack.index.max(0) as usize;
        stack.entries.truncate(keep);
        stack.entries.push(full_path.to_string());
        stack.index = keep as isize;
    }

    fn go(&self, delta: i32) -> Option<String> {
        let mut stack = self.stack.lock().unwrap_or_else(|e| e.into_inner());
        let target = stack.index + delta as isize;
        if target < 0 || target >= stack.entries.len() as isize {
            return None;
        }
        stack.index = target;
        Some(stack.entries[target as usize].clone())
    }

    fn make_href(&self, full_path: &str) -> String {
        full_path.to_string()
    }
}
