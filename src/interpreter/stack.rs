use std::fmt::Display;

use super::Value;

/// The evaluation stack shared by every frame of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    storage: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            storage: Vec::new(),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.storage.push(value);
    }

    /// Pops the top `count` values, oldest first, or nothing if fewer are present.
    pub fn pop_many(&mut self, count: usize) -> Option<Vec<Value>> {
        let start = self.storage.len().checked_sub(count)?;
        Some(self.storage.split_off(start))
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.storage
    }
}

impl From<Vec<Value>> for Stack {
    fn from(storage: Vec<Value>) -> Self {
        Stack { storage }
    }
}

impl Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, value) in self.storage.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[ {} ]", value)?;
        }
        Ok(())
    }
}
