//! Runtime enforcement of the prescribed tool invocation order.
//!
//! The email agent's instructions mandate check-calendar →
//! search-person → write-email. Instructions alone cannot stop a model
//! from calling out of sequence, so the engine consults this guard
//! before executing each requested tool and fails the turn on a
//! violation instead of running the wrong tool.

use crate::error::AgentError;

#[derive(Debug, Clone)]
pub struct ToolOrderGuard {
    order: Vec<String>,
    next: usize,
}

impl ToolOrderGuard {
    pub fn new(order: Vec<String>) -> Self {
        Self { order, next: 0 }
    }

    /// Checks that `name` is the next expected tool and advances.
    pub fn check(&mut self, name: &str) -> Result<(), AgentError> {
        match self.order.get(self.next) {
            Some(expected) if expected == name => {
                self.next += 1;
                Ok(())
            }
            Some(expected) => Err(AgentError::ToolOrder(format!(
                "expected '{expected}' next, model called '{name}'"
            ))),
            None => Err(AgentError::ToolOrder(format!(
                "palette exhausted, model called '{name}'"
            ))),
        }
    }
}
