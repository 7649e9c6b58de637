use crate::value::Value;
use log::debug;
use std::collections::HashMap;

/// Stack of name → value frames.  The bottom frame is the global scope and
/// is never popped.
///
/// Function calls push onto the same stack that the caller is using, so a
/// function body can see the locals of whoever called it (dynamic scoping).
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<HashMap<String, Value>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());

        debug!("Pushed scope frame, depth={}", self.frames.len());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }

        debug!("Popped scope frame, depth={}", self.frames.len());
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Innermost binding of `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains_key(name))
    }

    /// Bind `name` in the innermost frame, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    /// Overwrite the nearest existing binding of `name`; create it in the
    /// innermost frame when no frame has it.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self
            .frames
            .iter_mut()
            .rev()
            .find(|frame| frame.contains_key(name))
        {
            Some(frame) => {
                frame.insert(name.to_string(), value);
            }
            None => self.define(name, value),
        }
    }

    /// Truncate back to `depth` frames, used to unwind after a non-local exit.
    pub fn restore(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_frame_survives_extra_pops() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));

        env.pop();
        env.pop();

        assert_eq!(env.depth(), 1);
        assert_eq!(env.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assignment_updates_nearest_binding() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));

        env.push();
        env.assign("x", Value::Int(2));
        env.assign("y", Value::Int(3));
        env.pop();

        assert_eq!(env.get("x"), Some(Value::Int(2)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn define_shadows_outer_frame() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));

        env.push();
        env.define("x", Value::Int(10));
        assert_eq!(env.get("x"), Some(Value::Int(10)));

        env.pop();
        assert_eq!(env.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn restore_truncates_to_depth() {
        let mut env = Environment::new();
        env.push();
        env.push();
        env.define("inner", Value::Bool(true));

        env.restore(2);

        assert_eq!(env.depth(), 2);
        assert!(!env.contains("inner"));
    }
}
