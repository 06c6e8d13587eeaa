use crate::value::Map;
use crate::Value;

/// The variable scopes, innermost last.
///
/// The globals are always at the bottom, every loop iteration pushes a scope
/// with its bound variables.
#[cfg_attr(test, derive(Debug))]
pub struct Stack {
    scopes: Vec<Map<String, Value>>,
}

impl Stack {
    pub fn new(globals: Map<String, Value>) -> Self {
        Self {
            scopes: vec![globals],
        }
    }

    /// Looks up a variable, starting with the innermost scope.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Assigns a variable in the innermost scope that defines it, otherwise
    /// in the innermost scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        if let Some(v) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            *v = value;
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), value);
        }
    }

    pub fn push_scope(&mut self, scope: Map<String, Value>) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, i64)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), Value::Integer(*v)))
            .collect()
    }

    #[test]
    fn stack_lookup_innermost_first() {
        let mut stack = Stack::new(scope(&[("x", 1), ("y", 2)]));
        stack.push_scope(scope(&[("x", 3)]));
        assert_eq!(stack.lookup("x"), Some(&Value::Integer(3)));
        assert_eq!(stack.lookup("y"), Some(&Value::Integer(2)));
        stack.pop_scope();
        assert_eq!(stack.lookup("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn stack_assign_updates_defining_scope() {
        let mut stack = Stack::new(scope(&[("total", 0)]));
        stack.push_scope(scope(&[("item", 5)]));
        stack.assign("total", Value::Integer(5));
        stack.assign("tmp", Value::Integer(7));
        stack.pop_scope();
        assert_eq!(stack.lookup("total"), Some(&Value::Integer(5)));
        assert_eq!(stack.lookup("tmp"), None);
    }
}
