/*!
# Instrumentation Pass

Rewrites a parsed program so that running it reports its own progress to a
tracker object reachable under a fixed global name.

## Overview

For every traceable statement (anything but a bare block or a bare
expression statement) the pass inserts, right before it:

```js
__debugTracker.trackLine(<line>, { a: typeof a !== "undefined" ? a : "undefined", ... });
```

listing every variable declared so far in traversal order. For every
declarator binding a plain identifier it inserts, right after the enclosing
statement:

```js
__debugTracker.trackVar("a", a, <line>);
```

The declared-variable set spans the whole program rather than one lexical
scope, so same-named variables in different functions share one entry.

## Architecture

- `Instrumenter`: the `VisitMut` pass doing the rewriting
- `DeclaredVariables`: ordered set of names seen so far in one traversal
- `LineFallback`: line reported for nodes without a source position
- `patterns`: statement shape predicates

## Example Usage

```rust,ignore
use codeflow_core::tracer::{Instrumenter, LineFallback};

let mut instrumenter = Instrumenter::new("__debugTracker", source_map, LineFallback::Zero);
program.visit_mut_with(&mut instrumenter);
println!("{:?}", instrumenter.stats());
```
*/

use indexmap::IndexSet;

pub mod instrument;
pub mod patterns;

// Re-export main types
pub use instrument::{instrument_program, Instrumenter};
pub use patterns::{is_traceable, simple_binding_name};

/// Line reported for a node whose source position is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFallback {
    /// Always report line 0
    #[default]
    Zero,
    /// Report a counter that starts at 1 and grows on every use
    Counter,
}

/// Ordered set of variable names declared so far in one traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredVariables {
    names: IndexSet<String>,
}

impl DeclaredVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name; returns false if it was already present
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

/// Counters collected while instrumenting one program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentStats {
    /// `trackLine` calls inserted
    pub line_calls: usize,
    /// `trackVar` calls inserted
    pub var_calls: usize,
    /// Declarators recorded without a `trackVar` call (loop heads)
    pub detached_declarators: usize,
    /// Declarators with destructuring targets, left untouched
    pub skipped_patterns: usize,
    /// Size of the declared-variable set at the end of the traversal
    pub declared: usize,
}

impl InstrumentStats {
    pub fn inserted(&self) -> usize {
        self.line_calls + self.var_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_variables_keep_first_insertion_order() {
        let mut declared = DeclaredVariables::new();
        assert!(declared.insert("b"));
        assert!(declared.insert("a"));
        assert!(!declared.insert("b"));
        assert_eq!(declared.iter().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(declared.len(), 2);

        declared.clear();
        assert!(declared.is_empty());
        assert!(!declared.contains("a"));
    }
}
