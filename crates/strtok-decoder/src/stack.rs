use std::collections::BTreeMap;

use strtok_types::Value;

use crate::config::DEFAULT_PREALLOC_LIMIT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Map,
}

impl ContainerKind {
    /// Values a container of `len` entries collects: maps take a key and
    /// a value per entry. Never overflows, even for a `map32` of
    /// `u32::MAX` pairs.
    #[must_use]
    pub fn expected(self, len: u32) -> u64 {
        match self {
            Self::Array => u64::from(len),
            Self::Map => u64::from(len) * 2,
        }
    }
}

#[derive(Debug)]
struct Frame {
    kind: ContainerKind,
    remaining: u64,
    collected: Vec<Value>,
}

impl Frame {
    fn finish(self) -> Value {
        match self.kind {
            ContainerKind::Array => Value::Array(self.collected),
            ContainerKind::Map => {
                let mut map = BTreeMap::new();
                let mut values = self.collected.into_iter();
                while let (Some(k), Some(v)) = (values.next(), values.next()) {
                    // Later duplicates replace earlier ones
                    map.insert(k, v);
                }
                Value::Map(map)
            }
        }
    }
}

/// Explicit stack of partially built containers.
///
/// Nesting is tracked here instead of on the call stack, so depth costs
/// heap memory only. The top frame is the innermost open container.
///
/// ```text
///   [1, [2, {"a": ▌
///
///   frames:  Array  expected 2  collected [1]
///            Array  expected 2  collected [2]
///            Map    expected 2  collected ["a"]      ← top
/// ```
///
/// A frame is popped the moment its last value arrives and the finished
/// container is pushed into its parent, which may complete in turn. A
/// value that completes with no parent frame is a top-level value and is
/// handed back to the caller.
#[derive(Debug)]
pub struct ValueStack {
    frames: Vec<Frame>,
    prealloc_limit: usize,
}

impl Default for ValueStack {
    fn default() -> Self {
        Self::new(DEFAULT_PREALLOC_LIMIT)
    }
}

impl ValueStack {
    /// Create an empty stack. Each container reserves at most
    /// `prealloc_limit` slots before its values arrive.
    #[must_use]
    pub fn new(prealloc_limit: usize) -> Self {
        Self {
            frames: Vec::new(),
            prealloc_limit,
        }
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Open a container of `len` entries.
    ///
    /// An empty container is complete immediately and is pushed as a value
    /// instead of being stacked.
    ///
    /// # Returns
    ///
    /// A completed top-level value, if opening an empty container finished
    /// one.
    pub fn open(&mut self, kind: ContainerKind, len: u32) -> Option<Value> {
        let expected = kind.expected(len);
        if expected == 0 {
            let empty = match kind {
                ContainerKind::Array => Value::Array(Vec::new()),
                ContainerKind::Map => Value::Map(BTreeMap::new()),
            };
            return self.push(empty);
        }
        let reserve = usize::try_from(expected)
            .map_or(self.prealloc_limit, |n| n.min(self.prealloc_limit));
        self.frames.push(Frame {
            kind,
            remaining: expected,
            collected: Vec::with_capacity(reserve),
        });
        None
    }

    /// Add a complete value to the innermost container.
    ///
    /// # Returns
    ///
    /// The finished top-level value, if this push completed one.
    pub fn push(&mut self, mut value: Value) -> Option<Value> {
        loop {
            let Some(top) = self.frames.last_mut() else {
                return Some(value);
            };
            top.collected.push(value);
            top.remaining -= 1;
            if top.remaining > 0 {
                return None;
            }
            let frame = self.frames.pop()?;
            value = frame.finish();
        }
    }

    /// Drop every open container.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Value {
        Value::Integer(v)
    }

    #[test]
    fn scalar_with_no_frame_is_top_level() {
        let mut stack = ValueStack::default();
        assert_eq!(stack.push(int(5)), Some(int(5)));
        assert!(stack.is_empty());
    }

    #[test]
    fn empty_containers_complete_immediately() {
        let mut stack = ValueStack::default();
        assert_eq!(stack.open(ContainerKind::Array, 0), Some(Value::array([])));
        assert_eq!(
            stack.open(ContainerKind::Map, 0),
            Some(Value::Map(BTreeMap::new()))
        );
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn empty_container_inside_parent() {
        let mut stack = ValueStack::default();
        assert_eq!(stack.open(ContainerKind::Array, 2), None);
        assert_eq!(stack.open(ContainerKind::Array, 0), None);
        assert_eq!(stack.depth(), 1);
        assert_eq!(
            stack.push(int(1)),
            Some(Value::array([Value::array([]), int(1)]))
        );
    }

    #[test]
    fn nested_completion_cascades() {
        // [1, [2, 3]]
        let mut stack = ValueStack::default();
        stack.open(ContainerKind::Array, 2);
        assert_eq!(stack.push(int(1)), None);
        stack.open(ContainerKind::Array, 2);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.push(int(2)), None);
        assert_eq!(
            stack.push(int(3)),
            Some(Value::array([int(1), Value::array([int(2), int(3)])]))
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn map_collects_pairs() {
        let mut stack = ValueStack::default();
        stack.open(ContainerKind::Map, 2);
        for v in [Value::from("a"), int(1), Value::from("b")] {
            assert_eq!(stack.push(v), None);
        }
        assert_eq!(
            stack.push(int(2)),
            Some(Value::map([("a", 1), ("b", 2)]))
        );
    }

    #[test]
    fn duplicate_map_key_keeps_last() {
        let mut stack = ValueStack::default();
        stack.open(ContainerKind::Map, 2);
        stack.push(Value::from("k"));
        stack.push(int(1));
        stack.push(Value::from("k"));
        assert_eq!(stack.push(int(2)), Some(Value::map([("k", 2)])));
    }

    #[test]
    fn huge_declared_length_is_not_preallocated() {
        let mut stack = ValueStack::new(8);
        stack.open(ContainerKind::Array, u32::MAX);
        assert!(stack.frames[0].collected.capacity() < 1024);
        assert_eq!(stack.frames[0].remaining, u64::from(u32::MAX));
    }

    #[test]
    fn largest_map_counts_every_key_and_value() {
        assert_eq!(ContainerKind::Map.expected(u32::MAX), 8_589_934_590);
        assert_eq!(ContainerKind::Array.expected(u32::MAX), 4_294_967_295);

        let mut stack = ValueStack::new(8);
        stack.open(ContainerKind::Map, u32::MAX);
        assert_eq!(stack.frames[0].remaining, 8_589_934_590);
        stack.push(Value::from("k"));
        stack.push(int(1));
        assert_eq!(stack.frames[0].remaining, 8_589_934_588);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn clear_drops_deep_partial_value() {
        let mut deep = Value::Nil;
        for _ in 0..1_000_000 {
            deep = Value::array([deep]);
        }
        let mut stack = ValueStack::default();
        stack.open(ContainerKind::Array, 2);
        assert_eq!(stack.push(deep), None);
        stack.clear();
        assert!(stack.is_empty());
    }

    #[test]
    fn clear_discards_partial_values() {
        let mut stack = ValueStack::default();
        stack.open(ContainerKind::Array, 3);
        stack.push(int(1));
        stack.clear();
        assert_eq!(stack.push(int(9)), Some(int(9)));
    }
}
