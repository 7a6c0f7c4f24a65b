//! Stack growth for the recursive parser and evaluator.
//!
//! Deeply nested source or deep user recursion would otherwise overflow the
//! host stack. Recursive entry points run inside [`ensure_sufficient_stack`],
//! which moves onto a fresh heap-allocated segment when the current one runs low.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

