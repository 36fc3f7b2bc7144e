//! Tree configuration

use crate::stack::DEFAULT_CAPACITY;

/// Spaces per depth level in serialized output
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Lines shown on each side of a syntax error
pub const DEFAULT_CONTEXT_RADIUS: usize = 2;

/// Configuration parameters for a [`Tree`](super::Tree)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    /// Indentation per depth level when serializing (cosmetic)
    pub indent_width: usize,

    /// Lines of context on each side of a syntax error
    pub context_radius: usize,

    /// Initial capacity of the diagnostic path stack
    pub path_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            path_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl TreeConfig {
    /// Set indentation width
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Set syntax error context radius
    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    /// Set diagnostic stack capacity (at least 1)
    pub fn with_path_capacity(mut self, capacity: usize) -> Self {
        self.path_capacity = capacity.max(1);
        self
    }
}
