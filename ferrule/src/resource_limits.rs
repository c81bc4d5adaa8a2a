/// Limits applied while compiling rule sets
///
/// Exceeding one is a `ResourceLimitExceeded` error, never a panic or a stack
/// overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum rule source size in bytes
    pub max_source_bytes: usize,

    /// Maximum nesting of parentheses, unary operators and sub-expressions
    pub max_expression_depth: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 5 * 1024 * 1024, // 5 MB
            max_expression_depth: 100,
        }
    }
}

impl ResourceLimits {
    pub fn new() -> Self {
        Self::default()
    }
}
