use crate::lexer::buffer::MAX_TOKEN_SIZE;
use crate::model::AttributePolicy;
use crate::source::DEFAULT_CHUNK_SIZE;

/// Default maximum element nesting
pub const DEFAULT_MAX_DEPTH: u16 = 256;

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Attribute storage for the whole document
    pub attribute_policy: AttributePolicy,
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Largest single token in bytes, capped at 512 MiB
    pub max_token_size: usize,
    /// Bytes requested per read by reader-backed sources
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attribute_policy: AttributePolicy::Sorted,
            max_depth: DEFAULT_MAX_DEPTH,
            max_token_size: MAX_TOKEN_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default limits without a nesting cap
    pub fn unlimited_depth() -> Self {
        Self {
            max_depth: 0,
            ..Self::default()
        }
    }

    pub const fn with_attribute_policy(mut self, policy: AttributePolicy) -> Self {
        self.attribute_policy = policy;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_token_size(mut self, max_token_size: usize) -> Self {
        self.max_token_size = max_token_size.min(MAX_TOKEN_SIZE);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Whether `depth` open elements fit under the limit
    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth <= usize::from(self.max_depth)
    }
}
