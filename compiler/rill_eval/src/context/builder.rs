//! `ContextBuilder` for creating contexts with shared globals or custom limits.

use super::Context;
use crate::memory::SharedGlobals;
use crate::{ContextConfig, SharedProgram};

/// Builder for [`Context`].
///
/// Contexts that should see each other's global writes must be built with
/// the same [`SharedGlobals`]. Without one, each context gets fresh zeroed
/// globals sized from the program.
pub struct ContextBuilder {
    program: SharedProgram,
    globals: Option<SharedGlobals>,
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new(program: SharedProgram) -> Self {
        Self {
            program,
            globals: None,
            config: ContextConfig::default(),
        }
    }

    /// Share existing global storage.
    #[must_use]
    pub fn globals(mut self, globals: SharedGlobals) -> Self {
        self.globals = Some(globals);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the largest size the stack segment may grow to.
    #[must_use]
    pub fn stack_limit(mut self, bytes: u32) -> Self {
        self.config.stack_limit = bytes;
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: u32) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn zero_on_restart(mut self, zero: bool) -> Self {
        self.config.zero_on_restart = zero;
        self
    }

    pub fn build(self) -> Context {
        let globals = self
            .globals
            .unwrap_or_else(|| SharedGlobals::new(self.program.globals_size()));
        Context::from_parts(self.program, globals, self.config)
    }
}
