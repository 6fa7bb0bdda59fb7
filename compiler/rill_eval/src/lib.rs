//! Rill evaluation core.
//!
//! A lowered program is a tree of [`Node`]s plus a [`Program`] describing
//! functions, constant data and storage sizes. A [`Context`] evaluates nodes
//! against its own stack and a (possibly shared) global region.
//!
//! # Architecture
//!
//! - `node`: the closed set of node kinds, including the fused forms
//! - `exec`: how each node evaluates, and the fault protocol
//! - `ops`: operator kernels shared by plain and fused operator nodes
//! - `context`: per-run state, frames, catch boundaries and memory access
//! - `program`: functions, constant data and linking
//!
//! # Faults
//!
//! Evaluation returns `Result<Register, Fault>`. A fault propagates with `?`
//! until a `Try` node or the root of the run; see [`ContextState`].

mod config;
mod context;
mod exec;
mod fault;
mod memory;
mod node;
pub mod ops;
mod program;

use std::sync::Once;

pub use config::{ContextConfig, DEFAULT_MAX_CALL_DEPTH, DEFAULT_STACK_LIMIT};
pub use context::{CallError, CatchBoundary, Context, ContextBuilder, ContextState};
pub use fault::{EvalResult, Fault, FaultKind};
pub use memory::SharedGlobals;
pub use node::{FusedOp1, FusedOp2, FusedOperand, FusionHeader, Node, NodeKind, NodeTag};
pub use program::{
    Function, FunctionId, Program, ProgramBuilder, ProgramError, SharedProgram, Signature,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=rill_eval=debug`;
/// set `RILL_LOG_TREE=1` for indented span output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let tree = std::env::var("RILL_LOG_TREE").is_ok_and(|value| value == "1");
        // An embedder may have installed its own subscriber already.
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tree.then(|| tracing_tree::HierarchicalLayer::new(2).with_targets(true)))
            .with((!tree).then(|| fmt::layer().with_target(true).with_level(true)))
            .try_init();
    });
}
