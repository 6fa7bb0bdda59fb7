//! Execution context.
//!
//! A `Context` is the mutable state of one logical run of a program: its
//! stack segment, the handle to global storage, the current-fault slot and
//! the stack of catch boundaries. Node evaluation borrows it mutably; the
//! program itself is shared and never mutated.
//!
//! # Lifecycle
//!
//! ```text
//! Fresh -> Running -> Completed
//!                  -> Faulted          (fault with no catch boundary)
//!                  -> UnwoundToCatch   (a boundary caught a fault)
//! ```
//!
//! `restart` returns any state to `Fresh` without releasing the stack.

mod builder;

use rill_hash::MemoryRead;
use rill_ir::{Address, Region, Register, ScalarType, Span};
use smallvec::SmallVec;

use crate::memory::{self, SharedGlobals};
use crate::{ContextConfig, EvalResult, Fault, FaultKind, FunctionId, Node, SharedProgram};

pub use builder::ContextBuilder;

/// Where a context is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// Stack zeroed, no fault, no catch boundaries.
    Fresh,
    /// Evaluating a tree.
    Running,
    /// The last run finished without any fault.
    Completed,
    /// The last run ended with a fault no boundary caught.
    Faulted,
    /// A catch boundary caught a fault. The fault stays on the context.
    UnwoundToCatch,
}

/// An active catch boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CatchBoundary {
    pub span: Span,
    /// Call depth at which the boundary was entered.
    pub call_depth: u32,
}

/// The current call frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Frame {
    /// Stack offset of the first local.
    base: u32,
    /// Bytes of locals.
    size: u32,
    /// Index of the first argument in `Context::args`.
    arg_base: usize,
    arg_count: usize,
}

/// Everything a catch boundary restores when it catches.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CatchPoint {
    frame: Frame,
    call_depth: u32,
    arg_len: usize,
    catch_len: usize,
}

/// Error from [`Context::verify_call`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("no function with id #{}", .0.index())]
    UnknownFunction(FunctionId),
    #[error("`{name}` takes {expected} arguments, {got} given")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("argument {index} of `{name}` is `{expected}`, not `{got}`")]
    ArgumentType {
        name: String,
        index: usize,
        expected: ScalarType,
        got: ScalarType,
    },
    #[error("`{name}` returns {}, not {}", describe(.expected), describe(.got))]
    ResultType {
        name: String,
        expected: Option<ScalarType>,
        got: Option<ScalarType>,
    },
}

fn describe(ty: &Option<ScalarType>) -> &'static str {
    ty.map_or("nothing", ScalarType::name)
}

/// Mutable state for evaluating a shared program.
pub struct Context {
    program: SharedProgram,
    globals: SharedGlobals,
    config: ContextConfig,
    stack: Vec<u8>,
    args: Vec<Register>,
    frame: Frame,
    call_depth: u32,
    fault: Option<Fault>,
    catches: SmallVec<[CatchBoundary; 4]>,
    state: ContextState,
}

impl Context {
    /// Context with default configuration and its own zeroed globals.
    pub fn new(program: SharedProgram) -> Self {
        ContextBuilder::new(program).build()
    }

    pub fn builder(program: SharedProgram) -> ContextBuilder {
        ContextBuilder::new(program)
    }

    fn from_parts(program: SharedProgram, globals: SharedGlobals, config: ContextConfig) -> Self {
        let initial = program.max_stack_depth().min(config.stack_limit);
        Context {
            stack: vec![0; initial as usize],
            program,
            globals,
            config,
            args: Vec::new(),
            frame: Frame::default(),
            call_depth: 0,
            fault: None,
            catches: SmallVec::new(),
            state: ContextState::Fresh,
        }
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// The fault of the last run, caught or not.
    pub fn exception(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// Active catch boundaries, innermost last.
    pub fn catch_boundaries(&self) -> &[CatchBoundary] {
        &self.catches
    }

    /// Current size of the stack segment in bytes.
    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.program.find_function(name)
    }

    /// Check that `function` has exactly the given signature.
    pub fn verify_call(
        &self,
        function: FunctionId,
        arg_types: &[ScalarType],
        result_type: Option<ScalarType>,
    ) -> Result<(), CallError> {
        let Some(function) = self.program.function(function) else {
            return Err(CallError::UnknownFunction(function));
        };
        let signature = &function.signature;
        if signature.arg_types.len() != arg_types.len() {
            return Err(CallError::ArityMismatch {
                name: signature.name.clone(),
                expected: signature.arg_types.len(),
                got: arg_types.len(),
            });
        }
        for (index, (&expected, &got)) in signature.arg_types.iter().zip(arg_types).enumerate() {
            if expected != got {
                return Err(CallError::ArgumentType {
                    name: signature.name.clone(),
                    index,
                    expected,
                    got,
                });
            }
        }
        if signature.result_type != result_type {
            return Err(CallError::ResultType {
                name: signature.name.clone(),
                expected: signature.result_type,
                got: result_type,
            });
        }
        Ok(())
    }

    /// Return to `Fresh`, keeping the stack allocation.
    pub fn restart(&mut self) {
        if self.config.zero_on_restart {
            self.stack.fill(0);
        }
        self.args.clear();
        self.frame = Frame::default();
        self.call_depth = 0;
        self.fault = None;
        self.catches.clear();
        self.state = ContextState::Fresh;
    }

    /// Evaluate `root` as one run.
    ///
    /// On an uncaught fault the result is the zero register and the fault is
    /// available through [`exception`](Self::exception).
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn eval(&mut self, root: &Node) -> Register {
        let frame_size = self.program.root_frame_size();
        let result = self.begin_run(frame_size).and_then(|()| root.eval(self));
        self.finish_run(result)
    }

    /// Evaluate `root` inside an implicit outermost catch boundary.
    ///
    /// Never ends `Faulted`: a fault leaves the context `UnwoundToCatch`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn eval_with_catch(&mut self, root: &Node) -> Register {
        let frame_size = self.program.root_frame_size();
        let result = self.begin_run(frame_size).and_then(|()| {
            let point = self.push_catch(root.span);
            let result = root.eval(self);
            match result {
                Ok(value) => {
                    self.pop_catch();
                    Ok(value)
                }
                Err(fault) => {
                    self.unwind_to(point, fault);
                    Ok(Register::ZERO)
                }
            }
        });
        self.finish_run(result)
    }

    /// Call a program function as the root of a run.
    #[tracing::instrument(level = "trace", skip_all, fields(function = function.index()))]
    pub fn eval_function(&mut self, function: FunctionId, args: &[Register]) -> Register {
        let result = self.begin_run(0).and_then(|()| {
            self.args.extend_from_slice(args);
            self.call(function, 0)
        });
        self.finish_run(result)
    }

    /// Run the program's global initializer, if any.
    ///
    /// Returns `false` when the initializer faulted.
    pub fn run_init_script(&mut self) -> bool {
        let program = self.program.clone();
        match program.init() {
            Some(init) => {
                self.eval(init);
                self.state != ContextState::Faulted
            }
            None => true,
        }
    }

    fn begin_run(&mut self, frame_size: u32) -> Result<(), Fault> {
        self.state = ContextState::Running;
        self.fault = None;
        self.catches.clear();
        self.args.clear();
        self.call_depth = 0;
        self.frame = Frame {
            size: frame_size,
            ..Frame::default()
        };
        self.reserve_stack(frame_size)
    }

    fn finish_run(&mut self, result: EvalResult) -> Register {
        match result {
            Ok(value) => {
                if self.state == ContextState::Running {
                    self.state = ContextState::Completed;
                }
                value
            }
            Err(fault) => {
                tracing::debug!(%fault, "unhandled fault");
                self.fault = Some(fault);
                self.state = ContextState::Faulted;
                Register::ZERO
            }
        }
    }

    // Stack

    /// Make sure the stack covers `end` bytes, growing up to the limit.
    fn reserve_stack(&mut self, end: u32) -> Result<(), Fault> {
        let needed = end as usize;
        if needed <= self.stack.len() {
            return Ok(());
        }
        if end > self.config.stack_limit {
            return Err(FaultKind::StackOverflow.into());
        }
        let grown = needed
            .max(self.stack.len().saturating_mul(2))
            .min(self.config.stack_limit as usize);
        tracing::trace!(from = self.stack.len(), to = grown, "growing stack segment");
        self.stack.resize(grown, 0);
        Ok(())
    }

    /// Call `function` with the arguments at `args[arg_base..]`.
    pub(crate) fn call(&mut self, function: FunctionId, arg_base: usize) -> EvalResult {
        let program = self.program.clone();
        let Some(callee) = program.function(function) else {
            return Err(FaultKind::UnknownFunction(function).into());
        };
        if self.call_depth >= self.config.max_call_depth {
            return Err(FaultKind::StackOverflow.into());
        }
        let caller = self.frame;
        let overflow = || Fault::new(FaultKind::StackOverflow);
        let base = caller.base.checked_add(caller.size).ok_or_else(overflow)?;
        let end = base.checked_add(callee.frame_size()).ok_or_else(overflow)?;
        self.reserve_stack(end)?;
        self.stack[base as usize..end as usize].fill(0);

        self.frame = Frame {
            base,
            size: callee.frame_size(),
            arg_base,
            arg_count: self.args.len() - arg_base,
        };
        self.call_depth += 1;
        let result = callee.body.eval(self);
        self.call_depth -= 1;
        self.frame = caller;
        self.args.truncate(arg_base);
        result
    }

    pub(crate) fn arg_len(&self) -> usize {
        self.args.len()
    }

    pub(crate) fn push_arg(&mut self, value: Register) {
        self.args.push(value);
    }

    pub(crate) fn argument(&self, index: u32) -> Result<Register, FaultKind> {
        let out_of_range = || FaultKind::ArgumentOutOfRange {
            index,
            count: u32::try_from(self.frame.arg_count).unwrap_or(u32::MAX),
        };
        if index as usize >= self.frame.arg_count {
            return Err(out_of_range());
        }
        self.args
            .get(self.frame.arg_base + index as usize)
            .copied()
            .ok_or_else(out_of_range)
    }

    // Catch boundaries

    pub(crate) fn push_catch(&mut self, span: Span) -> CatchPoint {
        let point = CatchPoint {
            frame: self.frame,
            call_depth: self.call_depth,
            arg_len: self.args.len(),
            catch_len: self.catches.len(),
        };
        self.catches.push(CatchBoundary {
            span,
            call_depth: self.call_depth,
        });
        point
    }

    pub(crate) fn pop_catch(&mut self) {
        self.catches.pop();
    }

    /// Resume at the boundary `point`, keeping `fault` for inspection.
    pub(crate) fn unwind_to(&mut self, point: CatchPoint, fault: Fault) {
        tracing::debug!(%fault, depth = point.call_depth, "fault caught");
        self.frame = point.frame;
        self.call_depth = point.call_depth;
        self.args.truncate(point.arg_len);
        self.catches.truncate(point.catch_len);
        self.fault = Some(fault);
        self.state = ContextState::UnwoundToCatch;
    }

    // Addressing

    pub(crate) fn local_address(&self, offset: u32) -> Result<Address, FaultKind> {
        self.frame
            .base
            .checked_add(offset)
            .map(Address::stack)
            .ok_or(FaultKind::InvalidAddress)
    }

    pub(crate) fn load_local(&self, offset: u32, ty: ScalarType) -> Result<Register, FaultKind> {
        self.load(self.local_address(offset)?, ty)
    }

    /// Typed load of `ty.size()` bytes.
    pub(crate) fn load(&self, address: Address, ty: ScalarType) -> Result<Register, FaultKind> {
        self.read_register(address, ty.size())
            .ok_or(FaultKind::InvalidAddress)
    }

    /// Typed store of the first `ty.size()` bytes of `value`.
    pub(crate) fn store(
        &mut self,
        address: Address,
        ty: ScalarType,
        value: Register,
    ) -> Result<(), FaultKind> {
        let image = value.to_bytes();
        let bytes = &image[..ty.size() as usize];
        let len = ty.size();
        match address.region() {
            Region::Stack => {
                let slot = memory::range_mut(&mut self.stack, address.offset(), len)
                    .ok_or(FaultKind::InvalidAddress)?;
                slot.copy_from_slice(bytes);
            }
            Region::Global => {
                let mut globals = self.globals.write();
                let slot = memory::range_mut(&mut globals, address.offset(), len)
                    .ok_or(FaultKind::InvalidAddress)?;
                slot.copy_from_slice(bytes);
            }
            Region::Data | Region::Null => return Err(FaultKind::InvalidAddress),
        }
        Ok(())
    }
}

impl MemoryRead for Context {
    fn visit_bytes(&self, address: Address, len: u32, sink: &mut dyn FnMut(&[u8])) -> bool {
        let offset = address.offset();
        match address.region() {
            Region::Stack => deliver(memory::range(&self.stack, offset, len), sink),
            Region::Global => {
                let globals = self.globals.read();
                deliver(memory::range(&globals, offset, len), sink)
            }
            Region::Data => deliver(memory::range(self.program.data(), offset, len), sink),
            Region::Null => false,
        }
    }

    fn visit_cstr(&self, address: Address, sink: &mut dyn FnMut(&[u8])) -> bool {
        let offset = address.offset();
        match address.region() {
            Region::Stack => deliver(memory::cstr(&self.stack, offset), sink),
            Region::Global => {
                let globals = self.globals.read();
                deliver(memory::cstr(&globals, offset), sink)
            }
            Region::Data => deliver(memory::cstr(self.program.data(), offset), sink),
            Region::Null => false,
        }
    }
}

fn deliver(bytes: Option<&[u8]>, sink: &mut dyn FnMut(&[u8])) -> bool {
    match bytes {
        Some(bytes) => {
            sink(bytes);
            true
        }
        None => false,
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .field("stack", &self.stack.len())
            .field("call_depth", &self.call_depth)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
