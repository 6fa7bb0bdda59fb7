//! Linked programs.
//!
//! A `Program` is everything the front end hands to the execution core: the
//! function bodies, an optional global initializer, the constant data
//! region, and the sizes contexts need to allocate. Build it with
//! [`ProgramBuilder`], run the fusion pass over it while it is still
//! uniquely owned, then share it as a [`SharedProgram`].

// Arc is the implementation - all usage goes through the newtype
#![allow(
    clippy::disallowed_types,
    reason = "Arc is the implementation of SharedProgram"
)]

use std::fmt;
use std::sync::Arc;

use rill_ir::{Address, ScalarType, Span};
use rustc_hash::FxHashMap;

use crate::Node;

/// Index of a function in its program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(u32);

impl FunctionId {
    pub const fn new(index: u32) -> Self {
        FunctionId(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Name and calling convention of a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub span: Span,
    pub arg_types: Vec<ScalarType>,
    /// `None` for functions without a result.
    pub result_type: Option<ScalarType>,
    /// Bytes of frame-local storage.
    pub frame_size: u32,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Signature {
            name: name.into(),
            span: Span::DUMMY,
            arg_types: Vec::new(),
            result_type: None,
            frame_size: 0,
        }
    }

    #[must_use]
    pub fn args(mut self, arg_types: impl IntoIterator<Item = ScalarType>) -> Self {
        self.arg_types = arg_types.into_iter().collect();
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: ScalarType) -> Self {
        self.result_type = Some(ty);
        self
    }

    #[must_use]
    pub fn frame_size(mut self, size: u32) -> Self {
        self.frame_size = size;
        self
    }

    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A function: signature plus body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub signature: Signature,
    pub body: Node,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn frame_size(&self) -> u32 {
        self.signature.frame_size
    }
}

/// A linked, evaluable program.
#[derive(Debug)]
pub struct Program {
    functions: Vec<Function>,
    names: FxHashMap<String, FunctionId>,
    init: Option<Node>,
    data: Vec<u8>,
    root_frame_size: u32,
    max_stack_depth: u32,
    globals_size: u32,
}

impl Program {
    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0 as usize)
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.names.get(name).copied()
    }

    /// Global initializer, if the program has one.
    pub fn init(&self) -> Option<&Node> {
        self.init.as_ref()
    }

    /// Read-only constant data region.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Frame size of a root node evaluated with `Context::eval`.
    pub fn root_frame_size(&self) -> u32 {
        self.root_frame_size
    }

    /// Initial size of a context's stack segment.
    pub fn max_stack_depth(&self) -> u32 {
        self.max_stack_depth
    }

    pub fn globals_size(&self) -> u32 {
        self.globals_size
    }

    /// Every root node: function bodies, then the initializer.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.functions
            .iter_mut()
            .map(|function| &mut function.body)
            .chain(self.init.as_mut())
    }
}

/// Error when linking a program.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("function `{0}` is declared twice")]
    DuplicateFunction(String),
    #[error("function `{0}` is declared but has no body")]
    UndefinedFunction(String),
    #[error("function `{0}` already has a body")]
    AlreadyDefined(String),
    #[error("no function with id #{}", .0.index())]
    UnknownFunction(FunctionId),
    #[error("constant data exceeds the addressable region")]
    DataTooLarge,
}

/// Builder for [`Program`].
///
/// Functions are declared first (so calls can refer to them before their
/// bodies exist, including recursively) and defined afterwards.
#[derive(Default)]
pub struct ProgramBuilder {
    signatures: Vec<Signature>,
    bodies: Vec<Option<Node>>,
    names: FxHashMap<String, FunctionId>,
    init: Option<Node>,
    data: Vec<u8>,
    root_frame_size: u32,
    max_stack_depth: Option<u32>,
    globals_size: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a function.
    pub fn declare(&mut self, signature: Signature) -> Result<FunctionId, ProgramError> {
        if self.names.contains_key(&signature.name) {
            return Err(ProgramError::DuplicateFunction(signature.name));
        }
        let index = u32::try_from(self.signatures.len()).map_err(|_| ProgramError::DataTooLarge)?;
        let id = FunctionId(index);
        self.names.insert(signature.name.clone(), id);
        self.signatures.push(signature);
        self.bodies.push(None);
        Ok(id)
    }

    /// Give a declared function its body.
    pub fn define(&mut self, id: FunctionId, body: Node) -> Result<(), ProgramError> {
        let index = id.0 as usize;
        let (Some(signature), Some(slot)) = (self.signatures.get(index), self.bodies.get_mut(index))
        else {
            return Err(ProgramError::UnknownFunction(id));
        };
        if slot.is_some() {
            return Err(ProgramError::AlreadyDefined(signature.name.clone()));
        }
        *slot = Some(body);
        Ok(())
    }

    /// Declare and define in one step.
    pub fn function(&mut self, signature: Signature, body: Node) -> Result<FunctionId, ProgramError> {
        let id = self.declare(signature)?;
        self.define(id, body)?;
        Ok(id)
    }

    /// Set the global initializer run by `Context::run_init_script`.
    pub fn init(&mut self, node: Node) -> &mut Self {
        self.init = Some(node);
        self
    }

    /// Append raw bytes to the constant data region.
    pub fn data(&mut self, bytes: &[u8]) -> Result<Address, ProgramError> {
        let offset = u32::try_from(self.data.len()).map_err(|_| ProgramError::DataTooLarge)?;
        self.data.extend_from_slice(bytes);
        if u32::try_from(self.data.len()).is_err() {
            return Err(ProgramError::DataTooLarge);
        }
        Ok(Address::data(offset))
    }

    /// Append a NUL-terminated string literal.
    pub fn string_literal(&mut self, text: &str) -> Result<Address, ProgramError> {
        let address = self.data(text.as_bytes())?;
        self.data.push(0);
        Ok(address)
    }

    pub fn root_frame_size(&mut self, size: u32) -> &mut Self {
        self.root_frame_size = size;
        self
    }

    /// Override the computed initial stack size.
    pub fn max_stack_depth(&mut self, depth: u32) -> &mut Self {
        self.max_stack_depth = Some(depth);
        self
    }

    pub fn globals_size(&mut self, size: u32) -> &mut Self {
        self.globals_size = size;
        self
    }

    pub fn build(self) -> Result<Program, ProgramError> {
        let mut functions = Vec::with_capacity(self.signatures.len());
        for (signature, body) in self.signatures.into_iter().zip(self.bodies) {
            let Some(body) = body else {
                return Err(ProgramError::UndefinedFunction(signature.name));
            };
            functions.push(Function { signature, body });
        }
        let max_stack_depth = self.max_stack_depth.unwrap_or_else(|| {
            functions
                .iter()
                .map(Function::frame_size)
                .fold(self.root_frame_size, u32::saturating_add)
        });
        Ok(Program {
            functions,
            names: self.names,
            init: self.init,
            data: self.data,
            root_frame_size: self.root_frame_size,
            max_stack_depth,
            globals_size: self.globals_size,
        })
    }
}

/// Immutable program shared by every context that evaluates it.
pub struct SharedProgram(Arc<Program>);

impl SharedProgram {
    pub fn new(program: Program) -> Self {
        SharedProgram(Arc::new(program))
    }
}

impl From<Program> for SharedProgram {
    fn from(program: Program) -> Self {
        SharedProgram::new(program)
    }
}

impl Clone for SharedProgram {
    fn clone(&self) -> Self {
        SharedProgram(Arc::clone(&self.0))
    }
}

impl std::ops::Deref for SharedProgram {
    type Target = Program;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SharedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedProgram({} functions)", self.0.functions.len())
    }
}
