//! Node evaluation.
//!
//! Children are evaluated strictly in order: left before right, condition
//! before branch, arguments left to right. A failing child's fault is
//! returned unchanged; the node that creates a fault attaches its own span.

use rill_hash::{hash_ref, hash_scalar, hash_typed};
use rill_ir::{Address, Register};
use rill_stack::ensure_sufficient_stack;

use crate::node::{FusedOp1, FusedOp2, FusedOperand};
use crate::ops::{eval_binary, eval_unary};
use crate::{Context, EvalResult, Fault, FaultKind, Node, NodeKind};

impl Node {
    /// Evaluate this node to a register.
    #[inline]
    pub fn eval(&self, ctx: &mut Context) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(ctx))
    }

    /// Evaluate this node to the address of the storage it denotes.
    ///
    /// Only reference nodes support this: local and global slots, and
    /// constants holding a pointer. Every other kind faults with
    /// `NotAReference`.
    pub fn eval_ref(&self, ctx: &mut Context) -> Result<Address, Fault> {
        let fault = |kind: FaultKind| Fault::new(kind).at(self.span);
        match &self.kind {
            NodeKind::GetLocal { offset } => ctx.local_address(*offset).map_err(fault),
            NodeKind::GetGlobal { offset } => Ok(Address::global(*offset)),
            NodeKind::Const(value) => value
                .as_address()
                .ok_or_else(|| fault(FaultKind::InvalidAddress)),
            _ => Err(fault(FaultKind::NotAReference)),
        }
    }

    fn fault(&self, kind: FaultKind) -> Fault {
        Fault::new(kind).at(self.span)
    }

    /// Evaluate `subexpr` and decode its register as an address.
    fn eval_address(&self, subexpr: &Node, ctx: &mut Context) -> Result<Address, Fault> {
        let value = subexpr.eval(ctx)?;
        value
            .as_address()
            .ok_or_else(|| self.fault(FaultKind::InvalidAddress))
    }

    fn eval_inner(&self, ctx: &mut Context) -> EvalResult {
        let fault = |kind: FaultKind| Fault::new(kind).at(self.span);
        match &self.kind {
            NodeKind::Const(value) => Ok(*value),

            // Storage
            NodeKind::GetLocal { offset } => ctx
                .local_address(*offset)
                .map(Register::from_address)
                .map_err(fault),
            NodeKind::GetLocalR2V { offset, ty } => ctx.load_local(*offset, *ty).map_err(fault),
            NodeKind::GetArgument { index } => ctx.argument(*index).map_err(fault),
            NodeKind::GetGlobal { offset } => Ok(Register::from_address(Address::global(*offset))),
            NodeKind::GetGlobalR2V { offset, ty } => {
                ctx.load(Address::global(*offset), *ty).map_err(fault)
            }
            NodeKind::Ref2Value { ty, subexpr } => {
                let address = self.eval_address(subexpr, ctx)?;
                ctx.load(address, *ty).map_err(fault)
            }
            NodeKind::SetLocal { offset, ty, value } => {
                let value = value.eval(ctx)?;
                let address = ctx.local_address(*offset).map_err(fault)?;
                ctx.store(address, *ty, value).map_err(fault)?;
                Ok(value)
            }
            NodeKind::SetGlobal { offset, ty, value } => {
                let value = value.eval(ctx)?;
                ctx.store(Address::global(*offset), *ty, value)
                    .map_err(fault)?;
                Ok(value)
            }
            NodeKind::Assign { ty, target, value } => {
                let address = target.eval_ref(ctx)?;
                let value = value.eval(ctx)?;
                ctx.store(address, *ty, value).map_err(fault)?;
                Ok(value)
            }

            // Operators
            NodeKind::Op1 { op, ty, x } => {
                let x = x.eval(ctx)?;
                eval_unary(*op, *ty, x).map_err(fault)
            }
            NodeKind::Op2 {
                op,
                ty,
                left,
                right,
            } => {
                let left = left.eval(ctx)?;
                let right = right.eval(ctx)?;
                eval_binary(*op, *ty, left, right).map_err(fault)
            }
            NodeKind::Op1Fusion(fused) => fused.eval(ctx),
            NodeKind::Op2Fusion(fused) => fused.eval(ctx),

            // Control flow
            NodeKind::Block(nodes) => {
                let mut last = Register::ZERO;
                for node in nodes {
                    last = node.eval(ctx)?;
                }
                Ok(last)
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if cond.eval(ctx)?.as_bool() {
                    then_branch.eval(ctx)
                } else if let Some(else_branch) = else_branch {
                    else_branch.eval(ctx)
                } else {
                    Ok(Register::ZERO)
                }
            }
            NodeKind::While { cond, body } => {
                while cond.eval(ctx)?.as_bool() {
                    body.eval(ctx)?;
                }
                Ok(Register::ZERO)
            }
            NodeKind::Call { function, args } => {
                let arg_base = ctx.arg_len();
                for arg in args {
                    let value = arg.eval(ctx)?;
                    ctx.push_arg(value);
                }
                ctx.call(*function, arg_base).map_err(|f| f.at(self.span))
            }
            NodeKind::Try { body, handler } => {
                let point = ctx.push_catch(self.span);
                match body.eval(ctx) {
                    Ok(value) => {
                        ctx.pop_catch();
                        Ok(value)
                    }
                    Err(caught) => {
                        ctx.unwind_to(point, caught);
                        match handler {
                            Some(handler) => handler.eval(ctx),
                            None => Ok(Register::ZERO),
                        }
                    }
                }
            }
            NodeKind::Throw { message } => Err(fault(FaultKind::Thrown {
                message: message.clone(),
            })),

            // Hashing
            NodeKind::HashOfValue { ty, subexpr } => {
                let value = subexpr.eval(ctx)?;
                hash_scalar(*ty, value, &*ctx)
                    .map(Register::from_u32)
                    .ok_or_else(|| fault(FaultKind::InvalidAddress))
            }
            NodeKind::HashOfRef { size, subexpr } => {
                let address = self.eval_address(subexpr, ctx)?;
                hash_ref(&*ctx, address, *size)
                    .map(Register::from_u32)
                    .ok_or_else(|| fault(FaultKind::InvalidAddress))
            }
            NodeKind::HashOfMixedType { type_info, subexpr } => {
                let address = self.eval_address(subexpr, ctx)?;
                hash_typed(&*ctx, address, type_info)
                    .map(Register::from_u32)
                    .ok_or_else(|| fault(FaultKind::InvalidAddress))
            }
        }
    }
}

impl FusedOperand {
    /// Evaluate the operand exactly as the leaf it replaced would.
    #[inline]
    fn eval(&self, ctx: &mut Context) -> EvalResult {
        match self {
            FusedOperand::Const(value) => Ok(*value),
            FusedOperand::Local { offset, ty, span } => ctx
                .load_local(*offset, *ty)
                .map_err(|kind| Fault::new(kind).at(*span)),
            FusedOperand::Argument { index, span } => ctx
                .argument(*index)
                .map_err(|kind| Fault::new(kind).at(*span)),
            FusedOperand::Node(node) => node.eval(ctx),
        }
    }
}

impl FusedOp1 {
    fn eval(&self, ctx: &mut Context) -> EvalResult {
        let x = self.x.eval(ctx)?;
        eval_unary(self.op, self.header.ty, x).map_err(|kind| Fault::new(kind).at(self.header.span))
    }
}

impl FusedOp2 {
    fn eval(&self, ctx: &mut Context) -> EvalResult {
        let left = self.left.eval(ctx)?;
        let right = self.right.eval(ctx)?;
        eval_binary(self.op, self.header.ty, left, right)
            .map_err(|kind| Fault::new(kind).at(self.header.span))
    }
}
