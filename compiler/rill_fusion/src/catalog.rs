//! The fusion catalog.
//!
//! Rules are keyed first by operator name, then by operand type, so finding
//! the rule for a node is two hash lookups. At most one rule exists per key,
//! which makes registration order irrelevant.
//!
//! A process has one installed catalog. It is built before any context
//! runs and is read-only afterwards.

use std::sync::OnceLock;

use rill_eval::ops::{supports_binary, supports_unary};
use rill_eval::{Node, NodeKind};
use rill_ir::{BinaryOp, ScalarType, UnaryOp};
use rustc_hash::FxHashMap;

use crate::{FusionError, FusionPoint, Op1FusionPoint, Op2FusionPoint};

/// Two-level map from `(operator name, type)` to its fusion point.
#[derive(Default)]
pub struct FusionCatalog {
    points: FxHashMap<&'static str, FxHashMap<ScalarType, Box<dyn FusionPoint>>>,
    len: usize,
}

impl FusionCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A point for every operator/type pair the kernels define.
    pub fn builtin() -> Self {
        let mut catalog = FusionCatalog::new();
        for op in UnaryOp::ALL {
            for ty in ScalarType::ALL {
                if supports_unary(op, ty) {
                    catalog.insert(Box::new(Op1FusionPoint { op, ty }));
                }
            }
        }
        for op in BinaryOp::ALL {
            for ty in ScalarType::ALL {
                if supports_binary(op, ty) {
                    catalog.insert(Box::new(Op2FusionPoint { op, ty }));
                }
            }
        }
        catalog
    }

    /// Add `point`, rejecting a second point for an existing key.
    pub fn register(&mut self, point: Box<dyn FusionPoint>) -> Result<(), FusionError> {
        let (op, ty) = (point.op_name(), point.value_type());
        if self.insert(point) {
            Ok(())
        } else {
            Err(FusionError::DuplicatePoint { op, ty })
        }
    }

    fn insert(&mut self, point: Box<dyn FusionPoint>) -> bool {
        let by_type = self.points.entry(point.op_name()).or_default();
        if by_type.contains_key(&point.value_type()) {
            return false;
        }
        by_type.insert(point.value_type(), point);
        self.len += 1;
        true
    }

    pub fn get(&self, op_name: &str, ty: ScalarType) -> Option<&dyn FusionPoint> {
        self.points.get(op_name)?.get(&ty).map(|point| &**point)
    }

    /// The point keyed by an operator node's operator and type.
    pub fn point_for(&self, node: &Node) -> Option<&dyn FusionPoint> {
        match &node.kind {
            NodeKind::Op1 { op, ty, .. } => self.get(op.name(), *ty),
            NodeKind::Op2 { op, ty, .. } => self.get(op.name(), *ty),
            _ => None,
        }
    }

    /// Number of registered points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for FusionCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionCatalog")
            .field("operators", &self.points.len())
            .field("points", &self.len)
            .finish()
    }
}

static CATALOG: OnceLock<FusionCatalog> = OnceLock::new();

/// Install the process-wide catalog. Only the first call succeeds.
pub fn install_catalog(catalog: FusionCatalog) -> Result<&'static FusionCatalog, FusionError> {
    let mut installed = false;
    let current = CATALOG.get_or_init(|| {
        installed = true;
        catalog
    });
    if installed {
        tracing::debug!(points = current.len(), "fusion catalog installed");
        Ok(current)
    } else {
        Err(FusionError::CatalogInstalled)
    }
}

/// The process-wide catalog, installing the built-in one if none was.
pub fn catalog() -> &'static FusionCatalog {
    CATALOG.get_or_init(FusionCatalog::builtin)
}
