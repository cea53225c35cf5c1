//! Seeded input generation.
//!
//! The same seed always yields the same dataset, independent of the
//! accelerator count.

use pimwalk_common::{Edge, EntitySchema, FieldType, NodeId, PimError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Edge weights are drawn from `-WEIGHT_BOUND..WEIGHT_BOUND`.
pub const WEIGHT_BOUND: i32 = 1 << 10;

/// The two int32 vectors of the vector-add workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorPair {
    pub vec1: Vec<i32>,
    pub vec2: Vec<i32>,
}

impl VectorPair {
    /// One array per array field of `schema`, each `len` elements long.
    pub fn generate(schema: &EntitySchema, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arrays = schema.array_fields().map(|field| match field.ty {
            FieldType::Array(_, len) => (0..len).map(|_| rng.random::<i32>()).collect::<Vec<_>>(),
            FieldType::Scalar(_) => Vec::new(),
        });
        match (arrays.next(), arrays.next()) {
            (Some(vec1), Some(vec2)) => Ok(Self { vec1, vec2 }),
            _ => Err(PimError::Config(format!("schema `{}` needs two array fields", schema.name))),
        }
    }

    pub fn len(&self) -> usize {
        self.vec1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec1.is_empty()
    }
}

/// Parameters of a random edge list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSpec {
    pub len: usize,
    pub nodes: NodeId,
    pub special_ratio: f64,
    pub seed: u64,
}

/// Random edge list with sources and targets in `0..nodes`.
pub fn generate_edges(spec: &EdgeSpec) -> Vec<Edge> {
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    let nodes = spec.nodes.max(1);
    (0..spec.len)
        .map(|_| {
            let src = rng.random_range(0..nodes);
            let dst = rng.random_range(0..nodes);
            let weight = rng.random_range(-WEIGHT_BOUND..WEIGHT_BOUND);
            if rng.random_bool(spec.special_ratio.clamp(0.0, 1.0)) {
                Edge::special(src, dst, weight)
            } else {
                Edge::regular(src, dst, weight)
            }
        })
        .collect()
}
