use pimwalk_common::{EntitySchema, KernelId, PimError, Result, SystemConfig};
use pimwalk_kernels::reference;

use crate::accelerator_set::AcceleratorSet;
use crate::dataset::VectorPair;
use crate::plan::LaunchPlan;
use crate::verify::{VerificationReport, verify};
use crate::workload::Workload;

/// `vec2 += vec1`; `vec2` is the in-out array.
#[derive(Debug, Clone)]
pub struct VectorAddWorkload {
    schema: EntitySchema,
    data: VectorPair,
    expected: Vec<i32>,
    result: Vec<i32>,
}

impl VectorAddWorkload {
    pub fn new(schema: EntitySchema, data: VectorPair) -> Result<Self> {
        let element_size = schema
            .array_fields()
            .map(|f| f.ty.base().size_bytes())
            .next()
            .unwrap_or_default();
        if element_size != std::mem::size_of::<i32>() {
            return Err(PimError::Config(format!("`{}` arrays must hold int32 elements", schema.name)));
        }
        if data.vec1.len() != data.vec2.len() {
            return Err(PimError::Config("vector-add inputs differ in length".into()));
        }
        Ok(Self { schema, data, expected: Vec::new(), result: Vec::new() })
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn expected(&self) -> &[i32] {
        &self.expected
    }

    pub fn result(&self) -> &[i32] {
        &self.result
    }
}

impl Workload for VectorAddWorkload {
    fn kernel(&self) -> KernelId {
        KernelId::VectorAdd
    }

    fn element_size(&self) -> usize {
        std::mem::size_of::<i32>()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn host_compute(&mut self, _plan: &LaunchPlan, _system: &SystemConfig) {
        self.expected = reference::vector_add(&self.data.vec1, &self.data.vec2);
    }

    fn push_inputs(&self, set: &AcceleratorSet, plan: &LaunchPlan) -> Result<()> {
        let regions = plan.heap_layout().arrays();
        for (array, region) in [&self.data.vec1, &self.data.vec2].into_iter().zip(regions) {
            let padded = plan.scatter(array);
            set.transfer_inputs(bytemuck::cast_slice(&padded), region.offset, region.len)?;
        }
        Ok(())
    }

    fn pull_outputs(&mut self, set: &AcceleratorSet, plan: &LaunchPlan) -> Result<()> {
        let region = plan.heap_layout().arrays()[1];
        let mut padded = vec![0i32; plan.padded_elements()];
        set.retrieve_outputs(bytemuck::cast_slice_mut(&mut padded), region.offset, region.len)?;
        self.result = plan.gather(&padded);
        Ok(())
    }

    fn verify(&self) -> VerificationReport {
        verify(&self.expected, &self.result)
    }
}
