//! Elementwise kernels.

/// Status returned by kernels that cannot fail.
pub const KERNEL_OK: i32 = 0;

/// `result[i] += operand[i]` with two's-complement wrapping.
///
/// Operates on the common prefix of both slices, which the pipeline sizes to
/// the true element count of the block.
pub fn add_assign_block(result: &mut [i32], operand: &[i32]) -> i32 {
    debug_assert_eq!(result.len(), operand.len());
    for (r, o) in result.iter_mut().zip(operand) {
        *r = r.wrapping_add(*o);
    }
    KERNEL_OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_block_basic() {
        let mut result = vec![1, 2, 3];
        assert_eq!(add_assign_block(&mut result, &[10, 20, 30]), KERNEL_OK);
        assert_eq!(result, vec![11, 22, 33]);
    }

    #[test]
    fn test_add_assign_block_wraps() {
        let mut result = vec![i32::MAX, i32::MIN];
        add_assign_block(&mut result, &[1, -1]);
        assert_eq!(result, vec![i32::MIN, i32::MAX]);
    }

    #[test]
    fn test_add_assign_block_empty() {
        let mut result: Vec<i32> = Vec::new();
        assert_eq!(add_assign_block(&mut result, &[]), KERNEL_OK);
    }
}
