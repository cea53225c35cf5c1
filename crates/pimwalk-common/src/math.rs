//! Integer helpers for shard and transfer sizing.

/// Ceiling division. Returns 0 when `divisor` is 0.
#[inline]
pub const fn ceil_div(value: usize, divisor: usize) -> usize {
    if divisor == 0 { 0 } else { value.div_ceil(divisor) }
}

/// Round `value` up to the next multiple of `align` (`align` of 0 is a no-op).
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    if align == 0 { value } else { ceil_div(value, align) * align }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(512, 4), 128);
        assert_eq!(ceil_div(513, 4), 129);
        assert_eq!(ceil_div(0, 4), 0);
        assert_eq!(ceil_div(3, 8), 1);
        assert_eq!(ceil_div(3, 0), 0);
    }

    #[test]
    fn align_up_to_granularity() {
        assert_eq!(align_up(12, 8), 16);
        assert_eq!(align_up(16, 8), 16);
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(5, 0), 5);
    }
}
