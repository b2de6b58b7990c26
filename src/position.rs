use crate::constant::POSITION_TOLERANCE;

/// True iff `current` is no further than `tolerance` units away from `target`.
pub fn is_within_tolerance(current: i64, target: i64, tolerance: u32) -> bool {
    current.abs_diff(target) <= tolerance as u64
}

/// [`is_within_tolerance`] with the drive's backlash.
pub fn has_reached(current: i64, target: i64) -> bool {
    is_within_tolerance(current, target, POSITION_TOLERANCE)
}
