//! Angle arithmetic shared by the scan packet decoder and the degree table.

use crate::internals::DEGREE_BUCKETS;

const FULL_TURN_DEG: f32 = 360.0;

/// Decodes a packet angle field (Q6 degrees shifted left by one check bit).
#[inline]
pub fn decode_angle(raw: u16) -> f32 {
    (raw >> 1) as f32 / 64.0
}

/// Angular offset in degrees caused by the distance between the laser and
/// the receiver lens. Zero for a sample without return.
#[inline]
pub fn angle_correction(distance: u16) -> f32 {
    if distance == 0 {
        return 0.0;
    }
    let d = distance as f64;
    (21.8 * (155.3 - d) / (155.3 * d)).atan().to_degrees() as f32
}

/// Angle covered between the first and last sample of a packet, crossing
/// 0/360 when the last angle is below the first.
#[inline]
pub fn angle_span(first: f32, last: f32) -> f32 {
    if last < first {
        FULL_TURN_DEG - first + last
    } else {
        last - first
    }
}

/// Angle of sample `index` out of `count` samples spread evenly over `span`
/// degrees starting at `first`.
#[inline]
pub fn interpolate_angle(first: f32, span: f32, index: usize, count: usize) -> f32 {
    if count > 1 {
        first + index as f32 * span / (count - 1) as f32
    } else {
        first
    }
}

/// Brings an angle back towards `(0, 360]` with at most one correction
/// step in each direction. Angles further out stay out of range.
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    if angle <= 0.0 {
        angle += FULL_TURN_DEG;
    }
    if angle > FULL_TURN_DEG {
        angle -= FULL_TURN_DEG;
    }
    angle
}

/// Degree table bucket for `angle`: `floor(angle) - 1`, so angles in
/// `[1, 2)` land in bucket 0 and 360 lands in bucket 359. Indices falling
/// outside the table are wrapped around it.
#[inline]
pub fn degree_bucket(angle: f32) -> usize {
    (angle.floor() as i64 - 1).rem_euclid(DEGREE_BUCKETS as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_q6_angle() {
        assert_eq!(decode_angle(0x0501), 10.0);
        assert_eq!(decode_angle(0xA1), 1.25);
        assert_eq!(decode_angle(0), 0.0);
    }

    #[test]
    fn span_wraps_through_zero() {
        assert_eq!(angle_span(359.0, 1.0), 2.0);
        assert_eq!(angle_span(10.0, 20.5), 10.5);
        assert_eq!(angle_span(42.0, 42.0), 0.0);
    }

    #[test]
    fn interpolation() {
        assert_eq!(interpolate_angle(10.0, 8.0, 0, 5), 10.0);
        assert_eq!(interpolate_angle(10.0, 8.0, 2, 5), 14.0);
        assert_eq!(interpolate_angle(10.0, 8.0, 4, 5), 18.0);
        assert_eq!(interpolate_angle(10.0, 8.0, 0, 1), 10.0);
        assert_eq!(interpolate_angle(359.0, 2.0, 1, 2), 361.0);
    }

    #[test]
    fn correction() {
        assert_eq!(angle_correction(0), 0.0);
        // the offset vanishes at the lens baseline distance
        assert!(angle_correction(155).abs() < 0.05);
        let far = angle_correction(1000);
        assert!(far < -6.7 && far > -6.8, "got {}", far);
        assert!(angle_correction(50) > 0.0);
    }

    #[test]
    fn single_step_normalization() {
        assert_eq!(normalize_angle(0.0), 360.0);
        assert_eq!(normalize_angle(-5.0), 355.0);
        assert_eq!(normalize_angle(361.0), 1.0);
        assert_eq!(normalize_angle(360.0), 360.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        // not a modulo
        assert_eq!(normalize_angle(-400.0), -40.0);
        assert_eq!(normalize_angle(800.0), 440.0);
    }

    #[test]
    fn buckets_shift_down_by_one() {
        assert_eq!(degree_bucket(1.0), 0);
        assert_eq!(degree_bucket(1.99), 0);
        assert_eq!(degree_bucket(10.0), 9);
        assert_eq!(degree_bucket(360.0), 359);
        assert_eq!(degree_bucket(0.5), 359);
        assert_eq!(degree_bucket(440.0), 79);
    }
}
