//! Notch (throttle bucket) arithmetic and speed step quantization.

use core::fmt;

use pfxbrick_errors::{PfxResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Most notch levels the brick supports.
pub const MAX_NOTCHES: usize = 8;

/// Top of the 8-bit speed scale.
pub const SPEED_MAX: u8 = 255;

fn round_u8(value: f64) -> u8 {
    let clamped = value.round().clamp(0.0, f64::from(SPEED_MAX));
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is rounded and clamped to 0..=255"
    )]
    let out = clamped as u8;
    out
}

/// Evenly spaced default boundaries for `count` notches.
///
/// Returns `count - 1` values; a single notch has no boundaries.
///
/// ```
/// use pfxbrick_hid_protocol::bounds_from_notchcount;
/// assert_eq!(bounds_from_notchcount(4), vec![64, 128, 191]);
/// ```
pub fn bounds_from_notchcount(count: usize) -> Vec<u8> {
    if count < 2 {
        return Vec::new();
    }
    (1..count)
        .map(|i| round_u8(i as f64 / count as f64 * f64::from(SPEED_MAX)))
        .collect()
}

/// Speed range covered by one notch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotchRange {
    pub lower: u8,
    pub mid: u8,
    pub upper: u8,
}

impl From<NotchRange> for (u8, u8, u8) {
    fn from(r: NotchRange) -> Self {
        (r.lower, r.mid, r.upper)
    }
}

/// Lower, mid and upper speeds of every notch delimited by `bounds`.
///
/// The notch count is `bounds.len() + 1`. Midpoints round half away from zero.
pub fn notch_ranges_from_bounds(bounds: &[u8]) -> Vec<NotchRange> {
    let mut edges = Vec::with_capacity(bounds.len() + 2);
    edges.push(0u8);
    edges.extend_from_slice(bounds);
    edges.push(SPEED_MAX);
    edges
        .windows(2)
        .filter_map(|w| match *w {
            [lower, upper] => Some(NotchRange {
                lower,
                mid: round_u8(f64::from(lower) + (f64::from(upper) - f64::from(lower)) / 2.0),
                upper,
            }),
            _ => None,
        })
        .collect()
}

/// Index of the notch that `speed` falls into.
///
/// Ranges are half-open except the last, which includes full speed.
pub fn notch_from_speed(speed: u8, bounds: &[u8]) -> usize {
    bounds.iter().take_while(|&&b| speed >= b).count()
}

/// Check a notch table: `1..=8` levels and strictly increasing bounds, one
/// fewer than the level count.
///
/// # Errors
///
/// Returns a validation error describing the first problem found.
pub fn validate_notch_table(count: usize, bounds: &[u8]) -> PfxResult<()> {
    if !(1..=MAX_NOTCHES).contains(&count) {
        return Err(ValidationError::out_of_range("notch count", count, 1, MAX_NOTCHES).into());
    }
    if bounds.len() + 1 != count {
        return Err(ValidationError::constraint(format!(
            "{count} notches need {} bounds, got {}",
            count - 1,
            bounds.len()
        ))
        .into());
    }
    if bounds.windows(2).any(|w| matches!(*w, [a, b] if a >= b)) {
        return Err(ValidationError::constraint(format!(
            "notch bounds {bounds:?} are not strictly increasing"
        ))
        .into());
    }
    Ok(())
}

/// A speed change amount as written in a profile: `"10%"`, `0.1` or `10`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepAmount {
    Percent(i64),
    Fraction(f64),
    Text(String),
}

impl StepAmount {
    /// Whole percentage the amount stands for.
    ///
    /// # Errors
    ///
    /// Returns a validation error for text that is not an integer with an
    /// optional `%`.
    pub fn percent(&self) -> PfxResult<i64> {
        match self {
            Self::Percent(p) => Ok(*p),
            Self::Fraction(f) => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "fractions truncate toward zero like integer percent"
                )]
                let pct = (f * 100.0).trunc() as i64;
                Ok(pct)
            }
            Self::Text(s) => s.replace('%', "").trim().parse::<i64>().map_err(|e| {
                ValidationError::constraint(format!("speed amount '{s}' is not a percentage: {e}"))
                    .into()
            }),
        }
    }

    /// Firmware step code for the amount.
    ///
    /// # Errors
    ///
    /// Propagates [`StepAmount::percent`] failures.
    pub fn motor_step(&self) -> PfxResult<u8> {
        self.percent().map(map_pct_to_motor_step)
    }
}

impl fmt::Display for StepAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Fraction(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Quantize a percentage into the firmware's 0-9 speed step codes.
pub fn map_pct_to_motor_step(pct: i64) -> u8 {
    const STEPS: [(i64, u8); 9] = [
        (33, 9),
        (25, 8),
        (20, 7),
        (10, 6),
        (6, 5),
        (5, 4),
        (3, 3),
        (2, 2),
        (1, 1),
    ];
    STEPS
        .iter()
        .find(|(threshold, _)| pct >= *threshold)
        .map_or(0, |&(_, step)| step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        assert_eq!(bounds_from_notchcount(4), vec![64, 128, 191]);
        assert_eq!(bounds_from_notchcount(2), vec![128]);
        assert!(bounds_from_notchcount(1).is_empty());
        assert_eq!(bounds_from_notchcount(5).len(), 4);
    }

    #[test]
    fn test_ranges() {
        let ranges: Vec<(u8, u8, u8)> = notch_ranges_from_bounds(&[64, 128, 191])
            .into_iter()
            .map(Into::into)
            .collect();
        assert_eq!(
            ranges,
            vec![(0, 32, 64), (64, 96, 128), (128, 160, 191), (191, 223, 255)]
        );
    }

    #[test]
    fn test_notch_lookup() {
        let b = [64, 128, 191];
        assert_eq!(notch_from_speed(10, &b), 0);
        assert_eq!(notch_from_speed(64, &b), 1);
        assert_eq!(notch_from_speed(165, &b), 2);
        assert_eq!(notch_from_speed(192, &b), 3);
        assert_eq!(notch_from_speed(255, &b), 3);
        assert_eq!(notch_from_speed(200, &[]), 0);
    }

    #[test]
    fn test_step_thresholds() {
        let cases = [
            (50, 9),
            (33, 9),
            (32, 8),
            (25, 8),
            (20, 7),
            (15, 6),
            (10, 6),
            (7, 5),
            (6, 5),
            (5, 4),
            (4, 3),
            (3, 3),
            (2, 2),
            (1, 1),
            (0, 0),
            (-5, 0),
        ];
        for (pct, step) in cases {
            assert_eq!(map_pct_to_motor_step(pct), step, "pct {pct}");
        }
    }

    #[test]
    fn test_step_amount_forms() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(StepAmount::Text("10%".into()).motor_step()?, 6);
        assert_eq!(StepAmount::Fraction(0.25).motor_step()?, 8);
        assert_eq!(StepAmount::Fraction(0.029).motor_step()?, 2);
        assert_eq!(StepAmount::Percent(3).motor_step()?, 3);
        assert!(StepAmount::Text("fast".into()).motor_step().is_err());
        Ok(())
    }

    #[test]
    fn test_validate_table() {
        assert!(validate_notch_table(4, &[64, 128, 191]).is_ok());
        assert!(validate_notch_table(1, &[]).is_ok());
        assert!(validate_notch_table(0, &[]).is_err());
        assert!(validate_notch_table(9, &[0; 8]).is_err());
        assert!(validate_notch_table(3, &[64]).is_err());
        assert!(validate_notch_table(3, &[128, 64]).is_err());
    }
}
