use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Denominator for rates expressed in basis points (1 bp = 0.01%).
pub const BASIS_POINTS: u32 = 10_000;

/// Exact ratio `num / den` as Fixed64, clamped to [0, 1].
///
/// A zero denominator yields 0.
#[inline]
pub fn unit_ratio(num: u64, den: u64) -> Fixed64 {
    if den == 0 {
        return Fixed64::ZERO;
    }
    let num = num.min(den);
    // num <= den, so the quotient is at most 1 << 32 and fits the raw bits.
    let bits = ((num as u128) << Fixed64::FRAC_NBITS) / den as u128;
    Fixed64::from_bits(bits as i64)
}

/// Convert a basis-point rate to Fixed64 (10_000 bp == 1.0).
#[inline]
pub fn basis_points_to_fixed(bp: u32) -> Fixed64 {
    Fixed64::from_num(bp) / Fixed64::from_num(BASIS_POINTS)
}

/// `amount * bp / 10_000`, rounded half up. Computed in u128 so no
/// intermediate overflows.
#[inline]
pub fn apply_basis_points(amount: u64, bp: u32) -> u64 {
    let scaled = amount as u128 * bp as u128 + (BASIS_POINTS as u128 / 2);
    (scaled / BASIS_POINTS as u128) as u64
}

/// Convert Fixed64 to f64. Use only for display, never in the sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}
