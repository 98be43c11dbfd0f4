//! Octahedral unit-vector encoding
//!
//! All functions follow "A Survey of Efficient Representations for Independent
//! Unit Vectors" (Cigolle et al., JCGT 2014). Directions are folded onto the
//! octahedron and unfolded onto the `[-1, 1]²` square; the z component of the
//! returned `Vec3` is always zero for encoded values.

use glam::Vec3;

use crate::bits::low_mask;

/// Per-axis sign with zero treated as positive. Leaves z as 1.
#[inline]
fn sign_not_zero(v: Vec3) -> Vec3 {
    Vec3::new(
        if v.x >= 0.0 { 1.0 } else { -1.0 },
        if v.y >= 0.0 { 1.0 } else { -1.0 },
        1.0,
    )
}

/// Encode a normalized direction to octahedral coordinates in `[-1, 1]²`
#[inline]
pub fn float32x3_to_oct(v: Vec3) -> Vec3 {
    // Project the sphere onto the octahedron, then onto the xy plane
    let p = Vec3::new(v.x, v.y, 0.0) * (1.0 / (v.x.abs() + v.y.abs() + v.z.abs()));

    // Reflect the folds of the lower hemisphere over the diagonals
    if v.z <= 0.0 {
        Vec3::new(1.0 - p.y.abs(), 1.0 - p.x.abs(), 0.0) * sign_not_zero(p)
    } else {
        p
    }
}

/// Decode octahedral coordinates back to a normalized direction
#[inline]
pub fn oct_to_float32x3(e: Vec3) -> Vec3 {
    let mut v = Vec3::new(e.x, e.y, 1.0 - e.x.abs() - e.y.abs());
    if v.z < 0.0 {
        v = Vec3::new(1.0 - v.y.abs(), 1.0 - v.x.abs(), v.z) * sign_not_zero(v);
    }
    v.normalize()
}

/// Largest snorm value for `n / 2` bits per axis, as a float
#[inline]
fn snorm_max(n: u32) -> f32 {
    debug_assert!((4..=32).contains(&n) && n % 2 == 0, "invalid oct bit count {n}");
    ((1u32 << (n / 2 - 1)) - 1) as f32
}

/// Quantize `v` to `n` total bits (`n / 2` per axis) with minimal angular error.
///
/// Floor-snaps the projected coordinates, then tries the three remaining
/// floor/ceil combinations and keeps whichever decodes closest to `v`.
/// The result is still in float form, on the snorm grid.
pub fn float32x3_to_octn_precise(v: Vec3, n: u32) -> Vec3 {
    let m = snorm_max(n);

    let s = float32x3_to_oct(v);
    let s = (s.clamp(Vec3::splat(-1.0), Vec3::splat(1.0)) * m).floor() * (1.0 / m);
    let s = Vec3::new(s.x, s.y, 0.0);

    let mut best = s;
    let mut highest_cosine = oct_to_float32x3(s).dot(v);

    // At +/-1 a ceil step leaves the square; that encoding is never closer.
    for i in 0..=1 {
        for j in 0..=1 {
            if i == 0 && j == 0 {
                continue;
            }
            let candidate = Vec3::new(i as f32, j as f32, 0.0) * (1.0 / m) + s;
            let cosine = oct_to_float32x3(candidate).dot(v);
            if cosine > highest_cosine {
                best = candidate;
                highest_cosine = cosine;
            }
        }
    }

    best
}

/// Plain floor quantization to the same grid as [`float32x3_to_octn_precise`]
pub fn float32x3_to_octn_floor(v: Vec3, n: u32) -> Vec3 {
    let m = snorm_max(n);
    let s = float32x3_to_oct(v);
    let s = (s.clamp(Vec3::splat(-1.0), Vec3::splat(1.0)) * m).floor() * (1.0 / m);
    Vec3::new(s.x, s.y, 0.0)
}

/// Convert grid-aligned octahedral coordinates to two `n / 2`-bit snorm fields.
///
/// Fields are two's complement, truncated to `n / 2` bits, ready for
/// [`crate::bits::pack`].
pub fn encode_oct_snorm(e: Vec3, n: u32) -> (u32, u32) {
    let m = snorm_max(n);
    let mask = low_mask(n / 2);
    let x = (e.x * m).round().clamp(-m, m) as i32;
    let y = (e.y * m).round().clamp(-m, m) as i32;
    (x as u32 & mask, y as u32 & mask)
}

/// Inverse of [`encode_oct_snorm`], returns the decoded direction
pub fn decode_oct_snorm(x: u32, y: u32, n: u32) -> Vec3 {
    let m = snorm_max(n);
    let half = n / 2;
    let sign_extend = |raw: u32| -> f32 { (((raw << (32 - half)) as i32) >> (32 - half)) as f32 };
    let e = Vec3::new(
        (sign_extend(x) / m).max(-1.0),
        (sign_extend(y) / m).max(-1.0),
        0.0,
    );
    oct_to_float32x3(e)
}
