use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Reduce an azimuth into `[0, 2π)`.
pub fn wrap_positive(azimuth: f64) -> f64 {
    let wrapped = azimuth.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Reduce an azimuth into `(-2π, 0]`.
pub fn wrap_negative(azimuth: f64) -> f64 {
    let wrapped = -wrap_positive(-azimuth);
    if wrapped == 0.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed rotation taking `from` onto `to`, in `(-π, π]`.
pub fn signed_delta(to: f64, from: f64) -> f64 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// Unsigned distance between two azimuths around the circle, in `[0, π]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let delta = (a - b).abs() % TAU;
    delta.min(TAU - delta)
}

/// Fold an altitude that went past a pole back into `[-π/2, π/2]`.
///
/// A mount sweeping through the zenith keeps rising in sensor terms while it
/// actually descends on the opposite bearing, so an altitude of `π/2 + x`
/// becomes `π/2 - x` and the caller must rotate the azimuth by π. The second
/// tuple element reports whether that rotation is needed. The nadir is folded
/// the same way.
pub fn fold_altitude(altitude: f64) -> (f64, bool) {
    if (-FRAC_PI_2..=FRAC_PI_2).contains(&altitude) {
        return (altitude, false);
    }

    let reduced = signed_delta(altitude, 0.0);
    if reduced > FRAC_PI_2 {
        let folded = reduced - 2.0 * (reduced - FRAC_PI_2);
        (folded.min(FRAC_PI_2), true)
    } else if reduced < -FRAC_PI_2 {
        let folded = reduced - 2.0 * (reduced + FRAC_PI_2);
        (folded.max(-FRAC_PI_2), true)
    } else {
        (reduced, false)
    }
}
