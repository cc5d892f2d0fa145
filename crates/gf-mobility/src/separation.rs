//! Short-range repulsion between nearby agents.
//!
//! Purely cosmetic: the vector produced here only bends an agent's sub-cell
//! motion sideways.  Cell selection and claims never see it.

use glam::Vec2;

/// Inverse-distance-weighted push away from every neighbor closer than
/// `radius`.
///
/// Each neighbor at distance `d` contributes a unit vector pointing away from
/// it scaled by `1 / d`.  Neighbors at exactly `position` are skipped since
/// they have no defined direction.  Returns zero when `radius <= 0`.
pub fn repulsion<I>(position: Vec2, neighbors: I, radius: f32) -> Vec2
where
    I: IntoIterator<Item = Vec2>,
{
    if !(radius > 0.0) {
        return Vec2::ZERO;
    }
    let radius_sq = radius * radius;

    let mut push = Vec2::ZERO;
    for other in neighbors {
        let away = position - other;
        let dist_sq = away.length_squared();
        if dist_sq <= f32::EPSILON || dist_sq >= radius_sq {
            continue;
        }
        // away / |away| * 1 / |away|
        push += away / dist_sq;
    }
    push
}

/// Component of `steer` perpendicular to the unit vector `heading`, capped
/// at length 1.
#[inline]
pub fn lateral(steer: Vec2, heading: Vec2) -> Vec2 {
    (steer - heading * steer.dot(heading)).clamp_length_max(1.0)
}
