//! Nearest-neighbour cross-match between detections and catalog stars.

use flipp_core::detection::Detection;
use flipp_refcat::ReferenceStar;

/// For each detection, the index of its nearest star within `tolerance_deg`
/// by true angular separation. Detections with no star in range are left
/// out; a star may serve several detections.
#[must_use]
pub fn nearest_within(
    detections: &[Detection],
    stars: &[ReferenceStar],
    tolerance_deg: f64,
) -> Vec<(usize, usize)> {
    detections
        .iter()
        .enumerate()
        .filter_map(|(d, detection)| {
            let position = detection.position();
            stars
                .iter()
                .enumerate()
                .map(|(s, star)| (s, position.separation_deg(&star.position())))
                .filter(|(_, sep)| *sep <= tolerance_deg)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(s, _)| (d, s))
        })
        .collect()
}
