use crate::tracker::Orientation;

/// Parse an `"azimuth, altitude"` pair in degrees, e.g. `"180.4028, 36.8355"`.
pub fn parse_pose(text: &str) -> Option<Orientation> {
    let parts: Vec<_> = text.split(',').map(|s| s.trim()).collect();
    if parts.len() != 2 {
        return None;
    }
    let azimuth: f64 = parts[0].parse().ok()?;
    let altitude: f64 = parts[1].parse().ok()?;
    if !azimuth.is_finite() || !(-90.0..=90.0).contains(&altitude) {
        return None;
    }
    Some(Orientation::from_degrees(azimuth, altitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pose() {
        let pose = parse_pose(" 180.4028 , 36.8355 ").unwrap();
        assert_eq!(pose, Orientation::from_degrees(180.4028, 36.8355));
        assert_eq!(parse_pose("0,-90"), Some(Orientation::from_degrees(0.0, -90.0)));
    }

    #[test]
    fn test_parse_pose_rejects_invalid() {
        assert_eq!(parse_pose("180.0"), None);
        assert_eq!(parse_pose("180, 36, 1"), None);
        assert_eq!(parse_pose("north, 10"), None);
        assert_eq!(parse_pose("10, 91"), None);
        assert_eq!(parse_pose("inf, 10"), None);
    }
}
