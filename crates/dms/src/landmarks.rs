//! Facial landmark types consumed from the vision pipeline

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Number of points in the 68-point face landmark layout
pub const LANDMARK_COUNT: usize = 68;

/// Landmark indices of the left eye (outer corner first, clockwise)
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];

/// Landmark indices of the right eye
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// 2-D image point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// The six landmarks of one eye: corner, two upper lid, corner, two lower lid
pub type EyePoints = [Point; 6];

/// Landmarks of a single detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct FaceLandmarks {
    points: Vec<Point>,
}

impl FaceLandmarks {
    /// Wrap a 68-point landmark set
    pub fn new(points: Vec<Point>) -> Result<Self, DmsError> {
        if points.len() != LANDMARK_COUNT {
            return Err(DmsError::LandmarkCount(points.len()));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn left_eye(&self) -> EyePoints {
        self.eye(LEFT_EYE)
    }

    pub fn right_eye(&self) -> EyePoints {
        self.eye(RIGHT_EYE)
    }

    fn eye(&self, indices: [usize; 6]) -> EyePoints {
        indices.map(|i| self.points[i])
    }
}

impl TryFrom<Vec<Point>> for FaceLandmarks {
    type Error = DmsError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<FaceLandmarks> for Vec<Point> {
    fn from(face: FaceLandmarks) -> Self {
        face.points
    }
}

/// Everything the landmark source produced for one video frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Detected faces; empty when nobody is in view
    #[serde(default)]
    pub faces: Vec<FaceLandmarks>,
}

impl LandmarkFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(face: FaceLandmarks) -> Self {
        Self { faces: vec![face] }
    }

    /// The face the monitor evaluates (first detection)
    pub fn primary_face(&self) -> Option<&FaceLandmarks> {
        self.faces.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed_face() -> FaceLandmarks {
        let points = (0..LANDMARK_COUNT)
            .map(|i| Point::new(i as f64, 0.0))
            .collect();
        FaceLandmarks::new(points).unwrap()
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_wrong_landmark_count() {
        let err = FaceLandmarks::new(vec![Point::default(); 5]).unwrap_err();
        assert!(matches!(err, DmsError::LandmarkCount(5)));
    }

    #[test]
    fn test_eye_extraction_uses_documented_indices() {
        let face = indexed_face();
        let left: Vec<f64> = face.left_eye().iter().map(|p| p.x).collect();
        let right: Vec<f64> = face.right_eye().iter().map(|p| p.x).collect();
        assert_eq!(left, vec![36.0, 37.0, 38.0, 39.0, 40.0, 41.0]);
        assert_eq!(right, vec![42.0, 43.0, 44.0, 45.0, 46.0, 47.0]);
    }

    #[test]
    fn test_frame_json_shape() {
        let face = indexed_face();
        let json = serde_json::to_string(&LandmarkFrame::single(face.clone())).unwrap();
        assert!(json.starts_with("{\"faces\":[[[0.0,0.0],[1.0,0.0]"));

        let parsed: LandmarkFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.primary_face(), Some(&face));

        let short = "{\"faces\":[[[0.0,0.0]]]}";
        assert!(serde_json::from_str::<LandmarkFrame>(short).is_err());
    }
}
