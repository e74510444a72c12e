use nalgebra::Point2;

/// A detected point of interest: position, scale, orientation and strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub pt: Point2<f32>,
    /// diameter of the meaningful neighborhood
    pub size: f32,
    /// orientation in degrees, `-1` if not computed
    pub angle: f32,
    pub response: f32,
    /// pyramid level the keypoint was extracted from
    pub octave: i32,
    /// `-1` if unclassified
    pub class_id: i32,
}

impl Default for Keypoint {
    fn default() -> Self {
        Self {
            pt: Point2::origin(),
            size: 0.0,
            angle: -1.0,
            response: 0.0,
            octave: 0,
            class_id: -1,
        }
    }
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            pt: Point2::new(x, y),
            size,
            ..Default::default()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn with_octave(mut self, octave: i32) -> Self {
        self.octave = octave;
        self
    }

    pub fn with_class_id(mut self, class_id: i32) -> Self {
        self.class_id = class_id;
        self
    }

    /// Multi-line description shown when hovering a keypoint marker.
    /// `display_id` is the 1-based index of the keypoint in its record.
    pub fn info(&self, display_id: usize) -> String {
        format!(
            "ID = {}\nResponse = {}\nAngle = {}\nX = {}\nY = {}\nSize = {}",
            display_id, self.response, self.angle, self.pt.x, self.pt.y, self.size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_use_sentinels() {
        let kp = Keypoint::new(3.0, 4.0, 7.0);
        assert_eq!(kp.angle, -1.0);
        assert_eq!(kp.class_id, -1);
        assert_eq!(kp.octave, 0);
    }

    #[test]
    fn info_lists_every_displayed_field() {
        let kp = Keypoint::new(10.5, 20.0, 14.0)
            .with_response(0.25)
            .with_angle(90.0);
        assert_eq!(
            kp.info(3),
            "ID = 3\nResponse = 0.25\nAngle = 90\nX = 10.5\nY = 20\nSize = 14"
        );
    }
}
