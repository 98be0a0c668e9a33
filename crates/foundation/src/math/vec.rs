#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Narrows to the `f32` layout used by vertex buffers.
    pub fn to_f32_array(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::Vec3;

    #[test]
    fn dot_and_length() {
        let a = Vec3::new(1.0, 2.0, -1.0);
        let b = Vec3::new(0.5, -2.0, 3.0);
        assert_eq!(a.dot(b), -6.5);
        assert_eq!(Vec3::new(3.0, 0.0, 4.0).length(), 5.0);
    }

    #[test]
    fn narrows_to_f32() {
        assert_eq!(Vec3::new(3.0, 0.0, 4.0).to_f32_array(), [3.0f32, 0.0, 4.0]);
    }
}
