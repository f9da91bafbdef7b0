//! Raster ground control point support

use crate::errors::Result;
use crate::Dataset;

/// A ground control point, tying a raster position to a georeferenced location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gcp {
    /// Unique identifier, often numeric.
    pub id: String,
    /// Informational message or an empty string.
    pub info: String,
    /// Pixel (x) location of the point, from the left edge of the image.
    pub pixel: f64,
    /// Line (y) location of the point, from the top edge of the image.
    pub line: f64,
    /// X position of the point in georeferenced space.
    pub x: f64,
    /// Y position of the point in georeferenced space.
    pub y: f64,
    /// Elevation of the point, usually zero.
    pub z: f64,
}

impl Gcp {
    pub fn new(id: &str, pixel_line: (f64, f64), location: (f64, f64, f64)) -> Self {
        Gcp {
            id: id.to_string(),
            info: String::new(),
            pixel: pixel_line.0,
            line: pixel_line.1,
            x: location.0,
            y: location.1,
            z: location.2,
        }
    }
}

impl Dataset {
    /// The ground control points of this dataset, empty if none were set.
    pub fn gcps(&self) -> Vec<Gcp> {
        self.state.borrow().gcps.clone()
    }

    /// Get the projection definition string for the GCPs in this dataset.
    ///
    /// # Notes
    /// * This is separate and distinct from [`Dataset::projection`], and only applies to
    ///   the ground control points.
    pub fn gcp_projection(&self) -> Option<String> {
        self.state.borrow().gcp_projection.clone()
    }

    /// Replace the ground control points and their projection.
    ///
    /// An empty list clears both.
    pub fn set_gcps(&mut self, gcps: &[Gcp], projection: &str) -> Result<()> {
        let state = self.state.get_mut();
        state.gcps = gcps.to_vec();
        state.gcp_projection = (!gcps.is_empty()).then(|| projection.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Gcp;
    use crate::DriverManager;

    #[test]
    fn test_gcp_projection() {
        let driver = DriverManager::get_driver_by_name("MEM").unwrap();
        let mut dataset = driver.create(20, 10, 1).unwrap();
        assert!(dataset.gcps().is_empty());
        assert!(dataset.gcp_projection().is_none());

        let gcps = [
            Gcp::new("1", (0.0, 0.0), (-122.5, 37.8, 0.0)),
            Gcp::new("2", (19.0, 9.0), (-122.4, 37.7, 0.0)),
        ];
        dataset.set_gcps(&gcps, "EPSG:4326").unwrap();
        assert_eq!(dataset.gcps(), gcps);
        assert_eq!(dataset.gcp_projection().unwrap(), "EPSG:4326");
        // the dataset projection is independent
        assert!(dataset.projection().is_empty());

        dataset.set_gcps(&[], "EPSG:4326").unwrap();
        assert!(dataset.gcps().is_empty());
        assert!(dataset.gcp_projection().is_none());
    }
}
