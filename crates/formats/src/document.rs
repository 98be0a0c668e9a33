use foundation::math::GeoCoord;

/// `<Point>` payload. Coordinates stay in their source text until extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointGeometry {
    pub altitude_mode: String,
    pub coordinates: String,
}

impl PointGeometry {
    pub fn is_empty(&self) -> bool {
        self.coordinates.trim().is_empty()
    }

    /// First tuple of the coordinate list.
    pub fn position(&self) -> Result<GeoCoord, String> {
        let first = self
            .coordinates
            .split_whitespace()
            .next()
            .ok_or("Point has no coordinates".to_string())?;
        GeoCoord::parse(first)
    }
}

/// `<LineString>` payload. Only the first two tuples are rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry {
    pub altitude_mode: String,
    pub coordinates: String,
}

impl LineGeometry {
    pub fn is_empty(&self) -> bool {
        self.coordinates.trim().is_empty()
    }

    pub fn endpoints(&self) -> Result<(GeoCoord, GeoCoord), String> {
        let mut tuples = self.coordinates.split_whitespace();
        let (Some(a), Some(b)) = (tuples.next(), tuples.next()) else {
            return Err("LineString needs two coordinate tuples".to_string());
        };
        Ok((GeoCoord::parse(a)?, GeoCoord::parse(b)?))
    }
}

/// `<gx:Track>` payload: parallel `<when>` and `<gx:coord>` lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackGeometry {
    pub altitude_mode: String,
    pub whens: Vec<String>,
    pub coords: Vec<String>,
}

impl TrackGeometry {
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// All positions in document order. One malformed entry fails the track.
    pub fn positions(&self) -> Result<Vec<GeoCoord>, String> {
        self.coords.iter().map(|c| GeoCoord::parse(c)).collect()
    }
}

/// One folder of the normalized document hierarchy.
///
/// Containers and placemarks share this shape: a node may carry geometry,
/// children, or both, but only geometry on leaves is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    pub name: String,
    pub description: String,
    pub visible: bool,
    pub style_id: String,
    pub point: Option<PointGeometry>,
    pub line: Option<LineGeometry>,
    pub track: Option<TrackGeometry>,
    pub children: Vec<DocumentNode>,
}

impl Default for DocumentNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            visible: true,
            style_id: String::new(),
            point: None,
            line: None,
            track: None,
            children: Vec::new(),
        }
    }
}

impl DocumentNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn has_geometry(&self) -> bool {
        self.point.as_ref().is_some_and(|p| !p.is_empty())
            || self.line.as_ref().is_some_and(|l| !l.is_empty())
            || self.track.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Number of leaves in this subtree (a leaf counts itself).
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(DocumentNode::leaf_count).sum()
    }
}

/// A loaded document. The root is the outermost folder after the `kml`
/// wrapper has been stripped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: DocumentNode,
}

impl Document {
    pub fn new(root: DocumentNode) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &DocumentNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty() && !self.root.has_geometry()
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentNode, LineGeometry, PointGeometry, TrackGeometry};
    use foundation::math::GeoCoord;

    #[test]
    fn line_endpoints_take_first_two_tuples() {
        let line = LineGeometry {
            altitude_mode: String::new(),
            coordinates: "1,2,3 4,5,6 7,8,9".to_string(),
        };
        let (a, b) = line.endpoints().unwrap();
        assert_eq!(a, GeoCoord::new(1.0, 2.0, 3.0));
        assert_eq!(b, GeoCoord::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn line_with_one_tuple_is_an_error() {
        let line = LineGeometry {
            altitude_mode: String::new(),
            coordinates: "1,2,3".to_string(),
        };
        assert!(line.endpoints().is_err());
    }

    #[test]
    fn point_reads_first_tuple() {
        let point = PointGeometry {
            altitude_mode: "absolute".to_string(),
            coordinates: " 10,20,30 ".to_string(),
        };
        assert_eq!(point.position().unwrap(), GeoCoord::new(10.0, 20.0, 30.0));
        assert!(PointGeometry::default().position().is_err());
        assert!(PointGeometry::default().is_empty());
    }

    #[test]
    fn track_positions_accept_both_tuple_forms() {
        let track = TrackGeometry {
            altitude_mode: String::new(),
            whens: vec!["2020-01-01T00:00:00Z".to_string()],
            coords: vec!["1,2,3".to_string(), "4 5 6".to_string()],
        };
        let positions = track.positions().unwrap();
        assert_eq!(
            positions,
            vec![GeoCoord::new(1.0, 2.0, 3.0), GeoCoord::new(4.0, 5.0, 6.0)]
        );
    }

    #[test]
    fn leaf_count_and_geometry_flags() {
        let mut leaf = DocumentNode::named("leaf");
        assert!(!leaf.has_geometry());
        leaf.point = Some(PointGeometry {
            altitude_mode: String::new(),
            coordinates: "0,0,0".to_string(),
        });
        assert!(leaf.has_geometry());

        let tree = DocumentNode::named("root")
            .with_child(leaf)
            .with_child(DocumentNode::named("folder").with_child(DocumentNode::named("a")));
        assert_eq!(tree.leaf_count(), 2);
        assert!(!tree.is_leaf());
    }
}
