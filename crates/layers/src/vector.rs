use foundation::math::{GeoCoord, Vec3, project};
use formats::DocumentNode;
use gpu::{FLOATS_PER_VERTEX, VertexBuffer};
use scene::{Address, SceneSnapshot, SelectionIndex};
use tracing::debug;

use crate::symbology::StyleTable;

/// Interleaved `x, y, z, r, g, b` streams, one per geometry kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeometryStreams {
    pub lines: Vec<f32>,
    pub points: Vec<f32>,
    pub orbits: Vec<f32>,
}

impl GeometryStreams {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty() && self.orbits.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        (self.lines.len() + self.points.len() + self.orbits.len()) / FLOATS_PER_VERTEX
    }

    pub fn into_vertex_buffer(self) -> VertexBuffer {
        VertexBuffer::assemble(&self.lines, &self.points, &self.orbits)
    }
}

/// Turns selected document leaves into colored vertex streams.
#[derive(Debug, Clone, Default)]
pub struct GeometryExtractor {
    styles: StyleTable,
    point_latitude_bias_deg: f64,
}

impl GeometryExtractor {
    pub fn new(styles: StyleTable) -> Self {
        Self {
            styles,
            point_latitude_bias_deg: 0.0,
        }
    }

    /// Degrees added to the latitude of every point placemark.
    pub fn with_point_latitude_bias(mut self, deg: f64) -> Self {
        self.point_latitude_bias_deg = deg;
        self
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn point_latitude_bias_deg(&self) -> f64 {
        self.point_latitude_bias_deg
    }

    pub fn extract(&self, snapshot: &SceneSnapshot) -> GeometryStreams {
        self.extract_addresses(
            snapshot.document.root(),
            &snapshot.index,
            snapshot.selection.iter(),
        )
    }

    /// Resolves each address against `root` and appends its geometry in
    /// iteration order. Addresses that no longer resolve are skipped.
    pub fn extract_addresses<'a, I>(
        &self,
        root: &DocumentNode,
        index: &SelectionIndex,
        addresses: I,
    ) -> GeometryStreams
    where
        I: IntoIterator<Item = &'a Address>,
    {
        let mut out = GeometryStreams::default();
        let mut skipped = 0usize;
        for address in addresses {
            match index.resolve(root, address) {
                Some(node) => self.extract_node(node, &mut out),
                None => {
                    skipped += 1;
                    debug!("skipping unresolved address {address}");
                }
            }
        }
        debug!(
            lines = out.lines.len() / FLOATS_PER_VERTEX,
            points = out.points.len() / FLOATS_PER_VERTEX,
            orbits = out.orbits.len() / FLOATS_PER_VERTEX,
            skipped,
            "extracted geometry"
        );
        out
    }

    pub fn extract_node(&self, node: &DocumentNode, out: &mut GeometryStreams) {
        if let Some(line) = node.line.as_ref().filter(|l| !l.is_empty()) {
            match line.endpoints() {
                Ok((a, b)) => {
                    let rgb = self.styles.color(&node.style_id);
                    push_vertex(&mut out.lines, a.project(), rgb);
                    push_vertex(&mut out.lines, b.project(), rgb);
                }
                Err(e) => debug!("skipping line of {:?}: {e}", node.name),
            }
        }

        if let Some(point) = node.point.as_ref().filter(|p| !p.is_empty()) {
            match point.position() {
                Ok(p) => {
                    let rgb = self.styles.color(&node.style_id);
                    push_vertex(&mut out.points, self.project_point(p), rgb);
                }
                Err(e) => debug!("skipping point of {:?}: {e}", node.name),
            }
        }

        if let Some(track) = node.track.as_ref() {
            match track.positions() {
                Ok(positions) => {
                    let rgb = self.styles.color(&node.style_id);
                    let projected: Vec<Vec3> = positions.into_iter().map(GeoCoord::project).collect();
                    for p in closed_track(&projected) {
                        push_vertex(&mut out.orbits, p, rgb);
                    }
                }
                Err(e) => debug!("skipping track of {:?}: {e}", node.name),
            }
        }
    }

    fn project_point(&self, p: GeoCoord) -> Vec3 {
        project(p.lat_deg + self.point_latitude_bias_deg, p.lon_deg, p.alt_m)
    }
}

/// Line-list vertices drawing a closed loop through `positions`: the first
/// point once, every later point twice, then the first point again.
pub fn closed_track(positions: &[Vec3]) -> Vec<Vec3> {
    let Some(&first) = positions.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(2 * positions.len());
    out.push(first);
    for &p in &positions[1..] {
        out.push(p);
        out.push(p);
    }
    out.push(first);
    out
}

fn push_vertex(out: &mut Vec<f32>, p: Vec3, rgb: [f32; 3]) {
    out.extend_from_slice(&p.to_f32_array());
    out.extend_from_slice(&rgb);
}
