use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use tracing::warn;

/// `x, y, z, r, g, b`
pub const FLOATS_PER_VERTEX: usize = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColoredVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Vertex ranges of the three geometry kinds, in whole vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexRanges {
    pub lines: Range<u32>,
    pub points: Range<u32>,
    pub orbits: Range<u32>,
}

/// Flat upload buffer holding line vertices, then point vertices, then orbit
/// vertices. The two range ends are counted in floats and satisfy
/// `line_range_end <= point_range_end <= data.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBuffer {
    data: Vec<f32>,
    line_range_end: usize,
    point_range_end: usize,
}

impl VertexBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn assemble(lines: &[f32], points: &[f32], orbits: &[f32]) -> Self {
        let lines = whole_vertices(lines, "lines");
        let points = whole_vertices(points, "points");
        let orbits = whole_vertices(orbits, "orbits");

        let mut data = Vec::with_capacity(lines.len() + points.len() + orbits.len());
        data.extend_from_slice(lines);
        let line_range_end = data.len();
        data.extend_from_slice(points);
        let point_range_end = data.len();
        data.extend_from_slice(orbits);

        Self {
            data,
            line_range_end,
            point_range_end,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn line_range_end(&self) -> usize {
        self.line_range_end
    }

    pub fn point_range_end(&self) -> usize {
        self.point_range_end
    }

    pub fn lines(&self) -> &[f32] {
        &self.data[..self.line_range_end]
    }

    pub fn points(&self) -> &[f32] {
        &self.data[self.line_range_end..self.point_range_end]
    }

    pub fn orbits(&self) -> &[f32] {
        &self.data[self.point_range_end..]
    }

    pub fn vertex_count(&self) -> u32 {
        (self.data.len() / FLOATS_PER_VERTEX) as u32
    }

    pub fn vertex_ranges(&self) -> VertexRanges {
        let line_end = (self.line_range_end / FLOATS_PER_VERTEX) as u32;
        let point_end = (self.point_range_end / FLOATS_PER_VERTEX) as u32;
        VertexRanges {
            lines: 0..line_end,
            points: line_end..point_end,
            orbits: point_end..self.vertex_count(),
        }
    }

    pub fn vertices(&self) -> &[ColoredVertex] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

fn whole_vertices<'a>(stream: &'a [f32], kind: &str) -> &'a [f32] {
    let excess = stream.len() % FLOATS_PER_VERTEX;
    if excess != 0 {
        warn!("dropping {excess} trailing floats from the {kind} stream");
    }
    &stream[..stream.len() - excess]
}

#[cfg(test)]
mod tests {
    use super::{ColoredVertex, FLOATS_PER_VERTEX, VertexBuffer};
    use pretty_assertions::assert_eq;

    fn vertex(tag: f32) -> [f32; FLOATS_PER_VERTEX] {
        [tag, tag, tag, 1.0, 0.0, 0.0]
    }

    fn stream(tags: &[f32]) -> Vec<f32> {
        tags.iter().flat_map(|&t| vertex(t)).collect()
    }

    #[test]
    fn concatenates_in_kind_order() {
        let lines = stream(&[1.0, 2.0]);
        let points = stream(&[3.0]);
        let orbits = stream(&[4.0, 5.0, 6.0, 7.0]);
        let buffer = VertexBuffer::assemble(&lines, &points, &orbits);

        assert_eq!(buffer.line_range_end(), 12);
        assert_eq!(buffer.point_range_end(), 18);
        assert_eq!(buffer.len(), 42);
        assert_eq!(buffer.lines(), lines.as_slice());
        assert_eq!(buffer.points(), points.as_slice());
        assert_eq!(buffer.orbits(), orbits.as_slice());

        let ranges = buffer.vertex_ranges();
        assert_eq!(ranges.lines, 0..2);
        assert_eq!(ranges.points, 2..3);
        assert_eq!(ranges.orbits, 3..7);
    }

    #[test]
    fn empty_streams_give_empty_ranges() {
        let buffer = VertexBuffer::assemble(&[], &stream(&[1.0]), &[]);
        assert_eq!(buffer.line_range_end(), 0);
        assert_eq!(buffer.point_range_end(), 6);
        assert!(buffer.vertex_ranges().orbits.is_empty());

        let empty = VertexBuffer::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.vertex_count(), 0);
    }

    #[test]
    fn partial_records_are_dropped() {
        let mut lines = stream(&[1.0]);
        lines.push(9.0);
        let buffer = VertexBuffer::assemble(&lines, &[], &[]);
        assert_eq!(buffer.len(), FLOATS_PER_VERTEX);
        assert_eq!(buffer.len() % FLOATS_PER_VERTEX, 0);
    }

    #[test]
    fn typed_and_byte_views() {
        let buffer = VertexBuffer::assemble(&stream(&[2.0]), &[], &[]);
        assert_eq!(
            buffer.vertices(),
            &[ColoredVertex {
                position: [2.0, 2.0, 2.0],
                color: [1.0, 0.0, 0.0],
            }]
        );
        assert_eq!(buffer.as_bytes().len(), 24);
    }
}
