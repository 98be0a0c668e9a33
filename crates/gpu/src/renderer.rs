use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::VertexBuffer;
use crate::mesh::GlobeMeshes;

/// Per-layer visibility switches, read every frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerToggles {
    pub show_earth: bool,
    pub show_lines: bool,
    pub show_points: bool,
    pub show_orbits: bool,
    pub enable_blending: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            show_earth: true,
            show_lines: true,
            show_points: true,
            show_orbits: true,
            enable_blending: true,
        }
    }
}

impl LayerToggles {
    pub fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Earth => self.show_earth,
            Layer::Lines => self.show_lines,
            Layer::Points => self.show_points,
            Layer::Orbits => self.show_orbits,
            Layer::Blending => self.enable_blending,
        }
    }

    pub fn set(&mut self, layer: Layer, on: bool) {
        let flag = match layer {
            Layer::Earth => &mut self.show_earth,
            Layer::Lines => &mut self.show_lines,
            Layer::Points => &mut self.show_points,
            Layer::Orbits => &mut self.show_orbits,
            Layer::Blending => &mut self.enable_blending,
        };
        *flag = on;
    }
}

impl fmt::Display for LayerToggles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in Layer::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let state = if self.get(*layer) { "on" } else { "off" };
            write!(f, "{layer} {state}")?;
        }
        Ok(())
    }
}

/// One switch of [`LayerToggles`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Layer {
    Earth,
    Lines,
    Points,
    Orbits,
    Blending,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Earth,
        Layer::Lines,
        Layer::Points,
        Layer::Orbits,
        Layer::Blending,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Earth => "earth",
            Layer::Lines => "lines",
            Layer::Points => "points",
            Layer::Orbits => "orbits",
            Layer::Blending => "blending",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.name() == s)
            .ok_or_else(|| format!("unknown layer {s:?}; expected earth, lines, points, orbits or blending"))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshId {
    Earth,
    Clouds,
}

/// One draw call against either a globe mesh or the shared vertex buffer.
/// `first` and `count` are in vertices.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Triangles { mesh: MeshId, index_count: u32 },
    Lines { first: u32, count: u32 },
    Points { first: u32, count: u32 },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawPlan {
    pub calls: Vec<DrawCall>,
}

impl DrawPlan {
    /// Orders the frame's draw calls: earth, lines, points, orbits and finally
    /// the translucent cloud shell.
    pub fn build(buffer: &VertexBuffer, globe: &GlobeMeshes, toggles: LayerToggles) -> Self {
        let mut plan = Self::default();
        let ranges = buffer.vertex_ranges();

        if toggles.show_earth {
            plan.calls.push(DrawCall::Triangles {
                mesh: MeshId::Earth,
                index_count: globe.earth.index_count(),
            });
        }
        if toggles.show_lines && !ranges.lines.is_empty() {
            plan.calls.push(DrawCall::Lines {
                first: ranges.lines.start,
                count: ranges.lines.end - ranges.lines.start,
            });
        }
        if toggles.show_points && !ranges.points.is_empty() {
            plan.calls.push(DrawCall::Points {
                first: ranges.points.start,
                count: ranges.points.end - ranges.points.start,
            });
        }
        if toggles.show_orbits && !ranges.orbits.is_empty() {
            plan.calls.push(DrawCall::Lines {
                first: ranges.orbits.start,
                count: ranges.orbits.end - ranges.orbits.start,
            });
        }
        if toggles.show_earth && toggles.enable_blending {
            plan.calls.push(DrawCall::Triangles {
                mesh: MeshId::Clouds,
                index_count: globe.clouds.index_count(),
            });
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawCall, DrawPlan, Layer, LayerToggles, MeshId};
    use crate::buffer::VertexBuffer;
    use crate::mesh::GlobeMeshes;
    use pretty_assertions::assert_eq;

    fn floats(vertices: usize) -> Vec<f32> {
        vec![0.5; vertices * 6]
    }

    #[test]
    fn full_plan_orders_layers() {
        let globe = GlobeMeshes::new(1);
        let buffer = VertexBuffer::assemble(&floats(2), &floats(1), &floats(4));
        let plan = DrawPlan::build(&buffer, &globe, LayerToggles::default());

        let index_count = globe.earth.index_count();
        assert_eq!(
            plan.calls,
            vec![
                DrawCall::Triangles {
                    mesh: MeshId::Earth,
                    index_count,
                },
                DrawCall::Lines { first: 0, count: 2 },
                DrawCall::Points { first: 2, count: 1 },
                DrawCall::Lines { first: 3, count: 4 },
                DrawCall::Triangles {
                    mesh: MeshId::Clouds,
                    index_count,
                },
            ]
        );
    }

    #[test]
    fn empty_ranges_issue_no_calls() {
        let globe = GlobeMeshes::new(1);
        let toggles = LayerToggles {
            show_earth: false,
            ..LayerToggles::default()
        };
        let plan = DrawPlan::build(&VertexBuffer::empty(), &globe, toggles);
        assert!(plan.is_empty());
    }

    #[test]
    fn clouds_need_earth_and_blending() {
        let globe = GlobeMeshes::new(1);
        let toggles = LayerToggles {
            enable_blending: false,
            ..LayerToggles::default()
        };
        let plan = DrawPlan::build(&VertexBuffer::empty(), &globe, toggles);
        assert_eq!(plan.calls.len(), 1);
        assert!(matches!(
            plan.calls[0],
            DrawCall::Triangles {
                mesh: MeshId::Earth,
                ..
            }
        ));
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let globe = GlobeMeshes::new(1);
        let buffer = VertexBuffer::assemble(&floats(2), &floats(1), &floats(2));
        let toggles = LayerToggles {
            show_earth: false,
            show_lines: false,
            show_points: true,
            show_orbits: false,
            enable_blending: true,
        };
        let plan = DrawPlan::build(&buffer, &globe, toggles);
        assert_eq!(plan.calls, vec![DrawCall::Points { first: 2, count: 1 }]);
    }

    #[test]
    fn layers_parse_and_switch() {
        let mut toggles = LayerToggles::default();
        for layer in Layer::ALL {
            assert_eq!(layer.name().parse::<Layer>(), Ok(layer));
            toggles.set(layer, false);
            assert!(!toggles.get(layer));
        }
        assert!("clouds".parse::<Layer>().is_err());

        toggles.set(Layer::Orbits, true);
        assert_eq!(
            toggles.to_string(),
            "earth off, lines off, points off, orbits on, blending off"
        );
    }
}
