use std::collections::HashMap;

use rand::Rng;

pub const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Style id whose color is drawn at random on every lookup.
pub const PROCEDURAL_STYLE_ID: &str = "#webcam1";

const BUILTIN_STYLES: &[(&str, [f32; 3])] = &[
    ("red_line", [1.0, 0.0, 0.0]),
    ("green_line", [0.0, 1.0, 0.0]),
    ("blue_line", [0.0, 0.0, 1.0]),
    ("pink_line", [1.0, 0.0, 1.0]),
    ("cyan_line", [0.0, 1.0, 1.0]),
    ("purple_line", [0.5, 0.0, 1.0]),
    ("orange_line", [1.0, 0.5, 0.0]),
    ("yellow_line", [1.0, 1.0, 0.0]),
    ("shaded_dot", [1.0, 0.0, 0.5]),
];

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StyleColor {
    Fixed([f32; 3]),
    /// `(rand, 1.0, max(rand, 0.5))`
    Procedural,
}

impl StyleColor {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f32; 3] {
        match *self {
            StyleColor::Fixed(rgb) => rgb,
            StyleColor::Procedural => {
                let r: f32 = rng.r#gen();
                let b: f32 = rng.r#gen();
                [r, 1.0, b.max(0.5)]
            }
        }
    }
}

/// Maps `styleUrl` ids to colors. Unknown ids fall back to white.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    entries: HashMap<String, StyleColor>,
    default: [f32; 3],
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StyleTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            default: DEFAULT_COLOR,
        }
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (id, rgb) in BUILTIN_STYLES {
            table.insert(*id, StyleColor::Fixed(*rgb));
        }
        table.insert(PROCEDURAL_STYLE_ID, StyleColor::Procedural);
        table
    }

    pub fn insert(&mut self, id: impl Into<String>, color: StyleColor) -> Option<StyleColor> {
        self.entries.insert(id.into(), color)
    }

    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, StyleColor)>,
        S: Into<String>,
    {
        for (id, color) in overrides {
            self.insert(id, color);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tries the id verbatim, then without a leading `#`.
    pub fn lookup(&self, id: &str) -> Option<StyleColor> {
        if let Some(color) = self.entries.get(id) {
            return Some(*color);
        }
        id.strip_prefix('#')
            .and_then(|bare| self.entries.get(bare))
            .copied()
    }

    pub fn color(&self, id: &str) -> [f32; 3] {
        self.color_with(id, &mut rand::thread_rng())
    }

    pub fn color_with<R: Rng + ?Sized>(&self, id: &str, rng: &mut R) -> [f32; 3] {
        match self.lookup(id) {
            Some(color) => color.sample(rng),
            None => self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_COLOR, StyleColor, StyleTable};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builtin_colors() {
        let table = StyleTable::builtin();
        assert_eq!(table.color("red_line"), [1.0, 0.0, 0.0]);
        assert_eq!(table.color("purple_line"), [0.5, 0.0, 1.0]);
        assert_eq!(table.color("shaded_dot"), [1.0, 0.0, 0.5]);
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn hash_prefix_is_stripped_on_miss() {
        let table = StyleTable::builtin();
        assert_eq!(table.color("#orange_line"), [1.0, 0.5, 0.0]);
        assert_eq!(table.color("##orange_line"), DEFAULT_COLOR);
    }

    #[test]
    fn unknown_ids_are_white() {
        let table = StyleTable::builtin();
        assert_eq!(table.color("no_such_style"), DEFAULT_COLOR);
        assert_eq!(table.color(""), DEFAULT_COLOR);
    }

    #[test]
    fn procedural_color_stays_in_range() {
        let table = StyleTable::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..256 {
            let [r, g, b] = table.color_with("#webcam1", &mut rng);
            assert!((0.0..1.0).contains(&r));
            assert_eq!(g, 1.0);
            assert!((0.5..1.0).contains(&b));
        }
    }

    #[test]
    fn procedural_id_requires_its_hash() {
        let table = StyleTable::builtin();
        assert_eq!(table.lookup("webcam1"), None);
        assert_eq!(table.lookup("#webcam1"), Some(StyleColor::Procedural));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let table = StyleTable::builtin().with_overrides([
            ("red_line", StyleColor::Fixed([0.2, 0.2, 0.2])),
            ("beacon", StyleColor::Procedural),
        ]);
        assert_eq!(table.color("red_line"), [0.2, 0.2, 0.2]);
        assert_eq!(table.lookup("#beacon"), Some(StyleColor::Procedural));
    }
}
