use std::{collections::BTreeMap, fmt::Display, sync::Arc};

/// Fill of days without any activity. Project colors are always saturated, so this never looks
/// like a quiet day of some project.
pub const EMPTY_COLOR: &str = "#21262d";

/// HSL color of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectColor {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Display for ProjectColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Color of a project, derived only from its name. Adding projects never changes the color of
/// existing ones.
pub fn project_color(project: &str) -> ProjectColor {
    let hash = fnv1a(project.as_bytes());
    ProjectColor {
        hue: (hash % 360) as u16,
        saturation: 55 + ((hash >> 32) % 20) as u8,
        lightness: 45 + ((hash >> 48) % 10) as u8,
    }
}

/// 64 bit FNV-1a. Hashers from std are allowed to change between releases, this one is fixed.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(PRIME)
    })
}

/// Every project shown in the graph with its color, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRegistry {
    projects: BTreeMap<Arc<str>, ProjectColor>,
}

impl ProjectRegistry {
    pub fn from_projects(projects: impl IntoIterator<Item = Arc<str>>) -> Self {
        Self {
            projects: projects
                .into_iter()
                .map(|v| {
                    let color = project_color(&v);
                    (v, color)
                })
                .collect(),
        }
    }

    pub fn color_of(&self, project: &str) -> Option<ProjectColor> {
        self.projects.get(project).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, ProjectColor)> {
        self.projects.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
