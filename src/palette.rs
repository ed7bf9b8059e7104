use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// ARGB colors a presentation layer tints the usage indicator with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationColors {
    pub normal:  u32,
    pub warning: u32,
}

impl Default for ClassificationColors {
    fn default() -> Self {
        Self { normal: 0xFF33_B5E5, warning: 0xFFFF_4444 }
    }
}

impl ClassificationColors {
    pub fn pick(&self, is_warning: bool) -> u32 {
        if is_warning { self.warning } else { self.normal }
    }
}

static COLORS: OnceLock<ClassificationColors> = OnceLock::new();

/// Store the process-wide colors. Only the first call has any effect: later
/// calls return the pair already stored, even if `colors` differs, so a
/// config reload at runtime does not recolor anything.
pub fn init(colors: ClassificationColors) -> &'static ClassificationColors {
    COLORS.get_or_init(|| colors)
}
