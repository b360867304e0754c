//! Per-category building presentation.
//!
//! The registry is owned by whoever owns the visual sync and passed in
//! explicitly; styles are built on first use and kept for the registry's lifetime.

use std::collections::HashMap;

use bevy::prelude::*;

use simulation::snapshot::BuildingCategory;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualStyle {
    pub color: Color,
    /// Node width in tiles.
    pub scale: f32,
    /// Extra height in elevation units above the footprint.
    pub height: f32,
    /// Painter offset added after `x + y + elevation`.
    pub z_offset: f32,
    pub casts_shadow: bool,
}

impl VisualStyle {
    pub fn for_category(category: BuildingCategory) -> Self {
        let color = match category {
            BuildingCategory::Farm => Color::srgb(0.78, 0.70, 0.30),
            BuildingCategory::Mine => Color::srgb(0.45, 0.40, 0.38),
            BuildingCategory::Factory => Color::srgb(0.60, 0.35, 0.25),
            BuildingCategory::Warehouse => Color::srgb(0.55, 0.50, 0.42),
            BuildingCategory::Residential => Color::srgb(0.30, 0.70, 0.35),
            BuildingCategory::Commercial => Color::srgb(0.25, 0.45, 0.85),
            BuildingCategory::Office => Color::srgb(0.40, 0.55, 0.75),
            BuildingCategory::Utility => Color::srgb(0.85, 0.60, 0.20),
            BuildingCategory::Generic => Color::srgb(0.70, 0.70, 0.70),
        };
        let height = match category {
            BuildingCategory::Farm => 1.0,
            BuildingCategory::Office => 6.0,
            BuildingCategory::Factory | BuildingCategory::Commercial => 4.0,
            _ => 2.5,
        };
        let order = BuildingCategory::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or(0);
        Self {
            color,
            scale: category.footprint_scale(),
            height,
            z_offset: 0.5 + order as f32 * 0.01,
            casts_shadow: category.footprint_size() >= 2,
        }
    }
}

#[derive(Debug, Default)]
pub struct StyleRegistry {
    styles: HashMap<BuildingCategory, VisualStyle>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Style for `category`, building it on first request.
    pub fn get(&mut self, category: BuildingCategory) -> VisualStyle {
        *self
            .styles
            .entry(category)
            .or_insert_with(|| VisualStyle::for_category(category))
    }

    /// Number of styles built so far.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_populates_lazily() {
        let mut registry = StyleRegistry::new();
        assert!(registry.is_empty());
        let farm = registry.get(BuildingCategory::Farm);
        registry.get(BuildingCategory::Farm);
        assert_eq!(registry.len(), 1);
        assert_eq!(farm.scale, 3.0);
        assert!(farm.casts_shadow);
        assert!(!registry.get(BuildingCategory::Office).casts_shadow);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_category_offsets_stay_below_one() {
        for category in BuildingCategory::ALL {
            let style = VisualStyle::for_category(category);
            assert!(style.z_offset >= 0.5 && style.z_offset < 1.0);
            assert_eq!(style.scale, category.footprint_scale());
        }
    }
}
