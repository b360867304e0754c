//! Per-frame reconciliation of simulation entities into scene nodes.
//!
//! The sync owns one [`VisualEntity`] per qualifying entity, keyed by id.
//! Each call to [`VisualEntitySync::sync`]:
//! 1. collects the positioned, renderable, visible entities of the snapshot,
//! 2. destroys visuals whose entity left that set,
//! 3. creates missing visuals, replaces those whose category changed and
//!    pushes updates for the rest only when their node description changed.

use std::collections::{BTreeMap, HashSet};

use bevy::prelude::*;

use simulation::grid::TileGrid;
use simulation::snapshot::{BuildingCategory, EntityId, SimEntity, SimulationSnapshot};

use crate::coords::IsoProjection;
use crate::placement::{Footprint, Occupancy};
use crate::scene::{NodeKind, NodeSpec, SceneBackend};
use crate::style::{StyleRegistry, VisualStyle};

/// Fraction of the way a non-operational building is pulled toward grey.
pub const DESATURATION: f32 = 0.7;
/// Opacity multiplier for non-operational buildings.
pub const INACTIVE_ALPHA: f32 = 0.6;
const SHADOW_ALPHA: f32 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct VisualEntity<N> {
    pub entity_id: EntityId,
    pub node: N,
    pub shadow: Option<N>,
    pub category: BuildingCategory,
    pub footprint: Footprint,
    /// Anchor of the footprint centre in the world plane, elevation applied.
    pub last_screen_position: Vec2,
    last_spec: NodeSpec,
    last_shadow_spec: Option<NodeSpec>,
}

impl<N> VisualEntity<N> {
    pub fn spec(&self) -> &NodeSpec {
        &self.last_spec
    }
}

/// Counts of backend operations performed by one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub destroyed: usize,
    /// Entities that wanted a visual but could not be placed on the grid.
    pub skipped: usize,
}

/// Painter's order for something standing at grid `(x, y)`.
#[inline]
pub fn z_order(x: f32, y: f32, elevation: f32, offset: f32) -> f32 {
    x + y + elevation + offset
}

/// Tint applied on top of the style colour. Non-operational buildings are
/// pulled toward their own luminance and drawn more transparent.
pub fn presentation_color(base: Color, operational: bool, alpha: f32) -> Color {
    let mut c = base.to_srgba();
    if !operational {
        let luma = 0.299 * c.red + 0.587 * c.green + 0.114 * c.blue;
        c.red += (luma - c.red) * DESATURATION;
        c.green += (luma - c.green) * DESATURATION;
        c.blue += (luma - c.blue) * DESATURATION;
        c.alpha *= INACTIVE_ALPHA;
    }
    let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 1.0 };
    c.alpha *= alpha;
    Color::Srgba(c)
}

struct Placed {
    footprint: Footprint,
    screen: Vec2,
    spec: NodeSpec,
    shadow: Option<NodeSpec>,
}

#[derive(Debug)]
pub struct VisualEntitySync<N> {
    visuals: BTreeMap<EntityId, VisualEntity<N>>,
    styles: StyleRegistry,
}

impl<N: Copy + Eq + std::hash::Hash + std::fmt::Debug> VisualEntitySync<N> {
    pub fn new(styles: StyleRegistry) -> Self {
        Self {
            visuals: BTreeMap::new(),
            styles,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&VisualEntity<N>> {
        self.visuals.get(&id)
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisualEntity<N>> + '_ {
        self.visuals.values()
    }

    pub fn styles_mut(&mut self) -> &mut StyleRegistry {
        &mut self.styles
    }

    /// Reconcile the tracked visuals with `snapshot`.
    pub fn sync<B>(
        &mut self,
        snapshot: &SimulationSnapshot,
        grid: &TileGrid,
        projection: &IsoProjection,
        backend: &mut B,
    ) -> SyncStats
    where
        B: SceneBackend<Node = N>,
    {
        let mut stats = SyncStats::default();

        let mut wanted: BTreeMap<EntityId, &SimEntity> = BTreeMap::new();
        for entity in snapshot.entities.iter().filter(|e| e.wants_visual()) {
            let Some(pos) = entity.position else {
                continue;
            };
            if !grid.in_bounds(pos.x, pos.y) {
                debug!("Entity {} at {:?} is off the map, skipping", entity.id.0, pos);
                stats.skipped += 1;
                continue;
            }
            if wanted.insert(entity.id, entity).is_some() {
                debug!("Duplicate entity id {} in snapshot, keeping the last", entity.id.0);
            }
        }

        let gone: Vec<EntityId> = self
            .visuals
            .keys()
            .filter(|id| !wanted.contains_key(id))
            .copied()
            .collect();
        for id in gone {
            if let Some(visual) = self.visuals.remove(&id) {
                destroy_visual(backend, &visual);
                stats.destroyed += 1;
            }
        }

        for (id, entity) in wanted {
            let style = self.styles.get(entity.category);
            let Some(placed) = place(entity, &style, grid, projection) else {
                stats.skipped += 1;
                continue;
            };

            match self.visuals.get_mut(&id) {
                Some(visual) if visual.category == entity.category => {
                    if visual.last_spec != placed.spec {
                        backend.update_node(visual.node, &placed.spec);
                        visual.last_spec = placed.spec;
                        stats.updated += 1;
                    }
                    if visual.last_shadow_spec != placed.shadow {
                        if let (Some(node), Some(spec)) = (visual.shadow, placed.shadow.as_ref()) {
                            backend.update_node(node, spec);
                        }
                        visual.last_shadow_spec = placed.shadow;
                    }
                    visual.footprint = placed.footprint;
                    visual.last_screen_position = placed.screen;
                }
                existing => {
                    if let Some(old) = existing {
                        destroy_visual(backend, old);
                        stats.replaced += 1;
                    } else {
                        stats.created += 1;
                    }
                    let node = backend.create_node(&placed.spec);
                    let shadow = placed.shadow.as_ref().map(|s| backend.create_node(s));
                    self.visuals.insert(
                        id,
                        VisualEntity {
                            entity_id: id,
                            node,
                            shadow,
                            category: entity.category,
                            footprint: placed.footprint,
                            last_screen_position: placed.screen,
                            last_spec: placed.spec,
                            last_shadow_spec: placed.shadow,
                        },
                    );
                }
            }
        }

        stats
    }

    /// Destroy every visual, e.g. when the world is replaced.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: SceneBackend<Node = N>,
    {
        for visual in std::mem::take(&mut self.visuals).into_values() {
            destroy_visual(backend, &visual);
        }
    }

    /// Nodes currently owned, buildings and shadows.
    pub fn owned_nodes(&self) -> HashSet<N> {
        self.visuals
            .values()
            .flat_map(|v| std::iter::once(v.node).chain(v.shadow))
            .collect()
    }
}

impl<N> Occupancy for VisualEntitySync<N> {
    fn footprints(&self) -> impl Iterator<Item = (EntityId, Footprint)> + '_ {
        self.visuals.values().map(|v| (v.entity_id, v.footprint))
    }
}

fn destroy_visual<B: SceneBackend>(backend: &mut B, visual: &VisualEntity<B::Node>) {
    backend.destroy_node(visual.node);
    if let Some(shadow) = visual.shadow {
        backend.destroy_node(shadow);
    }
}

fn place(
    entity: &SimEntity,
    style: &VisualStyle,
    grid: &TileGrid,
    projection: &IsoProjection,
) -> Option<Placed> {
    let origin = entity.position?;
    let elevation = grid.elevation_at(origin.x, origin.y)? as f32;
    let footprint = Footprint::new(origin, entity.category.footprint_size());
    let centre = footprint.center();

    let screen = projection.elevated_to_screen(centre.x, centre.y, elevation);
    let z = z_order(centre.x, centre.y, elevation, style.z_offset);
    let tile = Vec2::new(
        projection.half_tile_width * 2.0,
        projection.half_tile_height * 2.0,
    );
    let lift = style.height * projection.elevation_unit;
    let base = tile * style.scale;

    let spec = NodeSpec {
        kind: NodeKind::Building,
        position: Vec2::new(screen.x, screen.y - lift * 0.5),
        z,
        size: Vec2::new(base.x, base.y + lift),
        color: presentation_color(style.color, entity.operational, entity.alpha),
    };
    let shadow = style.casts_shadow.then(|| NodeSpec {
        kind: NodeKind::Shadow,
        position: screen + Vec2::new(base.x * 0.12, base.y * 0.12),
        z: z - 0.05,
        size: base,
        color: Color::srgba(0.0, 0.0, 0.0, SHADOW_ALPHA * spec.color.to_srgba().alpha),
    });

    Some(Placed {
        footprint,
        screen,
        spec,
        shadow,
    })
}
