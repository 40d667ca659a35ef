//! Soft-body mesh builder
//!
//! Lays a `verts_x * verts_y` grid of nodes over the uploaded image and ties
//! them together with springs:
//! - structural: each node to its left and upper neighbor
//! - diagonal: up-left and up-right (optional)
//! - bend: two cells left and two cells up (optional)
//! - frame: the four corners joined along edges and diagonals (optional)
//! - pins: each corner held to its spawn point by a weak spring (optional)
//!
//! Nodes are stored row-major, so grid index `row * verts_x + col`.

use glam::Vec2;
use rand::Rng;

use super::world::{CollisionFilter, Node, SpringWorld};
use crate::error::MeshError;
use crate::renderer::MeshBuffers;
use crate::tuning::{MeshOptions, SpawnAt};

pub const MIN_VERTS: usize = 3;
pub const MAX_VERTS: usize = 64;

/// Node radius as a fraction of the smaller cell side
const RADIUS_FRACTION: f32 = 0.28;
const DIAGONAL_SCALE: f32 = 0.7;
const BEND_SCALE: f32 = 0.35;
const FRAME_SCALE: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Structural,
    Diagonal,
    Bend,
    Frame,
    Pin,
}

/// Mesh corners in `[top-left, top-right, bottom-left, bottom-right]` order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn is_top(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }
}

/// A spring created by the builder, in grid terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub kind: LinkKind,
    /// Grid index of the first end
    pub from: usize,
    /// Grid index of the second end; `None` for pins
    pub to: Option<usize>,
    /// Index of the spring in the world
    pub spring: usize,
}

/// Corner pin and the anchor it was created with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pin {
    pub corner: Corner,
    pub spring: usize,
    pub anchor: Vec2,
}

/// Display placement of the mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshLayout {
    pub verts_x: usize,
    pub verts_y: usize,
    /// Displayed size in world pixels
    pub display: Vec2,
    /// World pixels per image pixel
    pub scale: f32,
    /// World position of the top-left node at spawn
    pub origin: Vec2,
    pub cell: Vec2,
    pub radius: f32,
}

impl MeshLayout {
    /// Fit the image into the view and place it
    pub fn new(image: Vec2, view: Vec2, floor_y: f32, opts: &MeshOptions) -> Result<Self, MeshError> {
        if !(image.x > 0.0 && image.y > 0.0 && image.is_finite()) {
            return Err(MeshError::EmptyImage {
                width: image.x,
                height: image.y,
            });
        }
        if !(view.x > 0.0 && view.y > 0.0 && view.is_finite()) {
            return Err(MeshError::EmptyView {
                width: view.x,
                height: view.y,
            });
        }

        let verts_x = opts.verts_x.clamp(MIN_VERTS, MAX_VERTS);
        let verts_y = opts.verts_y.clamp(MIN_VERTS, MAX_VERTS);

        let scale = match opts.size_px {
            Some(px) => px / image.x.max(image.y),
            None => opts.scale_fit * (view.x / image.x).min(view.y / image.y),
        };
        let display = (image * scale).max(Vec2::ONE);
        let scale = display.x / image.x;

        let cell = Vec2::new(
            display.x / (verts_x - 1) as f32,
            display.y / (verts_y - 1) as f32,
        );
        let radius = RADIUS_FRACTION * cell.x.min(cell.y);

        let x = (view.x - display.x) / 2.0;
        let y = match opts.spawn_at {
            SpawnAt::Center => (view.y - display.y) / 2.0,
            SpawnAt::Floor => floor_y - radius - display.y,
        };

        Ok(Self {
            verts_x,
            verts_y,
            display,
            scale,
            origin: Vec2::new(x, y),
            cell,
            radius,
        })
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.verts_x + col
    }

    pub fn node_count(&self) -> usize {
        self.verts_x * self.verts_y
    }

    pub fn rest_position(&self, row: usize, col: usize) -> Vec2 {
        self.origin + Vec2::new(col as f32 * self.cell.x, row as f32 * self.cell.y)
    }

    pub fn corner(&self, corner: Corner) -> usize {
        let (last_row, last_col) = (self.verts_y - 1, self.verts_x - 1);
        match corner {
            Corner::TopLeft => self.index(0, 0),
            Corner::TopRight => self.index(0, last_col),
            Corner::BottomLeft => self.index(last_row, 0),
            Corner::BottomRight => self.index(last_row, last_col),
        }
    }
}

/// A jelly mesh living inside a `SpringWorld`
#[derive(Debug, Clone)]
pub struct SoftMesh {
    pub layout: MeshLayout,
    /// World index per grid index
    nodes: Vec<usize>,
    links: Vec<Link>,
    pins: Vec<Pin>,
    pub filter: CollisionFilter,
}

impl SoftMesh {
    /// Build the node grid and its springs inside `world`
    pub fn build<R: Rng + ?Sized>(
        world: &mut SpringWorld,
        image: Vec2,
        view: Vec2,
        floor_y: f32,
        opts: &MeshOptions,
        rng: &mut R,
    ) -> Result<Self, MeshError> {
        let layout = MeshLayout::new(image, view, floor_y, opts)?;
        let filter = world.next_negative_group();

        let mut nodes = Vec::with_capacity(layout.node_count());
        for row in 0..layout.verts_y {
            for col in 0..layout.verts_x {
                let node = Node::new(layout.rest_position(row, col), layout.radius)
                    .with_mass(opts.node_mass)
                    .with_restitution(opts.restitution)
                    .with_air_friction(opts.air_friction)
                    .with_filter(filter);
                nodes.push(world.add_node(node));
            }
        }

        let mut mesh = Self {
            layout,
            nodes,
            links: Vec::new(),
            pins: Vec::new(),
            filter,
        };
        mesh.add_springs(world, opts)?;
        if let Some(k) = opts.pin_stiffness {
            mesh.add_pins(world, k)?;
        }
        if opts.kick > 0.0 {
            let vx = rng.random_range(-0.5..=0.5) * opts.kick;
            for &n in &mesh.nodes {
                world.set_velocity(n, Vec2::new(vx, -opts.kick));
            }
        }

        log::info!(
            "Built {}x{} mesh: {} nodes, {} springs, {:.0}x{:.0}px",
            layout.verts_x,
            layout.verts_y,
            mesh.nodes.len(),
            mesh.links.len(),
            layout.display.x,
            layout.display.y
        );
        Ok(mesh)
    }

    fn link(
        &mut self,
        world: &mut SpringWorld,
        kind: LinkKind,
        from: usize,
        to: usize,
        stiffness: f32,
        damping: f32,
    ) -> Result<(), MeshError> {
        let spring = world.add_spring(self.nodes[from], self.nodes[to], stiffness, damping)?;
        self.links.push(Link {
            kind,
            from,
            to: Some(to),
            spring,
        });
        Ok(())
    }

    fn add_springs(&mut self, world: &mut SpringWorld, opts: &MeshOptions) -> Result<(), MeshError> {
        let layout = self.layout;
        let k = opts.stiffness;
        let d = opts.damping;

        for row in 0..layout.verts_y {
            for col in 0..layout.verts_x {
                let i = layout.index(row, col);
                if col > 0 {
                    self.link(world, LinkKind::Structural, i, layout.index(row, col - 1), k, d)?;
                }
                if row > 0 {
                    self.link(world, LinkKind::Structural, i, layout.index(row - 1, col), k, d)?;
                }
                if opts.diagonal && row > 0 {
                    let kd = k * DIAGONAL_SCALE;
                    if col > 0 {
                        self.link(world, LinkKind::Diagonal, i, layout.index(row - 1, col - 1), kd, d)?;
                    }
                    if col + 1 < layout.verts_x {
                        self.link(world, LinkKind::Diagonal, i, layout.index(row - 1, col + 1), kd, d)?;
                    }
                }
                if opts.bend {
                    let kb = k * BEND_SCALE;
                    if col > 1 {
                        self.link(world, LinkKind::Bend, i, layout.index(row, col - 2), kb, d)?;
                    }
                    if row > 1 {
                        self.link(world, LinkKind::Bend, i, layout.index(row - 2, col), kb, d)?;
                    }
                }
            }
        }

        if opts.frame {
            let kf = k * FRAME_SCALE;
            let [tl, tr, bl, br] = Corner::ALL.map(|c| layout.corner(c));
            for (a, b) in [(tl, tr), (bl, br), (tl, bl), (tr, br), (tl, br), (tr, bl)] {
                self.link(world, LinkKind::Frame, a, b, kf, d)?;
            }
        }
        Ok(())
    }

    fn add_pins(&mut self, world: &mut SpringWorld, stiffness: f32) -> Result<(), MeshError> {
        for corner in Corner::ALL {
            let grid = self.layout.corner(corner);
            let node = self.nodes[grid];
            let anchor = world
                .node(node)
                .map(|n| n.position)
                .ok_or(MeshError::NodeOutOfBounds {
                    index: node,
                    count: world.nodes().len(),
                })?;
            let spring = world.add_pin(node, anchor, stiffness, 0.0)?;
            self.links.push(Link {
                kind: LinkKind::Pin,
                from: grid,
                to: None,
                spring,
            });
            self.pins.push(Pin {
                corner,
                spring,
                anchor,
            });
        }
        Ok(())
    }

    /// World indices, row-major
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// World indices of the bottom row
    pub fn bottom_row(&self) -> &[usize] {
        let start = (self.layout.verts_y - 1) * self.layout.verts_x;
        &self.nodes[start..]
    }

    pub fn contains(&self, world_index: usize) -> bool {
        self.nodes.contains(&world_index)
    }

    /// `(left, up)` structural links leaving the node at `(row, col)`
    pub fn structural_links(&self, row: usize, col: usize) -> (bool, bool) {
        let i = self.layout.index(row, col);
        let mut left = false;
        let mut up = false;
        for link in self.links.iter().filter(|l| l.kind == LinkKind::Structural && l.from == i) {
            match link.to {
                Some(to) if to + 1 == i => left = true,
                Some(to) if to + self.layout.verts_x == i => up = true,
                _ => {}
            }
        }
        (left, up)
    }

    pub fn count(&self, kind: LinkKind) -> usize {
        self.links.iter().filter(|l| l.kind == kind).count()
    }

    /// Mean node velocity
    pub fn average_velocity(&self, world: &SpringWorld) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut n = 0;
        for node in self.nodes.iter().filter_map(|&i| world.node(i)) {
            sum += node.velocity;
            n += 1;
        }
        if n == 0 { Vec2::ZERO } else { sum / n as f32 }
    }

    /// Empty visual buffers sized to the image
    pub fn buffers(&self) -> MeshBuffers {
        let image = self.layout.display / self.layout.scale;
        MeshBuffers::grid(self.layout.verts_x, self.layout.verts_y, image)
    }

    /// Copy node positions into `buffers`
    pub fn sync(&self, world: &SpringWorld, buffers: &mut MeshBuffers) {
        let points = self
            .nodes
            .iter()
            .map(|&i| world.node(i).map_or(Vec2::ZERO, |n| n.position));
        buffers.sync(points, self.layout.origin, self.layout.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const VIEW: Vec2 = Vec2::new(800.0, 600.0);

    fn build(opts: &MeshOptions) -> (SpringWorld, SoftMesh) {
        let mut world = SpringWorld::new(Vec2::new(0.0, 3200.0), 4);
        let mut rng = Pcg32::seed_from_u64(1);
        let mesh = SoftMesh::build(&mut world, Vec2::new(200.0, 100.0), VIEW, 580.0, opts, &mut rng)
            .unwrap();
        (world, mesh)
    }

    #[test]
    fn test_layout_fits_long_side() {
        let layout =
            MeshLayout::new(Vec2::new(200.0, 100.0), VIEW, 580.0, &MeshOptions::default()).unwrap();
        assert!(layout.display.abs_diff_eq(Vec2::new(140.0, 70.0), 1e-3));
        assert!((layout.scale - 0.7).abs() < 1e-6);
        assert!((layout.origin.x - 330.0).abs() < 1e-3);
        // 8 verts: cell 20 x 10, radius 0.28 * 10
        assert!((layout.radius - 2.8).abs() < 1e-5);
        // Resting on the floor
        assert!((layout.origin.y + layout.display.y + layout.radius - 580.0).abs() < 1e-3);
    }

    #[test]
    fn test_layout_scale_fit_and_center() {
        let opts = MeshOptions {
            size_px: None,
            spawn_at: SpawnAt::Center,
            ..Default::default()
        };
        let layout = MeshLayout::new(Vec2::new(400.0, 400.0), VIEW, 580.0, &opts).unwrap();
        assert_eq!(layout.display, Vec2::new(360.0, 360.0));
        assert_eq!(layout.origin, Vec2::new(220.0, 120.0));
    }

    #[test]
    fn test_verts_are_clamped() {
        let opts = MeshOptions {
            verts_x: 1,
            verts_y: 500,
            ..Default::default()
        };
        let layout = MeshLayout::new(Vec2::new(10.0, 10.0), VIEW, 580.0, &opts).unwrap();
        assert_eq!(layout.verts_x, MIN_VERTS);
        assert_eq!(layout.verts_y, MAX_VERTS);
    }

    #[test]
    fn test_empty_inputs_are_errors() {
        let opts = MeshOptions::default();
        assert!(matches!(
            MeshLayout::new(Vec2::new(0.0, 10.0), VIEW, 580.0, &opts),
            Err(MeshError::EmptyImage { .. })
        ));
        assert!(matches!(
            MeshLayout::new(Vec2::new(10.0, 10.0), Vec2::new(800.0, 0.0), 580.0, &opts),
            Err(MeshError::EmptyView { .. })
        ));
    }

    #[test]
    fn test_spring_counts() {
        let (world, mesh) = build(&MeshOptions::default());
        let (vx, vy) = (8, 8);
        assert_eq!(mesh.count(LinkKind::Structural), (vx - 1) * vy + vx * (vy - 1));
        assert_eq!(mesh.count(LinkKind::Diagonal), 2 * (vx - 1) * (vy - 1));
        assert_eq!(mesh.count(LinkKind::Bend), (vx - 2) * vy + vx * (vy - 2));
        assert_eq!(mesh.count(LinkKind::Frame), 6);
        assert_eq!(mesh.count(LinkKind::Pin), 4);
        assert_eq!(world.springs().len(), mesh.links().len());
    }

    #[test]
    fn test_optional_springs_can_be_disabled() {
        let opts = MeshOptions {
            diagonal: false,
            bend: false,
            frame: false,
            pin_stiffness: None,
            ..Default::default()
        };
        let (_, mesh) = build(&opts);
        assert_eq!(mesh.links().len(), mesh.count(LinkKind::Structural));
        assert!(mesh.pins().is_empty());
    }

    #[test]
    fn test_nodes_share_negative_group_and_kick() {
        let (world, mesh) = build(&MeshOptions::default());
        assert!(mesh.filter.group < 0);
        let first = world.node(mesh.nodes()[0]).unwrap();
        assert!(mesh.nodes().iter().all(|&i| world.node(i).unwrap().filter == mesh.filter));
        assert_eq!(first.velocity.y, -60.0);
        assert!(first.velocity.x.abs() <= 30.0);
    }

    #[test]
    fn test_pin_anchor_is_spawn_position() {
        let (world, mesh) = build(&MeshOptions::default());
        for pin in mesh.pins() {
            let node = mesh.nodes()[mesh.layout.corner(pin.corner)];
            assert_eq!(world.node(node).unwrap().position, pin.anchor);
            assert_eq!(world.spring(pin.spring).unwrap().rest_length, 0.0);
        }
    }

    #[test]
    fn test_sync_starts_at_image_grid() {
        let (world, mesh) = build(&MeshOptions::default());
        let fresh = mesh.buffers();
        let mut synced = fresh.clone();
        mesh.sync(&world, &mut synced);
        for (a, b) in fresh.vertices.iter().zip(&synced.vertices) {
            assert!((a.position[0] - b.position[0]).abs() < 1e-3);
            assert!((a.position[1] - b.position[1]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_bottom_row() {
        let (_, mesh) = build(&MeshOptions::default());
        assert_eq!(mesh.bottom_row().len(), 8);
        assert_eq!(mesh.bottom_row()[0], mesh.nodes()[56]);
    }

    proptest! {
        #[test]
        fn prop_structural_links(vx in 4usize..12, vy in 4usize..12) {
            let opts = MeshOptions { verts_x: vx, verts_y: vy, ..Default::default() };
            let (world, mesh) = build(&opts);
            prop_assert_eq!(mesh.nodes().len(), vx * vy);
            prop_assert_eq!(world.nodes().len(), vx * vy);
            for row in 0..vy {
                for col in 0..vx {
                    let (left, up) = mesh.structural_links(row, col);
                    prop_assert_eq!(left, col > 0);
                    prop_assert_eq!(up, row > 0);
                }
            }
        }
    }
}
