use canvas_core::math::{Mat3, Rect};

use crate::asset::{AssetRef, AssetResolver, FrameDescriptor};
use crate::id::NodeId;
use crate::model::{BodyShape, ModelNode, NodeKind};

/// Frame used for nodes whose frame is unknown or empty, so they can still
/// be picked.
pub const PLACEHOLDER_FRAME: FrameDescriptor = FrameDescriptor::new(32.0, 32.0);

/// Rough glyph advance of text nodes, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;

/// Display-side mirror of one model node.
///
/// Built from the resolved values of the node, so prefab instances show
/// what they inherit. `created` and `generation` let callers tell a node
/// that was refreshed in place from one that was recreated.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: String,
    /// Local to world.
    pub world: Mat3,
    /// Visual extent in local space; `None` for groups.
    pub local_bounds: Option<Rect>,
    pub asset: Option<AssetRef>,
    pub text: Option<String>,
    pub body: Option<BodyShape>,
    pub pickable: bool,
    pub visible: bool,
    pub is_group: bool,
    pub closed: bool,
    pub missing_asset: bool,
    /// Outline state; set by reveal hints.
    pub expanded: bool,
    /// Reconcile pass that created this node.
    pub created: u64,
    /// Number of in-place refreshes.
    pub generation: u64,
}

impl ViewNode {
    pub(crate) fn new(
        resolved: &ModelNode,
        parent_world: &Mat3,
        assets: &dyn AssetResolver,
        pass: u64,
    ) -> Self {
        let mut node = Self {
            id: resolved.id,
            parent: resolved.parent,
            children: resolved.children().to_vec(),
            kind: String::new(),
            world: Mat3::identity(),
            local_bounds: None,
            asset: None,
            text: None,
            body: None,
            pickable: true,
            visible: true,
            is_group: false,
            closed: false,
            missing_asset: false,
            expanded: false,
            created: pass,
            generation: 0,
        };
        node.apply(resolved, parent_world, assets);
        node
    }

    /// Pushes resolved values into this node, keeping view-local state.
    pub(crate) fn refresh(&mut self, resolved: &ModelNode, parent_world: &Mat3, assets: &dyn AssetResolver) {
        self.apply(resolved, parent_world, assets);
        self.generation += 1;
    }

    fn apply(&mut self, resolved: &ModelNode, parent_world: &Mat3, assets: &dyn AssetResolver) {
        self.parent = resolved.parent;
        self.children = resolved.children().to_vec();
        self.kind = resolved.type_name().to_owned();
        self.world = parent_world * resolved.local_matrix();
        self.asset = resolved.asset().cloned();
        self.text = resolved.text_content().map(str::to_owned);
        self.pickable = resolved.editor.pick;
        self.visible = resolved.editor.show;
        self.is_group = resolved.is_group();
        self.closed = resolved.is_closed_group();
        self.missing_asset = resolved.is_missing_asset();

        let frame = frame_of(resolved, assets);
        self.local_bounds = (!self.is_group).then(|| {
            let (ax, ay) = resolved
                .sprite_data()
                .map_or((0.0, 0.0), |s| (s.anchor_x, s.anchor_y));
            Rect::new(-ax * frame.width, -ay * frame.height, frame.width, frame.height)
        });
        self.body = resolved
            .body()
            .map(|body| body.shape(frame.width, frame.height));
    }

    /// Bounds in world space.
    pub fn world_bounds(&self) -> Option<Rect> {
        self.local_bounds.map(|b| b.transformed(&self.world))
    }
}

fn frame_of(node: &ModelNode, assets: &dyn AssetResolver) -> FrameDescriptor {
    let frame = match &node.kind {
        NodeKind::Group { .. } => return FrameDescriptor::default(),
        NodeKind::TileSprite { tile, .. } => Some(FrameDescriptor::new(tile.width, tile.height)),
        NodeKind::Text { text, style, .. } => Some(text_frame(text, style.font_size)),
        NodeKind::BitmapText { text, font, .. } => Some(text_frame(text, font.size)),
        NodeKind::MissingAsset { .. } => None,
        NodeKind::Sprite { texture, .. } | NodeKind::Button { texture, .. } => {
            assets.resolve_asset_key(texture)
        }
    };
    match frame {
        Some(f) if f.width > 0.0 && f.height > 0.0 => f,
        _ => PLACEHOLDER_FRAME,
    }
}

fn text_frame(text: &str, size: f64) -> FrameDescriptor {
    let lines: Vec<&str> = text.lines().collect();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    FrameDescriptor::new(
        longest as f64 * size * GLYPH_ADVANCE,
        lines.len().max(1) as f64 * size,
    )
}
