//! The scene: every renderable and light entity composed for a render pass.
//!
//! Entities are moved into the [`Scene`] and addressed through [`NodeId`]
//! handles afterwards, so no entity can be added twice or live in two scenes.
//! Geometries, materials and textures are pooled next to the entities and
//! referenced by id, which lets many meshes (the stars) share one GPU upload.

use cgmath::Vector3;

use crate::{
    data_structures::{geometry::Geometry, instance::Instance, model::Material},
    resources::texture::{TextureId, TextureRegistry},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub colour: [f32; 3],
    pub intensity: f32,
    /// Exponent of the distance falloff.
    pub decay: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: [f32; 3],
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
    },
    PointLight(PointLight),
    AmbientLight(AmbientLight),
    /// A line-drawn debugging aid. When `follows` is set, the helper copies
    /// that node's position on every [`Scene::sync_helpers`].
    Helper {
        geometry: GeometryId,
        material: MaterialId,
        follows: Option<NodeId>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Instance,
}

impl Node {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            transform: Instance::new(),
        }
    }

    pub fn mesh(name: &str, geometry: GeometryId, material: MaterialId) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn at(mut self, position: Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }

    /// Geometry and material of anything that gets drawn.
    pub fn drawable(&self) -> Option<(GeometryId, MaterialId)> {
        match self.kind {
            NodeKind::Mesh { geometry, material } | NodeKind::Helper { geometry, material, .. } => {
                Some((geometry, material))
            }
            NodeKind::PointLight(_) | NodeKind::AmbientLight(_) => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Background {
    /// Cleared with the context's clear colour.
    #[default]
    Clear,
    Texture(TextureId),
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    pub textures: TextureRegistry,
    pub background: Background,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        log::trace!("adding {:?} as {:?}", node.name, id);
        self.nodes.push(node);
        id
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Instance> {
        self.get(id).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Instance> {
        self.get_mut(id).map(|node| &mut node.transform)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries
            .iter()
            .enumerate()
            .map(|(idx, geometry)| (GeometryId(idx), geometry))
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(idx, material)| (MaterialId(idx), material))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first point light and the combined ambient term.
    ///
    /// The renderer supports a single point light; further point lights are
    /// ignored.
    pub fn lights(&self) -> (Option<(Vector3<f32>, &PointLight)>, [f32; 3]) {
        let mut point = None;
        let mut ambient = [0.0; 3];
        for node in &self.nodes {
            match &node.kind {
                NodeKind::PointLight(light) if point.is_none() => {
                    point = Some((node.transform.position, light));
                }
                NodeKind::AmbientLight(light) => {
                    for (total, channel) in ambient.iter_mut().zip(light.colour) {
                        *total += channel * light.intensity;
                    }
                }
                _ => (),
            }
        }
        (point, ambient)
    }

    /// Moves every helper onto the node it follows.
    pub fn sync_helpers(&mut self) {
        for idx in 0..self.nodes.len() {
            let NodeKind::Helper {
                follows: Some(target),
                ..
            } = self.nodes[idx].kind
            else {
                continue;
            };
            match self.nodes.get(target.0) {
                Some(target) => {
                    let position = target.transform.position;
                    self.nodes[idx].transform.position = position;
                }
                None => log::warn!(
                    "helper {:?} follows {:?} which is not part of the scene",
                    self.nodes[idx].name,
                    target
                ),
            }
        }
    }
}
