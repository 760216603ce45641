//! Backend-neutral scene primitives: transforms, materials, meshes and the
//! composite group a celestial body is handed to the renderer as.

use std::path::PathBuf;
use std::rc::Rc;

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::geometry::Geometry;
use crate::params::ParameterSet;

/// Position, orientation and scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// The local +Z axis in parent space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// The local +Y axis in parent space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotate so local +Z points at `target` (parent space), keeping local +Y
    /// as close to world up as possible. A target at the node's own position
    /// leaves the rotation unchanged.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(forward) = (target - self.translation).try_normalize() else {
            return;
        };

        // Looking straight up or down: borrow +Z as the reference up.
        let reference_up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let right = reference_up.cross(forward).normalize();
        let up = forward.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize();
    }
}

/// A custom-shaded surface whose uniforms are read from a shared
/// [`ParameterSet`].
#[derive(Clone, Debug)]
pub struct ShaderMaterial {
    pub vertex_source: String,
    pub fragment_source: String,
    /// Alpha-blended and drawn after opaque parts.
    pub transparent: bool,
    parameters: Rc<ParameterSet>,
}

impl ShaderMaterial {
    pub fn new(
        vertex_source: impl Into<String>,
        fragment_source: impl Into<String>,
        parameters: Rc<ParameterSet>,
    ) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            transparent: false,
            parameters,
        }
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// The bound parameter set. The material holds the same instance the
    /// star mutates, not a copy.
    pub fn parameters(&self) -> &Rc<ParameterSet> {
        &self.parameters
    }

    pub fn is_bound_to(&self, parameters: &Rc<ParameterSet>) -> bool {
        Rc::ptr_eq(&self.parameters, parameters)
    }
}

/// Where a texture image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureSource {
    Path(PathBuf),
    Url {
        url: String,
        /// CORS mode for the request, e.g. `"anonymous"`.
        cross_origin: Option<String>,
    },
}

/// A lit, textured, bump-mapped surface.
#[derive(Clone, Debug, PartialEq)]
pub struct PhongMaterial {
    pub map: TextureSource,
    pub bump_map: TextureSource,
    pub bump_scale: f32,
}

#[derive(Clone, Debug)]
pub enum Material {
    Shader(ShaderMaterial),
    Phong(PhongMaterial),
}

impl Material {
    pub fn as_shader(&self) -> Option<&ShaderMaterial> {
        match self {
            Material::Shader(m) => Some(m),
            Material::Phong(_) => None,
        }
    }

    pub fn as_phong(&self) -> Option<&PhongMaterial> {
        match self {
            Material::Phong(m) => Some(m),
            Material::Shader(_) => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Material::Shader(m) if m.transparent)
    }
}

/// A renderable part: a surface paired with a material.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::default(),
        }
    }
}

/// A composite node holding renderable parts as one scene unit.
#[derive(Clone, Debug, Default)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
    children: Vec<Mesh>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, mesh: Mesh) {
        self.children.push(mesh);
    }

    pub fn children(&self) -> &[Mesh] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Mesh> {
        self.children.iter().find(|m| m.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.children.iter_mut().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// World matrix of a child, given this group's world placement.
    pub fn child_world_matrix(&self, child: &Mesh) -> Mat4 {
        self.transform.matrix() * child.transform.matrix()
    }

    /// Convert a world-space point into this group's local space.
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        self.transform.matrix().inverse().transform_point3(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorProfile;

    fn shared_params() -> Rc<ParameterSet> {
        Rc::new(ParameterSet::new(1.0, &ColorProfile::default(), 0.001, 0.05))
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let targets = [
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(5.0, 1.0, -3.0),
            Vec3::new(-2.0, -7.0, 0.5),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, -3.0, 0.0),
        ];
        for target in targets {
            let mut t = Transform::from_translation(Vec3::new(0.5, 0.0, 0.0));
            t.look_at(target);
            let expected = (target - t.translation).normalize();
            assert!(
                t.forward().dot(expected) > 0.9999,
                "forward {:?} does not face {target:?}",
                t.forward()
            );
            assert!((t.rotation.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_look_at_keeps_up_vertical_when_level() {
        let mut t = Transform::default();
        t.look_at(Vec3::new(3.0, 0.0, 4.0));
        assert!(t.up().dot(Vec3::Y) > 0.9999);
    }

    #[test]
    fn test_look_at_own_position_is_noop() {
        let mut t = Transform::from_translation(Vec3::ONE);
        let before = t.rotation;
        t.look_at(Vec3::ONE);
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn test_shader_material_shares_parameter_identity() {
        let params = shared_params();
        let a = ShaderMaterial::new("vs", "fs", Rc::clone(&params));
        let b = ShaderMaterial::new("vs", "fs", Rc::clone(&params)).with_transparent(true);
        assert!(a.is_bound_to(&params) && b.is_bound_to(&params));
        assert!(!a.is_bound_to(&shared_params()));

        params.set_displacement(0.9);
        assert_eq!(a.parameters().displacement(), 0.9);
        assert_eq!(b.parameters().displacement(), 0.9);
        assert!(Material::Shader(b).is_transparent());
    }

    #[test]
    fn test_group_child_lookup() {
        let params = shared_params();
        let mut group = Group::new("Star");
        assert!(group.is_empty());
        group.add(Mesh::new(
            "Sphere",
            Geometry::sphere(1.0, 8, 4),
            Material::Shader(ShaderMaterial::new("", "", params)),
        ));
        assert_eq!(group.len(), 1);
        assert!(group.child("Sphere").is_some());
        assert!(group.child("Halo").is_none());
        group.child_mut("Sphere").unwrap().transform.scale = Vec3::splat(2.0);
        assert_eq!(group.child("Sphere").unwrap().transform.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_world_to_local_inverts_group_transform() {
        let mut group = Group::new("g");
        group.transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::splat(2.0),
        };
        let world = Vec3::new(-4.0, 0.5, 9.0);
        let local = group.world_to_local(world);
        let back = group.transform.matrix().transform_point3(local);
        assert!((back - world).length() < 1e-4);
    }
}
