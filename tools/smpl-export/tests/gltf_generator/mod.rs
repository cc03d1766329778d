//! Programmatic GLB generation for integration tests.
//!
//! Builds a small Y-up SMPL-named rig:
//! - Armature -> Pelvis -> { Spine1, L_Hip -> L_Knee }
//! - one clip turning the pelvis 0° -> 45° -> 90° about the up axis over 1s
//!
//! The bound variant places the armature with a rotation, scale and offset,
//! stores inverse bind matrices on the skin, and holds the pelvis at rest.

use glam::{Mat4, Quat, Vec3};
use gltf_json as json;
use json::validation::Checked::Valid;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

/// Height of the pelvis above the scene origin
pub const PELVIS_HEIGHT: f32 = 1.0;
/// Height of the knee (lowest bone) above the scene origin
pub const KNEE_HEIGHT: f32 = 0.5;
/// Clip length in seconds
pub const CLIP_DURATION: f32 = 1.0;

const ARMATURE_NODE: u32 = 0;
const PELVIS_NODE: u32 = 1;
const SPINE_NODE: u32 = 2;
const HIP_NODE: u32 = 3;
const KNEE_NODE: u32 = 4;

/// Armature node offset in the bound variant
pub const ARMATURE_OFFSET: Vec3 = Vec3::new(2.0, 0.0, 0.0);
/// Armature node uniform scale in the bound variant
pub const ARMATURE_SCALE: f32 = 2.0;

/// Bone name and rest translation relative to its parent node
const BONES: [(&str, [f32; 3]); 4] = [
    ("Pelvis", [0.0, PELVIS_HEIGHT, 0.0]),
    ("Spine1", [0.0, 0.2, 0.0]),
    ("L_Hip", [0.1, -0.1, 0.0]),
    ("L_Knee", [0.0, KNEE_HEIGHT - PELVIS_HEIGHT + 0.1, 0.0]),
];

fn armature_rotation() -> Quat {
    Quat::from_rotation_y(FRAC_PI_2)
}

fn armature_matrix() -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(ARMATURE_SCALE),
        armature_rotation(),
        ARMATURE_OFFSET,
    )
}

/// World transforms of the bound variant's joints, in skin joint order
fn bound_joint_worlds() -> [Mat4; 4] {
    let local = |i: usize| Mat4::from_translation(Vec3::from(BONES[i].1));
    let pelvis = armature_matrix() * local(0);
    let hip = pelvis * local(2);
    [pelvis, pelvis * local(1), hip, hip * local(3)]
}

/// World head positions of the bound variant's bones
pub fn bound_rig_heads() -> Vec<(&'static str, Vec3)> {
    BONES
        .iter()
        .zip(bound_joint_worlds())
        .map(|((name, _), world)| (*name, world.w_axis.truncate()))
        .collect()
}

/// Generate the test rig. Without a skin the file holds no armature.
pub fn generate_rig_glb(with_skin: bool) -> Vec<u8> {
    build_rig_glb(with_skin, false)
}

/// Generate the bound variant: transformed armature, inverse bind matrices,
/// pelvis held at rest for the whole clip
pub fn generate_bound_rig_glb() -> Vec<u8> {
    build_rig_glb(true, true)
}

fn build_rig_glb(with_skin: bool, bound: bool) -> Vec<u8> {
    let times = [0.0f32, CLIP_DURATION / 2.0, CLIP_DURATION];
    let rotations: Vec<[f32; 4]> = (0..3)
        .map(|i| {
            if bound {
                return Quat::IDENTITY.to_array();
            }
            let half = i as f32 * FRAC_PI_4 / 2.0;
            [0.0, half.sin(), 0.0, half.cos()]
        })
        .collect();

    let mut buffer = Vec::new();
    for t in &times {
        buffer.extend_from_slice(&t.to_le_bytes());
    }
    let rotations_offset = buffer.len();
    for q in &rotations {
        for c in q {
            buffer.extend_from_slice(&c.to_le_bytes());
        }
    }

    let matrices_offset = buffer.len();
    if bound {
        for world in bound_joint_worlds() {
            for c in world.inverse().to_cols_array() {
                buffer.extend_from_slice(&c.to_le_bytes());
            }
        }
    }

    let mut buffer_views = vec![
        buffer_view(0, rotations_offset),
        buffer_view(rotations_offset, matrices_offset - rotations_offset),
    ];
    let mut accessors = vec![
        json::Accessor {
            buffer_view: Some(json::Index::new(0)),
            byte_offset: Some(0u64.into()),
            count: times.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Scalar),
            min: Some(json::Value::Array(vec![json::Value::from(0.0f64)])),
            max: Some(json::Value::Array(vec![json::Value::from(
                CLIP_DURATION as f64,
            )])),
            name: None,
            normalized: false,
            sparse: None,
        },
        json::Accessor {
            buffer_view: Some(json::Index::new(1)),
            byte_offset: Some(0u64.into()),
            count: rotations.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Vec4),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        },
    ];

    let inverse_bind_matrices = bound.then(|| {
        buffer_views.push(buffer_view(matrices_offset, buffer.len() - matrices_offset));
        accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(2)),
            byte_offset: Some(0u64.into()),
            count: BONES.len().into(),
            component_type: Valid(json::accessor::GenericComponentType(
                json::accessor::ComponentType::F32,
            )),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(json::accessor::Type::Mat4),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        });
        json::Index::new(2)
    });

    let mut armature = node("Armature", Some(vec![PELVIS_NODE]), [0.0, 0.0, 0.0]);
    if bound {
        armature.translation = Some(ARMATURE_OFFSET.to_array());
        armature.rotation = Some(json::scene::UnitQuaternion(armature_rotation().to_array()));
        armature.scale = Some([ARMATURE_SCALE; 3]);
    }
    let nodes = vec![
        armature,
        node("Pelvis", Some(vec![SPINE_NODE, HIP_NODE]), BONES[0].1),
        node("Spine1", None, BONES[1].1),
        node("L_Hip", Some(vec![KNEE_NODE]), BONES[2].1),
        node("L_Knee", None, BONES[3].1),
    ];

    let skins = if with_skin {
        vec![json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices,
            joints: [PELVIS_NODE, SPINE_NODE, HIP_NODE, KNEE_NODE]
                .into_iter()
                .map(json::Index::new)
                .collect(),
            name: Some("Armature".to_string()),
            skeleton: Some(json::Index::new(PELVIS_NODE)),
        }]
    } else {
        Vec::new()
    };

    let animations = vec![json::Animation {
        channels: vec![json::animation::Channel {
            sampler: json::Index::new(0),
            target: json::animation::Target {
                node: json::Index::new(PELVIS_NODE),
                path: Valid(json::animation::Property::Rotation),
                extensions: Default::default(),
                extras: Default::default(),
            },
            extensions: Default::default(),
            extras: Default::default(),
        }],
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Turn".to_string()),
        samplers: vec![json::animation::Sampler {
            input: json::Index::new(0),
            interpolation: Valid(json::animation::Interpolation::Linear),
            output: json::Index::new(1),
            extensions: Default::default(),
            extras: Default::default(),
        }],
    }];

    let root = json::Root {
        accessors,
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("smpl-export-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers: vec![json::Buffer {
            byte_length: buffer.len().into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }],
        buffer_views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes: Vec::new(),
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some("Scene".to_string()),
            nodes: vec![json::Index::new(ARMATURE_NODE)],
        }],
        skins,
        textures: Vec::new(),
    };

    assemble_glb(&root, &buffer)
}

fn node(name: &str, children: Option<Vec<u32>>, translation: [f32; 3]) -> json::Node {
    json::Node {
        camera: None,
        children: children.map(|c| c.into_iter().map(json::Index::new).collect()),
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        translation: Some(translation),
        skin: None,
        weights: None,
    }
}

fn buffer_view(offset: usize, length: usize) -> json::buffer::View {
    json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: length.into(),
        byte_offset: Some(offset.into()),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        target: None,
    }
}

/// Assemble a GLB container from JSON and a single binary chunk
fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Vec<u8> {
    let json_string = json::serialize::to_string(root).expect("Failed to serialize JSON");
    let json_bytes = json_string.as_bytes();

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;
    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;

    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk, space padded
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat(0x20u8).take(json_padding));

    // BIN chunk, zero padded
    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat(0u8).take(buffer_padding));

    glb
}
