//! glTF scene host.
//!
//! Reads a glTF/GLB export of the rig with the `gltf` crate. The first skin
//! is the rig and its joints are bones, looked up by node name. The bind pose
//! comes from the skin's inverse bind matrices (node rest transforms when the
//! skin has none). The first animation is the rig's clip, sampled at a fixed
//! frame rate since glTF keys are stored in seconds.
//!
//! glTF is Y-up; transforms leave this module in source axes (Z-up).

use glam::{Mat4, Quat, Vec3};
use std::ops::{Add, Mul};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use hashbrown::HashMap;
use std::path::Path;

use super::{translation_of, ClipRange, Rig, Scene, SceneLoader};
use crate::axis::to_source_matrix;
use crate::error::{ExportError, Result};

/// Default sample rate for clips (frames per second)
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Loads glTF/GLB files
#[derive(Debug, Clone, Copy)]
pub struct GltfLoader {
    frame_rate: f32,
}

impl GltfLoader {
    pub fn new(frame_rate: f32) -> Self {
        Self { frame_rate }
    }
}

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_RATE)
    }
}

impl SceneLoader for GltfLoader {
    type Scene = GltfScene;

    fn load(&mut self, path: &Path) -> Result<GltfScene> {
        let (document, buffers, _images) =
            gltf::import(path).map_err(|e| ExportError::ImportFailure {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            "Loaded {:?}: {} nodes, {} skins, {} animations",
            path,
            document.nodes().count(),
            document.skins().count(),
            document.animations().count()
        );

        Ok(GltfScene {
            frame_rate: self.frame_rate,
            rig: GltfRig::from_document(&document, &buffers, self.frame_rate),
        })
    }
}

/// A loaded glTF document
#[derive(Debug)]
pub struct GltfScene {
    frame_rate: f32,
    rig: Option<GltfRig>,
}

impl Scene for GltfScene {
    type Rig = GltfRig;

    fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    fn rig_mut(&mut self) -> Option<&mut GltfRig> {
        self.rig.as_mut()
    }
}

/// Node rest transform (TRS)
#[derive(Debug, Clone, Copy)]
struct NodeTransform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl NodeTransform {
    fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Keyed values of one channel
#[derive(Debug, Clone)]
struct Track<T> {
    values: Vec<T>,
    /// (in, out) tangent per key, cubic-spline samplers only
    tangents: Option<Vec<(T, T)>>,
}

impl<T: Keyed> Track<T> {
    fn sample(&self, times: &[f32], t: f32, interpolation: Interpolation) -> T {
        let (i0, i1, s) = keyframe_span(times, t, interpolation);
        match &self.tangents {
            Some(tangents) if i0 != i1 => {
                let dt = times[i1] - times[i0];
                let (s2, s3) = (s * s, s * s * s);
                let v = self.values[i0] * (2.0 * s3 - 3.0 * s2 + 1.0)
                    + tangents[i0].1 * ((s3 - 2.0 * s2 + s) * dt)
                    + self.values[i1] * (-2.0 * s3 + 3.0 * s2)
                    + tangents[i1].0 * ((s3 - s2) * dt);
                v.finish()
            }
            _ => T::blend(self.values[i0], self.values[i1], s),
        }
    }
}

/// Channel value types that can be interpolated between keys
trait Keyed: Copy + Add<Output = Self> + Mul<f32, Output = Self> {
    fn blend(a: Self, b: Self, s: f32) -> Self;

    /// Applied to cubic-spline results
    fn finish(self) -> Self {
        self
    }
}

impl Keyed for Vec3 {
    fn blend(a: Self, b: Self, s: f32) -> Self {
        a.lerp(b, s)
    }
}

impl Keyed for Quat {
    fn blend(a: Self, b: Self, s: f32) -> Self {
        a.slerp(b, s)
    }

    fn finish(self) -> Self {
        self.normalize()
    }
}

#[derive(Debug, Clone)]
enum ChannelValues {
    Translation(Track<Vec3>),
    Rotation(Track<Quat>),
    Scale(Track<Vec3>),
}

#[derive(Debug, Clone)]
struct Channel {
    node: usize,
    interpolation: Interpolation,
    times: Vec<f32>,
    values: ChannelValues,
}

/// Skin of a glTF document with its first animation
#[derive(Debug, Clone)]
pub struct GltfRig {
    frame_rate: f32,
    parents: Vec<Option<usize>>,
    rest: Vec<NodeTransform>,
    /// Node holding the skeleton (parent of the root joint)
    armature: Option<usize>,
    /// Bone name -> joint slot
    joint_names: HashMap<String, usize>,
    /// Joint slot -> node index
    joint_nodes: Vec<usize>,
    /// Bind-pose bone to rig transforms, per joint slot
    bind: Vec<Mat4>,
    clip: Option<ClipRange>,
    channels: Vec<Channel>,
    /// Node to world transforms at the current frame
    posed: Vec<Mat4>,
}

impl GltfRig {
    fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        frame_rate: f32,
    ) -> Option<Self> {
        let skin = document.skins().next()?;
        if document.skins().count() > 1 {
            tracing::warn!(
                "{} skins found, using '{}'",
                document.skins().count(),
                skin.name().unwrap_or("unnamed")
            );
        }

        let node_count = document.nodes().count();
        let mut parents = vec![None; node_count];
        let mut rest = Vec::with_capacity(node_count);
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
            let (t, r, s) = node.transform().decomposed();
            rest.push(NodeTransform {
                translation: Vec3::from(t),
                rotation: Quat::from_array(r).normalize(),
                scale: Vec3::from(s),
            });
        }

        let joint_nodes: Vec<usize> = skin.joints().map(|j| j.index()).collect();
        let joint_names = skin
            .joints()
            .enumerate()
            .filter_map(|(slot, j)| j.name().map(|n| (n.to_string(), slot)))
            .collect();

        let armature = joint_nodes
            .iter()
            .find(|&&n| !parents[n].is_some_and(|p| joint_nodes.contains(&p)))
            .and_then(|&n| parents[n]);

        let rest_globals = global_transforms(&rest, &parents);
        let rig_from_world = armature.map_or(Mat4::IDENTITY, |a| rest_globals[a].inverse());

        let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
        let bind = match reader.read_inverse_bind_matrices() {
            // Inverse bind matrices map world space to joint space
            Some(matrices) => matrices
                .map(|m| rig_from_world * Mat4::from_cols_array_2d(&m).inverse())
                .collect(),
            None => joint_nodes
                .iter()
                .map(|&n| rig_from_world * rest_globals[n])
                .collect(),
        };

        let (clip, channels) = match document.animations().next() {
            Some(animation) => read_clip(&animation, buffers, frame_rate),
            None => (None, Vec::new()),
        };

        Some(Self {
            frame_rate,
            parents,
            rest,
            armature,
            joint_names,
            joint_nodes,
            bind,
            clip,
            channels,
            posed: rest_globals,
        })
    }

    fn slot(&self, bone: &str) -> Option<usize> {
        self.joint_names.get(bone).copied()
    }

    /// Armature node to world transform at the current frame, glTF axes
    fn armature_world(&self) -> Mat4 {
        self.armature.map_or(Mat4::IDENTITY, |a| self.posed[a])
    }
}

impl Rig for GltfRig {
    fn world_matrix(&self) -> Mat4 {
        to_source_matrix(self.armature_world())
    }

    fn bind_head(&self, bone: &str) -> Option<Vec3> {
        self.bind_matrix(bone).map(translation_of)
    }

    fn bind_matrix(&self, bone: &str) -> Option<Mat4> {
        self.slot(bone)
            .and_then(|slot| self.bind.get(slot).copied())
            .map(to_source_matrix)
    }

    fn posed_matrix(&self, bone: &str) -> Option<Mat4> {
        let node = self.joint_nodes[self.slot(bone)?];
        Some(to_source_matrix(
            self.armature_world().inverse() * self.posed[node],
        ))
    }

    fn clip(&self) -> Option<ClipRange> {
        self.clip.clone()
    }

    fn set_frame(&mut self, frame: i32) {
        let t = frame as f32 / self.frame_rate;
        let mut locals = self.rest.clone();

        for channel in &self.channels {
            let (times, interpolation) = (&channel.times, channel.interpolation);
            let local = &mut locals[channel.node];
            match &channel.values {
                ChannelValues::Translation(v) => {
                    local.translation = v.sample(times, t, interpolation)
                }
                ChannelValues::Rotation(v) => local.rotation = v.sample(times, t, interpolation),
                ChannelValues::Scale(v) => local.scale = v.sample(times, t, interpolation),
            }
        }

        self.posed = global_transforms(&locals, &self.parents);
    }
}

/// Read the animation's channels and derive its frame range
fn read_clip(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    frame_rate: f32,
) -> (Option<ClipRange>, Vec<Channel>) {
    let mut channels = Vec::new();

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        let interpolation = channel.sampler().interpolation();

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(t)) => {
                ChannelValues::Translation(keyed_values(t.map(Vec3::from).collect(), interpolation))
            }
            Some(ReadOutputs::Rotations(r)) => {
                let mut track =
                    keyed_values(r.into_f32().map(Quat::from_array).collect(), interpolation);
                // Only the keyed rotations are unit length; tangents are rates
                for q in &mut track.values {
                    *q = q.normalize();
                }
                ChannelValues::Rotation(track)
            }
            Some(ReadOutputs::Scales(s)) => {
                ChannelValues::Scale(keyed_values(s.map(Vec3::from).collect(), interpolation))
            }
            // Morph target weights don't move bones
            _ => continue,
        };

        let value_count = match &values {
            ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.values.len(),
            ChannelValues::Rotation(v) => v.values.len(),
        };
        if times.is_empty() || value_count != times.len() {
            tracing::warn!(
                "Skipping channel on node {}: {} keys, {} values",
                channel.target().node().index(),
                times.len(),
                value_count
            );
            continue;
        }

        channels.push(Channel {
            node: channel.target().node().index(),
            interpolation,
            times,
            values,
        });
    }

    if channels.is_empty() {
        return (None, channels);
    }

    let start = channels
        .iter()
        .map(|c| c.times[0])
        .fold(f32::INFINITY, f32::min);
    let end = channels
        .iter()
        .map(|c| c.times[c.times.len() - 1])
        .fold(f32::NEG_INFINITY, f32::max);

    let clip = ClipRange {
        name: animation.name().map(str::to_string),
        first_frame: (start * frame_rate).round() as i32,
        last_frame: (end * frame_rate).round() as i32,
    };
    (Some(clip), channels)
}

/// Cubic-spline samplers store (in-tangent, value, out-tangent) per key
fn keyed_values<T: Copy>(values: Vec<T>, interpolation: Interpolation) -> Track<T> {
    match interpolation {
        Interpolation::CubicSpline => {
            let keys = values.chunks_exact(3);
            Track {
                values: keys.clone().map(|c| c[1]).collect(),
                tangents: Some(keys.map(|c| (c[0], c[2])).collect()),
            }
        }
        _ => Track {
            values,
            tangents: None,
        },
    }
}

/// Keys bracketing `t` and the blend factor between them
fn keyframe_span(times: &[f32], t: f32, interpolation: Interpolation) -> (usize, usize, f32) {
    let last = times.len() - 1;
    if t <= times[0] {
        return (0, 0, 0.0);
    }
    if t >= times[last] {
        return (last, last, 0.0);
    }

    let next = times.partition_point(|&key| key <= t);
    let prev = next - 1;
    let factor = match interpolation {
        Interpolation::Step => 0.0,
        _ => {
            let span = times[next] - times[prev];
            if span > 0.0 {
                ((t - times[prev]) / span).clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
    };
    (prev, next, factor)
}

/// Resolve node to world transforms through the parent chain
fn global_transforms(locals: &[NodeTransform], parents: &[Option<usize>]) -> Vec<Mat4> {
    fn resolve(
        node: usize,
        locals: &[NodeTransform],
        parents: &[Option<usize>],
        out: &mut [Option<Mat4>],
    ) -> Mat4 {
        if let Some(m) = out[node] {
            return m;
        }
        let local = locals[node].matrix();
        let m = match parents[node] {
            Some(parent) => resolve(parent, locals, parents, out) * local,
            None => local,
        };
        out[node] = Some(m);
        m
    }

    let mut out = vec![None; locals.len()];
    (0..locals.len())
        .map(|node| resolve(node, locals, parents, &mut out))
        .collect()
}
