//! SMPL bone hierarchy and name mappings.
//!
//! One table drives both pipelines: the parent chain used for local rotation
//! extraction, the authoring-tool bone names, the short keys written into
//! clip files, and the identifiers emitted for rest-pose constants.

/// Bone in the 22-joint SMPL body rig.
///
/// Declared in topological order: every parent comes before its children, so
/// iterating [`BoneId::ALL`] visits parents first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BoneId {
    Pelvis = 0,
    LeftHip = 1,
    RightHip = 2,
    Spine1 = 3,
    LeftKnee = 4,
    RightKnee = 5,
    Spine2 = 6,
    LeftAnkle = 7,
    RightAnkle = 8,
    Spine3 = 9,
    LeftFoot = 10,
    RightFoot = 11,
    Neck = 12,
    LeftCollar = 13,
    RightCollar = 14,
    Head = 15,
    LeftShoulder = 16,
    RightShoulder = 17,
    LeftElbow = 18,
    RightElbow = 19,
    LeftWrist = 20,
    RightWrist = 21,
}

impl BoneId {
    /// Total number of bones in the rig
    pub const COUNT: usize = 22;

    /// The root of the hierarchy; carries the clip's root motion
    pub const ROOT: BoneId = BoneId::Pelvis;

    /// All bones in topological order
    pub const ALL: [BoneId; Self::COUNT] = [
        BoneId::Pelvis,
        BoneId::LeftHip,
        BoneId::RightHip,
        BoneId::Spine1,
        BoneId::LeftKnee,
        BoneId::RightKnee,
        BoneId::Spine2,
        BoneId::LeftAnkle,
        BoneId::RightAnkle,
        BoneId::Spine3,
        BoneId::LeftFoot,
        BoneId::RightFoot,
        BoneId::Neck,
        BoneId::LeftCollar,
        BoneId::RightCollar,
        BoneId::Head,
        BoneId::LeftShoulder,
        BoneId::RightShoulder,
        BoneId::LeftElbow,
        BoneId::RightElbow,
        BoneId::LeftWrist,
        BoneId::RightWrist,
    ];

    /// Convert to array index
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Static description of one bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneEntry {
    pub id: BoneId,
    /// Parent bone (None for root)
    pub parent: Option<BoneId>,
    /// Bone name as exported by the authoring tool
    pub source_name: &'static str,
    /// Short key used in clip files
    pub key: &'static str,
    /// Identifier of the generated rest-pose constant
    pub constant: &'static str,
}

const fn bone(
    id: BoneId,
    parent: Option<BoneId>,
    source_name: &'static str,
    key: &'static str,
    constant: &'static str,
) -> BoneEntry {
    BoneEntry {
        id,
        parent,
        source_name,
        key,
        constant,
    }
}

use BoneId::*;

const SMPL_BONES: [BoneEntry; BoneId::COUNT] = [
    bone(Pelvis, None, "Pelvis", "p", "DEFAULT_PELVIS"),
    bone(LeftHip, Some(Pelvis), "L_Hip", "lh", "DEFAULT_LEFT_HIP"),
    bone(RightHip, Some(Pelvis), "R_Hip", "rh", "DEFAULT_RIGHT_HIP"),
    bone(Spine1, Some(Pelvis), "Spine1", "s1", "DEFAULT_SPINE1"),
    bone(LeftKnee, Some(LeftHip), "L_Knee", "lk", "DEFAULT_LEFT_KNEE"),
    bone(RightKnee, Some(RightHip), "R_Knee", "rk", "DEFAULT_RIGHT_KNEE"),
    bone(Spine2, Some(Spine1), "Spine2", "s2", "DEFAULT_SPINE2"),
    bone(LeftAnkle, Some(LeftKnee), "L_Ankle", "la", "DEFAULT_LEFT_ANKLE"),
    bone(RightAnkle, Some(RightKnee), "R_Ankle", "ra", "DEFAULT_RIGHT_ANKLE"),
    bone(Spine3, Some(Spine2), "Spine3", "s3", "DEFAULT_SPINE3"),
    bone(LeftFoot, Some(LeftAnkle), "L_Foot", "lf", "DEFAULT_LEFT_FOOT"),
    bone(RightFoot, Some(RightAnkle), "R_Foot", "rf", "DEFAULT_RIGHT_FOOT"),
    bone(Neck, Some(Spine3), "Neck", "n", "DEFAULT_NECK"),
    bone(LeftCollar, Some(Spine3), "L_Collar", "lc", "DEFAULT_LEFT_COLLAR"),
    bone(RightCollar, Some(Spine3), "R_Collar", "rc", "DEFAULT_RIGHT_COLLAR"),
    bone(Head, Some(Neck), "Head", "h", "DEFAULT_HEAD"),
    bone(LeftShoulder, Some(LeftCollar), "L_Shoulder", "ls", "DEFAULT_LEFT_SHOULDER"),
    bone(RightShoulder, Some(RightCollar), "R_Shoulder", "rs", "DEFAULT_RIGHT_SHOULDER"),
    bone(LeftElbow, Some(LeftShoulder), "L_Elbow", "le", "DEFAULT_LEFT_ELBOW"),
    bone(RightElbow, Some(RightShoulder), "R_Elbow", "re", "DEFAULT_RIGHT_ELBOW"),
    bone(LeftWrist, Some(LeftElbow), "L_Wrist", "lw", "DEFAULT_LEFT_WRIST"),
    bone(RightWrist, Some(RightElbow), "R_Wrist", "rw", "DEFAULT_RIGHT_WRIST"),
];

/// Read-only bone table handed to both pipelines.
#[derive(Debug, Clone)]
pub struct BoneTable {
    entries: [BoneEntry; BoneId::COUNT],
}

impl BoneTable {
    /// The SMPL body table
    pub fn smpl() -> Self {
        Self {
            entries: SMPL_BONES,
        }
    }

    /// Entries in topological order
    pub fn entries(&self) -> &[BoneEntry] {
        &self.entries
    }

    #[inline]
    pub fn entry(&self, id: BoneId) -> &BoneEntry {
        &self.entries[id.index()]
    }

    #[inline]
    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        self.entry(id).parent
    }

    pub fn by_source_name(&self, name: &str) -> Option<&BoneEntry> {
        self.entries.iter().find(|e| e.source_name == name)
    }

    pub fn by_key(&self, key: &str) -> Option<&BoneEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

impl Default for BoneTable {
    fn default() -> Self {
        Self::smpl()
    }
}
