// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Joint topology: which landmark index means which body part.
//!
//! The normaliser and the model both assume a fixed joint order. Keeping the
//! semantic indices in a [`JointTopology`] value lets an alternative landmark
//! source plug in its own mapping instead of editing index literals.

/// Coordinates stored per joint (`x`, `y`, `z`).
pub const COORDS_PER_JOINT: usize = 3;

/// The 33 MediaPipe Pose landmarks, in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum MediaPipeJoint {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl MediaPipeJoint {
    pub const COUNT: usize = 33;

    /// Position of this joint in a landmark set.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Semantic joint indices of a landmark source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTopology {
    /// Short identifier, e.g. `"mediapipe_pose"`.
    pub name: &'static str,
    /// Landmarks per frame.
    pub num_joints: usize,
    pub left_hip: usize,
    pub right_hip: usize,
    pub left_shoulder: usize,
    pub right_shoulder: usize,
}

impl JointTopology {
    /// MediaPipe Pose (BlazePose) 33-landmark topology.
    pub const MEDIAPIPE_POSE: JointTopology = JointTopology {
        name: "mediapipe_pose",
        num_joints: MediaPipeJoint::COUNT,
        left_hip: MediaPipeJoint::LeftHip.index(),
        right_hip: MediaPipeJoint::RightHip.index(),
        left_shoulder: MediaPipeJoint::LeftShoulder.index(),
        right_shoulder: MediaPipeJoint::RightShoulder.index(),
    };

    /// Length of a flattened pose vector for this topology.
    pub const fn pose_dim(&self) -> usize {
        self.num_joints * COORDS_PER_JOINT
    }

    /// Returns `true` if every named joint lies inside the landmark set.
    pub fn is_consistent(&self) -> bool {
        [
            self.left_hip,
            self.right_hip,
            self.left_shoulder,
            self.right_shoulder,
        ]
        .iter()
        .all(|&j| j < self.num_joints)
    }
}

impl Default for JointTopology {
    fn default() -> Self {
        Self::MEDIAPIPE_POSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mediapipe_indices() {
        let t = JointTopology::MEDIAPIPE_POSE;
        assert_eq!((t.left_hip, t.right_hip), (23, 24));
        assert_eq!((t.left_shoulder, t.right_shoulder), (11, 12));
        assert_eq!(t.pose_dim(), 99);
        assert!(t.is_consistent());
    }

    #[test]
    fn test_inconsistent_topology() {
        let t = JointTopology {
            name: "broken",
            num_joints: 17,
            ..JointTopology::MEDIAPIPE_POSE
        };
        assert!(!t.is_consistent());
    }

    #[test]
    fn test_last_joint_index() {
        assert_eq!(MediaPipeJoint::RightFootIndex.index(), MediaPipeJoint::COUNT - 1);
    }
}
