//! Landmark semantics of the 21-point hand model.

/// Names for the hand pose landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles.
/// - **IP**: [Interphalangeal joint], the upper joint of the thumb.
/// - **PIP**: Proximal interphalangeal joint, the middle joint of the other fingers.
/// - **DIP**: Distal interphalangeal joint, the joint closest to the fingertip.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
/// [Interphalangeal joint]: https://en.wikipedia.org/wiki/Interphalangeal_joints_of_the_hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl LandmarkIdx {
    /// Number of landmarks in the hand model.
    pub const COUNT: usize = 21;

    /// All landmarks, in index order.
    pub const ALL: [LandmarkIdx; Self::COUNT] = {
        use LandmarkIdx::*;
        [
            Wrist,
            ThumbCmc,
            ThumbMcp,
            ThumbIp,
            ThumbTip,
            IndexFingerMcp,
            IndexFingerPip,
            IndexFingerDip,
            IndexFingerTip,
            MiddleFingerMcp,
            MiddleFingerPip,
            MiddleFingerDip,
            MiddleFingerTip,
            RingFingerMcp,
            RingFingerPip,
            RingFingerDip,
            RingFingerTip,
            PinkyMcp,
            PinkyPip,
            PinkyDip,
            PinkyTip,
        ]
    };

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the landmark at position `index` of a detected hand, if the model has one.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the name the detector uses for this landmark.
    pub fn name(self) -> &'static str {
        use LandmarkIdx::*;
        match self {
            Wrist => "wrist",
            ThumbCmc => "thumb_cmc",
            ThumbMcp => "thumb_mcp",
            ThumbIp => "thumb_ip",
            ThumbTip => "thumb_tip",
            IndexFingerMcp => "index_finger_mcp",
            IndexFingerPip => "index_finger_pip",
            IndexFingerDip => "index_finger_dip",
            IndexFingerTip => "index_finger_tip",
            MiddleFingerMcp => "middle_finger_mcp",
            MiddleFingerPip => "middle_finger_pip",
            MiddleFingerDip => "middle_finger_dip",
            MiddleFingerTip => "middle_finger_tip",
            RingFingerMcp => "ring_finger_mcp",
            RingFingerPip => "ring_finger_pip",
            RingFingerDip => "ring_finger_dip",
            RingFingerTip => "ring_finger_tip",
            PinkyMcp => "pinky_finger_mcp",
            PinkyPip => "pinky_finger_pip",
            PinkyDip => "pinky_finger_dip",
            PinkyTip => "pinky_finger_tip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// The path of one finger's skeleton, from the wrist to the fingertip.
#[derive(Debug, Clone, Copy)]
pub struct FingerChain {
    pub finger: Finger,
    pub landmarks: &'static [LandmarkIdx],
}

/// Finger chains drawn for every hand.
///
/// Every chain starts at [`LandmarkIdx::Wrist`]. Consumers iterate this table, so adding a chain
/// here is all it takes to draw it.
pub const FINGER_CHAINS: &[FingerChain] = {
    use LandmarkIdx::*;
    &[
        FingerChain {
            finger: Finger::Thumb,
            landmarks: &[Wrist, ThumbCmc, ThumbMcp, ThumbIp, ThumbTip],
        },
        FingerChain {
            finger: Finger::Index,
            landmarks: &[
                Wrist,
                IndexFingerMcp,
                IndexFingerPip,
                IndexFingerDip,
                IndexFingerTip,
            ],
        },
        FingerChain {
            finger: Finger::Middle,
            landmarks: &[
                Wrist,
                MiddleFingerMcp,
                MiddleFingerPip,
                MiddleFingerDip,
                MiddleFingerTip,
            ],
        },
        FingerChain {
            finger: Finger::Ring,
            landmarks: &[
                Wrist,
                RingFingerMcp,
                RingFingerPip,
                RingFingerDip,
                RingFingerTip,
            ],
        },
        FingerChain {
            finger: Finger::Pinky,
            landmarks: &[Wrist, PinkyMcp, PinkyPip, PinkyDip, PinkyTip],
        },
    ]
};
