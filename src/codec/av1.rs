// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use enumn::N;

pub mod gop_frame;
pub mod reference_manager;

/// Number of reference frame slots a decoder keeps.
pub const NUM_REF_FRAMES: usize = 8;
/// Number of reference frames an inter frame can use.
pub const REFS_PER_FRAME: usize = 7;
/// `primary_ref_frame` value meaning no context is loaded from a reference.
pub const PRIMARY_REF_NONE: u32 = 7;

/// Symbolic names a reference slot is presented under in the frame header. The discriminants
/// match the `ref_frame` syntax element, `INTRA_FRAME` (0) is not a reference name.
#[derive(N, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceName {
    Last = 1,
    Last2 = 2,
    Last3 = 3,
    Golden = 4,
    BwdRef = 5,
    AltRef2 = 6,
    AltRef = 7,
}

impl ReferenceName {
    pub const ALL: [ReferenceName; REFS_PER_FRAME] = [
        ReferenceName::Last,
        ReferenceName::Last2,
        ReferenceName::Last3,
        ReferenceName::Golden,
        ReferenceName::BwdRef,
        ReferenceName::AltRef2,
        ReferenceName::AltRef,
    ];

    /// Position of the name in `ref_frame_idx` and other per-name arrays of the frame header.
    pub fn idx(self) -> usize {
        self as usize - ReferenceName::Last as usize
    }
}
