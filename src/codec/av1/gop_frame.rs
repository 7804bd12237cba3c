// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-frame metadata of a planned group of pictures.

use enumn::N;

use crate::codec::av1::ReferenceName;

/// Added to the depth a frame is planned at, so a key frame planned at depth -1 sits at layer
/// depth 0.
pub const LAYER_DEPTH_OFFSET: i32 = 1;

/// Why a frame is kept as a reference, independent of the name it is presented under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefUpdateType {
    /// Ahead of the current display position, ie. a look-ahead frame coded out of order.
    Forward,
    /// Behind the current display position, high quality.
    Backward,
    /// Behind the current display position, regular quality.
    Last,
    /// Not kept as a reference.
    None,
}

#[derive(N, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncodeRefMode {
    #[default]
    Regular = 0,
    /// Coded as an overlay on top of a previously coded ARF
    Overlay = 1,
    /// Shows a previously coded frame without coding new content
    ShowExisting = 2,
}

#[derive(N, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum GopFrameType {
    #[default]
    RegularKey = 0,
    RegularGolden = 1,
    RegularArf = 2,
    IntermediateArf = 3,
    RegularLeaf = 4,
    IntermediateOverlay = 5,
    Overlay = 6,
    ShowExisting = 7,
}

/// A reference handed to prediction: the slot holding it and the name it is signalled with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceFrame {
    pub index: usize,
    pub name: ReferenceName,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GopFrame {
    /// False for placeholders of empty reference slots
    pub is_valid: bool,

    /// Display position within the GOP
    pub order_idx: i32,
    /// Coding position within the GOP
    pub coding_idx: i32,
    /// Display position within the sequence
    pub global_order_idx: i32,
    /// Coding position within the sequence
    pub global_coding_idx: i32,

    pub is_key_frame: bool,
    pub is_arf_frame: bool,
    pub is_show_frame: bool,
    pub is_golden_frame: bool,

    pub layer_depth: i32,
    pub update_type: GopFrameType,
    pub encode_ref_mode: EncodeRefMode,

    /// References this frame predicts from
    pub ref_frame_list: Vec<ReferenceFrame>,
    /// Reference whose context is loaded before coding this frame
    pub primary_ref_frame: Option<ReferenceFrame>,
    /// Slot of the look-ahead reference sharing this frame's display position
    pub colocated_ref_idx: Option<usize>,
    /// Slot this frame is stored into, if it becomes a reference
    pub update_ref_idx: Option<usize>,
}

impl GopFrame {
    /// Creates a frame of `gop_frame_type` at the given GOP positions, with the flags that type
    /// implies.
    pub fn basic(
        global_coding_idx_offset: i32,
        global_order_idx_offset: i32,
        coding_idx: i32,
        order_idx: i32,
        depth: i32,
        gop_frame_type: GopFrameType,
    ) -> Self {
        let mut frame = Self {
            is_valid: true,
            order_idx,
            coding_idx,
            global_order_idx: global_order_idx_offset + order_idx,
            global_coding_idx: global_coding_idx_offset + coding_idx,
            layer_depth: depth + LAYER_DEPTH_OFFSET,
            ..Default::default()
        };
        frame.set_type(gop_frame_type);
        frame
    }

    /// Placeholder for an empty reference slot.
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            global_order_idx: -1,
            global_coding_idx: -1,
            ..Default::default()
        }
    }

    fn set_type(&mut self, gop_frame_type: GopFrameType) {
        use GopFrameType::*;

        self.update_type = gop_frame_type;
        self.is_key_frame = matches!(gop_frame_type, RegularKey);
        self.is_arf_frame = matches!(gop_frame_type, RegularArf | IntermediateArf);
        self.is_show_frame = !self.is_arf_frame;
        self.is_golden_frame = matches!(gop_frame_type, RegularKey | RegularGolden | RegularArf);
        self.encode_ref_mode = match gop_frame_type {
            Overlay => EncodeRefMode::Overlay,
            IntermediateOverlay | ShowExisting => EncodeRefMode::ShowExisting,
            _ => EncodeRefMode::Regular,
        };
    }
}
