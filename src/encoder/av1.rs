// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::codec::av1::reference_manager::RefFrameManagerConfig;

pub mod gop;
pub mod signaling;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PredictionStructure {
    /// Simplest prediction structure, suitable eg. for RTC. Keyframe is produced at the start of
    /// the stream and every time when [`limit`] frames are reached. Following frames are coded in
    /// display order and only refer to already shown frames.
    ///
    /// [`limit`]: PredictionStructure::LowDelay::limit
    LowDelay { limit: u16 },

    /// Hierarchical structure: each group of up to [`gop_size`] frames codes its last frame first
    /// as an alt-ref, then the frames before it as a pyramid of intermediate alt-refs and
    /// leaves. A keyframe starts a new group every [`key_frame_interval`] frames.
    ///
    /// [`gop_size`]: PredictionStructure::Pyramid::gop_size
    /// [`key_frame_interval`]: PredictionStructure::Pyramid::key_frame_interval
    Pyramid { gop_size: u16, key_frame_interval: u32 },
}

#[derive(Clone, Debug)]
pub struct EncoderConfig {
    pub pred_structure: PredictionStructure,
    /// Limits of the reference frame table
    pub ref_frames: RefFrameManagerConfig,
    /// Number of bits of the frame header order hints
    pub order_hint_bits: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            pred_structure: PredictionStructure::Pyramid {
                gop_size: 16,
                key_frame_interval: 160,
            },
            ref_frames: Default::default(),
            order_hint_bits: 8,
        }
    }
}
