// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::codec::av1::gop_frame::EncodeRefMode;
use crate::codec::av1::gop_frame::GopFrame;
use crate::codec::av1::NUM_REF_FRAMES;
use crate::codec::av1::PRIMARY_REF_NONE;
use crate::codec::av1::REFS_PER_FRAME;
use crate::encoder::EncodeError;
use crate::encoder::EncodeResult;

/// Reference related fields of an uncompressed frame header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameRefSignaling {
    pub show_existing_frame: bool,
    /// Slot shown when `show_existing_frame` is set
    pub frame_to_show_map_idx: u8,
    pub order_hint: u32,
    /// Slot used by each reference name, indexed with [`crate::codec::av1::ReferenceName::idx`]
    pub ref_frame_idx: [u8; REFS_PER_FRAME],
    /// Order hint of the frame stored in each slot
    pub ref_order_hint: [u32; NUM_REF_FRAMES],
    /// Slots the frame is stored into
    pub refresh_frame_flags: u8,
    pub primary_ref_frame: u32,
}

fn check_slot(slot: usize) -> EncodeResult<u8> {
    if slot >= NUM_REF_FRAMES {
        return Err(EncodeError::InvalidSlot(slot));
    }

    Ok(slot as u8)
}

impl FrameRefSignaling {
    /// Builds the header fields of `gop_frame`, once processed by the reference manager.
    /// `ref_frame_table` is the decoder side content of the slots before the frame.
    pub fn new(
        gop_frame: &GopFrame,
        ref_frame_table: &[GopFrame],
        order_hint_bits: u32,
    ) -> EncodeResult<Self> {
        let order_hint_mask = 1u32
            .checked_shl(order_hint_bits)
            .map_or(u32::MAX, |bit| bit - 1);
        let order_hint = |global_order_idx: i32| global_order_idx as u32 & order_hint_mask;

        let mut signaling = Self {
            order_hint: order_hint(gop_frame.global_order_idx),
            primary_ref_frame: PRIMARY_REF_NONE,
            ..Default::default()
        };

        if gop_frame.encode_ref_mode == EncodeRefMode::ShowExisting {
            let slot = gop_frame.colocated_ref_idx.ok_or(
                EncodeError::MissingColocatedReference {
                    order: gop_frame.global_order_idx,
                },
            )?;

            signaling.show_existing_frame = true;
            signaling.frame_to_show_map_idx = check_slot(slot)?;
        }

        for (slot, stored) in ref_frame_table.iter().enumerate().take(NUM_REF_FRAMES) {
            if stored.is_valid {
                signaling.ref_order_hint[slot] = order_hint(stored.global_order_idx);
            }
        }

        // Names left unused still have to point to a valid slot.
        if let Some(first) = gop_frame.ref_frame_list.first() {
            signaling.ref_frame_idx = [check_slot(first.index)?; REFS_PER_FRAME];
        }

        for ref_frame in gop_frame.ref_frame_list.iter() {
            signaling.ref_frame_idx[ref_frame.name.idx()] = check_slot(ref_frame.index)?;
        }

        if let Some(primary) = gop_frame.primary_ref_frame {
            signaling.primary_ref_frame = primary.name.idx() as u32;
        }

        signaling.refresh_frame_flags = if gop_frame.is_key_frame {
            0xff
        } else {
            match gop_frame.update_ref_idx {
                Some(slot) => 1 << check_slot(slot)?,
                None => 0,
            }
        };

        log::trace!(
            "Frame order={} ref_frame_idx={:?} refresh_frame_flags={:#04x}",
            gop_frame.global_order_idx,
            signaling.ref_frame_idx,
            signaling.refresh_frame_flags
        );

        Ok(signaling)
    }
}
