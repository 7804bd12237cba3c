// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Bookkeeping of the reference frames kept alive while encoding an AV1 sequence.
//!
//! Every slot of the reference frame table is at any time either free, or held by exactly one of
//! three collections classifying the stored frame by its temporal role:
//!
//! * the forward stack holds frames displayed after the current position (look-ahead frames
//!   coded out of order), the most recently pushed one being the closest,
//! * the backward queue holds high quality frames already passed in display order,
//! * the last queue holds regular frames already passed in display order.
//!
//! Both queues are read newest first and evicted oldest first.

use std::collections::VecDeque;

use thiserror::Error;

use crate::codec::av1::gop_frame::EncodeRefMode;
use crate::codec::av1::gop_frame::GopFrame;
use crate::codec::av1::gop_frame::RefUpdateType;
use crate::codec::av1::gop_frame::ReferenceFrame;
use crate::codec::av1::ReferenceName;
use crate::codec::av1::REFS_PER_FRAME;

pub const DEFAULT_REF_FRAME_TABLE_SIZE: usize = 7;

/// Preferred names of forward references, best first.
const FORWARD_NAMES: [ReferenceName; REFS_PER_FRAME] = [
    ReferenceName::BwdRef,
    ReferenceName::AltRef2,
    ReferenceName::AltRef,
    ReferenceName::Golden,
    ReferenceName::Last,
    ReferenceName::Last2,
    ReferenceName::Last3,
];

/// Preferred names of backward references, best first.
const BACKWARD_NAMES: [ReferenceName; REFS_PER_FRAME] = [
    ReferenceName::Golden,
    ReferenceName::Last,
    ReferenceName::Last2,
    ReferenceName::Last3,
    ReferenceName::BwdRef,
    ReferenceName::AltRef2,
    ReferenceName::AltRef,
];

/// Preferred names of last references, best first.
const LAST_NAMES: [ReferenceName; REFS_PER_FRAME] = [
    ReferenceName::Last,
    ReferenceName::Last2,
    ReferenceName::Last3,
    ReferenceName::Golden,
    ReferenceName::BwdRef,
    ReferenceName::AltRef2,
    ReferenceName::AltRef,
];

/// Order in which [`RefFrameManager::ref_frame_list`] takes turns between the roles.
const ROUND_ROBIN: [RefUpdateType; 3] = [
    RefUpdateType::Forward,
    RefUpdateType::Backward,
    RefUpdateType::Last,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefManagerError {
    #[error("reference frame table must hold at least one slot")]
    EmptyTable,
    #[error("invalid maximum of {max} reference frames for a table of {table_size} slots")]
    InvalidMaxRefFrames { max: usize, table_size: usize },
}

/// Limits of a [`RefFrameManager`], fixed for the whole encoding session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefFrameManagerConfig {
    /// Number of slots in the reference frame table
    pub ref_frame_table_size: usize,
    /// Maximum number of references a single frame may predict from
    pub max_ref_frames: usize,
}

impl Default for RefFrameManagerConfig {
    fn default() -> Self {
        Self {
            ref_frame_table_size: DEFAULT_REF_FRAME_TABLE_SIZE,
            max_ref_frames: REFS_PER_FRAME,
        }
    }
}

impl RefFrameManagerConfig {
    pub fn validate(&self) -> Result<(), RefManagerError> {
        if self.ref_frame_table_size == 0 {
            return Err(RefManagerError::EmptyTable);
        }

        // Every reference of a frame needs a distinct name.
        if self.max_ref_frames == 0
            || self.max_ref_frames > self.ref_frame_table_size
            || self.max_ref_frames > REFS_PER_FRAME
        {
            return Err(RefManagerError::InvalidMaxRefFrames {
                max: self.max_ref_frames,
                table_size: self.ref_frame_table_size,
            });
        }

        Ok(())
    }
}

/// Returns the first name not in `used`, scanning the preference list of `ref_update_type`
/// starting at `priority_idx`. `used` is indexed with [`ReferenceName::idx`].
pub fn get_ref_name(
    ref_update_type: RefUpdateType,
    priority_idx: usize,
    used: &[bool; REFS_PER_FRAME],
) -> Option<ReferenceName> {
    let names = match ref_update_type {
        RefUpdateType::Forward => &FORWARD_NAMES,
        RefUpdateType::Backward => &BACKWARD_NAMES,
        RefUpdateType::Last => &LAST_NAMES,
        RefUpdateType::None => return None,
    };

    names
        .iter()
        .skip(priority_idx)
        .copied()
        .find(|name| !used[name.idx()])
}

/// Role a frame is stored with, decided once the display position has been advanced to
/// `cur_global_order_idx`.
fn infer_ref_update_type(gop_frame: &GopFrame, cur_global_order_idx: i32) -> RefUpdateType {
    if gop_frame.global_order_idx > cur_global_order_idx {
        return RefUpdateType::Forward;
    }

    if gop_frame.is_golden_frame {
        return RefUpdateType::Backward;
    }

    match gop_frame.encode_ref_mode {
        EncodeRefMode::Overlay | EncodeRefMode::ShowExisting => RefUpdateType::None,
        EncodeRefMode::Regular => RefUpdateType::Last,
    }
}

/// Owner of the reference frame table. One instance lives for a whole encoding session and is
/// fed the frames in coding order.
#[derive(Clone, Debug)]
pub struct RefFrameManager {
    /// Frame stored in each slot, [`GopFrame::invalid`] for slots never written.
    ref_frame_table: Vec<GopFrame>,
    max_ref_frames: usize,

    free_ref_idx_list: VecDeque<usize>,
    forward_stack: Vec<usize>,
    backward_queue: VecDeque<usize>,
    last_queue: VecDeque<usize>,

    /// Display position of the last shown frame
    cur_global_order_idx: i32,
}

impl RefFrameManager {
    pub fn new(config: RefFrameManagerConfig) -> Result<Self, RefManagerError> {
        config.validate()?;

        let mut manager = Self {
            ref_frame_table: vec![GopFrame::invalid(); config.ref_frame_table_size],
            max_ref_frames: config.max_ref_frames,
            free_ref_idx_list: VecDeque::with_capacity(config.ref_frame_table_size),
            forward_stack: Vec::with_capacity(config.ref_frame_table_size),
            backward_queue: VecDeque::with_capacity(config.ref_frame_table_size),
            last_queue: VecDeque::with_capacity(config.ref_frame_table_size),
            cur_global_order_idx: 0,
        };
        manager.reset();

        Ok(manager)
    }

    /// Creates a manager allowing as many references per frame as the table and the frame header
    /// permit.
    pub fn with_table_size(ref_frame_table_size: usize) -> Result<Self, RefManagerError> {
        Self::new(RefFrameManagerConfig {
            ref_frame_table_size,
            max_ref_frames: ref_frame_table_size.min(REFS_PER_FRAME),
        })
    }

    /// Drops every reference. Used at the start of a sequence.
    pub fn reset(&mut self) {
        log::trace!("Resetting reference frame table");

        self.free_ref_idx_list.clear();
        self.free_ref_idx_list.extend(0..self.ref_frame_table.len());
        self.forward_stack.clear();
        self.backward_queue.clear();
        self.last_queue.clear();
        self.ref_frame_table.fill(GopFrame::invalid());
        self.cur_global_order_idx = 0;
    }

    pub fn ref_frame_table_size(&self) -> usize {
        self.ref_frame_table.len()
    }

    pub fn max_ref_frames(&self) -> usize {
        self.max_ref_frames
    }

    /// Deepest forward stack a prediction structure may build, so at least one backward and one
    /// last reference can stay alive.
    pub fn forward_max_size(&self) -> usize {
        self.ref_frame_table.len().saturating_sub(2)
    }

    /// Number of live references.
    pub fn ref_frame_count(&self) -> usize {
        self.forward_stack.len() + self.backward_queue.len() + self.last_queue.len()
    }

    pub fn ref_frame_count_by_type(&self, ref_update_type: RefUpdateType) -> usize {
        match ref_update_type {
            RefUpdateType::Forward => self.forward_stack.len(),
            RefUpdateType::Backward => self.backward_queue.len(),
            RefUpdateType::Last => self.last_queue.len(),
            RefUpdateType::None => 0,
        }
    }

    pub fn free_ref_idx_count(&self) -> usize {
        self.free_ref_idx_list.len()
    }

    pub fn cur_global_order_idx(&self) -> i32 {
        self.cur_global_order_idx
    }

    /// Returns a free slot, evicting the oldest reference of the larger of the last and backward
    /// queues if none is free. Ties evict from the last queue.
    ///
    /// The table must be sized so that a full table always holds a last or backward reference.
    pub fn allocate_ref_idx(&mut self) -> usize {
        if self.free_ref_idx_list.is_empty() {
            let evicted = if self.last_queue.len() >= self.backward_queue.len() {
                self.last_queue.pop_front()
            } else {
                self.backward_queue.pop_front()
            };

            let ref_idx = match evicted {
                Some(ref_idx) => ref_idx,
                None => {
                    log::error!(
                        "Reference frame table of {} slots holds only forward references",
                        self.ref_frame_table.len()
                    );
                    self.forward_stack.remove(0)
                }
            };

            log::debug!("Evicting reference in slot {}", ref_idx);
            self.free_ref_idx_list.push_back(ref_idx);
        }

        // Not empty: either a slot was free or one was just evicted.
        let ref_idx = self.free_ref_idx_list.pop_front().unwrap_or_default();
        log::trace!("Allocated slot {}", ref_idx);
        ref_idx
    }

    /// Finds the slot of the `priority_idx`-th newest reference of `ref_update_type`.
    ///
    /// A lower `priority_idx` means a reference closer to the current frame in display order,
    /// eg. `(RefUpdateType::Forward, 0)` is the closest look-ahead frame.
    pub fn ref_frame_idx(
        &self,
        ref_update_type: RefUpdateType,
        priority_idx: usize,
    ) -> Option<usize> {
        let size = self.ref_frame_count_by_type(ref_update_type);
        if priority_idx >= size {
            return None;
        }

        let pos = size - priority_idx - 1;
        match ref_update_type {
            RefUpdateType::Forward => self.forward_stack.get(pos).copied(),
            RefUpdateType::Backward => self.backward_queue.get(pos).copied(),
            RefUpdateType::Last => self.last_queue.get(pos).copied(),
            RefUpdateType::None => None,
        }
    }

    pub fn ref_frame_by_index(&self, ref_idx: usize) -> Option<&GopFrame> {
        self.ref_frame_table.get(ref_idx)
    }

    /// Returns the frame stored for the `priority_idx`-th newest reference of `ref_update_type`,
    /// or an invalid frame if there is none.
    pub fn ref_frame_by_priority(
        &self,
        ref_update_type: RefUpdateType,
        priority_idx: usize,
    ) -> GopFrame {
        self.ref_frame_idx(ref_update_type, priority_idx)
            .and_then(|ref_idx| self.ref_frame_by_index(ref_idx))
            .cloned()
            .unwrap_or_else(GopFrame::invalid)
    }

    /// Builds the references the next frame predicts from, taking turns between forward, backward
    /// and last references, closest first. No name is given twice.
    pub fn ref_frame_list(&self) -> Vec<ReferenceFrame> {
        let mut priority_idx_list = [0usize; ROUND_ROBIN.len()];
        let mut available_ref_frames = self.ref_frame_count();
        let mut used_names = [false; REFS_PER_FRAME];
        let mut ref_frame_list = Vec::with_capacity(self.max_ref_frames);
        let mut round_robin_idx = 0;

        while ref_frame_list.len() < self.max_ref_frames && available_ref_frames > 0 {
            let ref_update_type = ROUND_ROBIN[round_robin_idx];
            let priority_idx = priority_idx_list[round_robin_idx];

            if let Some(index) = self.ref_frame_idx(ref_update_type, priority_idx) {
                let Some(name) = get_ref_name(ref_update_type, priority_idx, &used_names) else {
                    log::error!(
                        "No name left for {:?} reference {} in slot {}",
                        ref_update_type,
                        priority_idx,
                        index
                    );
                    break;
                };

                used_names[name.idx()] = true;
                ref_frame_list.push(ReferenceFrame { index, name });
                available_ref_frames -= 1;
                priority_idx_list[round_robin_idx] += 1;
            }

            round_robin_idx = (round_robin_idx + 1) % ROUND_ROBIN.len();
        }

        ref_frame_list
    }

    /// Picks the reference whose coding context suits `gop_frame` best: one at the same layer
    /// depth, then one of the same frame type, then the closest layer depth.
    pub fn primary_ref_frame(&self, gop_frame: &GopFrame) -> Option<ReferenceFrame> {
        self.ref_frame_list()
            .into_iter()
            .enumerate()
            .filter(|(_, ref_frame)| self.ref_frame_table[ref_frame.index].is_valid)
            .min_by_key(|(pos, ref_frame)| {
                let stored = &self.ref_frame_table[ref_frame.index];
                let depth_diff = (gop_frame.layer_depth - stored.layer_depth).abs();

                (
                    depth_diff != 0,
                    stored.update_type != gop_frame.update_type,
                    depth_diff,
                    *pos,
                )
            })
            .map(|(_, ref_frame)| ref_frame)
    }

    /// Advances the display position to `global_order_idx`. If the closest forward reference
    /// has been reached, it becomes a backward reference if it is a golden frame, a last
    /// reference otherwise. At most one reference moves per call.
    pub fn update_order(&mut self, global_order_idx: i32) {
        self.cur_global_order_idx = global_order_idx;

        let Some(&ref_idx) = self.forward_stack.last() else {
            return;
        };

        let stored = &self.ref_frame_table[ref_idx];
        if stored.global_order_idx > global_order_idx {
            return;
        }

        let is_golden_frame = stored.is_golden_frame;
        self.forward_stack.pop();
        if is_golden_frame {
            log::debug!("Slot {} moves from forward to backward", ref_idx);
            self.backward_queue.push_back(ref_idx);
        } else {
            log::debug!("Slot {} moves from forward to last", ref_idx);
            self.last_queue.push_back(ref_idx);
        }
    }

    /// Returns the slot of the closest forward reference if it is displayed at
    /// `global_order_idx`, ie. the frame at that position is shown from or overlaid on it.
    pub fn colocated_ref_idx(&self, global_order_idx: i32) -> Option<usize> {
        let &ref_idx = self.forward_stack.last()?;
        (self.ref_frame_table[ref_idx].global_order_idx == global_order_idx).then_some(ref_idx)
    }

    /// Assigns `gop_frame` its references and, unless `ref_update_type` is
    /// [`RefUpdateType::None`], stores it as a new reference of that role.
    pub fn update_ref_frame_table(
        &mut self,
        gop_frame: &mut GopFrame,
        ref_update_type: RefUpdateType,
        encode_ref_mode: EncodeRefMode,
    ) {
        gop_frame.encode_ref_mode = encode_ref_mode;
        self.update_with(gop_frame, |_, _| ref_update_type);
    }

    /// Like [`Self::update_ref_frame_table`], the role being derived from the frame's flags and
    /// display position.
    pub fn update_ref_frame_table_by_type(&mut self, gop_frame: &mut GopFrame) {
        self.update_with(gop_frame, infer_ref_update_type);
    }

    fn update_with<F>(&mut self, gop_frame: &mut GopFrame, ref_update_type: F)
    where
        F: FnOnce(&GopFrame, i32) -> RefUpdateType,
    {
        gop_frame.ref_frame_list = self.ref_frame_list();
        gop_frame.primary_ref_frame = self.primary_ref_frame(gop_frame);
        gop_frame.colocated_ref_idx = self.colocated_ref_idx(gop_frame.global_order_idx);

        if gop_frame.is_show_frame {
            self.update_order(gop_frame.global_order_idx);
        }

        // Decided after update_order() so the display position is current.
        let ref_update_type = ref_update_type(gop_frame, self.cur_global_order_idx);

        log::trace!(
            "Frame coding={} order={} uses {} references, stored as {:?}",
            gop_frame.global_coding_idx,
            gop_frame.global_order_idx,
            gop_frame.ref_frame_list.len(),
            ref_update_type
        );

        if ref_update_type == RefUpdateType::None {
            gop_frame.update_ref_idx = None;
            return;
        }

        let ref_idx = self.allocate_ref_idx();
        gop_frame.update_ref_idx = Some(ref_idx);
        self.push_ref(ref_update_type, ref_idx);
        self.ref_frame_table[ref_idx] = gop_frame.clone();
    }

    fn push_ref(&mut self, ref_update_type: RefUpdateType, ref_idx: usize) {
        match ref_update_type {
            RefUpdateType::Forward => self.forward_stack.push(ref_idx),
            RefUpdateType::Backward => self.backward_queue.push_back(ref_idx),
            RefUpdateType::Last => self.last_queue.push_back(ref_idx),
            RefUpdateType::None => (),
        }
    }

    /// Slots held by the free list and each role, in that order.
    pub fn slot_partition(&self) -> [Vec<usize>; 4] {
        [
            self.free_ref_idx_list.iter().copied().collect(),
            self.forward_stack.clone(),
            self.backward_queue.iter().copied().collect(),
            self.last_queue.iter().copied().collect(),
        ]
    }
}
