// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Planning of groups of pictures in coding order.
//!
//! A group of `n` shown frames is coded as a pyramid: its last frame is coded first as an unshown
//! alt-ref (ARF), then the frames before it are split recursively around intermediate ARFs, each
//! shown later through a show-existing frame, and the group ends with an overlay on the ARF.
//! Every planned frame is pushed through the [`RefFrameManager`] right away, which stamps its
//! references and stores it as a reference if needed.

use crate::codec::av1::gop_frame::GopFrame;
use crate::codec::av1::gop_frame::GopFrameType;
use crate::codec::av1::reference_manager::RefFrameManager;
use crate::codec::av1::NUM_REF_FRAMES;
use crate::encoder::av1::signaling::FrameRefSignaling;
use crate::encoder::av1::EncoderConfig;
use crate::encoder::av1::PredictionStructure;
use crate::encoder::EncodeError;
use crate::encoder::EncodeResult;

/// Smallest number of frames split around an intermediate ARF.
pub const MIN_INTERVAL_TO_ADD_ARF: i32 = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GopStruct {
    pub show_frame_count: i32,
    pub global_coding_idx_offset: i32,
    pub global_order_idx_offset: i32,
    /// Frames in coding order
    pub gop_frame_list: Vec<GopFrame>,
}

struct GopBuilder<'a> {
    manager: &'a mut RefFrameManager,
    gop_struct: GopStruct,
    /// Depth of the frames at the bottom of the pyramid
    max_depth: i32,
}

impl<'a> GopBuilder<'a> {
    fn push(&mut self, order_idx: i32, depth: i32, gop_frame_type: GopFrameType) {
        let mut gop_frame = GopFrame::basic(
            self.gop_struct.global_coding_idx_offset,
            self.gop_struct.global_order_idx_offset,
            self.gop_struct.gop_frame_list.len() as i32,
            order_idx,
            depth,
            gop_frame_type,
        );

        self.manager.update_ref_frame_table_by_type(&mut gop_frame);
        self.gop_struct.gop_frame_list.push(gop_frame);
    }

    fn push_leaves(&mut self, order_start: i32, order_end: i32) {
        for order_idx in order_start..order_end {
            self.push(order_idx, self.max_depth, GopFrameType::RegularLeaf);
        }
    }

    /// Plans the shown frames `order_start..order_end` from pyramid level `depth` down.
    fn push_multi_layer(&mut self, depth: i32, order_start: i32, order_end: i32) {
        if depth >= self.max_depth || order_end - order_start < MIN_INTERVAL_TO_ADD_ARF {
            self.push_leaves(order_start, order_end);
            return;
        }

        let order_mid = (order_start + order_end) / 2;

        self.push(order_mid, depth, GopFrameType::IntermediateArf);
        self.push_multi_layer(depth + 1, order_start, order_mid);
        self.push(order_mid, self.max_depth, GopFrameType::ShowExisting);
        self.push_multi_layer(depth + 1, order_mid + 1, order_end);
    }
}

fn build_gop(
    manager: &mut RefFrameManager,
    show_frame_count: i32,
    has_key_frame: bool,
    use_arf: bool,
    global_coding_idx_offset: i32,
    global_order_idx_offset: i32,
) -> EncodeResult<GopStruct> {
    if show_frame_count < 1 {
        return Err(EncodeError::EmptyGop);
    }

    let max_depth = manager.forward_max_size() as i32;
    let mut builder = GopBuilder {
        manager,
        gop_struct: GopStruct {
            show_frame_count,
            global_coding_idx_offset,
            global_order_idx_offset,
            gop_frame_list: Vec::new(),
        },
        max_depth,
    };

    let mut order_start = 0;
    let order_end = show_frame_count - 1;

    if has_key_frame {
        builder.manager.reset();
        builder.push(order_start, -1, GopFrameType::RegularKey);
        order_start += 1;
    }

    // The ARF must stay in the forward stack until its overlay.
    let has_arf = use_arf && max_depth > 0 && show_frame_count > MIN_INTERVAL_TO_ADD_ARF;

    if has_arf {
        builder.push(order_end, 0, GopFrameType::RegularArf);
        builder.push_multi_layer(1, order_start, order_end);
        builder.push(order_end, max_depth, GopFrameType::Overlay);
    } else {
        builder.push_leaves(order_start, show_frame_count);
    }

    log::debug!(
        "Planned GOP of {} shown frames in {} coded frames, first coded frame {}",
        show_frame_count,
        builder.gop_struct.gop_frame_list.len(),
        global_coding_idx_offset
    );

    Ok(builder.gop_struct)
}

/// Plans a pyramid group of `show_frame_count` shown frames. With `has_key_frame` the manager is
/// reset and the group starts with a keyframe.
pub fn construct_gop(
    manager: &mut RefFrameManager,
    show_frame_count: i32,
    has_key_frame: bool,
    global_coding_idx_offset: i32,
    global_order_idx_offset: i32,
) -> EncodeResult<GopStruct> {
    build_gop(
        manager,
        show_frame_count,
        has_key_frame,
        true,
        global_coding_idx_offset,
        global_order_idx_offset,
    )
}

/// Plans a group of `show_frame_count` frames coded in display order.
pub fn construct_low_delay_gop(
    manager: &mut RefFrameManager,
    show_frame_count: i32,
    has_key_frame: bool,
    global_coding_idx_offset: i32,
    global_order_idx_offset: i32,
) -> EncodeResult<GopStruct> {
    build_gop(
        manager,
        show_frame_count,
        has_key_frame,
        false,
        global_coding_idx_offset,
        global_order_idx_offset,
    )
}

/// Returns the decoder side content of the reference slots before each frame of `gop_struct`,
/// followed by the content after its last frame. `ref_frame_table` is the content before the
/// group, padded with invalid frames up to `ref_frame_table_size`.
///
/// A keyframe refreshes every slot.
pub fn ref_frame_table_list(
    gop_struct: &GopStruct,
    ref_frame_table: &[GopFrame],
    ref_frame_table_size: usize,
) -> Vec<Vec<GopFrame>> {
    let mut table = ref_frame_table.to_vec();
    table.resize(ref_frame_table_size, GopFrame::invalid());

    let mut table_list = Vec::with_capacity(gop_struct.gop_frame_list.len() + 1);
    table_list.push(table.clone());

    for gop_frame in &gop_struct.gop_frame_list {
        if gop_frame.is_key_frame {
            table.fill(gop_frame.clone());
        } else if let Some(slot) = gop_frame.update_ref_idx.and_then(|idx| table.get_mut(idx)) {
            *slot = gop_frame.clone();
        }

        table_list.push(table.clone());
    }

    table_list
}

/// A planned group with the frame header reference fields of each of its frames.
#[derive(Clone, Debug)]
pub struct PlannedGop {
    pub gop_struct: GopStruct,
    /// One entry per frame of [`GopStruct::gop_frame_list`]
    pub signaling: Vec<FrameRefSignaling>,
}

/// Splits a sequence into groups of pictures according to the configured
/// [`PredictionStructure`] and plans them one after another.
pub struct GopPlanner {
    config: EncoderConfig,
    manager: RefFrameManager,

    /// Decoder side content of the reference slots
    ref_frame_table: Vec<GopFrame>,

    /// Coding position of the next planned frame
    global_coding_idx: i32,
    /// Display position of the next shown frame
    global_order_idx: i32,
    /// Shown frames left before the next keyframe. Zero requests a keyframe.
    frames_until_key: u32,
}

impl GopPlanner {
    pub fn new(config: EncoderConfig) -> EncodeResult<Self> {
        let size = config.ref_frames.ref_frame_table_size;
        if size > NUM_REF_FRAMES {
            return Err(EncodeError::TableTooLarge {
                size,
                max: NUM_REF_FRAMES,
            });
        }

        let manager = RefFrameManager::new(config.ref_frames.clone())?;

        Ok(Self {
            ref_frame_table: vec![GopFrame::invalid(); manager.ref_frame_table_size()],
            manager,
            config,
            global_coding_idx: 0,
            global_order_idx: 0,
            frames_until_key: 0,
        })
    }

    pub fn manager(&self) -> &RefFrameManager {
        &self.manager
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Forces the next group to start with a keyframe.
    pub fn force_keyframe(&mut self) {
        self.frames_until_key = 0;
    }

    /// Plans the next group, covering at most `pending` shown frames.
    pub fn next_gop(&mut self, pending: u32) -> EncodeResult<PlannedGop> {
        if pending == 0 {
            return Err(EncodeError::EmptyGop);
        }

        let (key_frame_interval, gop_size, use_arf) = match self.config.pred_structure {
            PredictionStructure::LowDelay { limit } => (limit as u32, limit as u32, false),
            PredictionStructure::Pyramid {
                gop_size,
                key_frame_interval,
            } => (key_frame_interval, gop_size as u32, true),
        };

        let has_key_frame = self.frames_until_key == 0;
        let mut frames_until_key = self.frames_until_key;
        if has_key_frame {
            log::trace!("Requesting keyframe at display position {}", self.global_order_idx);
            frames_until_key = key_frame_interval.max(1);
        }

        let show_frame_count = pending.min(gop_size.max(1)).min(frames_until_key);
        frames_until_key -= show_frame_count;

        // Planned on a copy, the session only advances once the whole group is signalled.
        let mut manager = self.manager.clone();
        let gop_struct = build_gop(
            &mut manager,
            show_frame_count as i32,
            has_key_frame,
            use_arf,
            self.global_coding_idx,
            self.global_order_idx,
        )?;

        let mut table_list = ref_frame_table_list(
            &gop_struct,
            &self.ref_frame_table,
            manager.ref_frame_table_size(),
        );

        let signaling = gop_struct
            .gop_frame_list
            .iter()
            .zip(table_list.iter())
            .map(|(gop_frame, table)| {
                FrameRefSignaling::new(gop_frame, table, self.config.order_hint_bits)
            })
            .collect::<EncodeResult<Vec<_>>>()?;

        self.ref_frame_table = table_list.pop().ok_or(EncodeError::InvalidInternalState)?;
        self.manager = manager;
        self.frames_until_key = frames_until_key;
        self.global_coding_idx += gop_struct.gop_frame_list.len() as i32;
        self.global_order_idx += show_frame_count as i32;

        Ok(PlannedGop {
            gop_struct,
            signaling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::av1::gop_frame::RefUpdateType;
    use crate::codec::av1::gop_frame::LAYER_DEPTH_OFFSET;
    use crate::codec::av1::reference_manager::RefFrameManagerConfig;
    use crate::codec::av1::ReferenceName;

    const TABLE_SIZE: usize = 7;

    fn check_display_order(gop_struct: &GopStruct) {
        let shown: Vec<i32> = gop_struct
            .gop_frame_list
            .iter()
            .filter(|f| f.is_show_frame)
            .map(|f| f.order_idx)
            .collect();

        assert_eq!(shown, (0..gop_struct.show_frame_count).collect::<Vec<_>>());
    }

    fn check_global_indices(gop_struct: &GopStruct) {
        let mut expected_global_order_idx = gop_struct.global_order_idx_offset;
        for gop_frame in gop_struct.gop_frame_list.iter() {
            assert_eq!(
                gop_frame.global_coding_idx,
                gop_struct.global_coding_idx_offset + gop_frame.coding_idx
            );
            if gop_frame.is_show_frame {
                assert_eq!(gop_frame.global_order_idx, expected_global_order_idx);
                expected_global_order_idx += 1;
            }
        }
    }

    /// Every unshown frame is shown later from its colocated reference.
    fn check_colocated_show_frame(gop_struct: &GopStruct) {
        let frames = &gop_struct.gop_frame_list;
        for (i, gop_frame) in frames.iter().enumerate() {
            if gop_frame.is_show_frame {
                continue;
            }

            let shown = frames[i + 1..]
                .iter()
                .find(|f| f.order_idx == gop_frame.order_idx)
                .expect("unshown frame is never shown");

            assert!(shown.is_show_frame);
            assert!(gop_frame.update_ref_idx.is_some());
            assert_eq!(shown.colocated_ref_idx, gop_frame.update_ref_idx);
        }
    }

    fn check_layer_depth(gop_struct: &GopStruct, max_layer_depth: i32) {
        for gop_frame in gop_struct.gop_frame_list.iter() {
            if gop_frame.is_key_frame {
                assert_eq!(gop_frame.layer_depth, 0);
            } else if gop_frame.is_arf_frame {
                assert!(gop_frame.layer_depth < max_layer_depth);
            } else {
                assert_eq!(gop_frame.layer_depth, max_layer_depth);
            }
        }
    }

    fn check_arf_interval(gop_struct: &GopStruct) {
        let mut arf_order_idx_list: Vec<i32> = gop_struct
            .gop_frame_list
            .iter()
            .filter(|f| f.is_arf_frame)
            .map(|f| f.order_idx)
            .collect();
        arf_order_idx_list.sort();

        for pair in arf_order_idx_list.windows(2) {
            assert!(pair[1] - pair[0] >= 2, "ARFs too close: {:?}", arf_order_idx_list);
        }
    }

    fn check_unique_names(gop_struct: &GopStruct) {
        for gop_frame in gop_struct.gop_frame_list.iter() {
            let mut used = [false; 8];
            for ref_frame in gop_frame.ref_frame_list.iter() {
                assert!(!used[ref_frame.name as usize]);
                used[ref_frame.name as usize] = true;
            }
        }
    }

    fn check_gop(manager: &RefFrameManager, gop_struct: &GopStruct) {
        check_display_order(gop_struct);
        check_global_indices(gop_struct);
        check_colocated_show_frame(gop_struct);
        check_layer_depth(
            gop_struct,
            manager.forward_max_size() as i32 + LAYER_DEPTH_OFFSET,
        );
        check_arf_interval(gop_struct);
        check_unique_names(gop_struct);
        assert_eq!(
            manager.free_ref_idx_count() + manager.ref_frame_count(),
            manager.ref_frame_table_size()
        );
    }

    #[test]
    fn test_construct_gop_arf() {
        let _ = env_logger::try_init();

        let mut manager = RefFrameManager::with_table_size(TABLE_SIZE).unwrap();
        let gop_struct = construct_gop(&mut manager, 16, false, 5, 20).unwrap();

        assert_eq!(gop_struct.show_frame_count, 16);
        assert_eq!(gop_struct.global_coding_idx_offset, 5);
        assert_eq!(gop_struct.global_order_idx_offset, 20);
        check_gop(&manager, &gop_struct);

        let first = &gop_struct.gop_frame_list[0];
        assert_eq!(first.update_type, GopFrameType::RegularArf);
        assert_eq!(first.order_idx, 15);

        let last = gop_struct.gop_frame_list.last().unwrap();
        assert_eq!(last.update_type, GopFrameType::Overlay);
        assert_eq!(last.order_idx, 15);
        assert_eq!(last.colocated_ref_idx, first.update_ref_idx);

        // Every look-ahead frame has been shown.
        assert_eq!(manager.ref_frame_count_by_type(RefUpdateType::Forward), 0);
    }

    #[test]
    fn test_construct_gop_key() {
        let mut manager = RefFrameManager::with_table_size(TABLE_SIZE).unwrap();
        let gop_struct = construct_gop(&mut manager, 16, true, 10, 8).unwrap();

        assert_eq!(gop_struct.show_frame_count, 16);
        check_gop(&manager, &gop_struct);

        let key = &gop_struct.gop_frame_list[0];
        assert!(key.is_key_frame);
        assert!(key.ref_frame_list.is_empty());
        assert_eq!(key.primary_ref_frame, None);
        assert_eq!(key.global_order_idx, 8);

        // The ARF comes right after the keyframe and sees only it.
        let arf = &gop_struct.gop_frame_list[1];
        assert_eq!(arf.update_type, GopFrameType::RegularArf);
        assert_eq!(arf.ref_frame_list.len(), 1);
        assert_eq!(arf.ref_frame_list[0].name, ReferenceName::Golden);
    }

    #[test]
    fn test_construct_gop_short() {
        let mut manager = RefFrameManager::with_table_size(TABLE_SIZE).unwrap();
        let gop_struct = construct_gop(&mut manager, 3, true, 0, 0).unwrap();

        let types: Vec<GopFrameType> = gop_struct
            .gop_frame_list
            .iter()
            .map(|f| f.update_type)
            .collect();
        assert_eq!(
            types,
            vec![
                GopFrameType::RegularKey,
                GopFrameType::RegularLeaf,
                GopFrameType::RegularLeaf
            ]
        );
        check_gop(&manager, &gop_struct);
    }

    #[test]
    fn test_construct_gop_small_pyramid() {
        let mut manager = RefFrameManager::with_table_size(TABLE_SIZE).unwrap();
        let gop_struct = construct_gop(&mut manager, 8, true, 0, 0).unwrap();

        let planned: Vec<(GopFrameType, i32)> = gop_struct
            .gop_frame_list
            .iter()
            .map(|f| (f.update_type, f.order_idx))
            .collect();
        assert_eq!(
            planned,
            vec![
                (GopFrameType::RegularKey, 0),
                (GopFrameType::RegularArf, 7),
                (GopFrameType::IntermediateArf, 4),
                (GopFrameType::IntermediateArf, 2),
                (GopFrameType::RegularLeaf, 1),
                (GopFrameType::ShowExisting, 2),
                (GopFrameType::RegularLeaf, 3),
                (GopFrameType::ShowExisting, 4),
                (GopFrameType::RegularLeaf, 5),
                (GopFrameType::RegularLeaf, 6),
                (GopFrameType::Overlay, 7),
            ]
        );
        check_gop(&manager, &gop_struct);
    }

    #[test]
    fn test_construct_gop_empty() {
        let mut manager = RefFrameManager::with_table_size(TABLE_SIZE).unwrap();
        assert_eq!(
            construct_gop(&mut manager, 0, true, 0, 0),
            Err(EncodeError::EmptyGop)
        );
    }

    #[test]
    fn test_construct_low_delay_gop() {
        let mut manager = RefFrameManager::with_table_size(3).unwrap();
        let gop_struct = construct_low_delay_gop(&mut manager, 10, true, 0, 0).unwrap();

        assert_eq!(gop_struct.gop_frame_list.len(), 10);
        assert!(gop_struct.gop_frame_list.iter().all(|f| f.is_show_frame));
        check_display_order(&gop_struct);
        check_unique_names(&gop_struct);

        // Keyframe stays as golden, the two most recent leaves fill the rest of the table.
        let last = gop_struct.gop_frame_list.last().unwrap();
        let names: Vec<ReferenceName> = last.ref_frame_list.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                ReferenceName::Golden,
                ReferenceName::Last,
                ReferenceName::Last2
            ]
        );
        let key_slot = gop_struct.gop_frame_list[0].update_ref_idx;
        assert_eq!(Some(last.ref_frame_list[0].index), key_slot);
        assert_eq!(manager.ref_frame_count(), 3);
    }

    #[test]
    fn test_consecutive_gops() {
        let mut manager = RefFrameManager::with_table_size(TABLE_SIZE).unwrap();
        let first = construct_gop(&mut manager, 16, true, 0, 0).unwrap();
        check_gop(&manager, &first);

        let coded = first.gop_frame_list.len() as i32;
        let second = construct_gop(&mut manager, 16, false, coded, 16).unwrap();
        check_gop(&manager, &second);

        // The second group predicts from what the first one left behind.
        assert!(!second.gop_frame_list[0].ref_frame_list.is_empty());
    }

    fn frame_with_slot(index: i32, ty: GopFrameType, update_ref_idx: Option<usize>) -> GopFrame {
        let mut frame = GopFrame::basic(index, index, index, index, 0, ty);
        frame.update_ref_idx = update_ref_idx;
        frame
    }

    #[test]
    fn test_ref_frame_table_list_first_gop() {
        let invalid = GopFrame::invalid();
        let frame0 = frame_with_slot(0, GopFrameType::RegularKey, None);
        let frame1 = frame_with_slot(1, GopFrameType::RegularLeaf, Some(2));
        let frame2 = frame_with_slot(2, GopFrameType::RegularLeaf, Some(0));

        let gop_struct = GopStruct {
            show_frame_count: 3,
            gop_frame_list: vec![frame0.clone(), frame1.clone(), frame2.clone()],
            ..Default::default()
        };

        assert_eq!(
            ref_frame_table_list(&gop_struct, &[], 3),
            vec![
                vec![invalid.clone(), invalid.clone(), invalid],
                vec![frame0.clone(), frame0.clone(), frame0.clone()],
                vec![frame0.clone(), frame0.clone(), frame1.clone()],
                vec![frame2, frame0, frame1],
            ]
        );
    }

    #[test]
    fn test_ref_frame_table_list_not_first_gop() {
        let previous = frame_with_slot(0, GopFrameType::RegularKey, None);
        let frame0 = frame_with_slot(5, GopFrameType::RegularLeaf, Some(2));
        let frame1 = frame_with_slot(6, GopFrameType::RegularLeaf, None);
        let frame2 = frame_with_slot(7, GopFrameType::RegularLeaf, Some(0));

        let gop_struct = GopStruct {
            show_frame_count: 3,
            global_coding_idx_offset: 5,
            global_order_idx_offset: 5,
            gop_frame_list: vec![frame0.clone(), frame1, frame2.clone()],
        };

        let initial = vec![previous.clone(); 3];
        assert_eq!(
            ref_frame_table_list(&gop_struct, &initial, 3),
            vec![
                vec![previous.clone(), previous.clone(), previous.clone()],
                vec![previous.clone(), previous.clone(), frame0.clone()],
                vec![previous.clone(), previous.clone(), frame0.clone()],
                vec![frame2, previous, frame0],
            ]
        );
    }

    #[test]
    fn test_planner_pyramid() {
        let config = EncoderConfig {
            pred_structure: PredictionStructure::Pyramid {
                gop_size: 16,
                key_frame_interval: 40,
            },
            ..Default::default()
        };
        let mut planner = GopPlanner::new(config).unwrap();

        let mut pending = 50u32;
        let mut gops = Vec::new();
        while pending > 0 {
            let planned = planner.next_gop(pending).unwrap();
            assert_eq!(
                planned.signaling.len(),
                planned.gop_struct.gop_frame_list.len()
            );
            check_gop(planner.manager(), &planned.gop_struct);
            pending -= planned.gop_struct.show_frame_count as u32;
            gops.push(planned.gop_struct);
        }

        let lengths: Vec<i32> = gops.iter().map(|g| g.show_frame_count).collect();
        assert_eq!(lengths, vec![16, 16, 8, 10]);

        let keys: Vec<bool> = gops
            .iter()
            .map(|g| g.gop_frame_list[0].is_key_frame)
            .collect();
        assert_eq!(keys, vec![true, false, false, true]);

        let offsets: Vec<i32> = gops.iter().map(|g| g.global_order_idx_offset).collect();
        assert_eq!(offsets, vec![0, 16, 32, 40]);

        assert_eq!(planner.next_gop(0).unwrap_err(), EncodeError::EmptyGop);
    }

    #[test]
    fn test_planner_low_delay() {
        let config = EncoderConfig {
            pred_structure: PredictionStructure::LowDelay { limit: 4 },
            ref_frames: RefFrameManagerConfig {
                ref_frame_table_size: 3,
                max_ref_frames: 3,
            },
            ..Default::default()
        };
        let mut planner = GopPlanner::new(config).unwrap();

        let first = planner.next_gop(6).unwrap();
        assert_eq!(first.gop_struct.show_frame_count, 4);
        assert_eq!(first.signaling[0].refresh_frame_flags, 0xff);

        let second = planner.next_gop(2).unwrap();
        assert_eq!(second.gop_struct.show_frame_count, 2);
        assert!(second.gop_struct.gop_frame_list[0].is_key_frame);

        planner.force_keyframe();
        let third = planner.next_gop(1).unwrap();
        assert!(third.gop_struct.gop_frame_list[0].is_key_frame);
        assert_eq!(third.gop_struct.global_order_idx_offset, 6);
        assert_eq!(third.gop_struct.global_coding_idx_offset, 6);
    }

    #[test]
    fn test_planner_table_size_limit() {
        let config = |ref_frame_table_size| EncoderConfig {
            ref_frames: RefFrameManagerConfig {
                ref_frame_table_size,
                max_ref_frames: 7,
            },
            ..Default::default()
        };

        assert_eq!(
            GopPlanner::new(config(NUM_REF_FRAMES + 1)).err(),
            Some(EncodeError::TableTooLarge {
                size: NUM_REF_FRAMES + 1,
                max: NUM_REF_FRAMES,
            })
        );

        // A table filling every frame header slot plans and signals normally.
        let mut planner = GopPlanner::new(config(NUM_REF_FRAMES)).unwrap();
        for _ in 0..3 {
            let planned = planner.next_gop(16).unwrap();
            check_gop(planner.manager(), &planned.gop_struct);
            for signaling in planned.signaling.iter() {
                assert!(signaling
                    .ref_frame_idx
                    .iter()
                    .all(|&slot| (slot as usize) < NUM_REF_FRAMES));
            }
        }
        assert_eq!(planner.manager().ref_frame_table_size(), NUM_REF_FRAMES);
    }
}
