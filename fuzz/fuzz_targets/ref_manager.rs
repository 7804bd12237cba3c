#![no_main]

use av1_refs::codec::av1::gop_frame::EncodeRefMode;
use av1_refs::codec::av1::gop_frame::GopFrame;
use av1_refs::codec::av1::gop_frame::GopFrameType;
use av1_refs::codec::av1::gop_frame::RefUpdateType;
use av1_refs::codec::av1::reference_manager::RefFrameManager;
use av1_refs::codec::av1::reference_manager::RefFrameManagerConfig;
use av1_refs::encoder::av1::gop::construct_gop;
use libfuzzer_sys::fuzz_target;

fn check_invariants(manager: &RefFrameManager) -> anyhow::Result<()> {
    let mut seen = vec![false; manager.ref_frame_table_size()];
    for slots in manager.slot_partition().iter() {
        for &slot in slots {
            anyhow::ensure!(!seen[slot], "slot {} held twice", slot);
            seen[slot] = true;
        }
    }
    anyhow::ensure!(seen.iter().all(|&s| s), "slot lost");

    let list = manager.ref_frame_list();
    anyhow::ensure!(list.len() <= manager.max_ref_frames());
    let mut used = [false; 8];
    for ref_frame in list.iter() {
        anyhow::ensure!(!used[ref_frame.name as usize], "name {:?} reused", ref_frame.name);
        used[ref_frame.name as usize] = true;
    }

    Ok(())
}

fn run(data: &[u8]) -> anyhow::Result<()> {
    let Some((&head, ops)) = data.split_first() else {
        return Ok(());
    };

    // Table sizes of 3 to 8 slots.
    let ref_frame_table_size = 3 + (head & 0x7) as usize % 6;
    let max_ref_frames = 1 + (head >> 3) as usize % ref_frame_table_size.min(7);
    let mut manager = RefFrameManager::new(RefFrameManagerConfig {
        ref_frame_table_size,
        max_ref_frames,
    })?;

    let mut global_order_idx = 0i32;
    for (coding_idx, chunk) in ops.chunks(2).enumerate() {
        let op = chunk[0];
        let arg = chunk.get(1).copied().unwrap_or_default();

        match op % 4 {
            0 => manager.reset(),
            1 => {
                // Frame with an explicit role. Forward frames are kept bounded so eviction can
                // always find a last or backward reference.
                let role = match arg % 3 {
                    0 if manager.ref_frame_count_by_type(RefUpdateType::Forward)
                        < manager.forward_max_size() =>
                    {
                        RefUpdateType::Forward
                    }
                    1 => RefUpdateType::Backward,
                    2 => RefUpdateType::Last,
                    _ => RefUpdateType::None,
                };
                let ty = GopFrameType::n(arg >> 5).unwrap_or_default();
                let order = match role {
                    RefUpdateType::Forward => global_order_idx + 1 + (arg >> 2 & 0x7) as i32,
                    _ => global_order_idx,
                };
                let mut frame = GopFrame::basic(0, 0, coding_idx as i32, order, 0, ty);
                let mode = EncodeRefMode::n(op >> 6).unwrap_or_default();
                manager.update_ref_frame_table(&mut frame, role, mode);
                global_order_idx += 1;
            }
            2 => manager.update_order(arg as i32),
            _ => {
                let count = 1 + (arg % 24) as i32;
                construct_gop(&mut manager, count, op & 0x80 != 0, 0, global_order_idx)?;
                global_order_idx += count;
            }
        }

        check_invariants(&manager)?;
    }

    Ok(())
}

fuzz_target!(|data: &[u8]| {
    if let Err(e) = run(data) {
        panic!("{:#}", e);
    }
});
