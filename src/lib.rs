// Copyright 2022 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Reference frame management for AV1 encoders.
//!
//! [`codec::av1::reference_manager::RefFrameManager`] decides, frame by frame in coding order,
//! which previously coded frames stay available for prediction and under which reference name
//! each of them is signalled. [`encoder::av1::gop`] plans groups of pictures on top of it and
//! [`encoder::av1::signaling`] turns its decisions into frame header fields.

pub mod codec;
pub mod encoder;
