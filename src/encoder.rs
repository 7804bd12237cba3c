// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod av1;

use thiserror::Error;

use crate::codec::av1::reference_manager::RefManagerError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("a group of pictures must show at least one frame")]
    EmptyGop,
    #[error("reference slot {0} cannot be signalled in a frame header")]
    InvalidSlot(usize),
    #[error("reference frame table of {size} slots exceeds the {max} header slots")]
    TableTooLarge { size: usize, max: usize },
    #[error("frame shown from display position {order} has no colocated reference")]
    MissingColocatedReference { order: i32 },
    #[error("invalid internal state. This is likely a bug.")]
    InvalidInternalState,
    #[error(transparent)]
    RefManager(#[from] RefManagerError),
}

pub type EncodeResult<T> = Result<T, EncodeError>;
