//! DWIN DGUS Display Protocol
//!
//! This crate defines the UART framing spoken between the instrument
//! controller and its DWIN touchscreen. The display owns the widgets; the
//! controller writes variables (VPs) and receives VP reports when the user
//! touches a key or finishes a text entry.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌────────┬────────┬─────┬─────────┬─────────────┐
//! │ HEADER │ LENGTH │ CMD │ VP ADDR │ PAYLOAD     │
//! │ 5A A5  │ 1B     │ 1B  │ 2B (BE) │ 0–58B       │
//! └────────┴────────┴─────┴─────────┴─────────────┘
//! ```
//!
//! LENGTH counts every byte after itself. There is no checksum.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;
pub mod receiver;

pub use frame::{
    Frame, FrameError, CMD_READ_VP, CMD_WRITE_VP, FRAME_HEADER, MAX_FRAME_LEN, MAX_PAYLOAD_SIZE,
};
pub use messages::{ControllerMessage, DisplayMessage, VpReport, VP_PAGE_SWITCH};
pub use receiver::{FrameHandler, FrameReceiver, RxState, RxStats};
