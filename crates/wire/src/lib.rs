// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket wire types and length-prefixed JSON framing, shared by
//! `devmand-daemon` and `devmand-cli`.

pub mod framing;
pub mod request;
pub mod response;

pub use framing::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_BYTES};
pub use request::Request;
pub use response::Response;
