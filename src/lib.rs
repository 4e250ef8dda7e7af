// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A pure-Rust SNMP v1/v2c/v3 toolkit: BER codec, manager engine with
//! GET/GET-NEXT/GET-BULK and walk algorithms, multi-target fan-out, USM
//! security, and an in-memory device simulator.

pub mod ber;
pub mod config;
pub mod error;
pub mod fanout;
pub mod logging;
pub mod manager;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod sim;
pub mod target;
pub mod transport;
pub mod usm;
pub mod value;
pub mod varbind;

pub use error::{Result, SnmpError};
pub use message::Message;
pub use oid::Oid;
pub use pdu::Pdu;
pub use value::SnmpValue;
pub use varbind::VarBind;
