// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The in-memory device simulator (spec §4.5, component C7): an OID table,
//! a device wrapping it with community/USM policy and counters, the UDP
//! server loop answering requests against it, and a parser for the walk
//! files used to seed a device's table.

pub mod device;
pub mod server;
pub mod table;
pub mod walkfile;

pub use device::SimulatorDevice;
pub use server::SimServer;
pub use table::OidTable;
