// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! User-based Security Model for SNMPv3 (RFC 3414), component of spec
//! §4.4: key localization, HMAC authentication, DES/AES privacy, and
//! engine discovery/time-window tracking.

pub mod auth;
pub mod discovery;
pub mod key;
pub mod params;
pub mod privacy;
pub mod user;

pub use discovery::EngineState;
pub use params::UsmSecurityParameters;
pub use user::{AuthProtocol, PrivProtocol, UsmUser};
