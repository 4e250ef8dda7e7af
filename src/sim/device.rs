// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The simulator device: an in-memory agent with community/USM policy and
//! the observable counters of spec §4.5.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Mutex, RwLock,
    },
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::{oid::Oid, sim::table::OidTable, usm::UsmUser, value::SnmpValue};

/// Bound on the `processing_times_us` ring (spec §4.5: "N ~ 1000").
const PROCESSING_SAMPLES_CAP: usize = 1000;

/// Default response size cap when the peer does not negotiate a lower
/// `msg_max_size` (spec §4.5, §6).
pub const DEFAULT_RESPONSE_CAP: usize = 1472;

/// Per-device telemetry (spec §4.5 "Observable counters"). Each counter is
/// an independent atomic; there is no cross-counter consistency guarantee
/// beyond "eventually incremented".
#[derive(Debug, Default)]
pub struct Counters {
    pub packets_received: AtomicU64,
    pub packets_sent: AtomicU64,
    pub successful_responses: AtomicU64,
    pub error_responses: AtomicU64,
    pub auth_failures: AtomicU64,
    pub decode_errors: AtomicU64,
    pub encode_errors: AtomicU64,
    pub send_errors: AtomicU64,
    processing_times_us: Mutex<VecDeque<u64>>,
}

impl Counters {
    pub fn record_processing_time(&self, micros: u64) {
        let mut ring = self.processing_times_us.lock().expect("counters mutex poisoned");
        if ring.len() == PROCESSING_SAMPLES_CAP {
            ring.pop_front();
        }
        ring.push_back(micros);
    }

    /// A snapshot of the last (up to) 1000 per-packet processing times.
    pub fn processing_times_us(&self) -> Vec<u64> {
        self.processing_times_us.lock().expect("counters mutex poisoned").iter().copied().collect()
    }
}

/// An in-memory SNMP agent (spec §4.5 component C7). Reads take a
/// consistent snapshot under a shared lock; SET takes the same lock
/// exclusively so mutations are serialized per device.
pub struct SimulatorDevice {
    pub table: RwLock<OidTable>,
    pub community: Vec<u8>,
    pub engine_id: Vec<u8>,
    pub engine_boots: u32,
    boot_instant: Instant,
    pub users: HashMap<String, UsmUser>,
    pub response_cap: usize,
    next_msg_id: AtomicU32,
    salt_counter: AtomicU32,
    pub counters: Counters,
}

impl SimulatorDevice {
    pub fn new(community: impl Into<Vec<u8>>, engine_id: impl Into<Vec<u8>>) -> Self {
        SimulatorDevice {
            table: RwLock::new(OidTable::new()),
            community: community.into(),
            engine_id: engine_id.into(),
            engine_boots: 1,
            boot_instant: Instant::now(),
            users: HashMap::new(),
            response_cap: DEFAULT_RESPONSE_CAP,
            next_msg_id: AtomicU32::new(1),
            salt_counter: AtomicU32::new(1),
            counters: Counters::default(),
        }
    }

    pub fn with_user(mut self, user: UsmUser) -> Self {
        self.users.insert(user.security_name.clone(), user);
        self
    }

    pub fn with_response_cap(mut self, cap: usize) -> Self {
        self.response_cap = cap;
        self
    }

    pub fn load(&self, entries: Vec<(Oid, SnmpValue)>) {
        let mut table = self.table.write().expect("table lock poisoned");
        for (oid, value) in entries {
            table.set(oid, value);
        }
    }

    /// RFC 3414 `engineTime`: seconds elapsed since this device booted.
    pub fn engine_time(&self) -> u32 {
        self.boot_instant.elapsed().as_secs() as u32
    }

    pub fn next_msg_id(&self) -> i32 {
        self.next_msg_id.fetch_add(1, Ordering::Relaxed) as i32
    }

    /// An 8-byte value unique per encrypted response under this device's
    /// keys (mirrors the manager's own counter-plus-clock salt, spec §4.4).
    pub fn next_salt(&self) -> [u8; 8] {
        let hi = self.salt_counter.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        let lo = (hi as u64) ^ (now << 16);
        let mut salt = [0u8; 8];
        salt[0..4].copy_from_slice(&hi.to_be_bytes());
        salt[4..8].copy_from_slice(&(lo as u32).to_be_bytes());
        salt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_ring_is_bounded() {
        let counters = Counters::default();
        for i in 0..(PROCESSING_SAMPLES_CAP + 10) {
            counters.record_processing_time(i as u64);
        }
        assert_eq!(counters.processing_times_us().len(), PROCESSING_SAMPLES_CAP);
    }

    #[test]
    fn loaded_entries_are_queryable() {
        let device = SimulatorDevice::new("public", vec![0x80, 0, 0, 0, 1]);
        device.load(vec![("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"dev".to_vec()))]);
        let table = device.table.read().unwrap();
        assert!(table.contains(&"1.3.6.1.2.1.1.1.0".parse().unwrap()));
    }
}
