// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The simulator's UDP server loop (spec §4.5, component C7): one socket,
//! one state machine per incoming datagram (decode, validate, dispatch,
//! respond), driving a [`SimulatorDevice`].
//!
//! Modeled on [`crate::transport::Transport`]'s long-lived owned struct
//! fronting a background receive task, and on [`crate::manager::client::Manager`]'s
//! v3 request construction for the mirrored response path.

use std::{
    net::SocketAddr,
    sync::{atomic::Ordering, Arc},
    time::Instant,
};

use tokio::{net::UdpSocket, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    ber::{encode::encode_tlv, tag},
    error::SnmpError,
    message::{Message, MsgFlags, ScopedPdu, ScopedPduData, V3Header},
    oid::Oid,
    pdu::{BulkPdu, Pdu, RequestPdu},
    sim::{device::SimulatorDevice, table::OidTable},
    usm::{self, discovery::TIME_WINDOW_SECS, UsmSecurityParameters, UsmUser},
    value::SnmpValue,
    varbind::VarBind,
};

/// Owns a bound UDP socket and the background task answering it. Dropping
/// the last handle aborts the task, the same lifecycle `Transport` uses.
pub struct SimServer {
    pub local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl SimServer {
    pub async fn bind(local_addr: SocketAddr, device: Arc<SimulatorDevice>) -> Result<Self, SnmpError> {
        let socket = UdpSocket::bind(local_addr).await.map_err(|e| SnmpError::SendError(e.to_string()))?;
        let local_addr = socket.local_addr().map_err(|e| SnmpError::SendError(e.to_string()))?;
        let socket = Arc::new(socket);
        let task = tokio::spawn(serve(device, socket));
        Ok(SimServer { local_addr, task })
    }
}

impl Drop for SimServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The receive loop: one packet at a time, logging and counting failures
/// instead of ever tearing the socket down.
async fn serve(device: Arc<SimulatorDevice>, socket: Arc<UdpSocket>) {
    let mut buf = vec![0u8; 65507];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "udp recv failed, simulator receive loop exiting");
                break;
            }
        };
        let started = Instant::now();
        device.counters.packets_received.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = handle_packet(&device, &socket, &buf[..len], from).await {
            debug!(error = %e, %from, "dropping datagram");
        }
        let micros = started.elapsed().as_micros().min(u64::MAX as u128) as u64;
        device.counters.record_processing_time(micros);
    }
}

/// Decode, validate, dispatch, and respond to one datagram. `Err` means the
/// datagram was dropped (already reflected in the device's counters); `Ok`
/// means a response was sent (or intentionally withheld, e.g. discovery
/// probes that carry no request worth answering).
async fn handle_packet(device: &SimulatorDevice, socket: &UdpSocket, bytes: &[u8], from: SocketAddr) -> Result<(), SnmpError> {
    let (message, sp_offset) = match Message::decode_with_security_offset(bytes) {
        Ok(v) => v,
        Err(e) => {
            device.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
    };
    match message {
        Message::V1V2c { version, community, pdu } => {
            if community != device.community {
                device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
                return Err(SnmpError::AuthFailure);
            }
            let response = dispatch(device, &pdu, version);
            let reply = Message::V1V2c { version, community, pdu: Pdu::Response(response) };
            send_capped(device, socket, from, reply, None, None).await
        }
        Message::V3 { header, security_params, scoped_pdu } => {
            handle_v3(device, socket, from, header, security_params, scoped_pdu, sp_offset, bytes).await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_v3(
    device: &SimulatorDevice,
    socket: &UdpSocket,
    from: SocketAddr,
    header: V3Header,
    security_params: Vec<u8>,
    scoped_pdu: ScopedPduData,
    sp_offset: Option<usize>,
    raw: &[u8],
) -> Result<(), SnmpError> {
    let params = match UsmSecurityParameters::decode(&security_params) {
        Ok(p) => p,
        Err(e) => {
            device.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
    };
    let is_discovery = params.authoritative_engine_id.is_empty();
    if !is_discovery && params.authoritative_engine_id != device.engine_id {
        device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
        return Err(SnmpError::UnknownEngineId);
    }

    let user_name = String::from_utf8_lossy(&params.user_name).into_owned();
    let user = device.users.get(&user_name);

    if header.msg_flags.contains(MsgFlags::AUTH) {
        let Some(user) = user else {
            device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
            return Err(SnmpError::UnknownUserName);
        };
        let auth_len = usm::auth::auth_param_len(user.auth_protocol);
        if params.auth_params.len() != auth_len {
            device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
            return Err(SnmpError::WrongDigest);
        }
        let sp_offset = sp_offset.ok_or_else(|| SnmpError::ProtocolError("v3 message missing security offset".into()))?;
        let (rel_start, rel_len) = UsmSecurityParameters::auth_params_span(&security_params, auth_len)?;
        let mut verify_buf = raw.to_vec();
        verify_buf[sp_offset + rel_start..sp_offset + rel_start + rel_len].fill(0);
        if usm::auth::verify_mac(user.auth_protocol, &user.auth_key, &verify_buf, &params.auth_params).is_err() {
            device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
            return Err(SnmpError::WrongDigest);
        }
        if !is_discovery {
            let estimated = device.engine_time() as i64;
            let delta = (params.authoritative_engine_time as i64 - estimated).abs();
            if params.authoritative_engine_boots != device.engine_boots || delta > TIME_WINDOW_SECS {
                device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
                return Err(SnmpError::NotInTimeWindow);
            }
        }
    }

    let scoped = match scoped_pdu {
        ScopedPduData::Plaintext(sp) => {
            if header.msg_flags.contains(MsgFlags::PRIV) {
                device.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                return Err(SnmpError::ProtocolError("privFlag set but scoped PDU is plaintext".into()));
            }
            sp
        }
        ScopedPduData::Encrypted(ciphertext) => {
            let Some(user) = user else {
                device.counters.auth_failures.fetch_add(1, Ordering::Relaxed);
                return Err(SnmpError::UnknownUserName);
            };
            let plaintext = usm::privacy::decrypt(user, device.engine_boots, device.engine_time(), &params.priv_params, &ciphertext)
                .map_err(|e| {
                    device.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                    e
                })?;
            decode_scoped_pdu_bytes(&plaintext).map_err(|e| {
                device.counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                e
            })?
        }
    };

    let response = dispatch(device, &scoped.pdu, 3);
    let response_flags = header.msg_flags & (MsgFlags::AUTH | MsgFlags::PRIV);
    let reply_header = V3Header {
        msg_id: header.msg_id,
        msg_max_size: header.msg_max_size,
        msg_flags: response_flags,
        msg_security_model: header.msg_security_model,
    };
    let reply = build_v3_reply(device, user, reply_header, scoped.context_engine_id, scoped.context_name, response)?;
    let cap = if header.msg_max_size > 0 { (header.msg_max_size as usize).min(device.response_cap) } else { device.response_cap };
    send_capped(device, socket, from, reply, Some(cap), user).await
}

/// `SEQUENCE { contextEngineID, contextName, PDU }`, encoded standalone so
/// USM privacy can decrypt/encrypt it as an opaque blob (mirrors
/// `Manager::build_v3_request`'s own helper of the same shape).
fn encode_scoped_pdu_bytes(scoped: &ScopedPdu) -> Result<Vec<u8>, SnmpError> {
    let mut content = Vec::new();
    encode_tlv(tag::OCTET_STRING, &scoped.context_engine_id, &mut content);
    encode_tlv(tag::OCTET_STRING, &scoped.context_name, &mut content);
    content.extend_from_slice(&scoped.pdu.encode()?);
    let mut out = Vec::new();
    crate::ber::encode::encode_sequence(&content, &mut out);
    Ok(out)
}

fn decode_scoped_pdu_bytes(bytes: &[u8]) -> Result<ScopedPdu, SnmpError> {
    let (content, remaining) = crate::ber::decode::expect_tag(bytes, tag::SEQUENCE)?;
    if !remaining.is_empty() {
        return Err(crate::error::DecodeErrorKind::TrailingBytes.into());
    }
    let (engine_id, rest) = crate::ber::decode::expect_tag(content, tag::OCTET_STRING)?;
    let (context_name, rest) = crate::ber::decode::expect_tag(rest, tag::OCTET_STRING)?;
    let (pdu, rest) = Pdu::decode(rest)?;
    if !rest.is_empty() {
        return Err(crate::error::DecodeErrorKind::TrailingBytes.into());
    }
    Ok(ScopedPdu { context_engine_id: engine_id.to_vec(), context_name: context_name.to_vec(), pdu })
}

/// Build and sign a v3 response, the server-side mirror of
/// `Manager::build_v3_request`: encrypt first if `PRIV` is set, then
/// compute and patch the MAC over the fully encoded message if `AUTH` is
/// set.
fn build_v3_reply(
    device: &SimulatorDevice,
    user: Option<&UsmUser>,
    header: V3Header,
    context_engine_id: Vec<u8>,
    context_name: Vec<u8>,
    response: RequestPdu,
) -> Result<Message, SnmpError> {
    let scoped_pdu_plain = ScopedPdu { context_engine_id, context_name, pdu: Pdu::Response(response) };
    let has_priv = header.msg_flags.contains(MsgFlags::PRIV);
    let has_auth = header.msg_flags.contains(MsgFlags::AUTH);
    let (scoped_pdu, priv_params) = if has_priv {
        let user = user.ok_or(SnmpError::UnknownUserName)?;
        let salt = device.next_salt();
        let plaintext = encode_scoped_pdu_bytes(&scoped_pdu_plain)?;
        let ciphertext = usm::privacy::encrypt(user, device.engine_boots, device.engine_time(), salt, &plaintext)?;
        (ScopedPduData::Encrypted(ciphertext), salt.to_vec())
    } else {
        (ScopedPduData::Plaintext(scoped_pdu_plain), vec![0u8; 8])
    };

    let auth_len = if has_auth { user.map(|u| usm::auth::auth_param_len(u.auth_protocol)).unwrap_or(0) } else { 0 };
    let params = UsmSecurityParameters {
        authoritative_engine_id: device.engine_id.clone(),
        authoritative_engine_boots: device.engine_boots,
        authoritative_engine_time: device.engine_time(),
        user_name: user.map(|u| u.security_name.as_bytes().to_vec()).unwrap_or_default(),
        auth_params: vec![0u8; auth_len],
        priv_params,
    };
    let security_params = params.encode();
    // `auth_params` stays zeroed here; [`finalize`] signs the MAC once the
    // response's final size (after any cap truncation) is known, since
    // popping a varbind changes the encoding and would invalidate a MAC
    // computed before that.
    Ok(Message::V3 { header, security_params, scoped_pdu })
}

/// Encode `message`, truncating trailing varbinds until the encoding fits
/// `cap` (spec §4.5 response size cap / `msg_max_size`), then re-sign a v3
/// message's MAC over the final bytes and send. `user` is the already
/// resolved sender of the request being answered (`None` for v1/v2c, where
/// there is no MAC to sign).
async fn send_capped(
    device: &SimulatorDevice,
    socket: &UdpSocket,
    to: SocketAddr,
    message: Message,
    cap: Option<usize>,
    user: Option<&UsmUser>,
) -> Result<(), SnmpError> {
    let cap = cap.unwrap_or(device.response_cap);
    let mut message = message;
    loop {
        let bytes = match finalize(&message, user) {
            Ok(b) => b,
            Err(e) => {
                device.counters.encode_errors.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        if bytes.len() <= cap || !truncate_one_varbind(&mut message) {
            return send_final(device, socket, to, &bytes).await;
        }
    }
}

/// Re-encode a (possibly v3, possibly truncated) message and, for v3 with
/// `AUTH` set, compute and patch the final MAC.
fn finalize(message: &Message, user: Option<&UsmUser>) -> Result<Vec<u8>, SnmpError> {
    match message {
        Message::V1V2c { .. } => message.encode(),
        Message::V3 { header, security_params, .. } => {
            let (mut bytes, offset) = message.encode_with_security_offset()?;
            if header.msg_flags.contains(MsgFlags::AUTH) {
                let user = user.ok_or(SnmpError::UnknownUserName)?;
                let auth_len = usm::auth::auth_param_len(user.auth_protocol);
                let offset = offset.expect("v3 message always has a security offset");
                let (rel_start, rel_len) = UsmSecurityParameters::auth_params_span(security_params, auth_len)?;
                let mac = usm::auth::compute_mac(user.auth_protocol, &user.auth_key, &bytes)?;
                bytes[offset + rel_start..offset + rel_start + rel_len].copy_from_slice(&mac);
            }
            Ok(bytes)
        }
    }
}

fn truncate_one_varbind(message: &mut Message) -> bool {
    let pdu = match message {
        Message::V1V2c { pdu, .. } => pdu,
        Message::V3 { scoped_pdu: ScopedPduData::Plaintext(sp), .. } => &mut sp.pdu,
        Message::V3 { .. } => return false,
    };
    let varbinds = match pdu {
        Pdu::Response(p) => &mut p.varbinds,
        _ => return false,
    };
    varbinds.pop().is_some()
}

async fn send_final(device: &SimulatorDevice, socket: &UdpSocket, to: SocketAddr, bytes: &[u8]) -> Result<(), SnmpError> {
    match socket.send_to(bytes, to).await {
        Ok(_) => {
            device.counters.packets_sent.fetch_add(1, Ordering::Relaxed);
            device.counters.successful_responses.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        Err(e) => {
            device.counters.send_errors.fetch_add(1, Ordering::Relaxed);
            Err(SnmpError::SendError(e.to_string()))
        }
    }
}

/// Dispatch a decoded request PDU against the device's table, returning
/// the response PDU body (spec §4.5 "decode -> validate -> dispatch ->
/// respond").
fn dispatch(device: &SimulatorDevice, pdu: &Pdu, version: u8) -> RequestPdu {
    let request_id = pdu.request_id().unwrap_or(0);
    match pdu {
        Pdu::GetRequest(p) => {
            let table = device.table.read().expect("table lock poisoned");
            let (error_status, error_index, varbinds) = handle_get(&table, &p.varbinds, version);
            note_error(device, error_status);
            RequestPdu { request_id, error_status, error_index, varbinds }
        }
        Pdu::GetNextRequest(p) => {
            let table = device.table.read().expect("table lock poisoned");
            let (error_status, error_index, varbinds) = handle_get_next(&table, &p.varbinds, version);
            note_error(device, error_status);
            RequestPdu { request_id, error_status, error_index, varbinds }
        }
        Pdu::SetRequest(p) => {
            let mut table = device.table.write().expect("table lock poisoned");
            let (error_status, error_index, varbinds) = handle_set(&mut table, &p.varbinds);
            note_error(device, error_status);
            RequestPdu { request_id, error_status, error_index, varbinds }
        }
        Pdu::GetBulkRequest(b) => {
            let table = device.table.read().expect("table lock poisoned");
            let varbinds = handle_get_bulk(&table, b);
            device.counters.successful_responses.fetch_add(1, Ordering::Relaxed);
            RequestPdu { request_id, error_status: 0, error_index: 0, varbinds }
        }
        _ => {
            device.counters.error_responses.fetch_add(1, Ordering::Relaxed);
            RequestPdu { request_id, error_status: SnmpError::GenErr.to_error_status(), error_index: 0, varbinds: Vec::new() }
        }
    }
}

fn note_error(device: &SimulatorDevice, error_status: i32) {
    if error_status == 0 {
        device.counters.successful_responses.fetch_add(1, Ordering::Relaxed);
    } else {
        device.counters.error_responses.fetch_add(1, Ordering::Relaxed);
    }
}

fn handle_get(table: &OidTable, varbinds: &[VarBind], version: u8) -> (i32, i32, Vec<VarBind>) {
    let mut out = Vec::with_capacity(varbinds.len());
    for (idx, vb) in varbinds.iter().enumerate() {
        match table.get(&vb.oid) {
            Some(value) => out.push(VarBind::new(vb.oid.clone(), value.clone())),
            None if version == 0 => return (SnmpError::NoSuchName.to_error_status(), idx as i32 + 1, varbinds.to_vec()),
            None => out.push(VarBind::new(vb.oid.clone(), SnmpValue::NoSuchObject)),
        }
    }
    (0, 0, out)
}

fn handle_get_next(table: &OidTable, varbinds: &[VarBind], version: u8) -> (i32, i32, Vec<VarBind>) {
    let mut out = Vec::with_capacity(varbinds.len());
    for (idx, vb) in varbinds.iter().enumerate() {
        match table.successor(&vb.oid) {
            Some((oid, value)) => out.push(VarBind::new(oid.clone(), value.clone())),
            None if version == 0 => return (SnmpError::NoSuchName.to_error_status(), idx as i32 + 1, varbinds.to_vec()),
            None => out.push(VarBind::new(vb.oid.clone(), SnmpValue::EndOfMibView)),
        }
    }
    (0, 0, out)
}

/// GetBulk (RFC 3416 §4.2.3): the first `non_repeaters` varbinds are
/// answered like a single GET-NEXT each; the rest are walked up to
/// `max_repetitions` times, one successor step per repetition per column,
/// row-major (repetition 1 for every column, then repetition 2, ...).
fn handle_get_bulk(table: &OidTable, bulk: &BulkPdu) -> Vec<VarBind> {
    let non_repeaters = (bulk.non_repeaters.max(0) as usize).min(bulk.varbinds.len());
    let max_repetitions = bulk.max_repetitions.max(0) as usize;
    let (heads, repeaters) = bulk.varbinds.split_at(non_repeaters);

    let mut out = Vec::new();
    for vb in heads {
        match table.successor(&vb.oid) {
            Some((oid, value)) => out.push(VarBind::new(oid.clone(), value.clone())),
            None => out.push(VarBind::new(vb.oid.clone(), SnmpValue::EndOfMibView)),
        }
    }

    // Every column contributes exactly `max_repetitions` varbinds even
    // past exhaustion, so the response stays rectangular: `non_repeaters +
    // max_repetitions * repeaters` (data-model invariant I3).
    let mut cursors: Vec<Oid> = repeaters.iter().map(|vb| vb.oid.clone()).collect();
    let mut exhausted = vec![false; cursors.len()];
    for _ in 0..max_repetitions {
        for (i, cursor) in cursors.iter_mut().enumerate() {
            if exhausted[i] {
                out.push(VarBind::new(cursor.clone(), SnmpValue::EndOfMibView));
                continue;
            }
            match table.successor(cursor) {
                Some((oid, value)) => {
                    out.push(VarBind::new(oid.clone(), value.clone()));
                    *cursor = oid.clone();
                }
                None => {
                    out.push(VarBind::new(cursor.clone(), SnmpValue::EndOfMibView));
                    exhausted[i] = true;
                }
            }
        }
    }
    out
}

/// SET (spec §4.5 "atomicity"): every varbind is validated against the
/// existing value's type before anything is written; the first mismatch
/// reverts every write already applied in this request and reports
/// `wrongType` at that varbind's index.
fn handle_set(table: &mut OidTable, varbinds: &[VarBind]) -> (i32, i32, Vec<VarBind>) {
    let mut applied: Vec<(Oid, Option<SnmpValue>)> = Vec::with_capacity(varbinds.len());
    for (idx, vb) in varbinds.iter().enumerate() {
        if let Some(existing) = table.get(&vb.oid) {
            if std::mem::discriminant(existing) != std::mem::discriminant(&vb.value) {
                revert(table, applied);
                return (SnmpError::WrongType.to_error_status(), idx as i32 + 1, varbinds.to_vec());
            }
        }
        let previous = table.set(vb.oid.clone(), vb.value.clone());
        applied.push((vb.oid.clone(), previous));
    }
    (0, 0, varbinds.to_vec())
}

fn revert(table: &mut OidTable, applied: Vec<(Oid, Option<SnmpValue>)>) {
    for (oid, previous) in applied.into_iter().rev() {
        match previous {
            Some(value) => {
                table.set(oid, value);
            }
            None => {
                table.remove(&oid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::target::SnmpVersion;

    fn device() -> SimulatorDevice {
        let device = SimulatorDevice::new("public", vec![0x80, 0, 0, 0, 1]);
        device.load(vec![
            ("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"dev".to_vec())),
            ("1.3.6.1.2.1.1.3.0".parse().unwrap(), SnmpValue::TimeTicks(1)),
        ]);
        device
    }

    #[test]
    fn get_next_wraps_to_end_of_mib_view_on_v2c() {
        let device = device();
        let table = device.table.read().unwrap();
        let (status, _, varbinds) = handle_get_next(&table, &[VarBind::request("1.3.6.1.2.1.1.3.0".parse().unwrap())], 1);
        assert_eq!(status, 0);
        assert_eq!(varbinds[0].value, SnmpValue::EndOfMibView);
    }

    #[test]
    fn get_next_returns_no_such_name_on_v1() {
        let device = device();
        let table = device.table.read().unwrap();
        let (status, index, _) = handle_get_next(&table, &[VarBind::request("1.3.6.1.2.1.1.3.0".parse().unwrap())], 0);
        assert_eq!(status, SnmpError::NoSuchName.to_error_status());
        assert_eq!(index, 1);
    }

    #[test]
    fn get_bulk_walks_each_repeater_column() {
        let device = device();
        let table = device.table.read().unwrap();
        let bulk = BulkPdu {
            request_id: 1,
            non_repeaters: 0,
            max_repetitions: 3,
            varbinds: vec![VarBind::request("1.3.6.1.2.1.1".parse().unwrap())],
        };
        let varbinds = handle_get_bulk(&table, &bulk);
        assert_eq!(varbinds.len(), 3);
        assert!(varbinds[2].value.is_end_of_mib_view());
    }

    #[test]
    fn get_bulk_pads_an_exhausted_column_to_the_full_repetition_count() {
        let device = device();
        let table = device.table.read().unwrap();
        let bulk = BulkPdu {
            request_id: 1,
            non_repeaters: 0,
            max_repetitions: 5,
            varbinds: vec![VarBind::request("1.3.6.1.2.1.1".parse().unwrap())],
        };
        let varbinds = handle_get_bulk(&table, &bulk);
        // non_repeaters + max_repetitions * repeaters = 0 + 5 * 1.
        assert_eq!(varbinds.len(), 5);
        assert!(varbinds[2].value.is_end_of_mib_view());
        assert!(varbinds[3].value.is_end_of_mib_view());
        assert!(varbinds[4].value.is_end_of_mib_view());
    }

    #[test]
    fn set_reverts_every_write_on_type_mismatch() {
        let device = device();
        let mut table = device.table.write().unwrap();
        let varbinds = vec![
            VarBind::new("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"new".to_vec())),
            VarBind::new("1.3.6.1.2.1.1.3.0".parse().unwrap(), SnmpValue::OctetString(b"wrong type".to_vec())),
        ];
        let (status, index, _) = handle_set(&mut table, &varbinds);
        assert_eq!(status, SnmpError::WrongType.to_error_status());
        assert_eq!(index, 2);
        assert_eq!(table.get(&"1.3.6.1.2.1.1.1.0".parse().unwrap()), Some(&SnmpValue::OctetString(b"dev".to_vec())));
    }

    #[tokio::test]
    #[serial]
    async fn v2c_get_round_trips_over_loopback() {
        use crate::{manager::client::Manager, target::Target};

        let device = Arc::new(device());
        let server = SimServer::bind("127.0.0.1:0".parse().unwrap(), device).await.unwrap();
        let manager = Manager::bind().await.unwrap();
        let target = Target { addr: "127.0.0.1".parse().unwrap(), embedded_port: Some(server.local_addr.port()) };
        let mut options = crate::target::Options::default();
        options.version = SnmpVersion::V2c;
        options.community = b"public".to_vec();
        let result = manager.get(&target, &["1.3.6.1.2.1.1.1.0".parse().unwrap()], &options).await.unwrap();
        assert_eq!(result[0].value, SnmpValue::OctetString(b"dev".to_vec()));
    }

    #[tokio::test]
    #[serial]
    async fn wrong_community_is_dropped_and_counted() {
        use crate::{manager::client::Manager, target::Target};

        let device = Arc::new(device());
        let server = SimServer::bind("127.0.0.1:0".parse().unwrap(), device.clone()).await.unwrap();
        let manager = Manager::bind().await.unwrap();
        let target = Target { addr: "127.0.0.1".parse().unwrap(), embedded_port: Some(server.local_addr.port()) };
        let mut options = crate::target::Options::default();
        options.version = SnmpVersion::V2c;
        options.community = b"wrong".to_vec();
        options.timeout_ms = 100;
        options.retries = 0;
        let result = manager.get(&target, &["1.3.6.1.2.1.1.1.0".parse().unwrap()], &options).await;
        assert!(result.is_err());
        assert_eq!(device.counters.auth_failures.load(Ordering::Relaxed), 1);
    }
}
