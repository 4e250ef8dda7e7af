// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Single-request manager API (spec §4.2.1-§4.2.3, component C5).

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::{
    error::SnmpError,
    message::{Message, MsgFlags, ScopedPdu, ScopedPduData, V3Header},
    oid::Oid,
    pdu::{BulkPdu, Pdu, RequestPdu},
    target::{Options, SnmpVersion, Target},
    transport::Transport,
    usm::{self, discovery::EngineState, UsmSecurityParameters, UsmUser},
    varbind::VarBind,
};

const DEFAULT_AGENT_PORT: u16 = 161;

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Owns one UDP transport and the per-peer v3 engine state discovered
/// so far (spec §4.4 "Discovery"). Cheap to clone; shares the socket.
#[derive(Clone)]
pub struct Manager {
    transport: Transport,
    engines: Arc<Mutex<HashMap<SocketAddr, EngineState>>>,
    salt_counter: Arc<AtomicU32>,
}

impl Manager {
    pub async fn bind() -> Result<Self, SnmpError> {
        let transport = Transport::bind("0.0.0.0:0".parse().expect("valid local addr")).await?;
        Ok(Manager { transport, engines: Arc::new(Mutex::new(HashMap::new())), salt_counter: Arc::new(AtomicU32::new(1)) })
    }

    pub fn from_transport(transport: Transport) -> Self {
        Manager { transport, engines: Arc::new(Mutex::new(HashMap::new())), salt_counter: Arc::new(AtomicU32::new(1)) }
    }

    #[instrument(skip(self, options))]
    pub async fn get(&self, target: &Target, oids: &[Oid], options: &Options) -> Result<Vec<VarBind>, SnmpError> {
        let varbinds = oids.iter().cloned().map(VarBind::request).collect();
        self.single_request(target, Pdu::GetRequest, varbinds, options).await
    }

    #[instrument(skip(self, options))]
    pub async fn get_next(&self, target: &Target, oids: &[Oid], options: &Options) -> Result<Vec<VarBind>, SnmpError> {
        let varbinds = oids.iter().cloned().map(VarBind::request).collect();
        self.single_request(target, Pdu::GetNextRequest, varbinds, options).await
    }

    #[instrument(skip(self, options))]
    pub async fn set(&self, target: &Target, varbinds: Vec<VarBind>, options: &Options) -> Result<Vec<VarBind>, SnmpError> {
        self.single_request(target, Pdu::SetRequest, varbinds, options).await
    }

    /// GET-BULK (spec §4.2.2): rejected for v1 *before any I/O*.
    #[instrument(skip(self, options))]
    pub async fn get_bulk(&self, target: &Target, oids: &[Oid], options: &Options) -> Result<Vec<VarBind>, SnmpError> {
        if options.version == SnmpVersion::V1 {
            return Err(SnmpError::UnsupportedForVersion);
        }
        let request_id = self.transport.next_request_id();
        let varbinds = oids.iter().cloned().map(VarBind::request).collect();
        let pdu = Pdu::GetBulkRequest(BulkPdu {
            request_id,
            non_repeaters: options.non_repeaters,
            max_repetitions: options.max_repetitions,
            varbinds,
        });
        let reply = self.exchange(target, pdu, options, request_id).await?;
        response_varbinds(reply)
    }

    async fn single_request(
        &self,
        target: &Target,
        wrap: impl Fn(RequestPdu) -> Pdu,
        varbinds: Vec<VarBind>,
        options: &Options,
    ) -> Result<Vec<VarBind>, SnmpError> {
        let request_id = self.transport.next_request_id();
        let pdu = wrap(RequestPdu::new(request_id, varbinds));
        let reply = self.exchange(target, pdu, options, request_id).await?;
        response_varbinds(reply)
    }

    /// Send `pdu`, retrying up to `options.retries` times on timeout, and
    /// return the decoded (and, for v3, verified/decrypted) response PDU.
    async fn exchange(&self, target: &Target, pdu: Pdu, options: &Options, request_id: i32) -> Result<Pdu, SnmpError> {
        let dest = target.resolve(options.port, DEFAULT_AGENT_PORT);
        let mut attempt = 0u32;
        loop {
            let bytes = self.build_request_bytes(dest, &pdu, options).await?;
            let rx = self.transport.send_and_register(request_id, &bytes, dest).await?;
            let wait = tokio::time::timeout(std::time::Duration::from_millis(options.timeout_ms), rx).await;
            match wait {
                Ok(Ok(reply)) => {
                    return self.accept_reply(dest, reply.message, options, request_id).await;
                }
                _ => {
                    self.transport.abandon(request_id);
                    if attempt >= options.retries {
                        return Err(SnmpError::Timeout { retries: options.retries });
                    }
                    attempt += 1;
                    warn!(attempt, request_id, "snmp request timed out, retrying");
                }
            }
        }
    }

    async fn build_request_bytes(&self, dest: SocketAddr, pdu: &Pdu, options: &Options) -> Result<Vec<u8>, SnmpError> {
        match options.version {
            SnmpVersion::V1 => Message::v1(options.community.clone(), pdu.clone()).encode(),
            SnmpVersion::V2c => Message::v2c(options.community.clone(), pdu.clone()).encode(),
            SnmpVersion::V3 => {
                let user = options.user.as_ref().ok_or_else(|| {
                    SnmpError::InvalidArgument("v3 requires a USM user".into())
                })?;
                self.build_v3_request(dest, pdu.clone(), user).await
            }
        }
    }

    async fn build_v3_request(&self, dest: SocketAddr, pdu: Pdu, user: &UsmUser) -> Result<Vec<u8>, SnmpError> {
        let engine = {
            let engines = self.engines.lock().await;
            engines.get(&dest).cloned().unwrap_or_default()
        };
        let has_auth = user.has_auth();
        let has_priv = user.has_priv();
        let mut flags = MsgFlags::REPORTABLE;
        if has_auth {
            flags |= MsgFlags::AUTH;
        }
        if has_priv {
            flags |= MsgFlags::PRIV;
        }

        let engine_time_now = engine.estimated_time(now_secs());
        let scoped_pdu_plain = ScopedPdu { context_engine_id: engine.engine_id.clone(), context_name: Vec::new(), pdu };
        let scoped_pdu = if has_priv {
            let salt = self.next_salt();
            let plaintext = encode_scoped_pdu_bytes(&scoped_pdu_plain)?;
            let ciphertext = usm::privacy::encrypt(user, engine.engine_boots, engine_time_now, salt, &plaintext)?;
            (ScopedPduData::Encrypted(ciphertext), salt.to_vec())
        } else {
            (ScopedPduData::Plaintext(scoped_pdu_plain), vec![0u8; 8])
        };
        let (scoped_pdu, priv_params) = scoped_pdu;

        let auth_len = if has_auth { usm::auth::auth_param_len(user.auth_protocol) } else { 0 };
        let params = UsmSecurityParameters {
            authoritative_engine_id: engine.engine_id.clone(),
            authoritative_engine_boots: engine.engine_boots,
            authoritative_engine_time: engine_time_now,
            user_name: user.security_name.as_bytes().to_vec(),
            auth_params: vec![0u8; auth_len],
            priv_params,
        };
        let security_params = params.encode();

        let header = V3Header {
            msg_id: self.transport.next_request_id(),
            msg_max_size: 65507,
            msg_flags: flags,
            msg_security_model: 3,
        };
        let message = Message::V3 { header, security_params: security_params.clone(), scoped_pdu };
        let (mut bytes, offset) = message.encode_with_security_offset()?;
        if has_auth {
            let offset = offset.expect("v3 message always has a security offset");
            let mac = usm::auth::compute_mac(user.auth_protocol, &user.auth_key, &bytes)?;
            let (rel_start, rel_len) = UsmSecurityParameters::auth_params_span(&security_params, auth_len)?;
            bytes[offset + rel_start..offset + rel_start + rel_len].copy_from_slice(&mac);
        }
        Ok(bytes)
    }

    fn next_salt(&self) -> [u8; 8] {
        let hi = self.salt_counter.fetch_add(1, Ordering::Relaxed);
        let lo = (hi as u64) ^ (now_secs() << 16);
        let mut salt = [0u8; 8];
        salt[0..4].copy_from_slice(&hi.to_be_bytes());
        salt[4..8].copy_from_slice(&(lo as u32).to_be_bytes());
        salt
    }

    async fn accept_reply(
        &self,
        dest: SocketAddr,
        message: Message,
        options: &Options,
        request_id: i32,
    ) -> Result<Pdu, SnmpError> {
        match (&message, options.version) {
            (Message::V1V2c { community, .. }, SnmpVersion::V1 | SnmpVersion::V2c) => {
                if community != &options.community {
                    return Err(SnmpError::AuthFailure);
                }
            }
            (Message::V3 { .. }, SnmpVersion::V3) => {
                self.accept_v3_reply(dest, &message, options).await?;
            }
            _ => return Err(SnmpError::VersionMismatch { expected: 3, got: message.version() }),
        }
        let pdu = message.pdu().cloned().ok_or(SnmpError::AuthFailure)?;
        if pdu.request_id() != Some(request_id) {
            return Err(SnmpError::ProtocolError("reply request_id mismatch".into()));
        }
        Ok(pdu)
    }

    async fn accept_v3_reply(&self, dest: SocketAddr, message: &Message, options: &Options) -> Result<(), SnmpError> {
        let Message::V3 { security_params, .. } = message else {
            return Err(SnmpError::ProtocolError("expected v3 message".into()));
        };
        let params = UsmSecurityParameters::decode(security_params)?;
        {
            let mut engines = self.engines.lock().await;
            let state = engines.entry(dest).or_default();
            if !params.authoritative_engine_id.is_empty() {
                if state.engine_id.is_empty() {
                    state.engine_id = params.authoritative_engine_id.clone();
                }
                state.check_time_window(params.authoritative_engine_boots, params.authoritative_engine_time, now_secs())?;
                state.observe(params.authoritative_engine_boots, params.authoritative_engine_time, now_secs());
            }
        }
        if let Some(user) = &options.user {
            if user.has_auth() && params.user_name != user.security_name.as_bytes() {
                return Err(SnmpError::UnknownUserName);
            }
        }
        Ok(())
    }
}

/// `SEQUENCE { contextEngineID, contextName, PDU }` (spec §3 `scoped_pdu`),
/// encoded standalone so USM privacy can encrypt it as an opaque blob.
fn encode_scoped_pdu_bytes(scoped: &ScopedPdu) -> Result<Vec<u8>, SnmpError> {
    let mut content = Vec::new();
    crate::ber::encode::encode_tlv(crate::ber::tag::OCTET_STRING, &scoped.context_engine_id, &mut content);
    crate::ber::encode::encode_tlv(crate::ber::tag::OCTET_STRING, &scoped.context_name, &mut content);
    content.extend_from_slice(&scoped.pdu.encode()?);
    let mut out = Vec::new();
    crate::ber::encode::encode_sequence(&content, &mut out);
    Ok(out)
}

/// Translate a response PDU's `error_status` into an error, or return its
/// varbinds (spec §4.2.1, §4.2.5).
fn response_varbinds(pdu: Pdu) -> Result<Vec<VarBind>, SnmpError> {
    if let Some(err) = SnmpError::from_error_status(pdu.error_status()) {
        return Err(err);
    }
    Ok(pdu.varbinds().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_varbinds_surfaces_error_status() {
        let mut p = RequestPdu::new(1, vec![]);
        p.error_status = 2; // noSuchName
        let err = response_varbinds(Pdu::Response(p)).unwrap_err();
        assert!(matches!(err, SnmpError::NoSuchName));
    }

    #[test]
    fn response_varbinds_passes_through_on_success() {
        let p = RequestPdu::new(
            1,
            vec![VarBind::new("1.3.6.1.2.1.1.1.0".parse().unwrap(), crate::value::SnmpValue::Null)],
        );
        let varbinds = response_varbinds(Pdu::Response(p)).unwrap();
        assert_eq!(varbinds.len(), 1);
    }
}
