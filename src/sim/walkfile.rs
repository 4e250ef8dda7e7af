// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Parser for the textual "walk" format used to bootstrap a simulator
//! device (spec §6): one varbind per line, `OID = TYPE: VALUE`.

use crate::{error::SnmpError, oid::Oid, value::SnmpValue};

/// Parse every non-blank, non-comment line of `text` into `(oid, value)`
/// pairs, in file order.
pub fn parse(text: &str) -> Result<Vec<(Oid, SnmpValue)>, SnmpError> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        out.push(parse_line(line).map_err(|e| {
            SnmpError::InvalidArgument(format!("walk file line {}: {e}", lineno + 1))
        })?);
    }
    Ok(out)
}

fn parse_line(line: &str) -> Result<(Oid, SnmpValue), String> {
    let (oid_str, rest) = line.split_once('=').ok_or("missing '='")?;
    let oid: Oid = oid_str.trim().parse().map_err(|e| format!("{e}"))?;
    let rest = rest.trim_start();
    let (type_str, value_str) = rest.split_once(':').ok_or("missing ':'")?;
    let type_str = type_str.trim();
    let value_str = value_str.trim();
    let value = parse_value(type_str, value_str)?;
    Ok((oid, value))
}

fn parse_value(type_str: &str, value_str: &str) -> Result<SnmpValue, String> {
    Ok(match type_str {
        "Null" => SnmpValue::Null,
        "INTEGER" => SnmpValue::Integer(value_str.parse().map_err(|_| "invalid INTEGER")?),
        "OCTET STRING" => SnmpValue::OctetString(parse_quoted(value_str)?.into_bytes()),
        "OID" => SnmpValue::Oid(value_str.parse().map_err(|e| format!("{e}"))?),
        "IpAddress" => SnmpValue::IpAddress(parse_ip(value_str)?),
        "Counter32" => SnmpValue::Counter32(value_str.parse().map_err(|_| "invalid Counter32")?),
        "Gauge32" => SnmpValue::Gauge32(value_str.parse().map_err(|_| "invalid Gauge32")?),
        "Timeticks" => SnmpValue::TimeTicks(value_str.parse().map_err(|_| "invalid Timeticks")?),
        "Opaque" => SnmpValue::Opaque(parse_quoted(value_str)?.into_bytes()),
        "Counter64" => SnmpValue::Counter64(value_str.parse().map_err(|_| "invalid Counter64")?),
        other => return Err(format!("unknown type: {other}")),
    })
}

/// Un-escape a double-quoted string with the C-style escapes this format
/// allows: `\"`, `\\`, `\n`, `\t`, `\r`.
fn parse_quoted(s: &str) -> Result<String, String> {
    let s = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).ok_or("expected a quoted string")?;
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => return Err(format!("unsupported escape: \\{other}")),
            None => return Err("trailing backslash".into()),
        }
    }
    Ok(out)
}

fn parse_ip(s: &str) -> Result<[u8; 4], String> {
    let mut out = [0u8; 4];
    let mut parts = s.split('.');
    for slot in &mut out {
        let part = parts.next().ok_or("IpAddress needs four octets")?;
        *slot = part.parse().map_err(|_| "invalid IpAddress octet")?;
    }
    if parts.next().is_some() {
        return Err("IpAddress has too many octets".into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_typical_walk_file() {
        let text = "\
            # comment line, skipped\n\
            1.3.6.1.2.1.1.1.0 = OCTET STRING: \"Test Device\"\n\
            1.3.6.1.2.1.1.3.0 = Timeticks: 12345\n\
            \n\
            1.3.6.1.2.1.1.2.0 = OID: 1.3.6.1.4.1.8072.3.2.10\n\
            1.3.6.1.2.1.4.20.1.1.10.0.0.1 = IpAddress: 10.0.0.1\n\
        ";
        let entries = parse(text).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].0.to_string(), "1.3.6.1.2.1.1.1.0");
        assert_eq!(entries[0].1, SnmpValue::OctetString(b"Test Device".to_vec()));
        assert_eq!(entries[1].1, SnmpValue::TimeTicks(12345));
        assert_eq!(entries[3].1, SnmpValue::IpAddress([10, 0, 0, 1]));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(parse("1.3.6.1 = Bogus: 1").is_err());
    }

    #[test]
    fn handles_escaped_quotes() {
        let (_, value) = parse_line(r#"1.3.6.1 = OCTET STRING: "say \"hi\"""#).unwrap();
        assert_eq!(value, SnmpValue::OctetString(b"say \"hi\"".to_vec()));
    }
}
