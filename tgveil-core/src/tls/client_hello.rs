//! Best-effort parsing of the Server Name Indication extension out of a
//! single TCP segment's payload, without ever decoding a full TLS record.
//!
//! Every read goes through [`Cursor`], which only ever returns `None` on a
//! short buffer — there is no indexing that can panic, so a truncated or
//! malformed ClientHello degrades to "no SNI found" rather than an error.

const RECORD_TYPE_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 0x01;
const EXTENSION_SERVER_NAME: u16 = 0x0000;
const SERVER_NAME_TYPE_HOST_NAME: u8 = 0x00;

struct Cursor<'a> {
    rest: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { rest: data }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let chunk = self.rest.get(..n)?;
        self.rest = self.rest.get(n..)?;
        Some(chunk)
    }

    fn take_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn take_u16(&mut self) -> Option<u16> {
        let b = self.take(2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    fn take_u24(&mut self) -> Option<u32> {
        let b = self.take(3)?;
        Some(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Quick gate: does `payload` *look* like a TLS handshake ClientHello record?
///
/// Used by the intercept loop to decide whether to bother calling
/// [`parse_sni`] at all and to account `tls_records_seen` (§4.E).
pub fn is_client_hello(payload: &[u8]) -> bool {
    payload.len() >= 6
        && payload[0] == RECORD_TYPE_HANDSHAKE
        && payload[1] == 0x03
        && payload[5] == HANDSHAKE_TYPE_CLIENT_HELLO
}

/// Extract the `host_name` SNI entry from a TCP payload that begins with a
/// (possibly truncated) TLS ClientHello record.
///
/// Returns `None` for anything that isn't a well-formed-enough ClientHello,
/// or that carries no `server_name` extension. Never panics (§8, property 1).
pub fn parse_sni(payload: &[u8]) -> Option<String> {
    if !is_client_hello(payload) {
        return None;
    }

    let mut c = Cursor::new(payload);
    // Record header: type(1) version(2) length(2)
    c.take_u8()?;
    c.take(2)?;
    c.take_u16()?;

    // Handshake header: msg type(1) body length(3)
    c.take_u8()?;
    c.take_u24()?;

    // legacy_version(2) random(32)
    c.take(2)?;
    c.take(32)?;

    // session_id
    let session_id_len = c.take_u8()? as usize;
    c.take(session_id_len)?;

    // cipher_suites
    let cipher_suites_len = c.take_u16()? as usize;
    c.take(cipher_suites_len)?;

    // compression_methods
    let compression_len = c.take_u8()? as usize;
    c.take(compression_len)?;

    if c.remaining() == 0 {
        // No extensions block at all — a legal (if ancient) ClientHello.
        return None;
    }

    let extensions_len = c.take_u16()? as usize;
    let extensions_data = c.take(extensions_len.min(c.remaining()))?;
    find_server_name(extensions_data)
}

fn find_server_name(extensions: &[u8]) -> Option<String> {
    let mut c = Cursor::new(extensions);
    while c.remaining() > 0 {
        let ext_type = c.take_u16()?;
        let ext_len = c.take_u16()? as usize;
        let ext_data = c.take(ext_len)?;
        if ext_type == EXTENSION_SERVER_NAME {
            if let Some(name) = parse_server_name_list(ext_data) {
                return Some(name);
            }
        }
    }
    None
}

fn parse_server_name_list(data: &[u8]) -> Option<String> {
    let mut c = Cursor::new(data);
    let list_len = c.take_u16()? as usize;
    let list_data = c.take(list_len.min(c.remaining()))?;
    let mut lc = Cursor::new(list_data);
    while lc.remaining() > 0 {
        let name_type = lc.take_u8()?;
        let name_len = lc.take_u16()? as usize;
        let name_bytes = lc.take(name_len)?;
        if name_type == SERVER_NAME_TYPE_HOST_NAME {
            return Some(String::from_utf8_lossy(name_bytes).into_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_be(n: u16) -> [u8; 2] {
        n.to_be_bytes()
    }

    fn build_client_hello(sni: Option<&str>) -> Vec<u8> {
        let mut extensions = Vec::new();
        if let Some(host) = sni {
            let host_bytes = host.as_bytes();
            let mut server_name_list = Vec::new();
            server_name_list.push(SERVER_NAME_TYPE_HOST_NAME);
            server_name_list.extend_from_slice(&u16_be(host_bytes.len() as u16));
            server_name_list.extend_from_slice(host_bytes);

            let mut ext_data = Vec::new();
            ext_data.extend_from_slice(&u16_be(server_name_list.len() as u16));
            ext_data.extend_from_slice(&server_name_list);

            extensions.extend_from_slice(&u16_be(EXTENSION_SERVER_NAME));
            extensions.extend_from_slice(&u16_be(ext_data.len() as u16));
            extensions.extend_from_slice(&ext_data);
        }

        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]); // legacy_version
        body.extend_from_slice(&[0u8; 32]); // random
        body.push(0); // session_id_len
        body.extend_from_slice(&u16_be(2)); // cipher_suites_len
        body.extend_from_slice(&[0x13, 0x01]);
        body.push(1); // compression_methods_len
        body.push(0);
        body.extend_from_slice(&u16_be(extensions.len() as u16));
        body.extend_from_slice(&extensions);

        let mut handshake = Vec::new();
        handshake.push(HANDSHAKE_TYPE_CLIENT_HELLO);
        let body_len = body.len() as u32;
        handshake.extend_from_slice(&body_len.to_be_bytes()[1..]);
        handshake.extend_from_slice(&body);

        let mut record = Vec::new();
        record.push(RECORD_TYPE_HANDSHAKE);
        record.extend_from_slice(&[0x03, 0x01]);
        record.extend_from_slice(&u16_be(handshake.len() as u16));
        record.extend_from_slice(&handshake);
        record
    }

    #[test]
    fn extracts_sni_from_well_formed_client_hello() {
        let record = build_client_hello(Some("www.telegram.org"));
        assert_eq!(parse_sni(&record).as_deref(), Some("www.telegram.org"));
    }

    #[test]
    fn returns_none_without_server_name_extension() {
        let record = build_client_hello(None);
        assert_eq!(parse_sni(&record), None);
    }

    #[test]
    fn returns_none_for_non_tls_payload() {
        assert_eq!(parse_sni(b"HTTP"), None);
        assert_eq!(parse_sni(b""), None);
    }

    #[test]
    fn never_panics_on_truncated_records() {
        let full = build_client_hello(Some("example.com"));
        for cut in 0..full.len() {
            let _ = parse_sni(&full[..cut]);
        }
    }

    #[test]
    fn minimal_client_hello_with_no_extensions_block() {
        // record header + handshake header claiming a body that stops right
        // after compression methods, with no extensions length field at all.
        let payload = [0x16, 0x03, 0x01, 0x00, 0x05, 0x01, 0x00, 0x00, 0x01, 0x00];
        assert_eq!(parse_sni(&payload), None);
    }

    #[test]
    fn is_client_hello_quick_gate() {
        assert!(is_client_hello(&build_client_hello(Some("x.com"))));
        assert!(!is_client_hello(b"GET / HTTP/1.1"));
        assert!(!is_client_hello(&[0x16, 0x03]));
    }
}
