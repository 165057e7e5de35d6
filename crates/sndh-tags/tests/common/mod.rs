#![allow(dead_code)]

/// Build an SNDH file: 12 bytes of branch instructions, the magic, `tags`.
pub fn sndh_file(tags: &[u8]) -> Vec<u8> {
    let mut data = vec![0x60, 0x00, 0x00, 0x0A, 0x60, 0x00, 0x00, 0x0A, 0x60, 0x00, 0x00, 0x0A];
    data.extend_from_slice(b"SNDH");
    data.extend_from_slice(tags);
    data
}

/// Pack `payload` (15..=269 bytes) as an ICE! 2.4 stream made of one literal run.
pub fn ice_literal(payload: &[u8]) -> Vec<u8> {
    assert!((15..=269).contains(&payload.len()));
    let extra = (payload.len() - 15) as u8;
    let packed_len = (payload.len() + 15) as u32;

    let mut out = b"ICE!".to_vec();
    out.extend_from_slice(&packed_len.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out.push((extra & 0x03) << 6);
    out.push(0xC0 | (extra >> 2));
    out.push(0xFF);
    out
}
