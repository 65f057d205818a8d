use glam::Vec3;

use super::quantize::{dequantize_health, dequantize_vec3};
use crate::peer::PeerFlags;

pub const DEFAULT_PORT: u16 = 27015;
pub const NAME_BYTES: usize = 12;

/// Exact encoded length of a [`LanPacket`]. Builds with a different length
/// speak a different protocol version and are rejected or misread.
pub const PACKET_SIZE: usize = 62;
pub const RECV_BUFFER_SIZE: usize = 68;

const CHECKSUM_OFFSET: usize = PACKET_SIZE - 2;

/// Fixed-width, zero-padded name field. At most `NAME_BYTES - 1` bytes are
/// stored so the field always carries a terminating zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WireName([u8; NAME_BYTES]);

impl WireName {
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(NAME_BYTES - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; NAME_BYTES];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; NAME_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NAME_BYTES] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    pub fn to_string_lossy(&self) -> String {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(NAME_BYTES);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

/// One LAN state record, field for field as it travels on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanPacket {
    pub position: [i16; 3],
    pub weapon_index: u8,
    pub ammo: u16,
    pub health: u8,
    pub cash_delta: i8,
    pub score_delta: i8,
    pub cash: u16,
    pub score: u16,
    pub flags: PeerFlags,
    pub name: WireName,
    pub join_seconds: u16,
    pub ray_origin: [i16; 3],
    pub ray_dir: [i16; 3],
    pub ray_damage: u8,
    pub damage_id: u8,
    pub event_kind: u8,
    pub event_team: u8,
    pub event_id: u8,
    pub event_target: WireName,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet truncated: {len} bytes, expected {expected}")]
    Truncated { len: usize, expected: usize },
    #[error("checksum mismatch: computed {expected:#06x}, received {received:#06x}")]
    ChecksumMismatch { expected: u16, received: u16 },
}

/// Additive checksum: byte sum mod 65536.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

struct WireWriter {
    buf: [u8; PACKET_SIZE],
    offset: usize,
}

impl WireWriter {
    fn new() -> Self {
        Self {
            buf: [0u8; PACKET_SIZE],
            offset: 0,
        }
    }

    fn put_u8(&mut self, v: u8) {
        self.buf[self.offset] = v;
        self.offset += 1;
    }

    fn put_u16(&mut self, v: u16) {
        self.buf[self.offset..self.offset + 2].copy_from_slice(&v.to_be_bytes());
        self.offset += 2;
    }

    fn put_i16x3(&mut self, v: [i16; 3]) {
        for component in v {
            self.buf[self.offset..self.offset + 2].copy_from_slice(&component.to_be_bytes());
            self.offset += 2;
        }
    }

    fn put_name(&mut self, name: &WireName) {
        self.buf[self.offset..self.offset + NAME_BYTES].copy_from_slice(name.as_bytes());
        self.offset += NAME_BYTES;
    }
}

struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    fn u8(&mut self) -> u8 {
        let v = self.data[self.offset];
        self.offset += 1;
        v
    }

    fn u16(&mut self) -> u16 {
        let v = u16::from_be_bytes([self.data[self.offset], self.data[self.offset + 1]]);
        self.offset += 2;
        v
    }

    fn i16x3(&mut self) -> [i16; 3] {
        [self.u16() as i16, self.u16() as i16, self.u16() as i16]
    }

    fn name(&mut self) -> WireName {
        let mut bytes = [0u8; NAME_BYTES];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + NAME_BYTES]);
        self.offset += NAME_BYTES;
        WireName::from_bytes(bytes)
    }
}

impl LanPacket {
    /// Writes the record in wire order. With `use_checksum` off the trailing
    /// checksum field is transmitted as zero.
    pub fn encode(&self, use_checksum: bool) -> [u8; PACKET_SIZE] {
        let mut w = WireWriter::new();
        w.put_i16x3(self.position);
        w.put_u8(self.weapon_index);
        w.put_u16(self.ammo);
        w.put_u8(self.health);
        w.put_u8(self.cash_delta as u8);
        w.put_u8(self.score_delta as u8);
        w.put_u16(self.cash);
        w.put_u16(self.score);
        w.put_u8(self.flags.bits());
        w.put_name(&self.name);
        w.put_u16(self.join_seconds);
        w.put_i16x3(self.ray_origin);
        w.put_i16x3(self.ray_dir);
        w.put_u8(self.ray_damage);
        w.put_u8(self.damage_id);
        w.put_u8(self.event_kind);
        w.put_u8(self.event_team);
        w.put_u8(self.event_id);
        w.put_name(&self.event_target);
        debug_assert_eq!(w.offset, CHECKSUM_OFFSET);

        let sum = if use_checksum {
            checksum(&w.buf[..CHECKSUM_OFFSET])
        } else {
            0
        };
        w.put_u16(sum);
        w.buf
    }

    /// A zero checksum field means the sender did not checksum and is
    /// accepted even when `use_checksum` is on.
    pub fn decode(data: &[u8], use_checksum: bool) -> Result<Self, PacketError> {
        if data.len() < PACKET_SIZE {
            return Err(PacketError::Truncated {
                len: data.len(),
                expected: PACKET_SIZE,
            });
        }

        let mut r = WireReader { data, offset: 0 };
        let mut packet = LanPacket {
            position: r.i16x3(),
            weapon_index: r.u8(),
            ammo: r.u16(),
            health: r.u8(),
            cash_delta: r.u8() as i8,
            score_delta: r.u8() as i8,
            cash: r.u16(),
            score: r.u16(),
            flags: PeerFlags::from_bits_retain(r.u8()),
            name: r.name(),
            join_seconds: r.u16(),
            ray_origin: r.i16x3(),
            ray_dir: r.i16x3(),
            ray_damage: r.u8(),
            damage_id: r.u8(),
            event_kind: r.u8(),
            event_team: r.u8(),
            event_id: r.u8(),
            event_target: r.name(),
        };

        let mut target = *packet.event_target.as_bytes();
        target[NAME_BYTES - 1] = 0;
        packet.event_target = WireName::from_bytes(target);

        let received = r.u16();
        if use_checksum && received != 0 {
            let expected = checksum(&data[..CHECKSUM_OFFSET]);
            if expected != received {
                return Err(PacketError::ChecksumMismatch { expected, received });
            }
        }

        Ok(packet)
    }

    pub fn position(&self) -> Vec3 {
        dequantize_vec3(self.position)
    }

    pub fn health(&self) -> f32 {
        dequantize_health(self.health)
    }

    pub fn ray_origin(&self) -> Vec3 {
        dequantize_vec3(self.ray_origin)
    }

    pub fn ray_dir(&self) -> Vec3 {
        dequantize_vec3(self.ray_dir)
    }
}
