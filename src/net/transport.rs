//! Transport-layer tags carried by packets.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Packet transport metadata.
///
/// `Packet` is a network-layer carrier; transport tags enable protocol simulation
/// without coupling the network to protocol implementations.
#[derive(Debug, Clone, Default)]
pub enum Transport {
    /// No transport metadata (default).
    #[default]
    None,
    /// TCP segment (simplified).
    Tcp(TcpSegment),
}

/// TCP header flags relevant to the simulation (RFC 793 / RFC 3168 bit layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TcpFlags(u8);

impl TcpFlags {
    pub const NONE: TcpFlags = TcpFlags(0);
    pub const SYN: TcpFlags = TcpFlags(0x02);
    pub const ACK: TcpFlags = TcpFlags(0x10);
    pub const ECE: TcpFlags = TcpFlags(0x40);
    pub const CWR: TcpFlags = TcpFlags(0x80);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Self {
        TcpFlags(bits & (Self::SYN.0 | Self::ACK.0 | Self::ECE.0 | Self::CWR.0))
    }

    pub fn contains(self, other: TcpFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TcpFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: TcpFlags) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// ECN-setup SYN: ECE and CWR both set (RFC 3168 §6.1.1)
    pub fn is_ecn_setup_syn(self) -> bool {
        self.contains(Self::SYN) && self.contains(Self::ECE | Self::CWR)
    }

    /// ECN-setup SYN-ACK: ECE set, CWR clear
    pub fn is_ecn_setup_syn_ack(self) -> bool {
        self.contains(Self::SYN | Self::ACK) && self.contains(Self::ECE) && !self.contains(Self::CWR)
    }
}

impl BitOr for TcpFlags {
    type Output = TcpFlags;

    fn bitor(self, rhs: TcpFlags) -> TcpFlags {
        TcpFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TcpFlags {
    fn bitor_assign(&mut self, rhs: TcpFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::SYN, "SYN"),
            (Self::ACK, "ACK"),
            (Self::ECE, "ECE"),
            (Self::CWR, "CWR"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("-")?;
        }
        Ok(())
    }
}

/// Segment category derived from the flags and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Syn,
    SynAck,
    Data,
    Ack,
}

/// TCP segment (minimal fields for simulation).
///
/// `seq` is the byte sequence number of the first payload byte, `ack` the next
/// expected byte (cumulative), `len` the payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpSegment {
    pub flags: TcpFlags,
    pub seq: u64,
    pub ack: u64,
    pub len: u32,
}

impl TcpSegment {
    pub fn syn(flags: TcpFlags) -> Self {
        Self {
            flags: TcpFlags::SYN | flags,
            seq: 0,
            ack: 0,
            len: 0,
        }
    }

    pub fn syn_ack(flags: TcpFlags) -> Self {
        Self {
            flags: TcpFlags::SYN | TcpFlags::ACK | flags,
            seq: 0,
            ack: 0,
            len: 0,
        }
    }

    pub fn data(seq: u64, len: u32, flags: TcpFlags) -> Self {
        Self {
            flags: TcpFlags::ACK | flags,
            seq,
            ack: 0,
            len,
        }
    }

    pub fn ack(ack: u64, flags: TcpFlags) -> Self {
        Self {
            flags: TcpFlags::ACK | flags,
            seq: 0,
            ack,
            len: 0,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        if self.flags.contains(TcpFlags::SYN) {
            if self.flags.contains(TcpFlags::ACK) {
                SegmentKind::SynAck
            } else {
                SegmentKind::Syn
            }
        } else if self.len > 0 {
            SegmentKind::Data
        } else {
            SegmentKind::Ack
        }
    }
}
