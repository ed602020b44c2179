use crate::config::{MAX_BIT_MAPPING, MAX_BYTE_MAPPING};
use md4::Md4;
use md5::Md5;
use sha1::{Digest, Sha1};

/// Digest algorithm used to derive cell indices. Numeric ids follow
/// the historical convention (1 = SHA-1, 4 = MD4, 5 = MD5); anything
/// else falls back to MD4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashFamily {
    Sha1,
    Md4,
    Md5,
}

impl HashFamily {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => HashFamily::Sha1,
            5 => HashFamily::Md5,
            _ => HashFamily::Md4,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            HashFamily::Sha1 => 1,
            HashFamily::Md4 => 4,
            HashFamily::Md5 => 5,
        }
    }

    /// Digest length in bytes for this family.
    pub fn digest_length(&self) -> usize {
        match self {
            HashFamily::Sha1 => 20,
            HashFamily::Md4 | HashFamily::Md5 => 16,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashFamily::Sha1 => Sha1::digest(data).to_vec(),
            HashFamily::Md4 => Md4::digest(data).to_vec(),
            HashFamily::Md5 => Md5::digest(data).to_vec(),
        }
    }
}

/// Host byte order, probed at runtime.
///
/// Index derivation reassembles the truncated digest into a `u32`
/// following the byte order of the machine it runs on, so the same
/// salts map an element to different cells on big- and little-endian
/// hosts. That quirk is part of the filter's observable behavior and
/// is kept as-is; the probe happens once at filter construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    pub fn detect() -> Self {
        let probe: u32 = 0x0102_0304;
        if probe.to_ne_bytes()[0] == 1 {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Derives the cell index for one hash round.
///
/// The element is XORed byte-wise with the round's salt (the salt must
/// be at least as long as the element), digested, truncated to the
/// first four bytes, reassembled into a `u32` in host byte order and
/// right-shifted so only `bit_mapping` bits survive.
pub fn derive_index(
    element: &[u8],
    salt: &[u8],
    family: HashFamily,
    bit_mapping: u32,
    endianness: Endianness,
) -> u32 {
    debug_assert!(salt.len() >= element.len());
    debug_assert!(bit_mapping >= 1 && bit_mapping <= MAX_BIT_MAPPING);

    let salted: Vec<u8> = element
        .iter()
        .zip(salt.iter())
        .map(|(byte, salt_byte)| byte ^ salt_byte)
        .collect();

    let digest = family.digest(&salted);

    let mut word = [0u8; MAX_BYTE_MAPPING];
    word.copy_from_slice(&digest[..MAX_BYTE_MAPPING]);

    let value = match endianness {
        Endianness::Big => u32::from_be_bytes(word),
        Endianness::Little => u32::from_le_bytes(word),
    };

    // Shift away everything above the addressable range; a full
    // 32-bit mapping keeps the whole word.
    if bit_mapping == MAX_BIT_MAPPING {
        value
    } else {
        value >> (MAX_BIT_MAPPING - bit_mapping)
    }
}
