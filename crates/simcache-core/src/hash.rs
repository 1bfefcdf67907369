//! Stable hashing helpers and the configuration fingerprint.
//!
//! A fingerprint is a BLAKE3 digest read as a 256-bit big-endian unsigned
//! integer. It is an opaque cache key: the decimal rendering is what ends up
//! in recipe directory names, nothing does arithmetic on it.

use std::fmt;
use std::str::FromStr;

use blake3::Hasher;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::configuration::Configuration;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Lowercase hex of arbitrary bytes.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Content fingerprint of a [`Configuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(Hash256);

impl Fingerprint {
    pub const fn from_digest(digest: Hash256) -> Self {
        Self(digest)
    }

    pub fn digest(&self) -> &Hash256 {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0 .0)
    }

    /// Decimal rendering of the 256-bit integer.
    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidId(s.to_string()));
        }
        let value = BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| Error::InvalidId(s.to_string()))?;
        let bytes = value.to_bytes_be();
        if bytes.len() > 32 {
            return Err(Error::InvalidId(format!("{s} exceeds 256 bits")));
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(Hash256(out)))
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_decimal()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Fingerprint a configuration.
///
/// The accumulator is seeded with the geometry's labelled content digest, then fed
/// each present part in declared order (layer stack, process, simulation
/// settings, convergence settings, recipe setup) as slot label, NUL,
/// big-endian length, canonical JSON. A geometry that cannot digest itself is
/// an error, never a weaker key; so are non-finite floats.
pub fn fingerprint(cfg: &Configuration) -> Result<Fingerprint> {
    let mut h = Hasher::new();
    if let Some(geometry) = cfg.geometry() {
        let digest = geometry.content_digest()?;
        h.update(b"geometry\0");
        h.update(&(digest.len() as u64).to_be_bytes());
        h.update(&digest);
    }
    for (slot, part) in cfg.canonical_parts()? {
        h.update(slot.as_bytes());
        h.update(&[0]);
        h.update(&(part.len() as u64).to_be_bytes());
        h.update(part.as_bytes());
    }
    Ok(Fingerprint(Hash256(h.finalize().into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::stack::{LayerLevel, LayerStack};

    fn sample() -> Configuration {
        Configuration::new()
            .with_layer_stack(
                LayerStack::new().with_layer("core", LayerLevel::new((1, 0), 0.22, 0.0, "si")),
            )
            .with_simulation_settings(Settings::new().with("mesh_accuracy", 2).with("wavl", 1.55))
    }

    #[test]
    fn decimal_of_small_values() {
        let mut raw = [0u8; 32];
        assert_eq!(Fingerprint::from_digest(Hash256(raw)).to_decimal(), "0");
        raw[31] = 42;
        assert_eq!(Fingerprint::from_digest(Hash256(raw)).to_decimal(), "42");
        raw[23] = 1; // 2^64 + 42
        assert_eq!(
            Fingerprint::from_digest(Hash256(raw)).to_decimal(),
            "18446744073709551658"
        );
    }

    #[test]
    fn decimal_of_max_value() {
        let fp = Fingerprint::from_digest(Hash256([0xff; 32]));
        assert_eq!(
            fp.to_decimal(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        let back: Fingerprint = fp.to_decimal().parse().unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn parse_rejects_garbage_and_overflow() {
        assert!("".parse::<Fingerprint>().is_err());
        assert!("12a".parse::<Fingerprint>().is_err());
        assert!(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
                .parse::<Fingerprint>()
                .is_err()
        );
    }

    #[test]
    fn parse_pads_short_values_and_accepts_leading_zeros() {
        let mut raw = [0u8; 32];
        raw[31] = 42;
        let expected = Fingerprint::from_digest(Hash256(raw));
        assert_eq!("42".parse::<Fingerprint>().unwrap(), expected);
        assert_eq!("00042".parse::<Fingerprint>().unwrap(), expected);
        assert_eq!(
            "0".parse::<Fingerprint>().unwrap(),
            Fingerprint::from_digest(Hash256([0; 32]))
        );
        assert!("+42".parse::<Fingerprint>().is_err());
        assert!("4_2".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn fingerprint_serializes_as_decimal_string() {
        let fp = fingerprint(&sample()).unwrap();
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn equal_configurations_share_a_fingerprint() {
        assert_eq!(fingerprint(&sample()).unwrap(), fingerprint(&sample()).unwrap());
    }

    #[test]
    fn any_setting_change_moves_the_fingerprint() {
        let a = fingerprint(&sample()).unwrap();
        let mut cfg = sample();
        cfg.simulation_settings
            .as_mut()
            .unwrap()
            .set("mesh_accuracy", 3);
        assert_ne!(a, fingerprint(&cfg).unwrap());
    }
}
