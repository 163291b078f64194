use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::ByteVector;
use ssz_derive::Ssz;
use typenum::U52;

/// A 52-byte validator public key. Its contents are opaque to the core: no
/// cryptographic scheme is assumed, only a fixed-size byte identity used by
/// the pluggable `SignatureVerifier`.
#[derive(Clone, Debug, PartialEq, Eq, Ssz, Default)]
pub struct PubKey(pub ByteVector<U52>);

impl Serialize for PubKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0.as_bytes())))
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(raw).map_err(serde::de::Error::custom)?;
        let vector = ByteVector::try_from(bytes.as_slice())
            .map_err(|_| serde::de::Error::custom("expected a 52-byte public key"))?;
        Ok(PubKey(vector))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Ssz, Serialize, Deserialize)]
pub struct Validator {
    pub pubkey: PubKey,
}

impl Validator {
    pub fn from_hex_pubkey(hex_str: &str) -> Result<Self, String> {
        let raw = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(raw).map_err(|err| err.to_string())?;
        let vector = ByteVector::try_from(bytes.as_slice())
            .map_err(|_| "expected a 52-byte public key".to_string())?;
        Ok(Self {
            pubkey: PubKey(vector),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pubkey_hex_roundtrips() {
        let hex_str = format!("0x{}", "ab".repeat(52));
        let validator = Validator::from_hex_pubkey(&hex_str).unwrap();
        let json = serde_json::to_string(&validator.pubkey).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(52)));
    }

    #[test]
    fn rejects_wrong_length_pubkeys() {
        assert!(Validator::from_hex_pubkey("0xabcd").is_err());
    }
}
