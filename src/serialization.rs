//! Serialization of fitted scaler parameters and configurations.
//!
//! Every payload is bincode preceded by a short header: the magic bytes
//! `DPSC` and a little-endian `u16` format version. Files written by another
//! tool, or by an incompatible version of this crate, are rejected before
//! bincode sees them.
//!
//! ```text
//! +------+---------+-----------------+
//! | DPSC | version | bincode payload |
//! +------+---------+-----------------+
//!   4 B     2 B
//! ```

use thiserror::Error;

const MAGIC: [u8; 4] = *b"DPSC";

/// Version written into every header. Bump when a persisted type changes shape.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// Errors raised while encoding or decoding persisted bytes.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("missing dp-scaler header")]
    MissingHeader,

    #[error("unsupported format version {found} (this build reads version {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("malformed payload: {0}")]
    Codec(#[from] bincode::Error),
}

/// Types that persist as a headed byte buffer.
///
/// Implemented for every serde type; used for [`StandardScalerParams`] and
/// [`ScalerConfig`]. Decoding only restores the fields. Semantic checks (lengths,
/// budgets) belong to the caller, e.g. `FittedTransformer::from_params`.
///
/// [`StandardScalerParams`]: crate::preprocessing::StandardScalerParams
/// [`ScalerConfig`]: crate::preprocessing::ScalerConfig
pub trait SerializableParams: Sized {
    fn to_bytes(&self) -> Result<Vec<u8>, FormatError>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::serialize_into(&mut bytes, self)?;
        Ok(bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let payload = strip_header(bytes)?;
        Ok(bincode::deserialize(payload)?)
    }
}

/// Check the header and return the payload that follows it.
fn strip_header(bytes: &[u8]) -> Result<&[u8], FormatError> {
    if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC[..] {
        return Err(FormatError::MissingHeader);
    }
    let found = u16::from_le_bytes([bytes[MAGIC.len()], bytes[MAGIC.len() + 1]]);
    if found != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }
    Ok(&bytes[HEADER_LEN..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::ScalerConfig;
    use crate::privacy::FeatureRange;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Moments {
        mean: Vec<f64>,
        count: u64,
    }

    fn moments() -> Moments {
        Moments {
            mean: vec![1.5, -2.0],
            count: 7,
        }
    }

    #[test]
    fn test_bytes_start_with_header() {
        let bytes = moments().to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"DPSC");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), FORMAT_VERSION);
        assert_eq!(Moments::from_bytes(&bytes).unwrap(), moments());
    }

    #[test]
    fn test_headerless_bincode_is_rejected() {
        let raw = bincode::serialize(&moments()).unwrap();
        assert!(matches!(
            Moments::from_bytes(&raw),
            Err(FormatError::MissingHeader)
        ));
        assert!(matches!(
            Moments::from_bytes(b"DP"),
            Err(FormatError::MissingHeader)
        ));
    }

    #[test]
    fn test_other_version_is_rejected() {
        let mut bytes = moments().to_bytes().unwrap();
        bytes[4..6].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        match Moments::from_bytes(&bytes) {
            Err(FormatError::UnsupportedVersion { found, supported }) => {
                assert_eq!(found, FORMAT_VERSION + 1);
                assert_eq!(supported, FORMAT_VERSION);
            }
            other => panic!("expected a version error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_payload_fails() {
        let bytes = Moments {
            mean: vec![1.0; 4],
            count: 1,
        }
        .to_bytes()
        .unwrap();
        assert!(matches!(
            Moments::from_bytes(&bytes[..HEADER_LEN + 5]),
            Err(FormatError::Codec(_))
        ));
    }

    #[test]
    fn test_config_persists() {
        let config = ScalerConfig::new(0.25)
            .with_std(false)
            .with_range(FeatureRange::new(vec![0.0, -1.0], vec![1.0, 3.0]).unwrap());
        let bytes = config.to_bytes().unwrap();
        assert_eq!(ScalerConfig::from_bytes(&bytes).unwrap(), config);
    }
}
