//! MessagePack codec helpers.
//!
//! Thin wrappers around `rmp-serde`. Every frame and every payload nested in a
//! frame is MessagePack.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

#[cfg(test)]
mod tests {
    use bui_component::{ComponentId, EntityId};

    use super::*;
    use crate::messages::{EntityFrame, EntityMessageKind, UiPayload};

    #[test]
    fn test_frame_carries_nested_payload() {
        let frame = EntityFrame::component_message(EntityId(3), ComponentId(7), &UiPayload::Close).unwrap();
        let bytes = encode(&frame).unwrap();
        let restored: EntityFrame = decode(&bytes).unwrap();
        assert_eq!(restored.kind, EntityMessageKind::ComponentMessage);
        assert_eq!(restored.entity, EntityId(3));
        let payload: UiPayload = decode(&restored.payload).unwrap();
        assert_eq!(payload, UiPayload::Close);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<EntityFrame, _> = decode(&[0xFF, 0xFF]);
        assert!(matches!(result, Err(NetError::Decode(_))));
    }

    #[test]
    fn test_decode_truncated_frame() {
        let frame = EntityFrame::component_message(EntityId(1), ComponentId(1), &UiPayload::Open).unwrap();
        let bytes = encode(&frame).unwrap();
        let result: Result<EntityFrame, _> = decode(&bytes[..bytes.len() - 1]);
        assert!(result.is_err());
    }
}
