//! Transaction serialization.

use super::core::{Transaction, TransactionType, MAX_TRANSACTION_PAYLOAD, PUBLIC_KEY_SIZE};
use crate::error::{CoreError, CoreResult};
use onyx_io::serializable::helper::get_var_bytes_size;
use onyx_io::{BinaryWriter, IoError, IoResult, MemoryReader, Serializable};

/// Upper bound on the number of keys a vote may name.
const MAX_VOTE_KEYS: usize = 1024;

impl Serializable for Transaction {
    fn size(&self) -> usize {
        // version + type + nonce
        1 + 1 + 8 + get_var_bytes_size(&self.payload)
    }

    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.version);
        writer.write_u8(self.tx_type.as_byte());
        writer.write_u64(self.nonce);
        writer.write_var_bytes(&self.payload);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let version = reader.read_u8()?;
        let tag = reader.read_u8()?;
        let tx_type =
            TransactionType::try_from(tag).map_err(|e| IoError::invalid_data(e.to_string()))?;
        let nonce = reader.read_u64()?;
        let payload = reader.read_var_bytes(MAX_TRANSACTION_PAYLOAD)?;
        Ok(Self {
            version,
            tx_type,
            nonce,
            payload,
        })
    }
}

pub(crate) fn encode_vote_keys(keys: &[[u8; PUBLIC_KEY_SIZE]]) -> Vec<u8> {
    let mut writer = BinaryWriter::with_capacity(1 + keys.len() * PUBLIC_KEY_SIZE);
    writer.write_var_int(keys.len() as u64);
    for key in keys {
        writer.write_bytes(key);
    }
    writer.into_bytes()
}

pub(crate) fn decode_vote_keys(payload: &[u8]) -> CoreResult<Vec<[u8; PUBLIC_KEY_SIZE]>> {
    let mut reader = MemoryReader::new(payload);
    let count = reader.read_var_int(MAX_VOTE_KEYS as u64)? as usize;
    if count == 0 {
        return Err(CoreError::invalid_format("vote names no bookkeepers"));
    }
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(reader.read_array::<PUBLIC_KEY_SIZE>()?);
    }
    if !reader.is_empty() {
        return Err(CoreError::invalid_format("trailing bytes after vote keys"));
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_io::SerializableExt;

    #[test]
    fn test_wire_layout() {
        let tx = Transaction::invocation(vec![0x51, 0x52], 0x0102);
        let bytes = tx.to_array();
        assert_eq!(
            bytes,
            vec![0x00, 0xD1, 0x02, 0x01, 0, 0, 0, 0, 0, 0, 0x02, 0x51, 0x52]
        );
        assert_eq!(bytes.len(), tx.size());
        assert_eq!(Transaction::from_array(&bytes).unwrap(), tx);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let bytes = [0x00, 0x7F, 0, 0, 0, 0, 0, 0, 0, 0, 0x00];
        assert!(matches!(
            Transaction::from_array(&bytes),
            Err(IoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_malformed_vote_payload() {
        assert!(decode_vote_keys(&[0x00]).is_err());
        assert!(decode_vote_keys(&[0x01, 0x02]).is_err());
        let mut payload = encode_vote_keys(&[[2u8; 33]]);
        payload.push(0);
        assert!(decode_vote_keys(&payload).is_err());
    }
}
