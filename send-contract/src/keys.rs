//! State key schema
//!
//! Every record lives under a one-byte namespace followed by length-prefixed
//! payload segments:
//!
//! ```text
//! account     : 0x01 | len | address
//! fee params  : 0x07 | 0x03 | "/f/"
//! ```
//!
//! Length prefixes are protobuf varints, so a payload can never be mistaken
//! for a prefix of a longer one under the same namespace.

/// Namespace for account records
pub const ACCOUNT_PREFIX: u8 = 0x01;

/// Namespace for governance controlled parameters
pub const PARAMS_PREFIX: u8 = 0x07;

/// Path of the fee parameters within [`PARAMS_PREFIX`]
pub const FEE_PARAMS_PATH: &[u8] = b"/f/";

/// State key for the account at `address`
pub fn key_for_account(address: &[u8]) -> Vec<u8> {
    join_len_prefix(ACCOUNT_PREFIX, &[address])
}

/// State key for the governance controlled fee parameters
pub fn key_for_fee_params() -> Vec<u8> {
    join_len_prefix(PARAMS_PREFIX, &[FEE_PARAMS_PATH])
}

/// Join a namespace byte with length-prefixed segments
pub fn join_len_prefix(prefix: u8, segments: &[&[u8]]) -> Vec<u8> {
    let capacity = 1 + segments
        .iter()
        .map(|s| prost::length_delimiter_len(s.len()) + s.len())
        .sum::<usize>();

    let mut key = Vec::with_capacity(capacity);
    key.push(prefix);
    for segment in segments {
        prost::encoding::encode_varint(segment.len() as u64, &mut key);
        key.extend_from_slice(segment);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_key_layout() {
        let address = [0xABu8; 20];
        let key = key_for_account(&address);

        assert_eq!(key.len(), 22);
        assert_eq!(key[0], ACCOUNT_PREFIX);
        assert_eq!(key[1], 20);
        assert_eq!(&key[2..], &address);
    }

    #[test]
    fn test_fee_params_key_layout() {
        assert_eq!(key_for_fee_params(), vec![0x07, 0x03, b'/', b'f', b'/']);
    }

    #[test]
    fn test_keys_are_deterministic() {
        let address = [7u8; 20];
        assert_eq!(key_for_account(&address), key_for_account(&address));
        assert_eq!(key_for_fee_params(), key_for_fee_params());
    }

    #[test]
    fn test_distinct_lengths_do_not_alias() {
        // [0x01] ++ "a" vs [0x01] ++ "ab": raw concatenation would share a prefix
        let short = join_len_prefix(ACCOUNT_PREFIX, &[&b"a"[..]]);
        let long = join_len_prefix(ACCOUNT_PREFIX, &[&b"ab"[..]]);
        assert_ne!(short, long);
        assert!(!long.starts_with(&short));

        // Segment boundaries matter too
        let split = join_len_prefix(ACCOUNT_PREFIX, &[&b"a"[..], &b"b"[..]]);
        let joined = join_len_prefix(ACCOUNT_PREFIX, &[&b"ab"[..]]);
        assert_ne!(split, joined);
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let account = key_for_account(FEE_PARAMS_PATH);
        assert_ne!(account, key_for_fee_params());
        assert_ne!(ACCOUNT_PREFIX, PARAMS_PREFIX);
    }

    #[test]
    fn test_long_segment_uses_varint_length() {
        let payload = vec![0u8; 300];
        let key = join_len_prefix(PARAMS_PREFIX, &[payload.as_slice()]);

        // 300 = 0b10_0101100 -> [0xAC, 0x02]
        assert_eq!(&key[..3], &[PARAMS_PREFIX, 0xAC, 0x02]);
        assert_eq!(key.len(), 1 + 2 + 300);
    }
}
