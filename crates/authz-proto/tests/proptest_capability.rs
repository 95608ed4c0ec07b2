//! Property-based tests for capability tamper detection.
//!
//! For every capability signed under a key:
//! 1. it verifies under that key
//! 2. it fails under any other key
//! 3. flipping any single bit of its encoding makes it unusable

use authz_proto::capability::ENCODED_LEN;
use authz_proto::{
    generate_cap, generate_key, verify_cap, Capability, CapabilityData, ContainerId, Credential,
    OperationMask, ServerKey, UserId, VerifyCapError,
};
use proptest::prelude::*;

fn data_strategy() -> impl Strategy<Value = CapabilityData> {
    (
        any::<u64>(),
        0u32..32,
        any::<[u8; 16]>(),
        any::<[u8; 32]>(),
    )
        .prop_map(|(cid, mask, user, cred_mac)| CapabilityData {
            container_id: ContainerId::new(cid),
            operation_mask: OperationMask::from_bits_truncate(mask),
            credential: Credential::new(UserId::from_bytes(user), cred_mac),
        })
}

fn key_strategy() -> impl Strategy<Value = ServerKey> {
    any::<[u8; 32]>().prop_map(ServerKey::from_bytes)
}

proptest! {
    #[test]
    fn signed_capability_verifies(data in data_strategy(), key in key_strategy()) {
        let cap = generate_cap(&key, data);
        prop_assert_eq!(verify_cap(&key, &cap), Ok(()));
    }

    #[test]
    fn other_key_rejects(data in data_strategy(), k1 in key_strategy(), k2 in key_strategy()) {
        prop_assume!(k1.expose_bytes() != k2.expose_bytes());
        let cap = generate_cap(&k1, data);
        prop_assert_eq!(verify_cap(&k2, &cap), Err(VerifyCapError::BadMac));
    }

    #[test]
    fn single_bit_flip_is_detected(data in data_strategy(), bit in 0usize..ENCODED_LEN * 8) {
        let key = generate_key();
        let mut bytes = generate_cap(&key, data).encode();
        bytes[bit / 8] ^= 1 << (bit % 8);

        match Capability::decode(&bytes) {
            Ok(tampered) => prop_assert!(verify_cap(&key, &tampered).is_err()),
            Err(e) => prop_assert_eq!(e, VerifyCapError::Malformed),
        }
    }
}
