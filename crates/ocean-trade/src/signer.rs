//! Order hashing and signing.
//!
//! The order hash is keccak-256 over the tightly packed order fields: the six
//! addresses as 20 bytes each, then the six amounts as 32-byte big-endian
//! words. The maker signs that hash as an EIP-191 personal message.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use ocean_core::{EcSignature, UnsignedOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::api::BoxFuture;

// =============================================================================
// KeySource and KeyManager
// =============================================================================

/// Source of the private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Holds the maker key.
///
/// The key is read once; the raw bytes are zeroized after the signer is built.
/// Never log private key material.
pub struct KeyManager {
    signer: PrivateKeySigner,
}

impl KeyManager {
    /// Load the key and, if given, check it derives `expected_address`.
    pub fn load(source: &KeySource, expected_address: Option<Address>) -> Result<Self, KeyError> {
        let hex_key: Zeroizing<String> = match source {
            KeySource::EnvVar { var_name } => Zeroizing::new(
                std::env::var(var_name).map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
            ),
            KeySource::File { path } => Zeroizing::new(std::fs::read_to_string(path)?),
        };
        Self::from_hex(&hex_key, expected_address)
    }

    /// Build from a hex key (optional `0x`, surrounding whitespace ignored).
    pub fn from_hex(hex_key: &str, expected_address: Option<Address>) -> Result<Self, KeyError> {
        let trimmed = hex_key.trim().trim_start_matches("0x");
        let secret_bytes = Zeroizing::new(hex::decode(trimmed)?);

        let signer = PrivateKeySigner::from_slice(&secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        Ok(Self { signer })
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// Key management errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Order hash
// =============================================================================

/// Signing errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("No key held for signer {0}")]
    UnknownSigner(String),

    #[error("Order cannot be hashed: {0}")]
    InvalidOrder(String),

    #[error("Invalid order hash: {0}")]
    InvalidHash(String),

    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("Signer rejected request: {0}")]
    Rejected(String),
}

fn parse_address(field: &str, value: &str) -> Result<Address, SignerError> {
    Address::from_str(value)
        .map_err(|e| SignerError::InvalidOrder(format!("{field} {value:?}: {e}")))
}

/// Hash of the order's current field values.
pub fn order_hash(order: &UnsignedOrder) -> Result<B256, SignerError> {
    let addresses = [
        ("exchangeContractAddress", &order.exchange_contract_address),
        ("maker", &order.maker),
        ("taker", &order.taker),
        ("makerTokenAddress", &order.maker_token_address),
        ("takerTokenAddress", &order.taker_token_address),
        ("feeRecipient", &order.fee_recipient),
    ];
    let amounts = [
        &order.maker_token_amount,
        &order.taker_token_amount,
        &order.maker_fee,
        &order.taker_fee,
        &order.expiration_unix_timestamp_sec,
        &order.salt,
    ];

    let mut data = Vec::with_capacity(addresses.len() * 20 + amounts.len() * 32);
    for (field, value) in addresses {
        data.extend_from_slice(parse_address(field, value)?.as_slice());
    }
    for amount in amounts {
        data.extend_from_slice(&amount.to_be_bytes());
    }

    Ok(keccak256(&data))
}

/// `0x`-prefixed lowercase hex of [`order_hash`].
pub fn order_hash_hex(order: &UnsignedOrder) -> Result<String, SignerError> {
    Ok(format!("0x{}", hex::encode(order_hash(order)?)))
}

/// Build an `EcSignature` from 65 raw bytes (r(32) + s(32) + v(1)).
///
/// Normalizes v from 0/1 to 27/28.
pub fn ec_signature_from_bytes(bytes: &[u8; 65]) -> EcSignature {
    let v_raw = bytes[64];
    let v = if v_raw < 27 { v_raw + 27 } else { v_raw };
    EcSignature {
        v,
        r: format!("0x{}", hex::encode(&bytes[0..32])),
        s: format!("0x{}", hex::encode(&bytes[32..64])),
    }
}

// =============================================================================
// OrderSigner
// =============================================================================

/// Signs order hashes on behalf of an address.
///
/// Implementations may call out to an external wallet or device, so signing
/// is asynchronous.
pub trait OrderSigner: Send + Sync {
    fn sign_order_hash<'a>(
        &'a self,
        order_hash: &'a str,
        signer_address: &'a str,
    ) -> BoxFuture<'a, Result<EcSignature, SignerError>>;
}

impl<T: OrderSigner + ?Sized> OrderSigner for Arc<T> {
    fn sign_order_hash<'a>(
        &'a self,
        order_hash: &'a str,
        signer_address: &'a str,
    ) -> BoxFuture<'a, Result<EcSignature, SignerError>> {
        (**self).sign_order_hash(order_hash, signer_address)
    }
}

/// Signs with a locally held private key.
pub struct LocalOrderSigner {
    key_manager: Arc<KeyManager>,
}

impl LocalOrderSigner {
    pub fn new(key_manager: Arc<KeyManager>) -> Self {
        Self { key_manager }
    }

    pub fn address(&self) -> Address {
        self.key_manager.address()
    }
}

impl OrderSigner for LocalOrderSigner {
    fn sign_order_hash<'a>(
        &'a self,
        order_hash: &'a str,
        signer_address: &'a str,
    ) -> BoxFuture<'a, Result<EcSignature, SignerError>> {
        Box::pin(async move {
            let requested = Address::from_str(signer_address)
                .map_err(|_| SignerError::UnknownSigner(signer_address.to_string()))?;
            if requested != self.key_manager.address() {
                return Err(SignerError::UnknownSigner(signer_address.to_string()));
            }

            let hash = B256::from_str(order_hash)
                .map_err(|e| SignerError::InvalidHash(format!("{order_hash}: {e}")))?;

            // NOTE: Do not log the signature
            let signature = self
                .key_manager
                .signer()
                .sign_message(hash.as_slice())
                .await?;
            Ok(ec_signature_from_bytes(&signature.as_bytes()))
        })
    }
}

/// Mock signer for testing.
///
/// Returns a fixed signature and records each `(order_hash, signer_address)`.
#[derive(Debug)]
pub struct MockOrderSigner {
    calls: parking_lot::Mutex<Vec<(String, String)>>,
    signature: parking_lot::Mutex<EcSignature>,
    fail_with: parking_lot::Mutex<Option<String>>,
}

impl Default for MockOrderSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOrderSigner {
    pub fn new() -> Self {
        Self::with_signature(EcSignature {
            v: 27,
            r: format!("0x{}", "11".repeat(32)),
            s: format!("0x{}", "22".repeat(32)),
        })
    }

    pub fn with_signature(signature: EcSignature) -> Self {
        Self {
            calls: parking_lot::Mutex::new(Vec::new()),
            signature: parking_lot::Mutex::new(signature),
            fail_with: parking_lot::Mutex::new(None),
        }
    }

    /// Make every following call fail with `SignerError::Rejected(reason)`.
    pub fn set_failure(&self, reason: impl Into<String>) {
        *self.fail_with.lock() = Some(reason.into());
    }

    /// Recorded `(order_hash, signer_address)` pairs.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

impl OrderSigner for MockOrderSigner {
    fn sign_order_hash<'a>(
        &'a self,
        order_hash: &'a str,
        signer_address: &'a str,
    ) -> BoxFuture<'a, Result<EcSignature, SignerError>> {
        Box::pin(async move {
            self.calls
                .lock()
                .push((order_hash.to_string(), signer_address.to_string()));
            if let Some(reason) = self.fail_with.lock().clone() {
                return Err(SignerError::Rejected(reason));
            }
            Ok(self.signature.lock().clone())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{PrimitiveSignature, U256};
    use ocean_core::Amount;

    // Well-known test private key (DO NOT use in production)
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_order() -> UnsignedOrder {
        UnsignedOrder {
            exchange_contract_address: "0x12459c951127e0c374ff9105dda097662a027093".to_string(),
            maker: TEST_ADDRESS.to_lowercase(),
            taker: "0x0000000000000000000000000000000000000000".to_string(),
            maker_token_address: "0xe41d2489571d322189246dafa5ebde1f4699f498".to_string(),
            taker_token_address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
            fee_recipient: "0x88a64b5e882e5ad851bea5e7a3c8ba7c523fecbe".to_string(),
            maker_token_amount: "1000000000000000000".parse().unwrap(),
            taker_token_amount: "2500000000000000".parse().unwrap(),
            maker_fee: Amount::ZERO,
            taker_fee: Amount::ZERO,
            expiration_unix_timestamp_sec: Amount::from(1_700_000_000u64),
            salt: Amount::from(42u64),
        }
    }

    #[test]
    fn test_key_manager_from_hex() {
        let manager = KeyManager::from_hex(TEST_PRIVATE_KEY, None).unwrap();
        assert_eq!(manager.address(), Address::from_str(TEST_ADDRESS).unwrap());

        let padded = format!("  {}\n", TEST_PRIVATE_KEY.trim_start_matches("0x"));
        assert!(KeyManager::from_hex(&padded, None).is_ok());
    }

    #[test]
    fn test_key_manager_address_mismatch() {
        let result = KeyManager::from_hex(TEST_PRIVATE_KEY, Some(Address::ZERO));
        assert!(matches!(result, Err(KeyError::AddressMismatch { .. })));
    }

    #[test]
    fn test_key_manager_bad_hex() {
        assert!(matches!(
            KeyManager::from_hex("0xzz", None),
            Err(KeyError::HexDecode(_))
        ));
    }

    #[test]
    fn test_key_manager_load_sources() {
        let var_name = "OCEAN_TRADE_TEST_SIGNER_KEY";
        std::env::set_var(var_name, TEST_PRIVATE_KEY);
        let from_env = KeyManager::load(
            &KeySource::EnvVar {
                var_name: var_name.to_string(),
            },
            None,
        )
        .unwrap();
        std::env::remove_var(var_name);

        let path = std::env::temp_dir().join("ocean_trade_test_signer.key");
        std::fs::write(&path, format!("{TEST_PRIVATE_KEY}\n")).unwrap();
        let from_file = KeyManager::load(&KeySource::File { path: path.clone() }, None).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(from_env.address(), from_file.address());

        let missing = KeyManager::load(
            &KeySource::EnvVar {
                var_name: "OCEAN_TRADE_TEST_MISSING_KEY".to_string(),
            },
            None,
        );
        assert!(matches!(missing, Err(KeyError::EnvVarNotFound(_))));
    }

    #[test]
    fn test_order_hash_format_and_determinism() {
        let order = test_order();
        let hash = order_hash_hex(&order).unwrap();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert_eq!(hash, hash.to_lowercase());
        assert_eq!(hash, order_hash_hex(&order.clone()).unwrap());
    }

    #[test]
    fn test_order_hash_tracks_field_values() {
        let order = test_order();
        let base = order_hash(&order).unwrap();

        let mut salted = order.clone();
        salted.salt = Amount::from(43u64);
        assert_ne!(order_hash(&salted).unwrap(), base);

        let rebound = order.with_maker("0x70997970c51812dc3a010c7d01b50e0d17dc79c8");
        assert_ne!(order_hash(&rebound).unwrap(), base);

        // Address case does not change the packed bytes
        let upper = order.with_maker(TEST_ADDRESS);
        assert_eq!(order_hash(&upper).unwrap(), base);
    }

    #[test]
    fn test_order_hash_packs_fields() {
        let order = test_order();
        let mut packed = Vec::new();
        for address in [
            &order.exchange_contract_address,
            &order.maker,
            &order.taker,
            &order.maker_token_address,
            &order.taker_token_address,
            &order.fee_recipient,
        ] {
            packed.extend_from_slice(&hex::decode(address.trim_start_matches("0x")).unwrap());
        }
        for amount in [
            U256::from(10u64).pow(U256::from(18u64)),
            U256::from(2_500_000_000_000_000u64),
            U256::ZERO,
            U256::ZERO,
            U256::from(1_700_000_000u64),
            U256::from(42u64),
        ] {
            packed.extend_from_slice(&amount.to_be_bytes::<32>());
        }
        assert_eq!(packed.len(), 6 * 20 + 6 * 32);
        assert_eq!(order_hash(&order).unwrap(), keccak256(&packed));
    }

    #[test]
    fn test_order_hash_rejects_missing_maker() {
        let mut order = test_order();
        order.maker = String::new();
        assert!(matches!(
            order_hash(&order),
            Err(SignerError::InvalidOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_local_signer_recovers_to_maker() {
        let manager = Arc::new(KeyManager::from_hex(TEST_PRIVATE_KEY, None).unwrap());
        let signer = LocalOrderSigner::new(manager);
        let hash = order_hash_hex(&test_order()).unwrap();

        let signature = signer
            .sign_order_hash(&hash, &TEST_ADDRESS.to_lowercase())
            .await
            .unwrap();
        assert!(signature.v == 27 || signature.v == 28);
        assert_eq!(signature.r.len(), 66);
        assert_eq!(signature.s.len(), 66);

        let recovered = PrimitiveSignature::new(
            U256::from_str(&signature.r).unwrap(),
            U256::from_str(&signature.s).unwrap(),
            signature.v == 28,
        )
        .recover_address_from_msg(B256::from_str(&hash).unwrap().as_slice())
        .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[tokio::test]
    async fn test_local_signer_unknown_address() {
        let manager = Arc::new(KeyManager::from_hex(TEST_PRIVATE_KEY, None).unwrap());
        let signer = LocalOrderSigner::new(manager);
        let hash = order_hash_hex(&test_order()).unwrap();

        let result = signer
            .sign_order_hash(&hash, "0x70997970c51812dc3a010c7d01b50e0d17dc79c8")
            .await;
        assert!(matches!(result, Err(SignerError::UnknownSigner(_))));

        let result = signer.sign_order_hash("0x1234", TEST_ADDRESS).await;
        assert!(matches!(result, Err(SignerError::InvalidHash(_))));
    }

    #[tokio::test]
    async fn test_mock_signer_records_and_fails() {
        let signer = MockOrderSigner::new();
        let signature = signer.sign_order_hash("0xaa", "0xbb").await.unwrap();
        assert_eq!(signature.v, 27);
        assert_eq!(
            signer.calls(),
            vec![("0xaa".to_string(), "0xbb".to_string())]
        );

        signer.set_failure("device locked");
        let result = signer.sign_order_hash("0xaa", "0xbb").await;
        assert!(matches!(result, Err(SignerError::Rejected(r)) if r == "device locked"));
    }

    #[test]
    fn test_signature_from_bytes_normalizes_v() {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&[0xab; 32]);
        bytes[32..64].copy_from_slice(&[0xcd; 32]);

        bytes[64] = 1;
        let sig = ec_signature_from_bytes(&bytes);
        assert_eq!(sig.v, 28);
        assert_eq!(sig.r, format!("0x{}", "ab".repeat(32)));
        assert_eq!(sig.s, format!("0x{}", "cd".repeat(32)));

        bytes[64] = 0;
        assert_eq!(ec_signature_from_bytes(&bytes).v, 27);

        bytes[64] = 28;
        assert_eq!(ec_signature_from_bytes(&bytes).v, 28);
    }
}
