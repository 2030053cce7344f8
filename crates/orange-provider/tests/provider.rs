// End-to-end tests for the Ontology provider
//
// Wallets are written to a temp directory and the DID registry is the
// in-memory StaticRegistry, so nothing here touches the network.

use std::path::{Path, PathBuf};

use orange_crypto::{CryptoError, SecretKey};
use orange_provider::{
    Account, Network, OntProvider, Provider, ProviderConfig, ProviderError, ScryptParams,
    SecretString, StaticRegistry, Wallet,
};
use rand::rngs::OsRng;
use tempfile::TempDir;

const REGISTERED_DID: &str = "did:ont:AFmseVrdL9f9oyCzZefL9tG6UbvhUMqNMV";

const TEST_SCRYPT: ScryptParams = ScryptParams {
    n: 1024,
    r: 8,
    p: 1,
    dk_len: 64,
};

fn password(s: &str) -> SecretString {
    SecretString::new(s.to_string())
}

fn write_wallet(dir: &TempDir, secret: &SecretKey, pwd: &str) -> PathBuf {
    let mut wallet = Wallet::new("orange", TEST_SCRYPT);
    wallet
        .add_account(secret, "default", &password(pwd), true)
        .expect("add account");
    let path = dir.path().join("wallet.dat");
    wallet.save(&path).expect("save wallet");
    path
}

fn load_provider(path: &Path, pwd: &str, registry: StaticRegistry) -> OntProvider<StaticRegistry> {
    let wallet = Wallet::open(path).expect("open wallet");
    let account = wallet.default_account(&password(pwd)).expect("unlock account");
    OntProvider::with_registry(account, registry)
}

#[test]
fn test_encrypt_to_self_roundtrip_from_wallet() {
    let dir = TempDir::new().unwrap();
    let secret = SecretKey::random(&mut OsRng);
    let path = write_wallet(&dir, &secret, "123456");

    let probe = load_provider(&path, "123456", StaticRegistry::new());
    let registry = StaticRegistry::new()
        .with_public_key(probe.self_did(), &probe.account().public_key_bytes());
    let provider = load_provider(&path, "123456", registry);

    let message = b"this is a secret string";
    let ciphertext = provider
        .encrypt_data_with_did(message, &provider.self_did())
        .expect("encrypt to self");
    assert_ne!(&ciphertext[..], &message[..]);

    let plaintext = provider.decrypt_data(&ciphertext).expect("decrypt");
    assert_eq!(plaintext, message);
}

#[test]
fn test_sign_and_verify_across_providers() {
    let alice = Account::from_secret(SecretKey::random(&mut OsRng), "alice");
    let bob = Account::from_secret(SecretKey::random(&mut OsRng), "bob");

    let registry = StaticRegistry::new()
        .with_public_key(alice.did(), &alice.public_key_bytes())
        .with_public_key(bob.did(), &bob.public_key_bytes());
    let alice_did = alice.did();

    let alice_provider = OntProvider::with_registry(alice, registry.clone());
    let bob_provider = OntProvider::with_registry(bob, registry);

    let data = b"test data to sign";
    let sig = alice_provider.sign_data(data).expect("sign");

    assert!(bob_provider.verify_sig(&alice_did, data, &sig).expect("verify"));
    assert!(!bob_provider
        .verify_sig(&bob_provider.self_did(), data, &sig)
        .expect("verify against wrong key"));
}

#[test]
fn test_tampered_signature_never_verifies() {
    let account = Account::from_secret(SecretKey::random(&mut OsRng), "signer");
    let registry = StaticRegistry::new().with_public_key(account.did(), &account.public_key_bytes());
    let provider = OntProvider::with_registry(account, registry);
    let did = provider.self_did();

    let sig = provider.sign_data(b"payload").unwrap();
    for i in 0..sig.len() {
        let mut tampered = sig.clone();
        tampered[i] ^= 0x01;
        match provider.verify_sig(&did, b"payload", &tampered) {
            Ok(valid) => assert!(!valid, "tampered byte {} verified", i),
            Err(ProviderError::Crypto(CryptoError::InvalidSignatureEncoding(_))) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}

#[test]
fn test_encrypt_to_registered_did() {
    // The recipient holds the key registered under a fixed DID.
    let recipient = Account::from_secret(SecretKey::random(&mut OsRng), "recipient");
    let registry = StaticRegistry::new().with_public_key(REGISTERED_DID, &recipient.public_key_bytes());

    let sender = Account::from_secret(SecretKey::random(&mut OsRng), "sender");
    let sender_provider = OntProvider::with_registry(sender, registry.clone());
    let recipient_provider = OntProvider::with_registry(recipient, registry);

    let ciphertext = sender_provider
        .encrypt_data_with_did(b"for your eyes only", REGISTERED_DID)
        .expect("encrypt");

    assert_eq!(
        recipient_provider.decrypt_data(&ciphertext).unwrap(),
        b"for your eyes only"
    );
    assert!(matches!(
        sender_provider.decrypt_data(&ciphertext),
        Err(ProviderError::Crypto(CryptoError::DecryptionFailed))
    ));
}

#[test]
fn test_first_registered_key_is_used() {
    let first = Account::from_secret(SecretKey::random(&mut OsRng), "first");
    let second = Account::from_secret(SecretKey::random(&mut OsRng), "second");

    let mut registry = StaticRegistry::new();
    registry.insert_json(
        REGISTERED_DID,
        format!(
            r#"[{{"id":"{did}#keys-1","type":"EcdsaSecp256r1VerificationKey2019","controller":"{did}","publicKeyHex":"{k1}"}},
                {{"id":"{did}#keys-2","type":"EcdsaSecp256r1VerificationKey2019","controller":"{did}","publicKeyHex":"{k2}"}}]"#,
            did = REGISTERED_DID,
            k1 = hex::encode(first.public_key_bytes()),
            k2 = hex::encode(second.public_key_bytes()),
        ),
    );

    let first_provider = OntProvider::with_registry(first, registry.clone());
    let second_provider = OntProvider::with_registry(second, registry);

    let sig = first_provider.sign_data(b"m").unwrap();
    assert!(second_provider.verify_sig(REGISTERED_DID, b"m", &sig).unwrap());

    let sig = second_provider.sign_data(b"m").unwrap();
    assert!(!first_provider.verify_sig(REGISTERED_DID, b"m", &sig).unwrap());
}

#[test]
fn test_empty_registry_entry_is_did_not_found() {
    let account = Account::from_secret(SecretKey::random(&mut OsRng), "a");
    let mut registry = StaticRegistry::new();
    registry.insert_json(REGISTERED_DID, "[]");
    let provider = OntProvider::with_registry(account, registry);

    assert!(matches!(
        provider.encrypt_data_with_did(b"data", REGISTERED_DID),
        Err(ProviderError::DidNotFound(ref did)) if did == REGISTERED_DID
    ));
}

#[test]
fn test_malformed_registry_response() {
    let account = Account::from_secret(SecretKey::random(&mut OsRng), "a");
    let mut registry = StaticRegistry::new();
    registry.insert_json(REGISTERED_DID, r#"{"unexpected": true}"#);
    let provider = OntProvider::with_registry(account, registry);

    assert!(matches!(
        provider.verify_sig(REGISTERED_DID, b"m", &[0u8; 65]),
        Err(ProviderError::MalformedRegistryResponse(_))
    ));
}

#[test]
fn test_registered_key_not_on_curve() {
    let account = Account::from_secret(SecretKey::random(&mut OsRng), "a");
    let mut bogus = vec![0x02];
    bogus.extend_from_slice(&[0xff; 32]);
    let registry = StaticRegistry::new().with_public_key(REGISTERED_DID, &bogus);
    let provider = OntProvider::with_registry(account, registry);

    assert!(matches!(
        provider.encrypt_data_with_did(b"data", REGISTERED_DID),
        Err(ProviderError::Crypto(CryptoError::InvalidPoint))
    ));
}

#[test]
fn test_new_opens_wallet_from_config() {
    let dir = TempDir::new().unwrap();
    let secret = SecretKey::random(&mut OsRng);
    let path = write_wallet(&dir, &secret, "correct horse");

    let config = ProviderConfig::new(&path, Network::Testnet).with_rpc_address("http://127.0.0.1:1");
    let provider = OntProvider::new(&config, &password("correct horse")).expect("provider");

    let expected = orange_crypto::Address::from_public_key(&secret.public_key()).to_did();
    assert_eq!(provider.self_did(), expected);
    assert_eq!(provider.registry().address(), "http://127.0.0.1:1");
}

#[test]
fn test_new_with_wrong_password() {
    let dir = TempDir::new().unwrap();
    let path = write_wallet(&dir, &SecretKey::random(&mut OsRng), "right");

    let config = ProviderConfig::new(&path, Network::Mainnet);
    assert!(matches!(
        OntProvider::new(&config, &password("wrong")),
        Err(ProviderError::WrongPassword)
    ));
}

#[test]
fn test_new_with_missing_wallet() {
    let dir = TempDir::new().unwrap();
    let config = ProviderConfig::new(dir.path().join("absent.dat"), Network::Testnet);
    assert!(matches!(
        OntProvider::new(&config, &password("x")),
        Err(ProviderError::Wallet(_))
    ));
}
