mod common;

use common::*;
use opentoken::envelope::{Envelope, COMPRESSED_FLAG};
use opentoken::{decode, encode, transport};

fn envelope_of(text: &str) -> Envelope {
    Envelope::parse(&transport::decode_text(text).unwrap()).unwrap()
}

#[test]
fn test_roundtrip_every_cipher() -> Result<(), Box<dyn std::error::Error>> {
    for cipher in CipherSuite::ALL {
        for compress in [true, false] {
            let ctx = context(cipher, compress);
            let text = ctx.encode(&sample_attrs())?;
            let token = ctx.decode(&text)?;
            assert_eq!(token, sample_attrs(), "cipher {cipher}, compress {compress}");
        }
    }
    Ok(())
}

#[test]
fn test_roundtrip_free_functions() -> Result<(), Box<dyn std::error::Error>> {
    let text = encode(&sample_attrs(), CipherSuite::Aes256Cbc, PASSWORD)?;
    let token = decode(&text, PASSWORD, chrono::Utc::now(), chrono::Duration::seconds(5))?;

    assert_eq!(token.get("first_name"), Some("André"));
    assert_eq!(token.get("last_name"), Some("D'angelo"));
    assert_eq!(token.get("motto"), Some("say \"hello\""));
    assert_eq!(token.subject(), Some("john@example.com"));
    Ok(())
}

#[test]
fn test_token_text_is_url_safe() -> Result<(), Box<dyn std::error::Error>> {
    for cipher in CipherSuite::ALL {
        let text = context(cipher, true).encode(&random_attrs(10, 20))?;
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '*')));
        assert!(!text.contains('='));
    }
    Ok(())
}

#[test]
fn test_empty_attribute_map() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context(CipherSuite::Aes128Cbc, true);
    let token = ctx.decode(&ctx.encode(&AttributeMap::new())?)?;
    assert!(token.is_empty());
    Ok(())
}

#[test]
fn test_medium_payload() -> Result<(), Box<dyn std::error::Error>> {
    let attributes = random_attrs(20, 50);
    for cipher in ENCRYPTING_CIPHERS {
        let ctx = context(cipher, true);
        assert_eq!(ctx.decode(&ctx.encode(&attributes)?)?, attributes);
    }
    Ok(())
}

#[test]
fn test_large_payload() -> Result<(), Box<dyn std::error::Error>> {
    let attributes = random_attrs(100, 100);
    for cipher in ENCRYPTING_CIPHERS {
        for compress in [true, false] {
            let ctx = context(cipher, compress);
            let token = ctx.decode(&ctx.encode(&attributes)?)?;
            assert_eq!(token.len(), 100);
            assert_eq!(token, attributes);
        }
    }
    Ok(())
}

#[test]
fn test_repetitive_payload_is_compressed() -> Result<(), Box<dyn std::error::Error>> {
    let groups = "admin,".repeat(500);
    let attributes = attrs(&[("groups", groups.as_str())]);

    let compressed = context(CipherSuite::Aes128Cbc, true).encode(&attributes)?;
    let plain = context(CipherSuite::Aes128Cbc, false).encode(&attributes)?;

    assert!(envelope_of(&compressed).flags.compressed);
    assert!(!envelope_of(&plain).flags.compressed);
    assert!(compressed.len() < plain.len());
    assert_eq!(
        context(CipherSuite::Aes128Cbc, false).decode(&compressed)?,
        attributes
    );
    Ok(())
}

#[test]
fn test_incompressible_payload_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let text = context(CipherSuite::Aes128Cbc, true).encode(&attrs(&[("k", "v")]))?;
    let envelope = envelope_of(&text);
    assert!(!envelope.flags.compressed);
    assert_eq!(envelope.flags.to_byte() & COMPRESSED_FLAG, 0);
    Ok(())
}

#[test]
fn test_cross_cipher_consistency() -> Result<(), Box<dyn std::error::Error>> {
    let attributes = sample_attrs();
    let payload_len = opentoken::payload::serialize(&attributes)?.len();

    for cipher in ENCRYPTING_CIPHERS {
        let ctx = context(cipher, false);
        let text = ctx.encode(&attributes)?;
        let envelope = envelope_of(&text);

        assert_eq!(envelope.cipher(), cipher);
        assert_eq!(envelope.flags.to_byte(), cipher.id());
        assert_eq!(envelope.iv.len(), cipher.iv_length());

        let block = cipher.iv_length();
        assert_eq!(envelope.ciphertext.len(), (payload_len / block + 1) * block);

        assert_eq!(ctx.decode(&text)?, attributes);
    }
    Ok(())
}

#[test]
fn test_fresh_iv_per_encode() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context(CipherSuite::Aes256Cbc, true);
    let first = ctx.encode(&sample_attrs())?;
    let second = ctx.encode(&sample_attrs())?;
    assert_ne!(first, second);
    assert_eq!(ctx.decode(&first)?, ctx.decode(&second)?);
    Ok(())
}

#[test]
fn test_decoder_reads_any_cipher() -> Result<(), Box<dyn std::error::Error>> {
    let issuer = context(CipherSuite::Des3Cbc, true);
    let verifier = context(CipherSuite::Aes256Cbc, true);
    let text = issuer.encode(&sample_attrs())?;
    assert_eq!(verifier.decode(&text)?, sample_attrs());
    Ok(())
}
