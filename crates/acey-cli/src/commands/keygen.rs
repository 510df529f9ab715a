//! Keygen command - create a signing seed.

use acey_crypto::KeyPair;
use serde_json::json;

use super::OutputFormat;
use crate::theme::Theme;

/// Generate a key pair and print its seed and public key.
pub(crate) fn run(format: OutputFormat) -> anyhow::Result<()> {
    let key = KeyPair::generate();
    let secret = key.secret_key_hex();
    let public = key.export_public_key();

    match format {
        OutputFormat::Json => {
            let output = json!({
                "signatureKey": secret.as_str(),
                "publicKey": public.to_hex(),
                "keyId": key.key_id_hex(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        },
        OutputFormat::Pretty => {
            println!("\n{}", Theme::header("New Signing Key"));
            println!("{}", Theme::field("Key ID", &key.key_id_hex()));
            println!("{}", Theme::field("Public key", &public.to_hex()));
            println!("{}", Theme::field("Signature key", secret.as_str()));
            println!();
            println!(
                "{}",
                Theme::warning("Store the signature key as ACEY_AUDIT_SIGNATURE_KEY; it is not saved.")
            );
            println!();
        },
    }

    Ok(())
}
