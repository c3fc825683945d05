use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;

const TOKEN_BYTES: usize = 32;
const CERTIFICATE_NUMBER_LENGTH: usize = 12;
const CERTIFICATE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Token à usage unique (vérification email, reset password) :
/// 32 octets aléatoires en base64 URL-safe sans padding
pub fn generate_url_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Numéro de certificat : 12 caractères parmi A-Z0-9
pub fn generate_certificate_number() -> String {
    let mut rng = rand::thread_rng();
    (0..CERTIFICATE_NUMBER_LENGTH)
        .map(|_| CERTIFICATE_ALPHABET[rng.gen_range(0..CERTIFICATE_ALPHABET.len())] as char)
        .collect()
}
