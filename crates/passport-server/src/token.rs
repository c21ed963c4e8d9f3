//! Guid and opaque token generation.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};

/// Guid layout: 8-digit date stamp + 2-digit user type + 10 random digits.
pub struct GuidGenerator;

impl GuidGenerator {
    pub fn generate(user_type: i32, now: DateTime<Utc>) -> String {
        let date_part = now.format("%Y%m%d");
        let rand_part = random_digits(10);
        format!("{date_part}{user_type:02}{rand_part}")
    }
}

/// Opaque refresh token: `R.` + 32 hex chars.
pub fn generate_refresh_token() -> String {
    generate_token('R')
}

/// Opaque access token: `A.` + 32 hex chars.
pub fn generate_access_token() -> String {
    generate_token('A')
}

/// Tokens are prefixed by kind purely for debuggability; the prefix carries
/// no authorization meaning.
fn generate_token(prefix: char) -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}.{hex}")
}

fn random_digits(count: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
