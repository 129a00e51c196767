//! Identifier and secret generation for new accounts.
//!
//! Everything takes the random source as a parameter so tests can seed it.

use rand::seq::SliceRandom;
use rand::Rng;

pub const USERNAME_PREFIX: &str = "cu";
pub const MAX_USERNAME_LEN: usize = 16;
pub const MIN_PASSWORD_LENGTH: usize = 8;

const USERNAME_SUFFIX_LEN: usize = 4;
const SUBDOMAIN_SUFFIX_LEN: usize = 6;
const MAX_SLUG_LEN: usize = 30;

const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#%^*-_+=";
const TOKEN: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Lowercase alphanumeric token of `len` characters
pub fn random_token<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| TOKEN[rng.gen_range(0..TOKEN.len())] as char)
        .collect()
}

/// `cu` + sanitized email local part + 4 random characters, at most 16 long
pub fn generate_username<R: Rng + ?Sized>(email: &str, rng: &mut R) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let stem_len = MAX_USERNAME_LEN - USERNAME_PREFIX.len() - USERNAME_SUFFIX_LEN;
    let stem: String = local
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(stem_len)
        .collect();

    format!("{}{}{}", USERNAME_PREFIX, stem, random_token(USERNAME_SUFFIX_LEN, rng))
}

/// Password of exactly `length` characters containing a lowercase letter, an
/// uppercase letter, a digit and a symbol. `None` below [`MIN_PASSWORD_LENGTH`].
pub fn generate_password<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Option<String> {
    if length < MIN_PASSWORD_LENGTH {
        return None;
    }
    let classes = [LOWER, UPPER, DIGITS, SYMBOLS];
    let all: Vec<u8> = classes.concat();

    let mut chars: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();
    while chars.len() < length {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(rng);

    Some(chars.into_iter().map(char::from).collect())
}

/// Lowercase, hyphen-separated DNS label from a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "site".to_string()
    } else {
        slug.to_string()
    }
}

/// `<slug(name)>-<6 random>.<primary domain>`
pub fn generate_subdomain<R: Rng + ?Sized>(name: &str, primary_domain: &str, rng: &mut R) -> String {
    format!(
        "{}-{}.{}",
        slugify(name),
        random_token(SUBDOMAIN_SUFFIX_LEN, rng),
        primary_domain.trim_matches('.')
    )
}

/// Short names for `v-add-database`; the control plane prefixes both with the owner
pub fn generate_database_names<R: Rng + ?Sized>(rng: &mut R) -> (String, String) {
    let token = random_token(USERNAME_SUFFIX_LEN, rng);
    (format!("db{}", token), format!("dbu{}", token))
}
