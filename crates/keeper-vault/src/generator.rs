// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation and a coarse strength heuristic.

use keeper_config::validation::{MAX_GENERATOR_LENGTH, MIN_GENERATOR_LENGTH};
use keeper_config::GeneratorConfig;
use keeper_core::KeeperError;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use secrecy::SecretString;
use zeroize::Zeroizing;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Generate a password from the OS CSPRNG.
///
/// Lowercase letters are always in the alphabet. Each enabled optional class
/// contributes at least one character before the result is shuffled.
pub fn generate_password(config: &GeneratorConfig) -> Result<SecretString, KeeperError> {
    if !(MIN_GENERATOR_LENGTH..=MAX_GENERATOR_LENGTH).contains(&config.length) {
        return Err(KeeperError::InvalidInput(format!(
            "password length must be between {MIN_GENERATOR_LENGTH} and \
             {MAX_GENERATOR_LENGTH}, got {}",
            config.length
        )));
    }

    let classes: Vec<&[u8]> = [
        (config.uppercase, UPPERCASE),
        (config.digits, DIGITS),
        (config.symbols, SYMBOLS),
    ]
    .into_iter()
    .filter_map(|(enabled, set)| enabled.then_some(set))
    .collect();

    let alphabet: Vec<u8> = std::iter::once(LOWERCASE)
        .chain(classes.iter().copied())
        .flatten()
        .copied()
        .collect();

    let mut rng = OsRng;
    let mut chars = Zeroizing::new(Vec::<u8>::with_capacity(config.length));
    for set in &classes {
        chars.extend(set.choose(&mut rng));
    }
    while chars.len() < config.length {
        chars.extend(alphabet.choose(&mut rng));
    }
    chars.shuffle(&mut rng);

    Ok(SecretString::from(
        chars.iter().map(|&b| b as char).collect::<String>(),
    ))
}

/// Coarse strength bucket for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLevel {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

/// Which of the five strength checks a password passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrengthChecks {
    /// At least eight characters.
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digit: bool,
    /// Any non-alphanumeric character.
    pub symbol: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    /// Number of passed checks, 0 to 5.
    pub score: u8,
    pub level: StrengthLevel,
    pub checks: StrengthChecks,
}

/// Score a password against the five checks.
pub fn check_strength(password: &str) -> PasswordStrength {
    let checks = StrengthChecks {
        length: password.chars().count() >= 8,
        uppercase: password.chars().any(char::is_uppercase),
        lowercase: password.chars().any(char::is_lowercase),
        digit: password.chars().any(|c| c.is_ascii_digit()),
        symbol: password.chars().any(|c| !c.is_alphanumeric()),
    };
    let score = [
        checks.length,
        checks.uppercase,
        checks.lowercase,
        checks.digit,
        checks.symbol,
    ]
    .into_iter()
    .filter(|passed| *passed)
    .count() as u8;

    let level = match score {
        5 => StrengthLevel::VeryStrong,
        4 => StrengthLevel::Strong,
        3 => StrengthLevel::Medium,
        _ => StrengthLevel::Weak,
    };
    PasswordStrength {
        score,
        level,
        checks,
    }
}
