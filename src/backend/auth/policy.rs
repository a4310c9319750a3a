/**
 * Signup Policy
 *
 * Local checks applied to a signup request before the identity provider is
 * contacted. Which checks run is decided by `SignupRules`.
 *
 * # Checks
 *
 * - email: one `@`, non-empty local part, a dot inside the domain
 * - password: at least `min_password_len` characters
 * - CPF: required and check-digit valid for veterinarians when
 *   `require_cpf_for_veterinarian` is set; validated whenever present
 */

use crate::backend::auth::profiles::Role;
use crate::shared::{SharedError, SignupRules};

/// Signup rule set
#[derive(Debug, Clone, Default)]
pub struct SignupPolicy {
    rules: SignupRules,
}

impl SignupPolicy {
    pub fn new(rules: SignupRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &SignupRules {
        &self.rules
    }

    /// Validate a signup request
    ///
    /// Returns the CPF normalized to its 11 digits, if one was given.
    pub fn check(
        &self,
        email: &str,
        password: &str,
        role: Role,
        cpf: Option<&str>,
    ) -> Result<Option<String>, SharedError> {
        if !is_valid_email(email) {
            return Err(SharedError::validation("email", "Invalid email address"));
        }
        if password.chars().count() < self.rules.min_password_len {
            return Err(SharedError::validation(
                "password",
                format!("Password must be at least {} characters", self.rules.min_password_len),
            ));
        }

        let cpf = match cpf.map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => Some(normalize_cpf(raw).ok_or_else(|| SharedError::validation("cpf", "Invalid CPF"))?),
            None => None,
        };
        if role == Role::Veterinarian && self.rules.require_cpf_for_veterinarian && cpf.is_none() {
            return Err(SharedError::validation("cpf", "CPF is required for veterinarians"));
        }
        Ok(cpf)
    }
}

/// Basic email shape check
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.starts_with('.'),
        None => false,
    }
}

/// Strip punctuation from a CPF and verify its check digits
///
/// Accepts `529.982.247-25` and `52998224725`; returns the 11 digits.
pub fn normalize_cpf(raw: &str) -> Option<String> {
    let digits: Vec<u32> = raw
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()?;

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return None;
    }
    if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
        return None;
    }
    Some(digits.iter().map(|d| char::from(b'0' + *d as u8)).collect())
}

/// Modulo-11 check digit over `digits`, weights counting down to 2
fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        d => d,
    }
}
