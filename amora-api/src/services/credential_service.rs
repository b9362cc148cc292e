use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Datelike, NaiveDate, Utc};

use amora_shared::errors::{AppError, ErrorCode};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::new(
            ErrorCode::PasswordTooWeak,
            "password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(
            ErrorCode::PasswordTooWeak,
            "password must contain at least one number",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::new(
            ErrorCode::PasswordTooWeak,
            "password must contain at least one letter",
        ));
    }
    Ok(())
}

/// Age is derived, never stored: whole years between the birth date and
/// `today`, minus one when this year's birthday has not yet passed.
pub fn derived_age(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn age_today(birth: NaiveDate) -> i32 {
    derived_age(birth, Utc::now().date_naive())
}

pub fn ensure_adult(birth: NaiveDate) -> Result<(), AppError> {
    if age_today(birth) < 18 {
        return Err(AppError::new(ErrorCode::AdultsOnly, "adults only"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn password_rules() {
        assert!(validate_password("abc1").is_err());
        assert!(validate_password("abcdefgh").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("abcdefg1").is_ok());
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("hunter42x").unwrap();
        assert!(verify_password("hunter42x", &hash).unwrap());
        assert!(!verify_password("hunter42y", &hash).unwrap());
    }

    #[test]
    fn age_counts_whole_years() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let birth = NaiveDate::from_ymd_opt(2000, 8, 23).unwrap();
        assert_eq!(derived_age(birth, today), 26);
    }

    #[test]
    fn age_drops_before_birthday() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let birth = NaiveDate::from_ymd_opt(2000, 8, 24).unwrap();
        assert_eq!(derived_age(birth, today), 25);
        let birth = NaiveDate::from_ymd_opt(2000, 9, 1).unwrap();
        assert_eq!(derived_age(birth, today), 25);
    }

    #[test]
    fn eighteenth_birthday_boundary() {
        let today = Utc::now().date_naive();
        // exactly 18 years ago today: allowed
        let birth = NaiveDate::from_ymd_opt(today.year() - 18, today.month(), today.day())
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(today.year() - 18, 2, 28).unwrap());
        assert!(ensure_adult(birth).is_ok());
        // one day short of 18 (17 years, 364-ish days): rejected
        let underage = birth + Duration::days(1);
        assert!(ensure_adult(underage).is_err());
    }
}
