//! パスワードハッシュ化と検証（bcrypt）

use bcrypt::{hash, verify};
use control_interface_common::error::ControlError;

/// パスワードハッシュ化のコスト（12推奨、200-300ms）
#[cfg(not(test))]
const HASH_COST: u32 = 12;

#[cfg(test)]
const HASH_COST: u32 = 4;

/// パスワードをbcryptでハッシュ化
///
/// # Returns
/// * `Ok(String)` - bcryptハッシュ文字列（$2b$で始まる）
/// * `Err(ControlError)` - ハッシュ化失敗
pub fn hash_password(password: &str) -> Result<String, ControlError> {
    hash(password, HASH_COST)
        .map_err(|e| ControlError::PasswordHash(format!("Failed to hash password: {}", e)))
}

/// パスワードを検証
///
/// # Returns
/// * `Ok(true)` - パスワード一致
/// * `Ok(false)` - パスワード不一致
/// * `Err(ControlError)` - 検証失敗（ハッシュ形式不正など）
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ControlError> {
    verify(password, hash)
        .map_err(|e| ControlError::PasswordHash(format!("Failed to verify password: {}", e)))
}
