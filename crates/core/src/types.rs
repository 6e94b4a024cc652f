/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Wallet address identifying a bloblet. Stored lowercased.
pub type Address = String;

/// Normalise a wallet address for storage and lock ordering.
pub fn normalize_address(address: &str) -> Address {
    address.trim().to_ascii_lowercase()
}
