/// Length of an API token key in hex characters.
pub const TOKEN_KEY_LEN: usize = 40;

/// Fresh random key: 20 bytes rendered as lowercase hex.
pub fn generate_key() -> String {
    hex::encode(rand::random::<[u8; TOKEN_KEY_LEN / 2]>())
}
