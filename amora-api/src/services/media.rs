//! Object keys for the two storage buckets.

/// Key of a profile's avatar in the `avatars` bucket.
pub fn avatar_key(profile_id: i32) -> String {
    format!("{profile_id}.png")
}

/// Key of a gallery image. `sequence` is the profile's monotonic upload
/// counter, which keeps keys unique across deletions.
pub fn gallery_key(profile_id: i32, sequence: i32) -> String {
    format!("{profile_id}_{sequence}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats() {
        assert_eq!(avatar_key(7), "7.png");
        assert_eq!(gallery_key(7, 0), "7_0.png");
        assert_eq!(gallery_key(12, 31), "12_31.png");
    }

    #[test]
    fn gallery_keys_unique_per_sequence() {
        assert_ne!(gallery_key(1, 0), gallery_key(1, 1));
        assert_ne!(gallery_key(1, 0), gallery_key(10, 0));
    }
}
