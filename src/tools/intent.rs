//! Keyword intent routing
//!
//! Decides which optional tool groups the latest user message warrants.
//! Substring matching over-selects on occasion; an extra group in the tool
//! list is harmless.

/// Keywords that suggest the user wants asset-library tools
const ASSET_KEYWORDS: &[&str] = &[
    "image", "images", "photo", "photos", "picture", "pictures", "video", "videos", "media",
    "asset", "assets", "thumbnail", "gallery",
];

/// Keywords that suggest the user wants CMS tools
const CMS_KEYWORDS: &[&str] = &[
    "post", "posts", "publish", "draft", "article", "blog", "page", "site", "cache", "cms",
    "content",
];

/// Which optional tool groups a message selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub assets: bool,
    pub cms: bool,
}

impl Intent {
    /// Select every group, used when routing is disabled
    pub fn all() -> Self {
        Self { assets: true, cms: true }
    }
}

/// Classify the latest user message by case-insensitive keyword matching
pub fn detect(message: &str) -> Intent {
    let lowered = message.to_lowercase();

    Intent {
        assets: ASSET_KEYWORDS.iter().any(|k| lowered.contains(k)),
        cms: CMS_KEYWORDS.iter().any(|k| lowered.contains(k)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_intent() {
        let intent = detect("Show me images of mountains");
        assert!(intent.assets);
        assert!(!intent.cms);
    }

    #[test]
    fn test_cms_intent() {
        let intent = detect("Publish a new draft post titled Hello");
        assert!(intent.cms);
        assert!(!intent.assets);
    }

    #[test]
    fn test_combined_intent() {
        let intent = detect("Create a blog post with a photo of the launch");
        assert!(intent.assets);
        assert!(intent.cms);
    }

    #[test]
    fn test_neutral_message_selects_nothing() {
        let intent = detect("What's the weather like in Lisbon?");
        assert!(!intent.assets);
        assert!(!intent.cms);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(detect("PUBLISH THIS").cms);
        assert!(detect("A Video Please").assets);
    }

    #[test]
    fn test_substring_matching_is_loose() {
        // "compost" contains "post"; substring matching accepts this
        assert!(detect("my compost heap").cms);
    }

    #[test]
    fn test_all_selects_everything() {
        let intent = Intent::all();
        assert!(intent.assets && intent.cms);
    }
}
