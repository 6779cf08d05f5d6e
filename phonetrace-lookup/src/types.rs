use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Everything one lookup produced, ready to display.
///
/// All fields except `phone_number` and `sources` are whatever the model
/// asserted; none of them are verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub phone_number: String,
    pub name: String,
    pub admin_name: String,
    pub city: String,
    pub location: String,
    pub carrier: String,
    #[serde(rename = "type")]
    pub line_type: String,
    pub summary: String,
    pub confidence: Confidence,
    pub social_presence: SocialPresence,
    pub sources: Vec<Source>,
}

/// The model's own rating of how sure it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::High, Confidence::Medium, Confidence::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }

    /// Case-insensitive parse; anything outside the three levels is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Confidence::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown confidence level {raw:?}, expected High, Medium or Low"
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPresence {
    pub whatsapp: ChannelPresence,
    pub telegram: ChannelPresence,
}

/// Whether the number looks active on one messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPresence {
    pub available: bool,
    pub link: String,
    pub note: String,
}

/// A grounding citation kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_parses_any_case() {
        assert_eq!(Confidence::parse("high"), Some(Confidence::High));
        assert_eq!(Confidence::parse(" MEDIUM "), Some(Confidence::Medium));
        assert_eq!(Confidence::parse("Low"), Some(Confidence::Low));
        assert_eq!(Confidence::parse("Very High"), None);
    }

    #[test]
    fn result_serializes_with_display_field_names() {
        let result = LookupResult {
            phone_number: "+8801712345678".into(),
            name: "Not Disclosed".into(),
            admin_name: "Not Disclosed".into(),
            city: "Dhaka".into(),
            location: "Dhaka Division, Bangladesh".into(),
            carrier: "Grameenphone".into(),
            line_type: "Mobile".into(),
            summary: "A Grameenphone mobile number.".into(),
            confidence: Confidence::Medium,
            social_presence: SocialPresence {
                whatsapp: ChannelPresence {
                    available: true,
                    link: "https://wa.me/8801712345678".into(),
                    note: String::new(),
                },
                telegram: ChannelPresence {
                    available: false,
                    link: String::new(),
                    note: "No public profile".into(),
                },
            },
            sources: Vec::new(),
        };

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["phoneNumber"], "+8801712345678");
        assert_eq!(v["adminName"], "Not Disclosed");
        assert_eq!(v["type"], "Mobile");
        assert_eq!(v["confidence"], "Medium");
        assert_eq!(v["socialPresence"]["whatsapp"]["available"], true);
        assert_eq!(v["sources"], serde_json::json!([]));
    }
}
