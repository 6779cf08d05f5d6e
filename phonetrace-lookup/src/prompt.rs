//! Prompt text and the structured-output schema sent with every lookup.

use serde_json::{json, Value};

pub const INVESTIGATOR_SYSTEM_PROMPT: &str = r#"You are a professional global phone number investigator.

Use web search to ground every finding in public sources.

Output rules:
- Return the results in JSON format only, matching the response schema.
- If some details are private or cannot be found, use the string "Not Disclosed".
- "confidence" must be exactly one of "High", "Medium" or "Low"."#;

/// The per-number task. The number is embedded verbatim, quoted.
pub fn build_lookup_prompt(phone_number: &str) -> String {
    format!(
        r#"Perform a deep search for the number: "{phone_number}".

Your goal is to find:
1. The most common display name (Caller ID from public records).
2. The legal name of the registered owner/admin if available.
3. The specific city or town where this number is registered.
4. The country and region.
5. The mobile network carrier name.
6. Check if this number is likely active on WhatsApp or Telegram.

Provide a high-quality summary of your findings.
MANDATORY: Return the results in JSON format only. If some details are private, return "Not Disclosed"."#
    )
}

fn channel_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "available": { "type": "BOOLEAN" },
            "link": { "type": "STRING" },
            "note": { "type": "STRING" }
        },
        "required": ["available", "link", "note"]
    })
}

/// Gemini response schema (OpenAPI subset) for a lookup result.
///
/// `phoneNumber` and `sources` are absent on purpose: the first is echoed
/// from the input and the second comes from grounding metadata.
pub fn lookup_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "adminName": { "type": "STRING" },
            "city": { "type": "STRING" },
            "location": { "type": "STRING" },
            "carrier": { "type": "STRING" },
            "type": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "confidence": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
            "socialPresence": {
                "type": "OBJECT",
                "properties": {
                    "whatsapp": channel_schema(),
                    "telegram": channel_schema()
                },
                "required": ["whatsapp", "telegram"]
            }
        },
        "required": [
            "name", "adminName", "city", "location", "carrier",
            "type", "summary", "confidence", "socialPresence"
        ]
    })
}
