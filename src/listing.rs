use crate::llm::{ContentPart, LlmClient, LlmError, LlmMessage};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::Rng;
use tracing::warn;

const SYSTEM_PROMPT: &str = "You are a helpful assistant writing marketplace listings.";
const GENERATION_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone)]
pub struct GeneratedCopy {
    pub text: String,
    pub images_used: usize,
    pub images_skipped: usize,
}

/// Fresh per-submission stock keeping unit. Uniqueness is probabilistic:
/// the 32-bit suffix space is large relative to expected volume and the
/// marketplace side treats the PUT as create-or-replace anyway.
pub fn new_sku() -> String {
    let suffix: u32 = rand::rng().random();
    format!("ITEM-{suffix:08x}")
}

/// Drives the generation gateway with the submitted text plus every image
/// entry that is a usable `data:image...` URI. Unusable entries are skipped
/// with a warning; they must never abort generation.
pub async fn generate_listing(
    llm: &LlmClient,
    text: &str,
    images: &[String],
) -> Result<GeneratedCopy, LlmError> {
    let mut attached = Vec::new();
    let mut skipped = 0usize;
    for entry in images {
        if is_image_data_uri(entry) {
            attached.push(ContentPart::Image { url: entry.clone() });
        } else {
            skipped += 1;
            warn!(
                target = "hawker.listing",
                entry_prefix = %entry.chars().take(24).collect::<String>(),
                "skipping image entry that is not an image data uri"
            );
        }
    }

    let mut instruction = format!(
        "Generate a catchy marketplace title and bullet-point description for this item: '{text}'"
    );
    if !attached.is_empty() {
        instruction.push_str("\nUse context from the attached photos if relevant.");
    }

    let images_used = attached.len();
    let mut parts = vec![ContentPart::Text { text: instruction }];
    parts.extend(attached);

    let messages = [LlmMessage::system(SYSTEM_PROMPT), LlmMessage::user(parts)];
    let response = llm.chat(&messages, Some(GENERATION_MAX_TOKENS)).await?;

    Ok(GeneratedCopy {
        text: response.text,
        images_used,
        images_skipped: skipped,
    })
}

/// A usable image reference is a `data:image...` URI whose base64 payload
/// decodes. Remote references are passed over here; the gateway only
/// receives inline photos.
pub fn is_image_data_uri(entry: &str) -> bool {
    let Some(rest) = entry.strip_prefix("data:image") else {
        return false;
    };
    let Some((_, payload)) = rest.split_once(";base64,") else {
        return false;
    };
    !payload.is_empty() && BASE64.decode(payload).is_ok()
}

/// Splits generated copy into a title and a description. Total: every input
/// shape produces a non-blank title (falling back to the SKU) and the
/// description falls back to the full generated text.
pub fn split_generated(generated: &str, sku: &str) -> (String, String) {
    let (first, rest) = match generated.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (generated, None),
    };

    let title = match first.trim() {
        "" => format!("Item {sku}"),
        trimmed => trimmed.to_string(),
    };

    let description = match rest {
        Some(rest) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => generated.to_string(),
    };

    (title, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_has_fixed_prefix_and_hex_suffix() {
        let sku = new_sku();
        let suffix = sku.strip_prefix("ITEM-").expect("prefix");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(suffix.to_lowercase(), suffix);
    }

    #[test]
    fn split_multi_line_copy() {
        let (title, description) =
            split_generated("Title Line\nBody line 1\nBody line 2", "ITEM-00000001");
        assert_eq!(title, "Title Line");
        assert_eq!(description, "Body line 1\nBody line 2");
    }

    #[test]
    fn split_single_line_falls_back_to_full_text() {
        let (title, description) = split_generated("Only one line", "ITEM-00000001");
        assert_eq!(title, "Only one line");
        assert_eq!(description, "Only one line");
    }

    #[test]
    fn split_empty_input_substitutes_sku_title() {
        let (title, description) = split_generated("", "ITEM-00000001");
        assert_eq!(title, "Item ITEM-00000001");
        assert_eq!(description, "");
    }

    #[test]
    fn split_blank_remainder_keeps_whole_text() {
        let (title, description) = split_generated("Title Line\n   \n", "ITEM-00000001");
        assert_eq!(title, "Title Line");
        assert_eq!(description, "Title Line\n   \n");
    }

    #[test]
    fn title_is_never_blank() {
        for input in ["", "\n", "   \nBody", "\t\n\n"] {
            let (title, _) = split_generated(input, "ITEM-deadbeef");
            assert!(!title.trim().is_empty(), "blank title for {input:?}");
        }
    }

    #[test]
    fn image_data_uri_detection() {
        assert!(is_image_data_uri("data:image/png;base64,AAAA"));
        assert!(is_image_data_uri("data:image/jpeg;base64,aGVsbG8="));
        assert!(!is_image_data_uri("not-a-real-image"));
        assert!(!is_image_data_uri("https://example.com/a.jpg"));
        assert!(!is_image_data_uri("data:text/plain;base64,AAAA"));
        assert!(!is_image_data_uri("data:image/png;base64,"));
        assert!(!is_image_data_uri("data:image/png;base64,%%%%"));
    }
}
