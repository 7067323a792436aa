//! Descriptive filename and alt-text convention for uploaded images.
//!
//! Uploads carry a predictable filename derived from the product and color
//! names so the filename-pattern matching step has a stable string to search
//! for even when alt text is missing or mismatched.

/// The supplier marks the main product shot with this literal caption.
pub fn is_main_image_caption(caption: &str) -> bool {
    caption.trim().eq_ignore_ascii_case("product image")
}

/// Title-case every whitespace-separated word.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the descriptive upload filename: `"{Product} + {Color}.jpg"` when a
/// real color is present, `"{Product}.jpg"` for the main image. Characters
/// other than alphanumerics, space, hyphen, period and plus are stripped.
pub fn descriptive_filename(product_name: &str, color: Option<&str>) -> String {
    let base = match color {
        Some(color) if !color.trim().is_empty() => {
            format!("{} + {}", title_case(product_name), title_case(color))
        }
        _ => title_case(product_name),
    };
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '.' | '+'))
        .collect();
    format!("{}.jpg", cleaned.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("royal blue"), "Royal Blue");
        assert_eq!(title_case("TRAIL JACKET"), "Trail Jacket");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn filename_with_color() {
        assert_eq!(
            descriptive_filename("trail jacket", Some("royal blue")),
            "Trail Jacket + Royal Blue.jpg"
        );
    }

    #[test]
    fn filename_without_color() {
        assert_eq!(descriptive_filename("trail jacket", None), "Trail Jacket.jpg");
        assert_eq!(descriptive_filename("trail jacket", Some("  ")), "Trail Jacket.jpg");
    }

    #[test]
    fn filename_strips_disallowed_characters() {
        assert_eq!(
            descriptive_filename("jacket (2024)!", Some("red/white")),
            "Jacket 2024 + Redwhite.jpg"
        );
    }

    #[test]
    fn main_image_caption_detection() {
        assert!(is_main_image_caption("Product Image"));
        assert!(is_main_image_caption("  product image "));
        assert!(!is_main_image_caption("Red"));
    }
}
