use std::sync::OnceLock;

use regex::Regex;

/// Runs of at least six ASCII digits.
fn digit_run() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[0-9]{6,}").expect("invalid regex"))
}

/// Pull the transaction reference out of a free-text description.
///
/// This is the last run of six or more digits in the text, or an empty
/// string when there is none. Nothing checks that the digits really are a
/// reference; it is only a label.
pub fn extract_operation_code(description: &str) -> String {
    digit_run()
        .find_iter(description)
        .last()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("Pago factura 000123456789", "000123456789")]
    #[case("Sin codigo", "")]
    #[case("Ref 12345", "")]
    #[case("TRANSF 123456 A CTA 98765432 OK", "98765432")]
    #[case("PAGO PSE 4455667 REF 12", "4455667")]
    #[case("", "")]
    #[case("9876543210", "9876543210")]
    fn test_extract_operation_code(#[case] given: &str, #[case] expected: &str) {
        assert_eq!(extract_operation_code(given), expected);
    }
}
