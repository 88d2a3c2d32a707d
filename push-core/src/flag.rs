const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// Turn a 2-letter ISO country code into its flag emoji by mapping each
/// letter to the matching Unicode regional indicator. Anything that is not
/// exactly two ASCII letters yields an empty string.
pub fn iso_to_flag(code: &str) -> String {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return String::new();
    }
    code.chars()
        .filter_map(|c| {
            char::from_u32(REGIONAL_INDICATOR_A + (c.to_ascii_uppercase() as u32 - 'A' as u32))
        })
        .collect()
}
