/// Decode the HTML entities trivia services embed in question text.
///
/// Covers numeric references (`&#039;`, `&#x27;`) and the full HTML5 named
/// entity table. Text without a recognised reference is returned as is.
#[must_use]
pub fn decode_html_entities(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}
