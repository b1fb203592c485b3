//! Regex capture helpers.

use regex::Regex;

/// Extract the placeholder captures when `text` matches `re`.
///
/// Group 0 (the whole match) is skipped so only placeholders contribute.
/// Groups that did not participate yield empty strings to keep the
/// arguments positional.
///
/// # Examples
/// ```
/// # use regex::Regex;
/// # use apibdd_patterns::extract_captured_values;
/// let regex = Regex::new(r#"^I send a GET request to "(.+?)" endpoint$"#)
///     .expect("example regex compiles");
/// let values = extract_captured_values(&regex, r#"I send a GET request to "comics" endpoint"#)
///     .expect("example text matches");
/// assert_eq!(values, vec!["comics".to_string()]);
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|capture| capture.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect(),
    )
}
