//! Placeholder type hints and the regex fragment each one matches.

/// Shape of the text a placeholder accepts.
///
/// Hints only narrow what the step line may contain; conversion to a Rust
/// value happens in the step handler.
///
/// # Examples
/// ```
/// use apibdd_patterns::TypeHint;
///
/// assert_eq!(TypeHint::from_hint(Some("u16")), TypeHint::Unsigned);
/// assert_eq!(TypeHint::from_hint(Some("String")), TypeHint::Text);
/// assert_eq!(TypeHint::Unsigned.regex(), r"\d+");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    /// Unsigned integers such as status codes.
    Unsigned,
    /// Signed integers.
    Signed,
    /// Floating point numbers, including `nan` and `inf`.
    Float,
    /// Any text, matched lazily; non-empty unless quoted.
    Text,
}

impl TypeHint {
    /// Classify the raw hint written after the colon in `{name:hint}`.
    #[must_use]
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("u8" | "u16" | "u32" | "u64" | "u128" | "usize") => Self::Unsigned,
            Some("i8" | "i16" | "i32" | "i64" | "i128" | "isize") => Self::Signed,
            Some("f32" | "f64") => Self::Float,
            _ => Self::Text,
        }
    }

    /// Regular-expression fragment placed inside the capture group.
    #[must_use]
    pub const fn regex(self) -> &'static str {
        match self {
            Self::Unsigned => r"\d+",
            Self::Signed => r"[+-]?\d+",
            Self::Float => {
                r"(?i:(?:[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?|nan|inf|infinity))"
            }
            Self::Text => r".+?",
        }
    }

    /// Fragment for a placeholder written between double quotes.
    ///
    /// Quoted text may be empty (`""`); other hints are unchanged.
    #[must_use]
    pub const fn quoted_regex(self) -> &'static str {
        match self {
            Self::Text => r".*?",
            other => other.regex(),
        }
    }
}
