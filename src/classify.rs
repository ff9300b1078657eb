//! Field classification and line scanning.
//!
//! [`classify_field()`] maps one trimmed field span to the narrowest
//! [`ColumnType`] able to represent it. [`split_line()`] cuts a raw line into
//! spans honoring separator, quote, and whitespace charsets, and
//! [`classify_line()`] classifies each span in turn. All three are total:
//! any input string yields a result.

use crate::flags::DetectFlags;
use crate::schema::ColumnType;

/// Charsets controlling how a line is cut into fields.
///
/// `separators` and `whitespace` are character sets (any member matches);
/// `quote_lead` and `quote_trail` are exact sequences. An empty `quote_lead`
/// disables quote handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub separators: String,
    pub quote_lead: String,
    pub quote_trail: String,
    pub whitespace: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            separators: ",".to_string(),
            quote_lead: "\"".to_string(),
            quote_trail: "\"".to_string(),
            whitespace: " \t".to_string(),
        }
    }
}

/// Classifies one field span as the narrowest type that represents it.
///
/// The span must already be trimmed and unquoted. Tests run in order:
/// empty, boolean token (gated by `flags`), hex literal, signed decimal
/// integer, float, and finally [`ColumnType::String`] as the catch-all.
/// Every parse is full-span: trailing characters mean failure.
pub fn classify_field(span: &str, flags: DetectFlags) -> ColumnType {
    if span.is_empty() {
        return ColumnType::Unknown;
    }
    if is_boolean_token(span, flags) {
        return ColumnType::Boolean;
    }
    if let Some(rest) = span.strip_prefix("0x").or_else(|| span.strip_prefix("0X")) {
        // The prefix commits the span to hex. from_str_radix tolerates a
        // leading '+', which is not valid inside a hex literal here.
        if rest.is_empty() || rest.starts_with(['+', '-']) {
            return ColumnType::String;
        }
        return match u64::from_str_radix(rest, 16) {
            Ok(value) => smallest_unsigned(value),
            Err(_) => ColumnType::String,
        };
    }
    if let Ok(value) = span.parse::<i64>() {
        return smallest_signed(value);
    }
    if span.parse::<f64>().is_ok() {
        return ColumnType::Float64;
    }
    ColumnType::String
}

/// Splits a raw line into field spans without classifying them.
///
/// Quoted content is taken verbatim; unquoted spans are trimmed of
/// whitespace-charset characters on both sides. A consumed separator always
/// opens another field, so `"a,"` yields two spans, the second empty. An
/// unterminated quote swallows the rest of the line. The empty line yields
/// a single empty span.
pub fn split_line<'a>(line: &'a str, opts: &ScanOptions) -> Vec<&'a str> {
    let mut fields = Vec::new();
    let mut rest = line;
    loop {
        rest = rest.trim_start_matches(|ch| opts.whitespace.contains(ch));
        let after_field;
        if !opts.quote_lead.is_empty() && rest.starts_with(opts.quote_lead.as_str()) {
            let body = &rest[opts.quote_lead.len()..];
            match body.find(opts.quote_trail.as_str()) {
                Some(at) if !opts.quote_trail.is_empty() => {
                    fields.push(&body[..at]);
                    after_field = &body[at + opts.quote_trail.len()..];
                }
                _ => {
                    fields.push(body);
                    after_field = "";
                }
            }
        } else {
            let end = rest
                .find(|ch| opts.separators.contains(ch))
                .unwrap_or(rest.len());
            fields.push(rest[..end].trim_end_matches(|ch| opts.whitespace.contains(ch)));
            after_field = &rest[end..];
        }
        // Characters between a closing quote and the separator are dropped.
        match next_separator(after_field, &opts.separators) {
            Some(after_sep) => rest = after_sep,
            None => break,
        }
    }
    fields
}

/// Splits and classifies a line in one pass.
pub fn classify_line(line: &str, opts: &ScanOptions, flags: DetectFlags) -> Vec<ColumnType> {
    split_line(line, opts)
        .into_iter()
        .map(|span| classify_field(span, flags))
        .collect()
}

fn is_boolean_token(span: &str, flags: DetectFlags) -> bool {
    if flags.contains(DetectFlags::TRUE_FALSE_BOOLEANS)
        && (span.eq_ignore_ascii_case("true") || span.eq_ignore_ascii_case("false"))
    {
        return true;
    }
    if flags.contains(DetectFlags::YES_NO_BOOLEANS)
        && (span.eq_ignore_ascii_case("yes") || span.eq_ignore_ascii_case("no"))
    {
        return true;
    }
    flags.contains(DetectFlags::INTEGER_BOOLEANS) && (span == "0" || span == "1")
}

fn smallest_signed(value: i64) -> ColumnType {
    if i8::try_from(value).is_ok() {
        ColumnType::Int8
    } else if i16::try_from(value).is_ok() {
        ColumnType::Int16
    } else if i32::try_from(value).is_ok() {
        ColumnType::Int32
    } else {
        ColumnType::Int64
    }
}

fn smallest_unsigned(value: u64) -> ColumnType {
    if u8::try_from(value).is_ok() {
        ColumnType::UInt8
    } else if u16::try_from(value).is_ok() {
        ColumnType::UInt16
    } else if u32::try_from(value).is_ok() {
        ColumnType::UInt32
    } else {
        ColumnType::UInt64
    }
}

fn next_separator<'a>(s: &'a str, separators: &str) -> Option<&'a str> {
    let (at, ch) = s.char_indices().find(|(_, ch)| separators.contains(*ch))?;
    Some(&s[at + ch.len_utf8()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    // The boolean families the detection battery runs with; integer-as-bool
    // stays off so "0"/"1" classify as integers.
    fn battery_flags() -> DetectFlags {
        DetectFlags::TRUE_FALSE_BOOLEANS | DetectFlags::YES_NO_BOOLEANS
    }

    #[test]
    fn empty_span_is_unknown() {
        assert_eq!(
            classify_field("", battery_flags()),
            ColumnType::Unknown
        );
    }

    #[test]
    fn hex_literals_take_narrowest_unsigned() {
        let flags = battery_flags();
        assert_eq!(classify_field("0x0A", flags), ColumnType::UInt8);
        assert_eq!(classify_field("0X0a", flags), ColumnType::UInt8);
        assert_eq!(classify_field("0xFF", flags), ColumnType::UInt8);
        assert_eq!(classify_field("0x100", flags), ColumnType::UInt16);
        assert_eq!(classify_field("0xFFFF", flags), ColumnType::UInt16);
        assert_eq!(classify_field("0x10000", flags), ColumnType::UInt32);
        assert_eq!(classify_field("0xFFFFFFFF", flags), ColumnType::UInt32);
        assert_eq!(classify_field("0x100000000", flags), ColumnType::UInt64);
        assert_eq!(
            classify_field("0xFFFFFFFFFFFFFFFF", flags),
            ColumnType::UInt64
        );
    }

    #[test]
    fn hex_prefix_commits_to_hex() {
        let flags = battery_flags();
        assert_eq!(classify_field("0x", flags), ColumnType::String);
        assert_eq!(classify_field("0X", flags), ColumnType::String);
        assert_eq!(classify_field("0x+1", flags), ColumnType::String);
        assert_eq!(classify_field("0x-1", flags), ColumnType::String);
        assert_eq!(classify_field("0xZZ", flags), ColumnType::String);
        assert_eq!(classify_field("0x12.5", flags), ColumnType::String);
        // overflow past u64 is not a number either
        assert_eq!(
            classify_field("0x10000000000000000", flags),
            ColumnType::String
        );
    }

    #[test]
    fn decimal_integers_take_narrowest_signed() {
        let flags = battery_flags();
        assert_eq!(classify_field("0", flags), ColumnType::Int8);
        assert_eq!(classify_field("127", flags), ColumnType::Int8);
        assert_eq!(classify_field("-128", flags), ColumnType::Int8);
        assert_eq!(classify_field("128", flags), ColumnType::Int16);
        assert_eq!(classify_field("-1000", flags), ColumnType::Int16);
        assert_eq!(classify_field("+1000", flags), ColumnType::Int16);
        assert_eq!(classify_field("32768", flags), ColumnType::Int32);
        assert_eq!(classify_field("-2147483649", flags), ColumnType::Int64);
        assert_eq!(
            classify_field("9223372036854775807", flags),
            ColumnType::Int64
        );
    }

    #[test]
    fn integer_overflow_falls_through_to_float() {
        assert_eq!(
            classify_field("9223372036854775808", battery_flags()),
            ColumnType::Float64
        );
    }

    #[test]
    fn isolated_or_doubled_signs_are_text() {
        let flags = battery_flags();
        assert_eq!(classify_field("+", flags), ColumnType::String);
        assert_eq!(classify_field("-", flags), ColumnType::String);
        assert_eq!(classify_field("+-5", flags), ColumnType::String);
        assert_eq!(classify_field("++5", flags), ColumnType::String);
    }

    #[test]
    fn float_spellings() {
        let flags = battery_flags();
        assert_eq!(classify_field("3.123", flags), ColumnType::Float64);
        assert_eq!(classify_field("3e123", flags), ColumnType::Float64);
        assert_eq!(classify_field("-2.5e-3", flags), ColumnType::Float64);
        assert_eq!(classify_field(".5", flags), ColumnType::Float64);
    }

    #[test]
    fn boolean_tokens_follow_flags() {
        assert_eq!(
            classify_field("TRUE", DetectFlags::TRUE_FALSE_BOOLEANS),
            ColumnType::Boolean
        );
        assert_eq!(
            classify_field("fAlSe", DetectFlags::TRUE_FALSE_BOOLEANS),
            ColumnType::Boolean
        );
        assert_eq!(
            classify_field("yes", DetectFlags::TRUE_FALSE_BOOLEANS),
            ColumnType::String
        );
        assert_eq!(
            classify_field("No", DetectFlags::YES_NO_BOOLEANS),
            ColumnType::Boolean
        );
        assert_eq!(
            classify_field("true", DetectFlags::empty()),
            ColumnType::String
        );
        // integer-as-bool is opt-in; when set it claims "0"/"1" ahead of
        // the integer tests
        assert_eq!(
            classify_field("1", DetectFlags::INTEGER_BOOLEANS),
            ColumnType::Boolean
        );
        assert_eq!(
            classify_field("0", DetectFlags::INTEGER_BOOLEANS),
            ColumnType::Boolean
        );
        assert_eq!(
            classify_field("1", DetectFlags::default()),
            ColumnType::Int8
        );
        assert_eq!(
            classify_field("2", DetectFlags::INTEGER_BOOLEANS),
            ColumnType::Int8
        );
    }

    #[test]
    fn mixed_line_classifies_per_field() {
        // Default flags: "1" is an integer, not an opt-in integer boolean.
        let types = classify_line(
            "1, 2.3, \"abc\", 0x00",
            &ScanOptions::default(),
            DetectFlags::default(),
        );
        assert_eq!(
            types,
            vec![
                ColumnType::Int8,
                ColumnType::Float64,
                ColumnType::String,
                ColumnType::UInt8
            ]
        );
    }

    #[test]
    fn empty_line_yields_single_unknown() {
        assert_eq!(
            classify_line("", &ScanOptions::default(), battery_flags()),
            vec![ColumnType::Unknown]
        );
    }

    #[test]
    fn trailing_separator_opens_blank_field() {
        let opts = ScanOptions::default();
        assert_eq!(
            classify_line("a,", &opts, battery_flags()),
            vec![ColumnType::String, ColumnType::Unknown]
        );
        assert_eq!(
            classify_line("a, ", &opts, battery_flags()),
            vec![ColumnType::String, ColumnType::Unknown]
        );
        assert_eq!(
            classify_line("a,,b", &opts, battery_flags()),
            vec![ColumnType::String, ColumnType::Unknown, ColumnType::String]
        );
    }

    #[test]
    fn unterminated_quote_swallows_rest_of_line() {
        let opts = ScanOptions::default();
        assert_eq!(split_line("\"abc", &opts), vec!["abc"]);
        assert_eq!(split_line("x,\"a,b", &opts), vec!["x", "a,b"]);
    }

    #[test]
    fn quoted_content_is_verbatim() {
        let opts = ScanOptions::default();
        assert_eq!(split_line("\" padded \",2", &opts), vec![" padded ", "2"]);
        // quoting delimits but does not force text
        assert_eq!(
            classify_line("\"123\"", &opts, battery_flags()),
            vec![ColumnType::Int8]
        );
    }

    #[test]
    fn multi_character_quotes_match_exactly() {
        let opts = ScanOptions {
            quote_lead: "<<".to_string(),
            quote_trail: ">>".to_string(),
            ..ScanOptions::default()
        };
        assert_eq!(split_line("<<a,b>>,c", &opts), vec!["a,b", "c"]);
        assert_eq!(split_line("<<open,never", &opts), vec!["open,never"]);
    }

    #[test]
    fn empty_quote_lead_disables_quoting() {
        let opts = ScanOptions {
            quote_lead: String::new(),
            quote_trail: String::new(),
            ..ScanOptions::default()
        };
        assert_eq!(split_line("\"a\",b", &opts), vec!["\"a\"", "b"]);
    }

    #[test]
    fn alternate_charsets() {
        let opts = ScanOptions {
            separators: ";|".to_string(),
            ..ScanOptions::default()
        };
        assert_eq!(split_line("a;b|c", &opts), vec!["a", "b", "c"]);

        let wide_ws = ScanOptions {
            whitespace: " \t_".to_string(),
            ..ScanOptions::default()
        };
        assert_eq!(split_line("_42_,x", &wide_ws), vec!["42", "x"]);
    }

    #[test]
    fn junk_after_closing_quote_is_dropped() {
        let opts = ScanOptions::default();
        assert_eq!(split_line("\"a\"junk,b", &opts), vec!["a", "b"]);
    }
}
