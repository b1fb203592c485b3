//! JUnit XML writer for scenario outcome records.
//!
//! The writer produces a single `<testsuite>` document. Failed scenarios carry
//! a `<failure>` element with the step failure; skipped scenarios carry
//! `<skipped>` and, when skips are disallowed, an additional `<failure>`.

use std::fmt::{self, Write};

use super::ScenarioRecord;
use crate::result::ScenarioStatus;

const FAIL_ON_SKIPPED_MESSAGE: &str = "Scenario skipped with fail_on_skipped enabled";

/// Render `records` as a `JUnit` XML document.
///
/// # Examples
/// ```
/// use apibdd::ScenarioStatus;
/// use apibdd::reporting::{ScenarioRecord, junit};
///
/// let records = vec![ScenarioRecord::new("f.feature", "s", 1, Vec::new(), ScenarioStatus::Passed)];
/// let mut output = String::new();
/// junit::write(&mut output, &records).expect("writing to a String succeeds");
/// assert!(output.contains("tests=\"1\" failures=\"0\" skipped=\"0\""));
/// ```
///
/// # Errors
/// Returns an error if writing to `writer` fails.
pub fn write<W: Write>(writer: &mut W, records: &[ScenarioRecord]) -> fmt::Result {
    let tests = records.len();
    let skipped = records
        .iter()
        .filter(|record| matches!(record.status(), ScenarioStatus::Skipped(_)))
        .count();
    let failures = records
        .iter()
        .filter(|record| match record.status() {
            ScenarioStatus::Failed(_) => true,
            ScenarioStatus::Skipped(details) => details.forced_failure(),
            ScenarioStatus::Passed => false,
        })
        .count();
    writer.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
    writeln!(
        writer,
        "<testsuite name=\"apibdd\" tests=\"{tests}\" failures=\"{failures}\" skipped=\"{skipped}\">",
    )?;
    for record in records {
        writer.write_str("  <testcase name=\"")?;
        write_escaped(writer, record.scenario_name())?;
        writer.write_str("\" classname=\"")?;
        write_escaped(writer, record.feature_path())?;
        write!(writer, "\" time=\"{:.3}\"", record.duration().as_secs_f64())?;
        match record.status() {
            ScenarioStatus::Passed => {
                writer.write_str(" />\n")?;
            }
            ScenarioStatus::Failed(failure) => {
                writer.write_str(">\n    <failure message=\"")?;
                write_escaped(writer, &failure.message)?;
                writer.write_str("\" type=\"step\">")?;
                write_escaped(writer, &failure.to_string())?;
                writer.write_str("</failure>\n  </testcase>\n")?;
            }
            ScenarioStatus::Skipped(details) => {
                writer.write_str(">\n    <skipped message=\"")?;
                write_escaped(writer, &details.message())?;
                writer.write_str("\" />\n")?;
                if details.forced_failure() {
                    writer.write_str("    <failure type=\"fail_on_skipped\">")?;
                    writer.write_str(FAIL_ON_SKIPPED_MESSAGE)?;
                    writer.write_str("</failure>\n")?;
                }
                writer.write_str("  </testcase>\n")?;
            }
        }
    }
    writer.write_str("</testsuite>\n")
}

fn write_escaped<W: Write>(writer: &mut W, value: &str) -> fmt::Result {
    const INVALID_REPLACEMENT: &str = "&#xFFFD;";
    for character in value.chars() {
        if !is_valid_xml_character(character) {
            writer.write_str(INVALID_REPLACEMENT)?;
            continue;
        }
        match character {
            '&' => writer.write_str("&amp;")?,
            '<' => writer.write_str("&lt;")?,
            '>' => writer.write_str("&gt;")?,
            '"' => writer.write_str("&quot;")?,
            '\'' => writer.write_str("&apos;")?,
            other => writer.write_char(other)?,
        }
    }
    Ok(())
}

fn is_valid_xml_character(character: char) -> bool {
    matches!(
        u32::from(character),
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x1_0000..=0x10_FFFF
    )
}
