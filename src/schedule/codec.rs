//! CSV text <-> rows of string fields.
//!
//! Decoding is lenient: it accepts `\n`, `\r\n` and bare `\r` record
//! separators, quoted fields with embedded separators/newlines and `""`
//! escapes, and never reports an error. Encoding always terminates every
//! record (including the last one) with `\r\n`.

use csv::{ReaderBuilder, Terminator, WriterBuilder};

/// Split `text` into records of fields. Empty input yields no records.
pub fn decode(text: &str) -> Vec<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_reader(text.as_bytes());

    rdr.records()
        .filter_map(Result::ok)
        .map(|rec| rec.iter().map(str::to_string).collect())
        .collect()
}

/// Serialize records back to text, quoting only where needed.
pub fn encode<R, F>(rows: R) -> csv::Result<String>
where
    R: IntoIterator<Item = F>,
    F: AsRef<[String]>,
{
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    for row in rows {
        wtr.write_record(row.as_ref())?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    // Every field came from a &str, so the buffer is valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
