// Start of file: src/utils/utils.rs

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer};

/*
    * Convert any `Serialize` type into a two-space-indented JSON string.
*/
pub fn to_two_space_indented_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut writer: Vec<u8> = Vec::new();

    let formatter: PrettyFormatter<'_> = PrettyFormatter::with_indent(b"  ");

    let mut ser: Serializer<&mut Vec<u8>, PrettyFormatter<'_>> =
        Serializer::with_formatter(&mut writer, formatter);

    value.serialize(&mut ser)?;

    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&writer).into_owned())
}

/*
    * Parses a comma separated list of ids such as `1,2,3`.
    * An empty or whitespace-only value yields an empty list.
*/
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a valid id.", part.trim()))
        })
        .collect()
}

/*
    * Interprets an integer flag such as `assigned_only=1`; non-zero means true.
*/
pub fn parse_int_flag(raw: Option<&str>) -> Result<bool, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => value
            .parse::<i64>()
            .map(|number: i64| number != 0)
            .map_err(|_| format!("'{}' is not a valid integer.", value)),
    }
}


// End of file: src/utils/utils.rs
