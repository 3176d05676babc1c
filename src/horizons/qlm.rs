//! QuasiLocalMeasures scalar output written by CarpetIOASCII.

use crate::horizons::{parse_numbers, RawSamples};
use crate::utils::error::{HorizonError, Result};
use std::collections::BTreeMap;
use std::path::Path;

const TIME_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;

/// Splits `qlm_<quantity>[<index>]` into `(quantity, index)`.
///
/// `qlm_time` only records when the measures were computed and is not
/// reported as a quantity.
pub fn qlm_variable(name: &str) -> Option<(String, usize)> {
    let rest = name.trim().strip_prefix("qlm_")?;
    let (quantity, index) = rest.strip_suffix(']')?.split_once('[')?;
    if quantity.is_empty() || quantity == "time" {
        return None;
    }
    let index = index.parse().ok()?;
    Some((quantity.to_string(), index))
}

// "# data columns: 3:qlm_time[0] 4:qlm_time[1]" -> [(2, "qlm_time[0]"), ...]
fn data_columns(comment: &str) -> Option<Vec<(usize, String)>> {
    let (_, spec) = comment.split_once("data columns:")?;
    let columns = spec
        .split_whitespace()
        .filter_map(|token| {
            let (number, name) = token.split_once(':')?;
            let number: usize = number.parse().ok()?;
            (number >= 1).then(|| (number - 1, name.to_string()))
        })
        .collect::<Vec<_>>();
    (!columns.is_empty()).then_some(columns)
}

// quasilocalmeasures-qlm_mass[0]..asc -> qlm_mass[0]
fn variable_from_file_name(path: &str) -> Option<String> {
    let name = Path::new(path).file_name()?.to_str()?;
    let (_, rest) = name.split_once('-')?;
    let stem = rest
        .strip_suffix("..asc")
        .or_else(|| rest.strip_suffix(".asc"))?;
    Some(stem.to_string())
}

/// Reads one scalar file into `variable name -> samples`.
///
/// Group files declare their columns in a `# data columns:` header.
/// Files without it hold a single variable named after the file.
pub fn parse_scalar_file(path: &str, content: &str) -> Result<BTreeMap<String, RawSamples>> {
    let mut columns: Option<Vec<(usize, String)>> = None;
    let mut out: BTreeMap<String, RawSamples> = BTreeMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            if let Some(found) = data_columns(trimmed) {
                columns = Some(found);
            }
            continue;
        }

        if columns.is_none() {
            let name = variable_from_file_name(path).ok_or_else(|| {
                HorizonError::parse(path, line_no, "no data columns header and no variable name in file name")
            })?;
            columns = Some(vec![(VALUE_COLUMN, name)]);
        }
        let layout = columns.as_deref().unwrap_or_default();

        let row = parse_numbers(path, line_no, trimmed)?;
        // Every row holds iteration and time followed by the declared data columns.
        let width = layout
            .iter()
            .map(|(col, _)| col + 1)
            .max()
            .unwrap_or(0)
            .max(TIME_COLUMN + 1);
        if row.len() != width {
            return Err(HorizonError::parse(
                path,
                line_no,
                format!("expected {} columns, found {}", width, row.len()),
            ));
        }

        let time = row[TIME_COLUMN];
        for (col, name) in layout {
            out.entry(name.clone()).or_default().push(time, row[*col]);
        }
    }
    Ok(out)
}
