//! Facility filtering and normalization.
//!
//! Turns the raw registry export into canonical [`FacilityRecord`] rows:
//! keeps operational facilities only, drops rows with missing or
//! implausible coordinates, and renames the source columns.
//!
//! Column semantics carry one upstream quirk that must be preserved: the
//! IPRESS export stores **longitude in `NORTE` and latitude in `ESTE`**,
//! swapped relative to surveying convention. Downstream geometry
//! construction depends on the swap, so the mapping here is exactly
//! `NORTE -> longitude`, `ESTE -> latitude`. The bounding-box filter
//! doubles as a tripwire: if upstream ever un-swaps the columns, every
//! row lands outside Peru and the output goes empty instead of silently
//! transposing the country.

use salud_map_models::{FacilityRecord, PERU_BOUNDS};

use crate::IngestError;

/// Registry state a facility must have to be kept.
const STATUS_ACTIVE: &str = "ACTIVADO";

/// Functional condition a facility must have to be kept.
const CONDITION_OPERATING: &str = "EN FUNCIONAMIENTO";

/// Indexes of the required columns in the source header.
struct ColumnMap {
    code: usize,
    name: usize,
    ubigeo: usize,
    norte: usize,
    este: usize,
    department: usize,
    status: usize,
    condition: usize,
}

impl ColumnMap {
    /// Locates every required column by folded header comparison.
    ///
    /// Fails with the first missing column so the error names exactly
    /// what the file lacks.
    fn locate(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let folded: Vec<String> = headers.iter().map(fold_header).collect();

        let find = |wanted: &str| -> Result<usize, IngestError> {
            folded
                .iter()
                .position(|h| h == wanted)
                .ok_or_else(|| IngestError::Schema {
                    column: wanted.to_string(),
                })
        };

        Ok(Self {
            code: find("CODIGO UNICO")?,
            name: find("NOMBRE DEL ESTABLECIMIENTO")?,
            ubigeo: find("UBIGEO")?,
            norte: find("NORTE")?,
            este: find("ESTE")?,
            department: find("DEPARTAMENTO")?,
            status: find("ESTADO")?,
            condition: find("CONDICION")?,
        })
    }
}

/// Parses and cleans the decoded registry text.
///
/// Filters: state `ACTIVADO`, condition `EN FUNCIONAMIENTO`, both
/// coordinates present, finite, and inside Peru's bounding box, UBIGEO
/// coercible to an integer. Rows failing a filter are dropped and
/// counted; zero surviving rows is a valid empty result.
///
/// # Errors
///
/// Returns [`IngestError::Schema`] naming the first required column
/// missing from the header, or [`IngestError::Csv`] if the header row
/// itself cannot be read.
#[allow(clippy::too_many_lines)]
pub fn clean_facilities(text: &str) -> Result<Vec<FacilityRecord>, IngestError> {
    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = ColumnMap::locate(reader.headers()?)?;

    let mut facilities = Vec::new();
    let mut total = 0u64;
    let mut inactive = 0u64;
    let mut bad_coords = 0u64;
    let mut out_of_bounds = 0u64;
    let mut bad_ubigeo = 0u64;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::trace!("Skipping malformed row: {e}");
                continue;
            }
        };
        total += 1;

        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        if field(columns.status) != STATUS_ACTIVE
            || field(columns.condition) != CONDITION_OPERATING
        {
            inactive += 1;
            continue;
        }

        // NORTE holds the longitude, ESTE the latitude (upstream swap).
        let Some((longitude, latitude)) =
            parse_coordinates(field(columns.norte), field(columns.este))
        else {
            bad_coords += 1;
            continue;
        };

        if !PERU_BOUNDS.contains(longitude, latitude) {
            out_of_bounds += 1;
            continue;
        }

        let Ok(district_code) = field(columns.ubigeo).parse::<u32>() else {
            bad_ubigeo += 1;
            continue;
        };

        facilities.push(FacilityRecord {
            code: field(columns.code).to_string(),
            name: field(columns.name).to_string(),
            district_code,
            longitude,
            latitude,
            department: field(columns.department).to_string(),
            status: STATUS_ACTIVE.to_string(),
        });
    }

    log::info!(
        "Facility cleaning: {} kept of {total} rows ({inactive} not operational, \
         {bad_coords} missing/invalid coordinates, {out_of_bounds} outside Peru, \
         {bad_ubigeo} bad UBIGEO)",
        facilities.len()
    );

    Ok(facilities)
}

/// Parses both coordinate fields; `None` if either is absent or not a
/// finite number.
fn parse_coordinates(norte: &str, este: &str) -> Option<(f64, f64)> {
    if norte.is_empty() || este.is_empty() {
        return None;
    }
    let longitude = norte.parse::<f64>().ok()?;
    let latitude = este.parse::<f64>().ok()?;
    if !longitude.is_finite() || !latitude.is_finite() {
        return None;
    }
    Some((longitude, latitude))
}

/// Picks `;` or `,` by counting occurrences in the header line. The
/// registry has shipped with both over the years.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

/// Folds a header name for comparison: uppercase, accents stripped,
/// non-alphanumeric characters other than spaces removed.
fn fold_header(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    let mut last_was_space = true;
    for c in raw.trim().chars() {
        let mapped = match c {
            'á' | 'à' | 'â' | 'ä' | 'Á' | 'À' | 'Â' | 'Ä' => Some('A'),
            'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => Some('E'),
            'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => Some('I'),
            'ó' | 'ò' | 'ô' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Ö' => Some('O'),
            'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => Some('U'),
            'ñ' | 'Ñ' => Some('N'),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_uppercase()),
            ' ' | '\t' => Some(' '),
            _ => None,
        };
        match mapped {
            Some(' ') => {
                if !last_was_space {
                    folded.push(' ');
                    last_was_space = true;
                }
            }
            Some(ch) => {
                folded.push(ch);
                last_was_space = false;
            }
            None => {}
        }
    }
    folded.trim_end().to_string()
}
