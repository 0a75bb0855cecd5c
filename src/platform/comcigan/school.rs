//! School search: keyword in, upstream school identifiers out.

use serde::{Deserialize, Serialize};

use crate::stdx::{encoding, http::truncate_after_last_brace};

use super::{discovery::ProtocolConstants, errors::SearchError, markers};

/// A school as listed by the upstream search.
///
/// The [`code()`](SchoolRecord::code()) is what [`Session::set_school()`](super::Session::set_school())
/// expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    raw_tag: String,
    region: String,
    name: String,
    code: u32,
}

impl SchoolRecord {
    /// First column of the search row. Its meaning is unknown, it is kept as text.
    #[must_use]
    pub fn raw_tag(&self) -> &str {
        &self.raw_tag
    }

    /// Region of the school, e.g. `경기`.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Full name of the school, e.g. `기흥고등학교`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upstream school code.
    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }
}

#[derive(Deserialize)]
struct Row(
    #[serde(deserialize_with = "crate::stdx::serde::string_from_scalar")] String,
    #[serde(deserialize_with = "crate::stdx::serde::string_from_scalar")] String,
    #[serde(deserialize_with = "crate::stdx::serde::string_from_scalar")] String,
    #[serde(deserialize_with = "crate::stdx::serde::u32_from_string")] u32,
);

impl From<Row> for SchoolRecord {
    fn from(Row(raw_tag, region, name, code): Row) -> Self {
        Self {
            raw_tag,
            region,
            name,
            code,
        }
    }
}

/// Address of the search for `keyword`: the keyword's EUC-KR bytes as `%xx`, appended to the school_ra fragment.
pub(super) fn search_url(constants: &ProtocolConstants, keyword: &str) -> String {
    format!(
        "{}{}{}",
        constants.base_path(),
        constants.school_ra_fragment(),
        encoding::percent_hex_legacy(keyword)
    )
}

pub(super) fn parse_search(body: &str) -> Result<Vec<SchoolRecord>, SearchError> {
    let json = truncate_after_last_brace(body)
        .ok_or_else(|| SearchError::Malformed("response has no JSON object".into()))?;

    let mut value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| SearchError::Malformed(err.to_string()))?;

    let rows = value
        .get_mut(markers::SEARCH_FIELD)
        .map(serde_json::Value::take)
        .ok_or_else(|| {
            SearchError::Malformed(format!("response has no `{}` field", markers::SEARCH_FIELD))
        })?;

    let rows: Vec<Row> =
        serde_json::from_value(rows).map_err(|err| SearchError::Malformed(err.to_string()))?;

    if rows.is_empty() {
        return Err(SearchError::NoSchoolsFound);
    }

    Ok(rows.into_iter().map(SchoolRecord::from).collect())
}
