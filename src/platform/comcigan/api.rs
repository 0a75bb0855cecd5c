//! Mapping between an HTTP timetable endpoint and a [`Session`](super::Session).
//!
//! This is the contract of a `GET /api/timetable?grade=1&class=4` handler, without
//! tying it to a web framework: query parsing and validation, picking the school,
//! and turning results and failures into a status code with a JSON body.
//!
//! ```no_run
//! # use comcigan::platform::comcigan::{Client, api::{self, Query}};
//! # #[tokio::main]
//! # async fn main() {
//! let client = Client::new();
//!
//! let response = match Query::from_pairs([("grade", "1"), ("class", "4")]) {
//!     Ok(query) => api::serve(&client, &query).await,
//!     Err(rejected) => rejected,
//! };
//!
//! println!("{} {}", response.status(), response.body());
//! # }
//! ```

use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

use super::{
    Client, Options,
    errors::Error,
    school::SchoolRecord,
    timetable::{ClassTimeInfo, Timetable, Week},
};

/// Highest grade a query may ask for.
pub const MAX_GRADE: u8 = 3;

/// Keyword the default school is searched by.
pub const DEFAULT_KEYWORD: &str = "기흥";
/// Name of the default school.
pub const DEFAULT_SCHOOL: &str = "기흥고등학교";
/// Region of the default school.
pub const DEFAULT_REGION: &str = "경기";

/// How long a served session reuses its timetable.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

const INVALID_GRADE: &str =
    "유효하지 않은 학년(grade) 파라미터입니다. 1에서 3 사이의 숫자를 입력하세요.";
const INVALID_CLASS: &str = "유효하지 않은 반(class) 파라미터입니다. 1 이상의 숫자를 입력하세요.";
const SCHOOL_NOT_FOUND: &str = "학교를 찾을 수 없습니다.";
const INTERNAL_FAILURE: &str = "시간표 데이터를 가져오는 데 실패했습니다.";

/// A status code and a JSON body, ready to be written by any HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// JSON body. Failures have a single `error` field with a message.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the response, returning its body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Any failure of the core flow is a `500` with a generic message. Details only go to the log.
impl From<&Error> for ApiResponse {
    fn from(_: &Error) -> Self {
        Self::error(500, INTERNAL_FAILURE)
    }
}

/// Validated `grade` and `class` query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Query {
    grade: Option<u8>,
    class: Option<u64>,
}

impl Query {
    /// Parses the `grade` and `class` parameters out of decoded query pairs.
    ///
    /// Only the first occurrence of each counts and empty values count as absent. Values are
    /// read as a leading integer, so `2반` is `2`. `grade` must be within `1..=3` and `class`
    /// at least `1`. A class with no such class in the timetable still passes and is left to
    /// [`respond()`] to turn into a `404`.
    ///
    /// # Errors
    ///
    /// Returns the `400` response to send back when a parameter is invalid.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ApiResponse>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut grade = None;
        let mut class = None;

        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "grade" => &mut grade,
                "class" => &mut class,
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(value.as_ref().to_owned());
            }
        }

        let grade = match grade.as_deref().filter(|grade| !grade.is_empty()) {
            None => None,
            Some(grade) => Some(
                leading_integer(grade)
                    .and_then(|grade| u8::try_from(grade).ok())
                    .filter(|grade| (1..=MAX_GRADE).contains(grade))
                    .ok_or_else(|| ApiResponse::error(400, INVALID_GRADE))?,
            ),
        };

        let class = match class.as_deref().filter(|class| !class.is_empty()) {
            None => None,
            Some(class) => Some(
                leading_integer(class)
                    .and_then(|class| u64::try_from(class).ok())
                    .filter(|class| *class >= 1)
                    .ok_or_else(|| ApiResponse::error(400, INVALID_CLASS))?,
            ),
        };

        Ok(Self { grade, class })
    }

    /// Requested grade, if any.
    #[must_use]
    pub fn grade(&self) -> Option<u8> {
        self.grade
    }

    /// Requested class, if any.
    #[must_use]
    pub fn class(&self) -> Option<u64> {
        self.class
    }
}

/// Parses an optionally signed integer at the start of `text`, ignoring leading whitespace
/// and anything after the digits.
///
/// Values out of the `i64` range saturate.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();

    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let negative = text.starts_with('-');

    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    if digits == 0 {
        return None;
    }

    let magnitude = unsigned.get(..digits)?.parse::<i64>().unwrap_or(i64::MAX);

    Some(if negative { -magnitude } else { magnitude })
}

/// Picks a school out of search results: the first one in `region` whose name contains `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolFinder {
    name: String,
    region: String,
}

impl Default for SchoolFinder {
    fn default() -> Self {
        Self::new(DEFAULT_SCHOOL, DEFAULT_REGION)
    }
}

impl SchoolFinder {
    /// Creates a finder for schools named like `name` in `region`.
    #[must_use]
    pub fn new(name: &str, region: &str) -> Self {
        Self {
            name: name.to_owned(),
            region: region.to_owned(),
        }
    }

    /// The first matching school, in search order.
    #[must_use]
    pub fn find<'a>(&self, schools: &'a [SchoolRecord]) -> Option<&'a SchoolRecord> {
        schools
            .iter()
            .find(|school| school.region() == self.region && school.name().contains(&self.name))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Body<'a> {
    class_time: &'a ClassTimeInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    timetable: Option<&'a Week>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_timetable: Option<&'a Timetable>,
}

/// Builds the response for `query` out of fetched class times and timetable.
///
/// With both a grade and a class, only that class's week is returned under `timetable`, or a
/// `404` when it doesn't exist. Otherwise everything is returned under `fullTimetable`.
#[must_use]
pub fn respond(query: &Query, class_time: &ClassTimeInfo, timetable: &Timetable) -> ApiResponse {
    let body = match (query.grade, query.class) {
        (Some(grade), Some(class)) => {
            let week = u8::try_from(class)
                .ok()
                .and_then(|class| timetable.get(&grade)?.get(&class));

            let Some(week) = week else {
                return ApiResponse::error(
                    404,
                    &format!("학년 {grade}반 {class}의 시간표를 찾을 수 없습니다."),
                );
            };

            Body {
                class_time,
                timetable: Some(week),
                full_timetable: None,
            }
        }
        _ => Body {
            class_time,
            timetable: None,
            full_timetable: Some(timetable),
        },
    };

    match serde_json::to_value(body) {
        Ok(body) => ApiResponse::ok(body),
        Err(err) => {
            tracing::error!(%err, "failed to serialize timetable response");
            ApiResponse::error(500, INTERNAL_FAILURE)
        }
    }
}

/// Serves `query` for the default school, `기흥고등학교` in `경기`.
pub async fn serve(client: &Client, query: &Query) -> ApiResponse {
    serve_school(client, DEFAULT_KEYWORD, &SchoolFinder::default(), query).await
}

/// Serves `query` for the school `finder` picks out of the search for `keyword`.
///
/// Every call makes a new [`Session`](super::Session). Class times and the timetable are
/// fetched concurrently.
pub async fn serve_school(
    client: &Client,
    keyword: &str,
    finder: &SchoolFinder,
    query: &Query,
) -> ApiResponse {
    match load(client, keyword, finder, query).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(%err, "failed to load timetable");
            ApiResponse::from(&err)
        }
    }
}

async fn load(
    client: &Client,
    keyword: &str,
    finder: &SchoolFinder,
    query: &Query,
) -> Result<ApiResponse, Error> {
    let mut session = client
        .init(Options::default().with_cache_ttl(CACHE_TTL))
        .await?;

    let schools = session.search(keyword).await?;

    let Some(school) = finder.find(&schools) else {
        tracing::error!(keyword, school = %finder.name, region = %finder.region, "school not found");
        return Ok(ApiResponse::error(404, SCHOOL_NOT_FOUND));
    };

    session.set_school(school.code());

    let (class_time, timetable) =
        futures::try_join!(session.class_time_info(), session.timetable())?;

    Ok(respond(query, &class_time, &timetable))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform::comcigan::{PeriodEntry, errors::TimetableError};
    use std::collections::BTreeMap;

    fn school(region: &str, name: &str, code: u32) -> SchoolRecord {
        serde_json::from_value(json!({
            "rawTag": "1",
            "region": region,
            "name": name,
            "code": code,
        }))
        .unwrap()
    }

    fn timetable() -> Timetable {
        let entry = PeriodEntry {
            grade: 1,
            class_number: 4,
            weekday: 0,
            weekday_label: "월".into(),
            period: 1,
            subject: "국어".into(),
            teacher: "김*".into(),
        };

        BTreeMap::from([(1, BTreeMap::from([(4, vec![vec![Some(entry)]])]))])
    }

    #[test]
    fn should_parse_absent_parameters() {
        let query = Query::from_pairs(Vec::<(&str, &str)>::new()).unwrap();
        pretty_assertions::assert_eq!(Query::default(), query);

        let query = Query::from_pairs([("grade", ""), ("class", "")]).unwrap();
        pretty_assertions::assert_eq!(Query::default(), query);
    }

    #[test]
    fn should_parse_leading_integers() {
        let query = Query::from_pairs([("grade", " 2학년"), ("class", "10반"), ("grade", "9")])
            .unwrap();

        pretty_assertions::assert_eq!(Some(2), query.grade());
        pretty_assertions::assert_eq!(Some(10), query.class());
    }

    #[test]
    fn should_reject_invalid_grade() {
        for grade in ["0", "4", "abc", "-1", "+"] {
            let response = Query::from_pairs([("grade", grade)]).unwrap_err();

            pretty_assertions::assert_eq!(400, response.status(), "grade `{grade}`");
            pretty_assertions::assert_eq!(json!({ "error": INVALID_GRADE }), *response.body());
        }
    }

    #[test]
    fn should_reject_invalid_class() {
        for class in ["0", "-3", "x1"] {
            let response = Query::from_pairs([("class", class)]).unwrap_err();

            pretty_assertions::assert_eq!(400, response.status(), "class `{class}`");
            pretty_assertions::assert_eq!(json!({ "error": INVALID_CLASS }), *response.body());
        }
    }

    #[test]
    fn oversized_class_should_pass_validation() {
        let query = Query::from_pairs([("grade", "1"), ("class", "5000000000")]).unwrap();
        pretty_assertions::assert_eq!(Some(5_000_000_000), query.class());

        let query = Query::from_pairs([("class", "99999999999999999999반")]).unwrap();
        pretty_assertions::assert_eq!(Some(i64::MAX.unsigned_abs()), query.class());

        let response = Query::from_pairs([("class", "-99999999999999999999")]).unwrap_err();
        pretty_assertions::assert_eq!(400, response.status());

        let response = Query::from_pairs([("grade", "99999999999999999999")]).unwrap_err();
        pretty_assertions::assert_eq!(400, response.status());
    }

    #[test]
    fn oversized_class_should_not_be_found() {
        let query = Query::from_pairs([("grade", "1"), ("class", "5000000000")]).unwrap();

        let response = respond(&query, &json!([]), &timetable());

        pretty_assertions::assert_eq!(404, response.status());
        pretty_assertions::assert_eq!(
            json!({ "error": "학년 1반 5000000000의 시간표를 찾을 수 없습니다." }),
            response.into_body()
        );
    }

    #[test]
    fn finder_should_match_region_and_partial_name() {
        let schools = [
            school("서울", "기흥고등학교", 1),
            school("경기", "기흥중학교", 2),
            school("경기", "용인기흥고등학교", 3),
            school("경기", "기흥고등학교", 4),
        ];

        let found = SchoolFinder::default().find(&schools).unwrap();
        pretty_assertions::assert_eq!(3, found.code());

        assert!(
            SchoolFinder::new("기흥고등학교", "부산").find(&schools).is_none(),
            "no school in that region"
        );
    }

    #[test]
    fn should_respond_with_single_class() {
        let query = Query::from_pairs([("grade", "1"), ("class", "4")]).unwrap();
        let class_time = json!(["1(09:00)"]);

        let response = respond(&query, &class_time, &timetable());

        pretty_assertions::assert_eq!(200, response.status());
        pretty_assertions::assert_eq!(class_time, response.body()["classTime"]);
        pretty_assertions::assert_eq!(json!("국어"), response.body()["timetable"][0][0]["subject"]);
        assert!(
            response.body().get("fullTimetable").is_none(),
            "single class responses have no full timetable"
        );
    }

    #[test]
    fn should_respond_with_full_timetable() {
        let query = Query::from_pairs([("grade", "1")]).unwrap();

        let response = respond(&query, &json!([]), &timetable());

        pretty_assertions::assert_eq!(200, response.status());
        pretty_assertions::assert_eq!(
            json!("김*"),
            response.body()["fullTimetable"]["1"]["4"][0][0]["teacher"]
        );
        assert!(
            response.body().get("timetable").is_none(),
            "full responses have no single timetable"
        );
    }

    #[test]
    fn should_respond_not_found_for_missing_class() {
        let query = Query::from_pairs([("grade", "2"), ("class", "4")]).unwrap();

        let response = respond(&query, &json!([]), &timetable());

        pretty_assertions::assert_eq!(404, response.status());
        pretty_assertions::assert_eq!(
            json!({ "error": "학년 2반 4의 시간표를 찾을 수 없습니다." }),
            response.into_body()
        );
    }

    #[test]
    fn errors_should_map_to_internal_failure() {
        let err = Error::from(TimetableError::Uninitialized);
        let response = ApiResponse::from(&err);

        pretty_assertions::assert_eq!(500, response.status());
        pretty_assertions::assert_eq!(json!({ "error": INTERNAL_FAILURE }), response.into_body());
    }
}
