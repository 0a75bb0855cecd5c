//! Per-school state on top of a resolved [`Discovery`].

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

use crate::stdx::{
    cache::{Cache, Store},
    http::truncate_after_last_brace,
};

use super::{
    Client,
    discovery::Discovery,
    errors::{DataFetchError, ParseError, SearchError, TimetableError},
    markers,
    school::{self, SchoolRecord},
    script::{self, RenderScript},
    table,
    timetable::{ClassTimeInfo, Timetable, Week},
};

/// Options of a [`Session`].
///
/// # Example
///
/// ```
/// # use comcigan::platform::comcigan::Options;
/// # use std::time::Duration;
/// let options = Options::default()
///     .with_max_grade(3)
///     .with_cache_ttl(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    max_grade: u8,
    cache_ttl: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_grade: 3,
            cache_ttl: Duration::ZERO,
        }
    }
}

impl Options {
    /// Highest grade a full timetable covers. Defaults to `3`.
    #[must_use]
    pub fn with_max_grade(self, max_grade: u8) -> Self {
        Self { max_grade, ..self }
    }

    /// How long a computed timetable is reused. Defaults to zero, which disables caching.
    #[must_use]
    pub fn with_cache_ttl(self, cache_ttl: Duration) -> Self {
        Self { cache_ttl, ..self }
    }

    /// Highest grade a full timetable covers.
    #[must_use]
    pub fn max_grade(&self) -> u8 {
        self.max_grade
    }

    /// How long a computed timetable is reused.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
}

/// A resolved connection to the service, optionally bound to one school.
///
/// Gotten from [`Client::init()`]. Searching works right away; timetables need a
/// school selected with [`set_school()`](Session::set_school()) first.
#[derive(Debug)]
pub struct Session {
    client: Client,
    discovery: Arc<Discovery>,
    school: Option<u32>,
    cache: Cache<Timetable>,
    options: Options,
}

impl Session {
    pub(super) fn new(client: Client, discovery: Arc<Discovery>, options: Options) -> Self {
        Self {
            client,
            discovery,
            school: None,
            cache: Cache::empty(options.cache_ttl),
            options,
        }
    }

    /// What [`Client::init()`] resolved.
    #[must_use]
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Options the session was created with.
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Code of the selected school, if any.
    #[must_use]
    pub fn school(&self) -> Option<u32> {
        self.school
    }

    /// Searches schools by (part of) their name.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use comcigan::platform::comcigan::{Client, Options, errors::Error};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Error> {
    /// let session = Client::new().init(Options::default()).await?;
    ///
    /// for school in session.search("기흥").await? {
    ///     println!("{} {} ({})", school.region(), school.name(), school.code());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NoSchoolsFound`] when nothing matched.
    pub async fn search(&self, keyword: &str) -> Result<Vec<SchoolRecord>, SearchError> {
        let url = school::search_url(self.discovery.constants(), keyword);
        let body = self.client.get_text(&url).await?;

        let schools = school::parse_search(&body)?;

        tracing::debug!(keyword, count = schools.len(), "searched schools");

        Ok(schools)
    }

    /// Selects the school later timetable requests are for, dropping any cached timetable.
    ///
    /// No request is made: the code is only checked by the service on the next fetch.
    pub fn set_school(&mut self, code: u32) {
        self.school = Some(code);
        self.cache.clear();

        tracing::info!(code, "selected school");
    }

    /// Path of the data request for the selected school, relative to the base path.
    ///
    /// # Errors
    ///
    /// Returns [`TimetableError::Uninitialized`] without a selected school.
    pub fn data_request_path(&self) -> Result<String, TimetableError> {
        let code = self.school.ok_or(TimetableError::Uninitialized)?;
        let constants = self.discovery.constants();

        let [prefix, _, suffix, ..] = constants.sc_data() else {
            return Err(DataFetchError::MissingConstant(constants.sc_data().len()).into());
        };

        let fragment = constants.school_ra_fragment();
        let path = fragment.split_once('?').map_or(fragment, |(path, _)| path);

        let request = [
            format!("{prefix}{code}"),
            markers::DATA_REQUEST_FLAG.to_owned(),
            suffix.clone(),
        ]
        .join(markers::DATA_REQUEST_SEPARATOR);

        Ok(format!("{path}?{}", STANDARD.encode(request)))
    }

    /// Full timetable of the selected school: `grade → class → week`.
    ///
    /// With a non-zero cache TTL, a timetable computed less than that long ago is
    /// returned without any request.
    ///
    /// # Errors
    ///
    /// Returns [`TimetableError::Uninitialized`] without a selected school, and the
    /// failing step otherwise. Nothing is retried.
    pub async fn timetable(&self) -> Result<Timetable, TimetableError> {
        let code = self.school.ok_or(TimetableError::Uninitialized)?;

        if let Store::Value(timetable) = self.cache.get() {
            tracing::debug!(code, "timetable served from cache");
            return Ok(timetable);
        }

        let blob = self.fetch_data().await?;
        let mut data: Value = serde_json::from_str(&blob).map_err(DataFetchError::from)?;

        let counts = data
            .get_mut(markers::CLASS_COUNT_FIELD)
            .map(Value::take)
            .ok_or(DataFetchError::MissingField(markers::CLASS_COUNT_FIELD))?;
        let counts = class_counts(counts)?;

        let script = script::extract(self.discovery.document())?;
        let max_grade = self.options.max_grade;

        tracing::debug!(code, generator = script.function(), max_grade, "materializing timetable");

        let timetable =
            tokio::task::spawn_blocking(move || render(&script, &blob, &counts, max_grade))
                .await
                .map_err(|err| TimetableError::Unexpected(err.into()))??;

        if self.cache.is_enabled() {
            self.cache.insert(timetable.clone());
            tracing::info!(code, ttl = ?self.options.cache_ttl, "refreshed timetable cache");
        }

        Ok(timetable)
    }

    /// Period start and end times of the selected school, verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`TimetableError::Uninitialized`] without a selected school, and
    /// [`DataFetchError::MissingField`] when the data has no class times.
    pub async fn class_time_info(&self) -> Result<ClassTimeInfo, TimetableError> {
        let blob = self.fetch_data().await?;
        let mut data: Value = serde_json::from_str(&blob).map_err(DataFetchError::from)?;

        let class_time = data
            .get_mut(markers::CLASS_TIME_FIELD)
            .map(Value::take)
            .ok_or(DataFetchError::MissingField(markers::CLASS_TIME_FIELD))?;

        Ok(class_time)
    }

    /// Fetches the data blob of the selected school, without whatever trails its JSON.
    async fn fetch_data(&self) -> Result<String, TimetableError> {
        let url = format!(
            "{}{}",
            self.discovery.constants().base_path(),
            self.data_request_path()?
        );

        let body = self.client.get_text(&url).await?;

        let blob = truncate_after_last_brace(&body).ok_or(DataFetchError::Empty)?;

        Ok(blob.to_owned())
    }
}

/// Materializes and parses the table of every class of every grade up to `max_grade`.
///
/// `counts` is indexed by grade. Grades past its end get an empty class map.
fn render(
    script: &RenderScript,
    blob: &str,
    counts: &[u8],
    max_grade: u8,
) -> Result<Timetable, TimetableError> {
    let mut timetable = Timetable::new();

    for grade in 1..=max_grade {
        let classes = timetable.entry(grade).or_default();
        let count = counts.get(usize::from(grade)).copied().unwrap_or(0);

        for class in 1..=count {
            let html = script.materialize(blob, grade, class)?;

            let week = match table::parse(&html, grade, class) {
                Ok(week) => week,
                Err(err @ ParseError::NoRows { .. }) => {
                    tracing::warn!(grade, class, %err, "keeping an empty week");
                    Week::new()
                }
            };

            classes.insert(class, week);
        }
    }

    Ok(timetable)
}

#[derive(Deserialize)]
struct ClassCount(#[serde(deserialize_with = "crate::stdx::serde::u32_from_string")] u32);

/// Reads the per-grade class counts of the `학급수` field.
///
/// Entries may be numbers or numeric strings. Counts above 255 saturate.
fn class_counts(counts: Value) -> Result<Vec<u8>, DataFetchError> {
    let counts: Vec<ClassCount> = serde_json::from_value(counts)?;

    Ok(counts
        .into_iter()
        .map(|ClassCount(count)| u8::try_from(count).unwrap_or(u8::MAX))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform::comcigan::ProtocolConstants;
    use url::Url;

    const DOCUMENT: &str = "<script language='JavaScript'>function 자료7(자료,학년,반){\
        return '<table><tr><td>제목</td></tr><tr><td></td></tr>\
        <tr><td>1</td><td>'+자료.과목[학년]+'<br>'+반+'반</td></tr></table>';}</script>";

    fn session(sc_data: &[&str]) -> Session {
        let constants = ProtocolConstants::new(
            "http://112.186.146.81:4082/",
            "36179?17384l",
            sc_data.iter().map(|item| (*item).to_owned()).collect(),
        );

        let discovery = Discovery::new(
            Url::parse("http://112.186.146.81:4082/st").unwrap(),
            constants,
            DOCUMENT.to_owned(),
        );

        Session::new(Client::new(), Arc::new(discovery), Options::default())
    }

    #[test]
    fn should_build_data_request_path() {
        let mut session = session(&["73629_", "sc", "1", "0"]);
        session.set_school(12345);

        pretty_assertions::assert_str_eq!(
            "36179?NzM2MjlfMTIzNDVfMF8x",
            session.data_request_path().unwrap()
        );
    }

    #[test]
    fn data_request_path_should_need_school() {
        let session = session(&["73629_", "sc", "1", "0"]);

        assert!(
            matches!(session.data_request_path(), Err(TimetableError::Uninitialized)),
            "no school selected"
        );
    }

    #[test]
    fn data_request_path_should_need_three_constants() {
        let mut session = session(&["73629_", "sc"]);
        session.set_school(1);

        assert!(
            matches!(
                session.data_request_path(),
                Err(TimetableError::DataFetch(DataFetchError::MissingConstant(2)))
            ),
            "two constants are not enough"
        );
    }

    #[tokio::test]
    async fn timetable_should_need_school() {
        let session = session(&["73629_", "sc", "1", "0"]);

        assert!(
            matches!(session.timetable().await, Err(TimetableError::Uninitialized)),
            "no school selected"
        );
        assert!(
            matches!(session.class_time_info().await, Err(TimetableError::Uninitialized)),
            "no school selected"
        );
    }

    #[test]
    fn options_should_default_to_three_grades_without_cache() {
        let options = Options::default();

        pretty_assertions::assert_eq!(3, options.max_grade());
        pretty_assertions::assert_eq!(Duration::ZERO, options.cache_ttl());
    }

    #[test]
    fn should_render_every_class_of_every_grade() {
        let script = script::extract(DOCUMENT).unwrap();
        let blob = r#"{"과목":["","국어","수학"],"학급수":[0,2,1]}"#;

        let timetable = render(&script, blob, &[0, 2, 1], 3).unwrap();

        pretty_assertions::assert_eq!(vec![1, 2, 3], timetable.keys().copied().collect::<Vec<_>>());
        pretty_assertions::assert_eq!(2, timetable[&1].len());
        pretty_assertions::assert_eq!(1, timetable[&2].len());
        assert!(timetable[&3].is_empty(), "grade 3 has no class count");

        for (grade, classes) in &timetable {
            for (class, week) in classes {
                for entry in week.iter().flatten().flatten() {
                    pretty_assertions::assert_eq!(*grade, entry.grade());
                    pretty_assertions::assert_eq!(*class, entry.class_number());
                }
            }
        }

        let entry = timetable[&1][&2][0][0].as_ref().unwrap();
        pretty_assertions::assert_str_eq!("국어", entry.subject());
        pretty_assertions::assert_str_eq!("2반", entry.teacher());

        let entry = timetable[&2][&1][0][0].as_ref().unwrap();
        pretty_assertions::assert_str_eq!("수학", entry.subject());
    }

    #[test]
    fn should_keep_empty_week_for_class_without_table() {
        let document = "<script language='JavaScript'>function 자료7(자료,학년,반){\
            if(반==2){return '<p>자료 없음</p>';}\
            return '<table><tr><td>제목</td></tr><tr><td></td></tr>\
            <tr><td>1</td><td>'+자료.과목[학년]+'<br>'+반+'반</td></tr></table>';}</script>";
        let script = script::extract(document).unwrap();
        let blob = r#"{"과목":["","국어"],"학급수":[0,3]}"#;

        let timetable = render(&script, blob, &[0, 3], 1).unwrap();

        pretty_assertions::assert_eq!(
            vec![1, 2, 3],
            timetable[&1].keys().copied().collect::<Vec<_>>()
        );
        assert!(timetable[&1][&2].is_empty(), "class 2 rendered no table");
        pretty_assertions::assert_str_eq!(
            "1반",
            timetable[&1][&1][0][0].as_ref().unwrap().teacher()
        );
        pretty_assertions::assert_str_eq!(
            "3반",
            timetable[&1][&3][0][0].as_ref().unwrap().teacher()
        );
    }

    #[test]
    fn class_counts_should_accept_numeric_strings() {
        let counts = class_counts(serde_json::json!(["0", " 3", 10, 300])).unwrap();

        pretty_assertions::assert_eq!(vec![0, 3, 10, 255], counts);
    }

    #[test]
    fn class_counts_should_reject_non_numeric_entries() {
        let err = class_counts(serde_json::json!([0, 10, "x"])).unwrap_err();
        assert!(matches!(err, DataFetchError::Malformed(_)), "{err}");

        let err = class_counts(serde_json::json!([0, null])).unwrap_err();
        assert!(matches!(err, DataFetchError::Malformed(_)), "{err}");
    }

    #[test]
    fn class_counts_should_be_an_array() {
        let err = class_counts(serde_json::json!({})).unwrap_err();
        assert!(matches!(err, DataFetchError::Malformed(_)), "{err}");

        let err = class_counts(serde_json::json!(3)).unwrap_err();
        assert!(matches!(err, DataFetchError::Malformed(_)), "{err}");
    }
}
