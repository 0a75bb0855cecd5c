//! Every string and pattern the client relies on to find its way through the upstream pages.
//!
//! The upstream service has no schema: constants live inside live script and change per
//! deployment. When the service changes its markup, this is the file that needs to follow.

use regex::Regex;
use std::sync::LazyLock;

/// First `frame` tag of the root page. `\b` keeps `<frameset>` out.
pub(super) static FRAME_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<frame\b[^>]*>").expect("frame tag pattern should be a valid regex")
});

/// Quoted `src` of a frame tag.
pub(super) static FRAME_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']*)["']"#)
        .expect("frame src pattern should be a valid regex")
});

/// Script call anchoring the school search address.
pub(super) const SCHOOL_RA: &str = "school_ra(sc)";
/// Characters after [`SCHOOL_RA`] searched for the address.
pub(super) const SCHOOL_RA_WINDOW: usize = 50;
/// Address inside the [`SCHOOL_RA`] window. The character after the quote is a `.` of a relative path.
pub(super) static SCHOOL_RA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"url:'.(.*?)'").expect("`school_ra` url pattern should be a valid regex")
});

/// Script call anchoring the data request constants.
pub(super) const SC_DATA: &str = "sc_data('";
/// Characters after [`SC_DATA`] searched for the argument list.
pub(super) const SC_DATA_WINDOW: usize = 30;
/// Argument list inside the [`SC_DATA`] window.
pub(super) static SC_DATA_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(.*?\)").expect("`sc_data` args pattern should be a valid regex")
});

/// Opening tag of the inline render script blocks. The attributes after `language` vary per deployment.
pub(super) static SCRIPT_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<script language(.*?)>")
        .expect("script open tag pattern should be a valid regex")
});
/// Closing tag of a render script block.
pub(super) const SCRIPT_CLOSE_TAG: &str = "</script>";

/// Declaration of the timetable generator. The suffix after `자료` changes per deployment.
pub(super) static GENERATOR_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"function 자료[^\(]*").expect("generator function pattern should be a valid regex")
});
/// Artifact sometimes left inside the generator name.
pub(super) const GENERATOR_ARTIFACT: &str = "+s";

/// Field of the search response holding school rows.
pub(super) const SEARCH_FIELD: &str = "학교검색";
/// Field of the data blob holding class counts, indexed by grade.
pub(super) const CLASS_COUNT_FIELD: &str = "학급수";
/// Field of the data blob holding period start and end times.
pub(super) const CLASS_TIME_FIELD: &str = "일과시간";

/// Flag between the school code and the last `sc_data` constant in a data request.
pub(super) const DATA_REQUEST_FLAG: &str = "0";
/// Separator of the data request parts before they are base64 encoded.
pub(super) const DATA_REQUEST_SEPARATOR: &str = "_";

/// Labels of the weekdays, indexed from Sunday.
pub(super) const WEEKDAY_LABELS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];
