//! Errors that can happen when interacting with the `컴시간학생` timetable service.

use std::fmt::{self, Display};
use thiserror::Error;

use crate::stdx::error::InternalInvariant;

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error(transparent)]
    DiscoveryError(#[from] DiscoveryError),
    #[error(transparent)]
    SearchError(#[from] SearchError),
    #[error(transparent)]
    TimetableError(#[from] TimetableError),
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Unexpected(anyhow::Error::from(error))
    }
}

/// One of the two script markers the framed document must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `school_ra(sc)`, anchoring the school search and data request path.
    SchoolRa,
    /// `sc_data('`, anchoring the constants used to build the data request.
    ScData,
}

impl Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self {
            Self::SchoolRa => "school_ra(sc)",
            Self::ScData => "sc_data('",
        };

        write!(f, "`{marker}`")
    }
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("No `frame` tag was found on the service root page")]
    NoFrameFound,
    #[error("The `frame` tag on the service root page has no target address")]
    NoFrameTarget,
    #[error("Framed document is missing the {0} protocol marker")]
    MissingProtocolMarker(Marker),
    #[error(transparent)]
    MalformedUrl(#[from] url::ParseError),
    #[error(transparent)]
    Internal(#[from] InternalInvariant),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(error: reqwest::Error) -> Self {
        Self::ClientError(ClientError::Unexpected(anyhow::Error::from(error)))
    }
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("No school matched the search keyword")]
    NoSchoolsFound,
    #[error("School search response was malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        Self::ClientError(ClientError::Unexpected(anyhow::Error::from(error)))
    }
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("No school was selected, call `Session::set_school` first")]
    Uninitialized,
    #[error(transparent)]
    DataFetch(#[from] DataFetchError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for TimetableError {
    fn from(error: reqwest::Error) -> Self {
        Self::ClientError(ClientError::Unexpected(anyhow::Error::from(error)))
    }
}

/// Failures of the timetable data endpoint.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DataFetchError {
    #[error("Timetable data endpoint returned no data")]
    Empty,
    #[error("Timetable data was malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Timetable data has no `{0}` field")]
    MissingField(&'static str),
    #[error("`sc_data` protocol constant has {0} items, at least 3 are needed")]
    MissingConstant(usize),
}

/// Failures locating or running the upstream's timetable renderer.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("No inline render script was found in the framed document")]
    NoInlineScript,
    #[error("No timetable generator function was found in the render script")]
    NoGeneratorFunction,
    #[error("Render script failed: {0}")]
    Evaluation(String),
    #[error("Timetable generator returned a non-string value")]
    NonStringResult,
    #[error(transparent)]
    Internal(#[from] InternalInvariant),
}

/// Failures reading the markup produced by the renderer.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Rendered timetable for grade {grade} class {class} has no table rows")]
    NoRows { grade: u8, class: u8 },
}
