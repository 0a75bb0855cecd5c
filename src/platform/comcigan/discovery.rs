//! Resolution of the service's internal routing.
//!
//! The root page only holds a `frame`. The framed document is where the service
//! keeps its protocol constants, written inline in script:
//!
//! ```text
//! function school_ra(sc){$.ajax({url:'./36179?17384l'+sc, ...
//! sc_data('73629_',sc,1,'0');
//! ```
//!
//! Neither has a stable tag or attribute to select by, so both are found by
//! anchoring on the call name and matching a small window of text after it.

use url::Url;

use crate::stdx::error::invariant;

use super::{
    Client,
    errors::{DiscoveryError, Marker},
    markers,
};

/// Opaque constants parameterizing every later request, as found in the framed document.
///
/// Immutable once extracted. A new [`Client::init()`] is the only way to refresh them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConstants {
    base_path: String,
    school_ra_fragment: String,
    sc_data: Vec<String>,
}

impl ProtocolConstants {
    /// Builds constants from already known values.
    ///
    /// Normally these come from [`Client::init()`]; this exists for callers that
    /// persisted them from an earlier discovery.
    #[must_use]
    pub fn new(base_path: &str, school_ra_fragment: &str, sc_data: Vec<String>) -> Self {
        Self {
            base_path: base_path.to_owned(),
            school_ra_fragment: school_ra_fragment.to_owned(),
            sc_data,
        }
    }

    /// Directory of the framed document, ending in `/`. Every request address is relative to it.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Path and query prefix used for school searches and, up to its `?`, for data requests.
    #[must_use]
    pub fn school_ra_fragment(&self) -> &str {
        &self.school_ra_fragment
    }

    /// Arguments of the `sc_data` call, in order.
    #[must_use]
    pub fn sc_data(&self) -> &[String] {
        &self.sc_data
    }

    pub(super) fn extract(document: &str, framed_url: &Url) -> Result<Self, DiscoveryError> {
        let base_path = framed_url.join("./")?.to_string();

        invariant!(
            base_path.ends_with('/'),
            "framed document directory should end in `/`, but was `{base_path}`"
        );

        let school_ra_fragment = school_ra_fragment(document)?;
        let sc_data = sc_data(document)?;

        Ok(Self {
            base_path,
            school_ra_fragment,
            sc_data,
        })
    }
}

/// Everything learned from the service root: where the framed document lives, its
/// protocol constants and its raw text.
#[derive(Debug, Clone)]
pub struct Discovery {
    framed_url: Url,
    constants: ProtocolConstants,
    document: String,
}

impl Discovery {
    pub(super) fn new(framed_url: Url, constants: ProtocolConstants, document: String) -> Self {
        Self {
            framed_url,
            constants,
            document,
        }
    }

    /// Address of the framed document.
    #[must_use]
    pub fn framed_url(&self) -> &str {
        self.framed_url.as_str()
    }

    /// Protocol constants extracted from the framed document.
    #[must_use]
    pub fn constants(&self) -> &ProtocolConstants {
        &self.constants
    }

    /// The framed document, decoded from EUC-KR.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }
}

pub(super) async fn resolve(client: &Client, root: &str) -> Result<Discovery, DiscoveryError> {
    let root_url = Url::parse(root)?;

    let page = client.get_text(root_url.as_str()).await?;
    let framed_url = frame_target(&page, &root_url)?;

    tracing::debug!(%framed_url, "found service frame");

    let document = client.get_legacy_text(framed_url.as_str()).await?;
    let constants = ProtocolConstants::extract(&document, &framed_url)?;

    tracing::debug!(
        school_ra = constants.school_ra_fragment(),
        sc_data = ?constants.sc_data(),
        "extracted protocol constants"
    );

    Ok(Discovery::new(framed_url, constants, document))
}

/// Finds the first `frame` on `page` and resolves its target against `root`.
fn frame_target(page: &str, root: &Url) -> Result<Url, DiscoveryError> {
    let frame = markers::FRAME_TAG.find(page).ok_or(DiscoveryError::NoFrameFound)?;

    let target = markers::FRAME_SRC
        .captures(frame.as_str())
        .and_then(|captures| captures.get(1))
        .map(|target| target.as_str().trim())
        .filter(|target| !target.is_empty())
        .ok_or(DiscoveryError::NoFrameTarget)?;

    Ok(root.join(target)?)
}

/// Up to `len` characters of `document` starting at `marker`, with spaces removed.
fn window(document: &str, marker: &str, len: usize) -> Option<String> {
    let idx = document.find(marker)?;
    let tail = document.get(idx..)?;

    Some(tail.chars().take(len).filter(|c| *c != ' ').collect())
}

fn school_ra_fragment(document: &str) -> Result<String, DiscoveryError> {
    let missing = DiscoveryError::MissingProtocolMarker(Marker::SchoolRa);

    let Some(window) = window(document, markers::SCHOOL_RA, markers::SCHOOL_RA_WINDOW) else {
        return Err(missing);
    };

    let Some(fragment) = markers::SCHOOL_RA_URL
        .captures(&window)
        .and_then(|captures| captures.get(1))
    else {
        return Err(missing);
    };

    Ok(fragment.as_str().trim_start_matches('/').to_owned())
}

fn sc_data(document: &str) -> Result<Vec<String>, DiscoveryError> {
    let missing = DiscoveryError::MissingProtocolMarker(Marker::ScData);

    let Some(window) = window(document, markers::SC_DATA, markers::SC_DATA_WINDOW) else {
        return Err(missing);
    };

    let Some(args) = markers::SC_DATA_ARGS.find(&window) else {
        return Err(missing);
    };

    Ok(args
        .as_str()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '\''))
        .collect::<String>()
        .split(',')
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    const DOCUMENT: &str = "<html><script language='JavaScript'>\
        function school_ra(sc){$.ajax({ url:'./36179?17384l'+sc,success:function(data){}});}\
        function load(){ sc_data('73629_',sc,1,'0'); }</script></html>";

    #[test]
    fn should_find_frame_target() {
        let root = Url::parse("http://xn--s39aj90b0nb2xw6xh.kr/").unwrap();
        let page = "<HTML><FRAMESET><FRAME SRC='http://112.186.146.81:4082/st' NAME=main></FRAMESET></HTML>";

        let framed = frame_target(page, &root).unwrap();

        pretty_assertions::assert_str_eq!("http://112.186.146.81:4082/st", framed.as_str());
    }

    #[test]
    fn should_resolve_relative_frame_target() {
        let root = Url::parse("http://host/").unwrap();
        let page = r#"<frameset><frame src="app/index.html"></frameset>"#;

        let framed = frame_target(page, &root).unwrap();

        pretty_assertions::assert_str_eq!("http://host/app/index.html", framed.as_str());
    }

    #[test]
    fn should_fail_without_frame() {
        let root = Url::parse("http://host/").unwrap();
        let page = "<html><frameset></frameset><body>moved</body></html>";

        assert!(
            matches!(frame_target(page, &root), Err(DiscoveryError::NoFrameFound)),
            "`frameset` alone is not a frame"
        );
    }

    #[test]
    fn should_fail_without_frame_target() {
        let root = Url::parse("http://host/").unwrap();

        assert!(
            matches!(
                frame_target("<frame name=main>", &root),
                Err(DiscoveryError::NoFrameTarget)
            ),
            "frame without src has no target"
        );
        assert!(
            matches!(
                frame_target("<frame src=''>", &root),
                Err(DiscoveryError::NoFrameTarget)
            ),
            "frame with empty src has no target"
        );
    }

    #[test]
    fn should_extract_protocol_constants() {
        let framed = Url::parse("http://112.186.146.81:4082/st").unwrap();

        let constants = ProtocolConstants::extract(DOCUMENT, &framed).unwrap();

        pretty_assertions::assert_eq!(
            ProtocolConstants::new(
                "http://112.186.146.81:4082/",
                "36179?17384l",
                vec!["73629_".into(), "sc".into(), "1".into(), "0".into()],
            ),
            constants
        );
    }

    #[test]
    fn should_name_missing_school_ra_marker() {
        let framed = Url::parse("http://host/app/index.html").unwrap();
        let document = "<script>sc_data('73629_',sc,1,'0');</script>";

        let err = ProtocolConstants::extract(document, &framed).unwrap_err();

        assert!(
            matches!(err, DiscoveryError::MissingProtocolMarker(Marker::SchoolRa)),
            "{err}"
        );
    }

    #[test]
    fn should_name_missing_sc_data_marker() {
        let framed = Url::parse("http://host/app/index.html").unwrap();
        let document = "function school_ra(sc){$.ajax({url:'./frame.do?'+sc});}";

        let err = ProtocolConstants::extract(document, &framed).unwrap_err();

        assert!(
            matches!(err, DiscoveryError::MissingProtocolMarker(Marker::ScData)),
            "{err}"
        );
    }

    #[test]
    fn should_fail_when_address_is_outside_window() {
        let framed = Url::parse("http://host/app/index.html").unwrap();
        let padding = "x".repeat(60);
        let document = format!(
            "function school_ra(sc){{{padding} url:'./frame.do?'}} sc_data('1_',sc,1,'0');"
        );

        let err = ProtocolConstants::extract(&document, &framed).unwrap_err();

        assert!(
            matches!(err, DiscoveryError::MissingProtocolMarker(Marker::SchoolRa)),
            "{err}"
        );
    }

    #[test]
    fn window_should_count_characters_not_bytes() {
        let window = window("앞 sc_data('가나다',1)", "sc_data('", 12).unwrap();
        pretty_assertions::assert_str_eq!("sc_data('가나다", window);
    }
}
