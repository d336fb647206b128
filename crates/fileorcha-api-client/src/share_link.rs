//! Share links of the form `{origin}/download.html?id={id}[&password=...]`.

use fileorcha_core::{DownloadQuery, FileId};
use reqwest::Url;

const DOWNLOAD_PAGE: &str = "download.html";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareLinkError {
    #[error("Invalid link: {0}")]
    InvalidUrl(String),

    #[error("Link does not contain a file ID")]
    MissingId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub id: FileId,
    pub password: Option<String>,
}

impl ShareLink {
    pub fn new(id: FileId, password: Option<String>) -> Self {
        Self {
            id,
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn to_url(&self, origin: &str) -> Result<String, ShareLinkError> {
        let base = format!("{}/{}", origin.trim_end_matches('/'), DOWNLOAD_PAGE);
        let mut url = Url::parse(&base).map_err(|e| ShareLinkError::InvalidUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("id", self.id.as_str());
            if let Some(password) = &self.password {
                pairs.append_pair("password", password);
            }
        }
        Ok(url.to_string())
    }

    /// Parse a link copied from the success view (or a bare `?id=` query).
    pub fn parse(link: &str) -> Result<Self, ShareLinkError> {
        let url = Url::parse(link.trim()).map_err(|e| ShareLinkError::InvalidUrl(e.to_string()))?;

        let mut id = None;
        let mut password = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "id" => id = Some(value.into_owned()),
                "password" => password = Some(value.into_owned()),
                _ => {}
            }
        }

        let id = id
            .and_then(|raw| FileId::parse(&raw).ok())
            .ok_or(ShareLinkError::MissingId)?;
        Ok(Self::new(id, password))
    }

    pub fn into_query(self) -> DownloadQuery {
        DownloadQuery::new(self.id, self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> FileId {
        FileId::parse(raw).unwrap()
    }

    #[test]
    fn builds_link_without_password() {
        let link = ShareLink::new(id("a1b2c3"), None);
        assert_eq!(
            link.to_url("https://share.example.com/").unwrap(),
            "https://share.example.com/download.html?id=a1b2c3"
        );
    }

    #[test]
    fn password_is_query_encoded() {
        let link = ShareLink::new(id("abc"), Some("a&b c".to_string()));
        let url = link.to_url("http://localhost:8080").unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/download.html?id=abc&password=a%26b+c"
        );
        assert_eq!(ShareLink::parse(&url).unwrap(), link);
    }

    #[test]
    fn parse_requires_id() {
        assert_eq!(
            ShareLink::parse("http://localhost:8080/download.html?password=x"),
            Err(ShareLinkError::MissingId)
        );
        assert_eq!(
            ShareLink::parse("http://localhost:8080/download.html?id=%20"),
            Err(ShareLinkError::MissingId)
        );
        assert!(matches!(
            ShareLink::parse("not a url"),
            Err(ShareLinkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn empty_password_is_dropped() {
        let link = ShareLink::parse("http://h/download.html?id=x&password=").unwrap();
        assert_eq!(link.password, None);
        assert_eq!(link.into_query().password, None);
    }
}
