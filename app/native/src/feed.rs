//! Daily-image feed client.
//!
//! Queries the archive endpoint (`format=xml&idx=&n=&mkt=`) and turns each
//! `<image>` element into an [`ImageRecord`]. The client never retries; the
//! sync loop and the cache own retry policy.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::FeedConfig;
use crate::error::{DailywallError, Result};
use crate::http::Transport;
use crate::model::{Collection, ImageRecord, date_format};

/// `<images>` document root.
#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(rename = "image", default)]
    images: Vec<FeedImage>,
}

/// One `<image>` element. Unknown children (`url`, `hsh`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct FeedImage {
    startdate: String,
    #[serde(rename = "urlBase")]
    url_base: String,
    #[serde(default)]
    copyright: String,
}

/// Fetches metadata from the remote feed.
pub struct FeedClient {
    transport: Arc<dyn Transport>,
    config: FeedConfig,
}

impl FeedClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: FeedConfig) -> Self {
        Self { transport, config }
    }

    /// Builds the metadata URL for `count` records starting `offset` days back.
    #[must_use]
    pub fn request_url(&self, offset: usize, count: usize) -> String {
        format!(
            "{}?format=xml&idx={offset}&n={count}&mkt={}",
            self.config.endpoint, self.config.market
        )
    }

    /// Returns up to `count` records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::FeedUnavailable`] on transport failure and
    /// [`DailywallError::FeedFormat`] when the document cannot be parsed.
    pub fn fetch_records(&self, offset: usize, count: usize) -> Result<Vec<ImageRecord>> {
        let url = self.request_url(offset, count);
        let body = self
            .transport
            .fetch_text(&url)
            .map_err(|err| DailywallError::FeedUnavailable(err.to_string()))?;

        let records = self.parse(&body)?;
        tracing::debug!(offset, count, received = records.len(), "fetched feed records");
        Ok(records)
    }

    /// Returns the single most recent record.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_records`](Self::fetch_records); an empty document is a
    /// [`DailywallError::FeedFormat`] error.
    pub fn fetch_latest(&self) -> Result<ImageRecord> {
        self.fetch_records(0, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| DailywallError::FeedFormat("feed returned no images".to_string()))
    }

    /// Parses a feed document.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::FeedFormat`] on malformed XML, a missing
    /// required element, an empty `urlBase` or an invalid `startdate`.
    pub fn parse(&self, xml: &str) -> Result<Vec<ImageRecord>> {
        let document: FeedDocument = quick_xml::de::from_str(xml)
            .map_err(|err| DailywallError::FeedFormat(err.to_string()))?;

        document.images.into_iter().map(|image| self.to_record(image)).collect()
    }

    fn to_record(&self, image: FeedImage) -> Result<ImageRecord> {
        let url_base = image.url_base.trim();
        if url_base.is_empty() {
            return Err(DailywallError::FeedFormat("image without urlBase".to_string()));
        }

        let date = date_format::parse(&image.startdate).map_err(DailywallError::FeedFormat)?;
        let host = &self.config.host;

        Ok(ImageRecord {
            picture_url: format!("{host}{url_base}{}", self.config.image_suffix),
            thumbnail_url: format!("{host}{url_base}{}", self.config.thumbnail_suffix),
            caption: image.copyright.trim().to_string(),
            date,
            source: Collection::Remote,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::test_utils::{FakeTransport, feed_xml};

    fn client(transport: &Arc<FakeTransport>) -> FeedClient {
        FeedClient::new(transport.clone(), FeedConfig::default())
    }

    #[test]
    fn test_request_url_shape() {
        let transport = Arc::new(FakeTransport::default());
        assert_eq!(
            client(&transport).request_url(0, 7),
            "https://www.bing.com/HPImageArchive.aspx?format=xml&idx=0&n=7&mkt=en-US"
        );
    }

    #[test]
    fn test_parse_builds_urls_from_template() {
        let transport = Arc::new(FakeTransport::default());
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
            <images>
              <image>
                <startdate>20250409</startdate>
                <fullstartdate>202504090700</fullstartdate>
                <url>/th?id=OHR.Fox_1920x1080.jpg</url>
                <urlBase>/th?id=OHR.Fox</urlBase>
                <copyright>A red fox (© Photographer)</copyright>
                <hsh>abc</hsh>
              </image>
              <tooltips><loadMessage><message>Loading</message></loadMessage></tooltips>
            </images>"#;

        let records = client(&transport).parse(xml).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.picture_url, "https://www.bing.com/th?id=OHR.Fox_UHD.jpg");
        assert_eq!(record.thumbnail_url, "https://www.bing.com/th?id=OHR.Fox_320x240.jpg");
        assert_eq!(record.caption, "A red fox (© Photographer)");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 4, 9).unwrap());
        assert_eq!(record.source, Collection::Remote);
    }

    #[test]
    fn test_parse_keeps_feed_order() {
        let transport = Arc::new(FakeTransport::default());
        let xml = feed_xml(&[
            ("/th?id=C", "20250403"),
            ("/th?id=B", "20250402"),
            ("/th?id=A", "20250401"),
        ]);

        let records = client(&transport).parse(&xml).unwrap();

        let dates: Vec<_> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-04-03", "2025-04-02", "2025-04-01"]);
    }

    #[test]
    fn test_parse_empty_document() {
        let transport = Arc::new(FakeTransport::default());
        assert!(client(&transport).parse("<images></images>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_truncated_document() {
        let transport = Arc::new(FakeTransport::default());
        let err = client(&transport).parse("<images><image><startdate>2025").unwrap_err();
        assert!(matches!(err, DailywallError::FeedFormat(_)));
    }

    #[test]
    fn test_parse_rejects_image_without_url_base() {
        let transport = Arc::new(FakeTransport::default());
        let xml = "<images><image><startdate>20250409</startdate></image></images>";
        let err = client(&transport).parse(xml).unwrap_err();
        assert!(matches!(err, DailywallError::FeedFormat(_)));
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let transport = Arc::new(FakeTransport::default());
        let xml = feed_xml(&[("/th?id=X", "2025-13-45")]);
        let err = client(&transport).parse(&xml).unwrap_err();
        assert!(matches!(err, DailywallError::FeedFormat(_)));
    }

    #[test]
    fn test_fetch_records_maps_transport_failure() {
        let transport = Arc::new(FakeTransport::default());
        let err = client(&transport).fetch_records(0, 1).unwrap_err();
        assert!(matches!(err, DailywallError::FeedUnavailable(_)));
        assert_eq!(transport.feed_requests(), 1);
    }

    #[test]
    fn test_fetch_latest_returns_first_record() {
        let transport = Arc::new(FakeTransport::default());
        transport.set_feed(&[("/th?id=New", "20250410"), ("/th?id=Old", "20250409")]);

        let latest = client(&transport).fetch_latest().unwrap();
        assert!(latest.picture_url.contains("New"));
    }

    #[test]
    fn test_fetch_latest_on_empty_feed() {
        let transport = Arc::new(FakeTransport::default());
        transport.set_feed(&[]);
        let err = client(&transport).fetch_latest().unwrap_err();
        assert!(matches!(err, DailywallError::FeedFormat(_)));
    }
}
