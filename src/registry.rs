//! KIPRIS patent registry API client.
//!
//! Searches registered patents and utility models by customer number
//! and parses the XML search response into [`PatentRecord`]s.
//! Payment history comes from the register history service of the public data portal.
//!
//! Documentation:
//! <https://plus.kipris.or.kr/portal/data/service/DBII_000000000000001/view.do>

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use reqwest::{Client, Url};
use roxmltree::{Document, Node};

use crate::ABSENT;
use crate::config::HISTORY_API_KEY_ENV;
use crate::history::{self, LastPayment};
use crate::patent::{CustomerNumber, PatentRecord, RegistrationNumber};

/// Word search endpoint relative to the API base URL.
pub const SEARCH_PATH: &str = "patUtiModInfoSearchSevice/getWordSearch";

/// Register history service of the public data portal.
pub const REGISTER_HISTORY_URL: &str = "https://apis.data.go.kr/1430000/PttRgstRtInfoInqSvc/getPatentRegisterHistory";

/// Maximum number of results requested in one search.
pub const ROWS_PER_PAGE: u32 = 100;

/// Result code of a successful API call.
const RESULT_CODE_OK: &str = "00";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of registered patents for a customer.
pub trait PatentRegistry {
    /// Search all patents of the given customer.
    ///
    /// An empty list means the registry answered but the customer has no patents.
    fn search_patents(&self, customer_number: &CustomerNumber) -> impl Future<Output = Result<Vec<PatentRecord>>>;

    /// Latest renewal fee payment recorded in the register for a patent.
    ///
    /// `None` means the register answered without any payments.
    fn last_payment(
        &self,
        registration_number: &RegistrationNumber,
    ) -> impl Future<Output = Result<Option<LastPayment>>>;
}

/// Register history service location and key.
#[derive(Debug)]
struct RegisterHistory {
    url: String,
    api_key: String,
}

/// KIPRIS Plus open API client.
#[derive(Debug)]
pub struct KiprisClient {
    client: Client,
    base_url: String,
    api_key: String,
    register_history: Option<RegisterHistory>,
    verbose: bool,
}

impl KiprisClient {
    /// Create a new client for the given API base URL and service key.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, verbose: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            register_history: None,
            verbose,
        })
    }

    /// Enable payment history lookups with the register history service key.
    #[must_use]
    pub fn with_register_history(mut self, url: &str, api_key: &str) -> Self {
        self.register_history = Some(RegisterHistory {
            url: url.trim().to_string(),
            api_key: api_key.trim().to_string(),
        });
        self
    }

    /// Build the word search URL for a customer number.
    ///
    /// # Errors
    /// Returns an error if the base URL is not a valid URL.
    pub fn search_url(&self, customer_number: &CustomerNumber) -> Result<Url> {
        let endpoint = format!("{}/{SEARCH_PATH}", self.base_url);
        Url::parse_with_params(
            &endpoint,
            &[
                ("word", customer_number.as_str()),
                ("ServiceKey", self.api_key.as_str()),
                ("numOfRows", &ROWS_PER_PAGE.to_string()),
                ("pageNo", "1"),
            ],
        )
        .with_context(|| format!("Invalid API URL: {endpoint}"))
    }

    /// Build the register history URL for a registration number.
    ///
    /// # Errors
    /// Returns an error if no register history key is set or the URL is invalid.
    pub fn register_history_url(&self, registration_number: &RegistrationNumber) -> Result<Url> {
        let history = self.register_history.as_ref().with_context(|| {
            format!("Payment history API key is not set. Set {HISTORY_API_KEY_ENV} or history_api_key in the config file")
        })?;
        Url::parse_with_params(
            &history.url,
            &[
                ("serviceKey", history.api_key.as_str()),
                ("type", "json"),
                ("rgstNo", registration_number.as_str()),
            ],
        )
        .with_context(|| format!("Invalid API URL: {}", history.url))
    }

    /// GET the URL and return the response body of a successful response.
    async fn fetch_text(&self, url: Url, operation: &str) -> Result<String> {
        if self.verbose {
            println!("GET {}", masked_url(&url));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send {operation} request"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {operation} response"))?;
        if !status.is_success() {
            bail!("{operation} request failed: HTTP {status} - {}", body.trim());
        }
        Ok(body)
    }
}

impl PatentRegistry for KiprisClient {
    async fn search_patents(&self, customer_number: &CustomerNumber) -> Result<Vec<PatentRecord>> {
        let url = self.search_url(customer_number)?;
        let body = self.fetch_text(url, "Search").await?;
        parse_search_response(&body)
    }

    async fn last_payment(&self, registration_number: &RegistrationNumber) -> Result<Option<LastPayment>> {
        let url = self.register_history_url(registration_number)?;
        let body = self.fetch_text(url, "Payment history").await?;
        history::parse_register_history(&body)
    }
}

/// Copy of the URL with the service key masked, for printing.
fn masked_url(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key.eq_ignore_ascii_case("ServiceKey") {
                crate::mask_secret(&value)
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked
}

/// Parse a word search XML response into patent records.
///
/// The response must be a `<response>` element whose `<header>` has a `<resultCode>`.
/// An empty result code is accepted as success.
///
/// # Errors
/// Returns an error if the body is not XML, is not a registry response,
/// or the response header reports a failed call.
pub fn parse_search_response(xml: &str) -> Result<Vec<PatentRecord>> {
    let xml = xml.trim_start_matches('\u{feff}').trim();
    let document =
        Document::parse(xml).with_context(|| format!("Response is not XML: {}", crate::truncate_text(xml, 80)))?;

    let root = document.root_element();
    if !root.has_tag_name("response") {
        bail!("Unexpected response element <{}>", root.tag_name().name());
    }
    let header = child_element(root, "header").context("Response has no header")?;
    let code = child_element(header, "resultCode").context("Response header has no result code")?;
    let code = element_text(code);
    if !code.is_empty() && code != RESULT_CODE_OK {
        let message = child_element(header, "resultMsg")
            .map(element_text)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "unknown error".to_string());
        bail!("Registry API error {code}: {message}");
    }

    Ok(root
        .descendants()
        .filter(|node| node.has_tag_name("item"))
        .map(parse_item)
        .collect())
}

/// Convert one `<item>` element to a patent record.
fn parse_item(item: Node) -> PatentRecord {
    PatentRecord {
        application_number: text_or_absent(item, "applicationNumber"),
        registration_number: child_text(item, "registerNumber"),
        applicant_name: text_or_absent(item, "applicantName"),
        registration_date: child_text(item, "registerDate").as_deref().and_then(parse_registry_date),
        title: text_or_absent(item, "inventionTitle"),
        claim_count: text_or_absent(item, "claimCount"),
        expiration_date: child_text(item, "rightDuration").as_deref().and_then(parse_registry_date),
    }
}

/// Parse a registry date in `yyyymmdd` format.
///
/// Anything else, including the absent placeholder, gives `None`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use patent_fees::registry::parse_registry_date;
///
/// assert_eq!(parse_registry_date("20210510"), NaiveDate::from_ymd_opt(2021, 5, 10));
/// assert_eq!(parse_registry_date("2021-05-10"), None);
/// ```
#[must_use]
pub fn parse_registry_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.len() != 8 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y%m%d").ok()
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

/// All text inside the element, trimmed.
fn element_text(element: Node) -> String {
    let text: String = element
        .descendants()
        .filter(Node::is_text)
        .filter_map(|node| node.text())
        .collect();
    text.trim().to_string()
}

/// Text of the first child element with the given tag.
///
/// Returns `None` for a missing or empty element, or one containing only the absent placeholder.
fn child_text(item: Node, tag: &str) -> Option<String> {
    let text = element_text(child_element(item, tag)?);
    (!text.is_empty() && text != ABSENT).then_some(text)
}

fn text_or_absent(item: Node, tag: &str) -> String {
    child_text(item, tag).unwrap_or_else(|| ABSENT.to_string())
}



#[cfg(test)]
mod test_kipris_client {
    use super::*;

    fn customer() -> CustomerNumber {
        CustomerNumber::parse("120140558200").expect("valid customer number")
    }

    #[test]
    fn search_url_has_query_parameters() {
        let client = KiprisClient::new("http://plus.kipris.or.kr/openapi/rest/", "secret+key", false).unwrap();
        let url = client.search_url(&customer()).unwrap();

        assert_eq!(url.path(), "/openapi/rest/patUtiModInfoSearchSevice/getWordSearch");
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            [
                ("word".to_string(), "120140558200".to_string()),
                ("ServiceKey".to_string(), "secret+key".to_string()),
                ("numOfRows".to_string(), "100".to_string()),
                ("pageNo".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn masked_url_hides_service_key() {
        let client = KiprisClient::new("http://localhost/api", "abcdefgh1234", false).unwrap();
        let url = masked_url(&client.search_url(&customer()).unwrap());
        assert!(!url.as_str().contains("abcdefgh"));
        assert!(url.as_str().contains("ServiceKey=********1234"));
        assert!(url.as_str().contains("word=120140558200"));
    }

    #[test]
    fn invalid_base_url_fails() {
        let client = KiprisClient::new("not a url", "key", false).unwrap();
        assert!(client.search_url(&customer()).is_err());
    }

    #[test]
    fn register_history_url_has_query_parameters() {
        let client = KiprisClient::new("http://localhost/api", "key", false)
            .unwrap()
            .with_register_history(REGISTER_HISTORY_URL, "history-key");
        let number = RegistrationNumber::parse("1021234560000").unwrap();
        let url = client.register_history_url(&number).unwrap();

        assert_eq!(url.host_str(), Some("apis.data.go.kr"));
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            [
                ("serviceKey".to_string(), "history-key".to_string()),
                ("type".to_string(), "json".to_string()),
                ("rgstNo".to_string(), "1021234560000".to_string()),
            ]
        );
        assert!(masked_url(&url).as_str().contains("serviceKey=*******-key"));
    }

    #[tokio::test]
    async fn payment_history_without_key_fails() {
        let client = KiprisClient::new("http://localhost/api", "key", false).unwrap();
        let number = RegistrationNumber::parse("1021234560000").unwrap();
        let error = client.last_payment(&number).await.unwrap_err();
        assert!(error.to_string().contains(HISTORY_API_KEY_ENV), "{error}");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let client = KiprisClient::new("http://127.0.0.1:9", "key", false).unwrap();
        assert!(client.search_patents(&customer()).await.is_err());
    }
}
