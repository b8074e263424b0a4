use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::Endpoint;
use crate::domain::{Accession, ReturnType, SearchSession};
use crate::error::GrabberError;

pub const DATABASE: &str = "nuccore";

static QUERY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<QueryKey>\s*([^<]*?)\s*</QueryKey>").unwrap());
static WEB_ENV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<WebEnv>\s*([^<]*?)\s*</WebEnv>").unwrap());
static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Count>\s*(\d+)\s*</Count>").unwrap());
static ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<ERROR>(.*?)</ERROR>").unwrap());

pub trait EutilsTransport {
    fn get(&self, url: &Url) -> Result<String, GrabberError>;
}

impl<T: EutilsTransport + ?Sized> EutilsTransport for &T {
    fn get(&self, url: &Url) -> Result<String, GrabberError> {
        (**self).get(url)
    }
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    client: Client,
}

impl EutilsHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, GrabberError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("genbank-grabber/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GrabberError::EutilsHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| GrabberError::EutilsHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl EutilsTransport for EutilsHttpClient {
    fn get(&self, url: &Url) -> Result<String, GrabberError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| GrabberError::EutilsHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "E-utilities request failed".to_string());
            return Err(GrabberError::EutilsStatus { status, message });
        }
        response
            .text()
            .map_err(|err| GrabberError::EutilsHttp(err.to_string()))
    }
}

pub fn search_url(endpoint: &Endpoint, accession: &Accession) -> Result<Url, GrabberError> {
    let params = [
        ("db", DATABASE),
        ("term", accession.as_str()),
        ("usehistory", "y"),
    ];
    build_url(endpoint, "esearch.fcgi", &params)
}

pub fn fetch_url(
    endpoint: &Endpoint,
    session: &SearchSession,
    return_type: ReturnType,
) -> Result<Url, GrabberError> {
    return_type.ensure_supported()?;
    let params = [
        ("db", DATABASE),
        ("query_key", session.query_key()),
        ("WebEnv", session.web_env()),
        ("rettype", "fasta"),
        ("retmode", "text"),
    ];
    build_url(endpoint, "efetch.fcgi", &params)
}

fn build_url(
    endpoint: &Endpoint,
    utility: &str,
    params: &[(&str, &str)],
) -> Result<Url, GrabberError> {
    let base = endpoint.base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/{utility}"))
        .map_err(|err| GrabberError::ConfigParse(format!("invalid base_url {base}: {err}")))?;
    {
        let mut query = url.query_pairs_mut();
        query.extend_pairs(params.iter().copied());
        for (key, value) in [
            ("api_key", &endpoint.api_key),
            ("tool", &endpoint.tool),
            ("email", &endpoint.email),
        ] {
            if let Some(value) = value {
                query.append_pair(key, value);
            }
        }
    }
    Ok(url)
}

pub fn parse_search_response(
    body: &str,
    accession: &Accession,
) -> Result<SearchSession, GrabberError> {
    if let Some(message) = ERROR_RE.captures(body).and_then(|caps| caps.get(1)) {
        return Err(GrabberError::ResponseParse(format!(
            "esearch reported an error: {}",
            message.as_str().trim()
        )));
    }

    let count = COUNT_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok());
    if count == Some(0) {
        return Err(GrabberError::RecordNotFound(format!(
            "{accession} matched no {DATABASE} records"
        )));
    }

    let query_key = element_text(&QUERY_KEY_RE, body, "QueryKey")?;
    let web_env = element_text(&WEB_ENV_RE, body, "WebEnv")?;
    SearchSession::new(query_key, web_env)
}

fn element_text<'a>(re: &Regex, body: &'a str, tag: &str) -> Result<&'a str, GrabberError> {
    let value = re
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| GrabberError::ResponseParse(format!("missing <{tag}> element")))?;
    if value.is_empty() {
        return Err(GrabberError::ResponseParse(format!("empty <{tag}> element")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn search_url_requests_history() {
        let acc: Accession = "NC_045512.2".parse().unwrap();
        let url = search_url(&Endpoint::default(), &acc).unwrap();
        assert_eq!(
            url.as_str(),
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi?db=nuccore&term=NC_045512.2&usehistory=y"
        );
    }

    #[test]
    fn fetch_url_appends_credentials() {
        let endpoint = Endpoint {
            api_key: Some("abc".to_string()),
            email: Some("me@example.org".to_string()),
            ..Endpoint::default()
        };
        let session = SearchSession::new("1", "MCID_42").unwrap();
        let url = fetch_url(&endpoint, &session, ReturnType::Fasta).unwrap();
        assert_eq!(
            url.as_str(),
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi?db=nuccore&query_key=1&WebEnv=MCID_42&rettype=fasta&retmode=text&api_key=abc&email=me%40example.org"
        );
    }

    #[test]
    fn error_element_is_reported() {
        let acc: Accession = "X1".parse().unwrap();
        let body = "<eSearchResult><ERROR>Invalid db name</ERROR></eSearchResult>";
        assert_matches!(
            parse_search_response(body, &acc),
            Err(GrabberError::ResponseParse(msg)) if msg.contains("Invalid db name")
        );
    }
}
