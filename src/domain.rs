use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::GrabberError;

const MAX_ACCESSION_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Accession(String);

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Accession {
    type Err = GrabberError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= MAX_ACCESSION_LEN
            && normalized.chars().any(|ch| ch.is_ascii_alphanumeric())
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'));
        if !is_valid {
            return Err(GrabberError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReturnType {
    #[default]
    Fasta,
    Gb,
    Xml,
}

impl ReturnType {
    pub fn ensure_supported(self) -> Result<Self, GrabberError> {
        match self {
            ReturnType::Fasta => Ok(self),
            other => Err(GrabberError::UnsupportedReturnType(other.to_string())),
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Fasta => write!(f, "fasta"),
            ReturnType::Gb => write!(f, "gb"),
            ReturnType::Xml => write!(f, "xml"),
        }
    }
}

// Both halves are always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    query_key: String,
    web_env: String,
}

impl SearchSession {
    pub fn new(
        query_key: impl Into<String>,
        web_env: impl Into<String>,
    ) -> Result<Self, GrabberError> {
        let query_key = query_key.into();
        let web_env = web_env.into();
        if query_key.is_empty() || web_env.is_empty() {
            return Err(GrabberError::MissingSession(
                "query key and WebEnv must both be set".to_string(),
            ));
        }
        Ok(Self { query_key, web_env })
    }

    pub fn query_key(&self) -> &str {
        &self.query_key
    }

    pub fn web_env(&self) -> &str {
        &self.web_env
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    text: String,
    header: String,
}

impl SequenceRecord {
    pub fn from_text(text: String) -> Self {
        let header = text
            .split('\n')
            .next()
            .unwrap_or_default()
            .trim_end_matches('\r')
            .to_string();
        Self { text, header }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_accession_trims() {
        let acc: Accession = "  NC_045512.2 ".parse().unwrap();
        assert_eq!(acc.as_str(), "NC_045512.2");
    }

    #[test]
    fn parse_accession_rejects_query_syntax() {
        let err = "NC_045512 OR 1".parse::<Accession>().unwrap_err();
        assert_matches!(err, GrabberError::InvalidAccession(_));
        let err = "a&b".parse::<Accession>().unwrap_err();
        assert_matches!(err, GrabberError::InvalidAccession(_));
        let err = "...".parse::<Accession>().unwrap_err();
        assert_matches!(err, GrabberError::InvalidAccession(_));
    }

    #[test]
    fn only_fasta_is_supported() {
        assert_eq!(ReturnType::Fasta.ensure_supported().unwrap(), ReturnType::Fasta);
        assert_matches!(
            ReturnType::Gb.ensure_supported(),
            Err(GrabberError::UnsupportedReturnType(name)) if name == "gb"
        );
    }

    #[test]
    fn session_requires_both_values() {
        assert_matches!(
            SearchSession::new("1", ""),
            Err(GrabberError::MissingSession(_))
        );
        assert_matches!(
            SearchSession::new("", "MCID_1"),
            Err(GrabberError::MissingSession(_))
        );
    }

    #[test]
    fn header_strips_carriage_return() {
        let record = SequenceRecord::from_text(">seq1 demo\r\nACGT\r\n".to_string());
        assert_eq!(record.header(), ">seq1 demo");
    }
}
