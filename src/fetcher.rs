use std::fs::{self, File};
use std::io::{self, Write};
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::{DEFAULT_OUTPUT_DIR, Endpoint};
use crate::domain::{Accession, ReturnType, SearchSession, SequenceRecord};
use crate::error::GrabberError;
use crate::eutils::{self, EutilsTransport};
use crate::output::{Phase, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FetchState {
    Unsearched,
    Searched,
    Fetched,
    Saved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    File(Utf8PathBuf),
    Stdout,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub session: SearchSession,
    pub raw_response: String,
}

pub fn search_session<T, S>(
    transport: &T,
    endpoint: &Endpoint,
    accession: &Accession,
    sink: &S,
) -> Result<SearchOutcome, GrabberError>
where
    T: EutilsTransport + ?Sized,
    S: ProgressSink + ?Sized,
{
    let url = eutils::search_url(endpoint, accession)?;
    sink.event(ProgressEvent::new(
        Phase::Search,
        format!("searching {} for {accession}", eutils::DATABASE),
    ));
    let started = Instant::now();
    let raw_response = transport.get(&url)?;
    let session = eutils::parse_search_response(&raw_response, accession)?;
    sink.event(
        ProgressEvent::new(
            Phase::Search,
            format!(
                "query_key={} WebEnv={}",
                session.query_key(),
                session.web_env()
            ),
        )
        .with_elapsed(started.elapsed()),
    );
    Ok(SearchOutcome {
        session,
        raw_response,
    })
}

pub fn fetch_record<T, S>(
    transport: &T,
    endpoint: &Endpoint,
    session: &SearchSession,
    return_type: ReturnType,
    sink: &S,
) -> Result<SequenceRecord, GrabberError>
where
    T: EutilsTransport + ?Sized,
    S: ProgressSink + ?Sized,
{
    let url = eutils::fetch_url(endpoint, session, return_type)?;
    sink.event(ProgressEvent::new(
        Phase::Fetch,
        format!("fetching {return_type} for query_key={}", session.query_key()),
    ));
    let started = Instant::now();
    let body = transport.get(&url)?;
    if body.trim().is_empty() {
        return Err(GrabberError::RecordNotFound(format!(
            "efetch returned an empty body for query_key={}",
            session.query_key()
        )));
    }
    let record = SequenceRecord::from_text(body);
    sink.event(
        ProgressEvent::new(
            Phase::Fetch,
            format!("{} ({} bytes)", record.header(), record.text().len()),
        )
        .with_elapsed(started.elapsed()),
    );
    Ok(record)
}

pub fn retrieve<T, S>(
    transport: &T,
    endpoint: &Endpoint,
    accession: &Accession,
    return_type: ReturnType,
    sink: &S,
) -> Result<SequenceRecord, GrabberError>
where
    T: EutilsTransport + ?Sized,
    S: ProgressSink + ?Sized,
{
    return_type.ensure_supported()?;
    let outcome = search_session(transport, endpoint, accession, sink)?;
    fetch_record(transport, endpoint, &outcome.session, return_type, sink)
}

pub struct RecordFetcher<T: EutilsTransport, S: ProgressSink> {
    transport: T,
    sink: S,
    endpoint: Endpoint,
    accession: Accession,
    return_type: ReturnType,
    output_filename: Option<String>,
    output_dir: Utf8PathBuf,
    session: Option<SearchSession>,
    raw_search_response: Option<String>,
    record: Option<SequenceRecord>,
    saved: bool,
}

impl<T: EutilsTransport, S: ProgressSink> RecordFetcher<T, S> {
    pub fn new(transport: T, sink: S, endpoint: Endpoint, accession: Accession) -> Self {
        Self {
            transport,
            sink,
            endpoint,
            accession,
            return_type: ReturnType::Fasta,
            output_filename: None,
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            session: None,
            raw_search_response: None,
            record: None,
            saved: false,
        }
    }

    pub fn with_output(mut self, filename: Option<String>, dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_filename = filename.filter(|name| !name.is_empty());
        self.output_dir = dir.into();
        self
    }

    pub fn with_return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn accession(&self) -> &Accession {
        &self.accession
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    pub fn output_path(&self) -> Option<Utf8PathBuf> {
        self.output_filename
            .as_ref()
            .map(|name| self.output_dir.join(name))
    }

    pub fn state(&self) -> FetchState {
        if self.saved {
            FetchState::Saved
        } else if self.record.is_some() {
            FetchState::Fetched
        } else if self.session.is_some() {
            FetchState::Searched
        } else {
            FetchState::Unsearched
        }
    }

    pub fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    pub fn raw_search_response(&self) -> Option<&str> {
        self.raw_search_response.as_deref()
    }

    pub fn record(&self) -> Option<&SequenceRecord> {
        self.record.as_ref()
    }

    pub fn record_text(&self) -> &str {
        self.record.as_ref().map(SequenceRecord::text).unwrap_or("")
    }

    pub fn record_header(&self) -> &str {
        self.record.as_ref().map(SequenceRecord::header).unwrap_or("")
    }

    /// Runs esearch once; later calls return the cached session.
    pub fn search(&mut self) -> Result<&SearchSession, GrabberError> {
        if self.session.is_none() {
            let outcome =
                search_session(&self.transport, &self.endpoint, &self.accession, &self.sink)?;
            self.raw_search_response = Some(outcome.raw_response);
            self.session = Some(outcome.session);
        } else {
            tracing::debug!(accession = %self.accession, "reusing cached search session");
        }
        self.session
            .as_ref()
            .ok_or_else(|| GrabberError::MissingSession(self.accession.to_string()))
    }

    pub fn fetch(&mut self) -> Result<&SequenceRecord, GrabberError> {
        self.return_type.ensure_supported()?;
        if self.session.is_none() {
            self.search()?;
        }
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| GrabberError::MissingSession(self.accession.to_string()))?;
        let record = fetch_record(
            &self.transport,
            &self.endpoint,
            session,
            self.return_type,
            &self.sink,
        )?;
        Ok(self.record.insert(record))
    }

    pub fn save(&mut self) -> Result<SaveOutcome, GrabberError> {
        let stdout = io::stdout();
        self.save_to(stdout.lock())
    }

    /// Like [`save`](Self::save) but sends filename-less output to `writer`.
    pub fn save_to<W: Write>(&mut self, mut writer: W) -> Result<SaveOutcome, GrabberError> {
        self.ensure_output_dir()?;
        if self.record.is_none() {
            self.fetch()?;
        }
        let text = self.record_text();

        let outcome = match self.output_path() {
            Some(path) => {
                let mut file = File::create(path.as_std_path())
                    .map_err(|err| GrabberError::Filesystem(format!("create {path}: {err}")))?;
                file.write_all(text.as_bytes())
                    .map_err(|err| GrabberError::Filesystem(format!("write {path}: {err}")))?;
                SaveOutcome::File(path)
            }
            None => {
                writer
                    .write_all(text.as_bytes())
                    .and_then(|()| writer.flush())
                    .map_err(|err| GrabberError::Filesystem(format!("write stdout: {err}")))?;
                SaveOutcome::Stdout
            }
        };

        let message = match &outcome {
            SaveOutcome::File(path) => format!("wrote {} bytes to {path}", text.len()),
            SaveOutcome::Stdout => format!("wrote {} bytes to stdout", text.len()),
        };
        self.sink.event(ProgressEvent::new(Phase::Save, message));
        self.saved = true;
        Ok(outcome)
    }

    fn ensure_output_dir(&self) -> Result<(), GrabberError> {
        fs::create_dir_all(self.output_dir.as_std_path()).map_err(|err| {
            GrabberError::Filesystem(format!("create directory {}: {err}", self.output_dir))
        })
    }
}
