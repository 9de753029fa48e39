use std::error::Error;
use std::fmt;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::info;

use crate::LookupPayload;

/// Deployment the finder page posts against unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "https://decsf.bvsalud.org";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Backend routes a submission can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The term-lookup processor; carries the full seven-field form.
    Finder,
    /// The "submit to site" variant; carries only the display language.
    Site,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Finder => "dmf",
            Route::Site => "dmfs",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The transient form a navigation carries: ordered hidden fields bound to a
/// route. Exists only long enough to be encoded and submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticForm {
    route: Route,
    fields: Vec<(&'static str, String)>,
}

impl SyntheticForm {
    /// Materializes the full lookup form. Field order is part of the wire
    /// contract and never changes.
    pub fn for_lookup(payload: LookupPayload) -> Self {
        let term_types = payload.term_types_field();
        Self {
            route: Route::Finder,
            fields: vec![
                ("inputLang", payload.input_lang),
                ("outLang", payload.out_lang),
                ("inputText", payload.input_text),
                ("termTypes", term_types),
                ("lang", payload.lang),
                ("isFirstLoad", payload.is_first_load.to_string()),
                ("showSR", payload.show_sr.to_string()),
            ],
        }
    }

    /// Materializes the single-field language form for the site route.
    pub fn for_site(language: &str) -> Self {
        Self {
            route: Route::Site,
            fields: vec![("lang", language.to_string())],
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Percent-encodes the field values into a form-urlencoded body.
    pub fn encoded_body(&self) -> String {
        let mut body = String::new();
        for (name, value) in &self.fields {
            if !body.is_empty() {
                body.push('&');
            }
            body.push_str(name);
            body.push('=');
            body.push_str(&encode_component(value));
        }
        body
    }
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// The page a navigation landed on.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

#[derive(Debug)]
pub enum DispatchError {
    Navigation(reqwest::Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Navigation(err) => write!(f, "navigation failed: {err}"),
        }
    }
}

impl Error for DispatchError {}

impl From<reqwest::Error> for DispatchError {
    fn from(value: reqwest::Error) -> Self {
        DispatchError::Navigation(value)
    }
}

/// Performs the blocking POST navigations the page would.
pub struct Dispatcher {
    base_url: String,
    client: Client,
}

impl Dispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        // No timeout: a navigation blocks until the server answers, and
        // there is no retry path. Redirects are followed as a browser would.
        let client = Client::builder()
            .user_agent(concat!("decsfinder-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("construct HTTP client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Submits the full lookup form to the finder route. Consumes the
    /// payload: a submission is built once, sent once, and not reused.
    pub fn submit(&self, payload: LookupPayload) -> Result<LoadedPage, DispatchError> {
        self.post(SyntheticForm::for_lookup(payload))
    }

    /// Switches the site language through the simplified route.
    pub fn submit_to_site(&self, language: &str) -> Result<LoadedPage, DispatchError> {
        self.post(SyntheticForm::for_site(language))
    }

    /// Posts an already-materialized form to its route.
    pub fn post(&self, form: SyntheticForm) -> Result<LoadedPage, DispatchError> {
        let url = format!("{}/{}", self.base_url, form.route().path());
        let body = form.encoded_body();
        info!(route = %form.route(), url = %url, bytes = body.len(), "Submitting form");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()?;
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text()?;
        info!(status, bytes = body.len(), "Navigation landed");
        // Error statuses are still a completed navigation; the landed page
        // is whatever the server rendered for them.
        Ok(LoadedPage {
            final_url,
            status,
            body,
        })
    }
}
