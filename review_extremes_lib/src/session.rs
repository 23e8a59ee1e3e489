//! The page-loading session shared by every row of a run.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use storefront_api::{Client, Error, Page};

use crate::config::PacingConfig;
use crate::error::AgentError;

/// Something that can turn a URL into page markup.
///
/// The agent only talks to pages through this trait, so a run can be driven
/// by a live [`BrowserSession`] or by canned markup in tests.
pub trait PageSource {
    fn load(&mut self, url: &str) -> impl Future<Output = Result<Page, Error>> + Send;

    /// Tears the source down. Called once when a run ends, however it ends.
    fn release(&mut self) {}
}

/// A single long-lived page session.
///
/// Holds one HTTP client (and its cookie jar) for the whole run, spaces
/// consecutive loads with a random pause, and gives the operator a fixed
/// window to clear challenge pages.
pub struct BrowserSession {
    client: Option<Client>,
    pacing: PacingConfig,
    /// When the previous page load started, for pacing.
    last_load: Option<Instant>,
    pages_loaded: usize,
}

impl BrowserSession {
    /// Opens a session with the given timing. Invalid timing is rejected
    /// before any client is built.
    pub fn launch(pacing: PacingConfig) -> Result<Self, AgentError> {
        pacing.validate()?;
        let client = Client::with_timeout(pacing.request_timeout())?;
        tracing::info!("Page session started ({})", client.user_agent());
        Ok(Self {
            client: Some(client),
            pacing,
            last_load: None,
            pages_loaded: 0,
        })
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Pause owed before the next load: a fresh random draw from the
    /// configured range, minus the time already spent since the last load.
    fn pacing_delay(&self) -> Option<Duration> {
        let last = self.last_load?;
        let (min, max) = (
            self.pacing.row_delay_min_secs,
            self.pacing.row_delay_max_secs,
        );
        let secs = if max > min {
            rand::thread_rng().gen_range(min..max)
        } else {
            min
        };
        let delay = match Duration::try_from_secs_f64(secs) {
            Ok(delay) => delay,
            Err(e) => {
                tracing::warn!("Ignoring unusable page delay {}s: {}", secs, e);
                return None;
            }
        };
        let elapsed = last.elapsed();
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    async fn pace(&mut self) {
        if let Some(dur) = self.pacing_delay() {
            tracing::info!("Pausing {:.1}s before next page", dur.as_secs_f64());
            tokio::time::sleep(dur).await;
        }
        self.last_load = Some(Instant::now());
    }

    async fn fetch(&self, url: &str) -> Result<Page, Error> {
        match &self.client {
            Some(client) => client.fetch_page(url).await,
            None => {
                tracing::error!("Page session already released");
                Err(Error::RequestFailed)
            }
        }
    }

    /// Loads `url`, waiting out a challenge page once and letting the page
    /// settle before handing back its markup.
    pub async fn load_page(&mut self, url: &str) -> Result<Page, Error> {
        self.pace().await;
        let mut page = self.fetch(url).await?;
        self.pages_loaded += 1;

        if page.is_challenge() {
            tracing::warn!(
                "Challenge page detected ({}). Solve it manually; waiting {}s",
                page.title,
                self.pacing.challenge_wait_secs
            );
            tokio::time::sleep(self.pacing.challenge_wait()).await;
            page = self.fetch(url).await?;
            if page.is_challenge() {
                tracing::warn!("Still on a challenge page, continuing with what was served");
            }
        }

        let settle = self.pacing.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(page)
    }

    /// Closes the session. Safe to call more than once.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::info!("Page session closed after {} pages", self.pages_loaded);
        }
    }
}

impl PageSource for BrowserSession {
    fn load(&mut self, url: &str) -> impl Future<Output = Result<Page, Error>> + Send {
        self.load_page(url)
    }

    fn release(&mut self) {
        self.close();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.close();
    }
}
