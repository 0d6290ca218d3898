/// Presentation state for one run of the app
///
/// All mutable UI state lives in `Session` and changes only through its
/// methods. Network responses come back tagged with the `Ticket` of the
/// request that produced them; anything older than the newest applied
/// response is dropped, so a slow early request can never overwrite a
/// newer result.

use iced::widget::image::Handle;
use std::collections::HashMap;

use super::data::{format_percent, AnalysisResult, Recommendation, RecommendationOutcome};
use crate::api::ApiError;
use crate::capture::uploader::CropSession;
use crate::capture::{CaptureError, CropRegion, DisplaySize, ImageUploader, SelectedImage};

/// Shown for any failed analysis; details go to the log
pub const ANALYSIS_FAILED: &str = "An error occurred while analyzing the image.";

/// Sequence number of an outstanding image load or analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// What the window is currently showing, derived from the session data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected
    Idle,
    /// File dialog open
    Selecting,
    /// Image chosen, not analyzed yet
    Selected,
    Cropping,
    /// At least one analysis newer than the displayed one is outstanding
    Analyzing,
    ShowingResult,
    /// The newest analysis failed
    Error,
}

/// Prediction panel contents
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub label: String,
    /// e.g. "87.00%"
    pub confidence: Option<String>,
    /// Other classes with their probability, highest first
    pub breakdown: Vec<(String, f64)>,
}

/// Recommendation panel contents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecommendationsView<'a> {
    /// No result to recommend for
    Hidden,
    Loading,
    Products(&'a [Recommendation]),
    Empty,
    Failed(&'a str),
}

#[derive(Debug, Default)]
pub struct Session {
    uploader: ImageUploader,
    /// Decoded-on-demand preview of the current image
    preview: Option<Handle>,
    picking: bool,
    result: Option<(Ticket, AnalysisResult)>,
    /// `None` while the fetch for the current result is outstanding
    recommendations: Option<RecommendationOutcome>,
    /// Product pictures keyed by URL, for the current result only
    thumbnails: HashMap<String, Handle>,
    recommendations_open: bool,
    /// Failure of the newest analysis
    error: Option<String>,
    /// Inline message for rejected user actions
    notice: Option<String>,
    /// Last analysis ticket handed out
    issued: u64,
    /// Newest analysis ticket whose response was applied; older ones are void
    applied: u64,
    /// Same pair for background image loads
    loads_issued: u64,
    loads_applied: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Capture ==========

    pub fn begin_pick(&mut self) {
        self.picking = true;
        self.notice = None;
    }

    pub fn pick_cancelled(&mut self) {
        self.picking = false;
    }

    /// Issue a ticket for loading a picked or dropped file.
    pub fn begin_load(&mut self) -> Ticket {
        self.picking = false;
        self.loads_issued += 1;
        Ticket(self.loads_issued)
    }

    /// Apply a finished load.
    ///
    /// Returns `Ok(false)` when the load was superseded by a newer one or
    /// voided by `remove`; nothing changes then.
    pub fn finish_load(&mut self, ticket: Ticket, result: Result<SelectedImage, CaptureError>) -> Result<bool, CaptureError> {
        if ticket.0 <= self.loads_applied {
            log::debug!("Dropping stale image load #{} (applied #{})", ticket.0, self.loads_applied);
            return Ok(false);
        }
        self.loads_applied = ticket.0;

        match result {
            Ok(image) => self.select(image).map(|()| true),
            Err(err) => {
                self.load_failed(&err);
                Err(err)
            }
        }
    }

    /// Make `image` the current image and rebuild the preview.
    pub fn select(&mut self, image: SelectedImage) -> Result<(), CaptureError> {
        self.picking = false;
        match self.uploader.select(image) {
            Ok(image) => {
                // the old handle is dropped here, releasing its texture
                self.preview = Some(Handle::from_bytes(image.bytes.clone()));
                self.error = None;
                self.notice = None;
                Ok(())
            }
            Err(err) => {
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// A picked file could not be loaded
    fn load_failed(&mut self, err: &CaptureError) {
        self.picking = false;
        self.notice = Some(err.to_string());
    }

    pub fn begin_crop(&mut self, displayed: DisplaySize) -> Result<CropRegion, CaptureError> {
        let result = self.uploader.begin_crop(displayed);
        self.note(&result);
        result
    }

    pub fn update_crop(&mut self, region: CropRegion) -> Result<CropRegion, CaptureError> {
        self.uploader.update_crop(region)
    }

    /// Replace the image with its crop. Crop mode stays on if this fails.
    pub fn apply_crop(&mut self, region: CropRegion) -> Result<(), CaptureError> {
        match self.uploader.apply_crop(region) {
            Ok(image) => {
                self.preview = Some(Handle::from_bytes(image.bytes.clone()));
                self.error = None;
                self.notice = None;
                Ok(())
            }
            Err(err) => {
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn cancel_crop(&mut self) {
        self.uploader.cancel_crop();
    }

    /// Clear the image, preview, crop, result and recommendations together.
    ///
    /// Every outstanding request is voided so nothing lands afterwards.
    pub fn remove(&mut self) {
        self.uploader.remove();
        self.preview = None;
        self.result = None;
        self.recommendations = None;
        self.thumbnails.clear();
        self.recommendations_open = false;
        self.error = None;
        self.notice = None;
        self.applied = self.issued;
        self.loads_applied = self.loads_issued;
    }

    // ========== Analysis ==========

    /// Issue a ticket for uploading the current image.
    ///
    /// Fails with `ApiError::Validation` when nothing is selected; that
    /// leaves the displayed result untouched.
    pub fn begin_analysis(&mut self) -> Result<(Ticket, SelectedImage), ApiError> {
        let Some(image) = self.uploader.image() else {
            self.notice = Some(ApiError::Validation.to_string());
            return Err(ApiError::Validation);
        };
        let image = image.clone();

        self.issued += 1;
        self.notice = None;
        Ok((Ticket(self.issued), image))
    }

    /// Apply an analysis response.
    ///
    /// Returns the label to fetch recommendations for when a new result was
    /// applied. Stale responses return `None` and change nothing. A failure
    /// keeps the previous result on screen.
    pub fn finish_analysis(&mut self, ticket: Ticket, result: Result<AnalysisResult, ApiError>) -> Option<String> {
        if ticket.0 <= self.applied {
            log::debug!("Dropping stale analysis response #{} (applied #{})", ticket.0, self.applied);
            return None;
        }
        self.applied = ticket.0;

        match result {
            Ok(result) => {
                let label = result.label.clone();
                self.result = Some((ticket, result));
                self.recommendations = None;
                self.thumbnails.clear();
                self.error = None;
                Some(label)
            }
            Err(err) => {
                log::error!("❌ Analysis #{} failed: {}", ticket.0, err);
                self.error = Some(ANALYSIS_FAILED.to_string());
                None
            }
        }
    }

    /// Apply recommendations fetched for the result of `ticket`.
    ///
    /// Returns false (and drops the outcome) if that result is no longer
    /// the one on screen.
    pub fn finish_recommendations(&mut self, ticket: Ticket, outcome: RecommendationOutcome) -> bool {
        if self.current_ticket() != Some(ticket) {
            log::debug!("Dropping recommendations for superseded analysis #{}", ticket.0);
            return false;
        }
        self.recommendations = Some(outcome);
        true
    }

    /// Store a product picture for the current result.
    pub fn set_thumbnail(&mut self, ticket: Ticket, url: String, bytes: Vec<u8>) -> bool {
        if self.current_ticket() != Some(ticket) {
            return false;
        }
        let known = self
            .recommendations
            .as_ref()
            .is_some_and(|outcome| outcome.products().iter().any(|p| p.product_image == url));
        if known {
            self.thumbnails.insert(url, Handle::from_bytes(bytes));
        }
        known
    }

    pub fn toggle_recommendations(&mut self) {
        self.recommendations_open = !self.recommendations_open;
    }

    // ========== Queries ==========

    pub fn phase(&self) -> Phase {
        if self.uploader.is_cropping() {
            Phase::Cropping
        } else if self.picking {
            Phase::Selecting
        } else if self.issued > self.applied {
            Phase::Analyzing
        } else if self.error.is_some() {
            Phase::Error
        } else if self.result.is_some() {
            Phase::ShowingResult
        } else if self.uploader.image().is_some() {
            Phase::Selected
        } else {
            Phase::Idle
        }
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.uploader.image()
    }

    pub fn preview(&self) -> Option<&Handle> {
        self.preview.as_ref()
    }

    pub fn crop_session(&self) -> Option<&CropSession> {
        self.uploader.crop_session()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref().map(|(_, result)| result)
    }

    pub fn current_ticket(&self) -> Option<Ticket> {
        self.result.as_ref().map(|(ticket, _)| *ticket)
    }

    /// Error of the newest analysis, else the last rejected-action notice
    pub fn message(&self) -> Option<&str> {
        self.error.as_deref().or(self.notice.as_deref())
    }

    pub fn recommendations_open(&self) -> bool {
        self.recommendations_open
    }

    pub fn thumbnail(&self, url: &str) -> Option<&Handle> {
        self.thumbnails.get(url)
    }

    pub fn summary(&self, classes: &[String]) -> Option<ResultSummary> {
        let result = self.result()?;
        let breakdown = result
            .breakdown(classes)
            .into_iter()
            .filter(|(label, _)| !label.eq_ignore_ascii_case(&result.label))
            .collect();

        Some(ResultSummary {
            label: result.label.clone(),
            confidence: result.confidence(classes).map(format_percent),
            breakdown,
        })
    }

    pub fn recommendations(&self) -> RecommendationsView<'_> {
        if self.result.is_none() {
            return RecommendationsView::Hidden;
        }
        match &self.recommendations {
            None => RecommendationsView::Loading,
            Some(RecommendationOutcome::Found(list)) => RecommendationsView::Products(list.as_slice()),
            Some(RecommendationOutcome::Empty) => RecommendationsView::Empty,
            Some(RecommendationOutcome::Failed(reason)) => RecommendationsView::Failed(reason.as_str()),
        }
    }

    fn note<T>(&mut self, result: &Result<T, CaptureError>) {
        self.notice = result.as_ref().err().map(|err| err.to_string());
    }
}
