use iced::event::{self, Event};
use iced::widget::{container, scrollable, text, Column};
use iced::{window, Alignment, Element, Length, Subscription, Task, Theme};
use rfd::AsyncFileDialog;
use std::path::PathBuf;

mod api;
mod capture;
mod config;
mod state;
mod ui;

use api::{with_min_duration, ApiClient, ApiError};
use capture::{CaptureError, CropRegion, DisplaySize, SelectedImage};
use config::Config;
use state::data::{AnalysisResult, RecommendationOutcome};
use state::session::{Phase, RecommendationsView, Session, Ticket};

/// Extensions offered in the file picker
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Main application state
struct VisageCheck {
    /// Everything shown in the window
    session: Session,
    /// Client for the prediction and recommendation endpoints
    client: ApiClient,
    config: Config,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked the drop zone or "Choose Image"
    PickImage,
    /// File dialog closed
    ImagePicked(Option<PathBuf>),
    /// A file was dropped on the window
    FileDropped(PathBuf),
    /// Background load of a picked or dropped file finished
    ImageLoaded(Ticket, Result<SelectedImage, CaptureError>),
    /// Enter crop mode over the current preview
    StartCrop,
    /// The crop square was dragged
    CropChanged(CropRegion),
    /// Replace the image with the selected square
    ApplyCrop,
    /// Leave crop mode and keep the original
    CancelCrop,
    /// Clear the image, result and recommendations
    RemoveImage,
    /// Upload the current image for prediction
    Analyze,
    /// Prediction response for the given request
    AnalysisComplete(Ticket, Result<AnalysisResult, ApiError>),
    /// Products for the label of the given analysis
    RecommendationsLoaded(Ticket, RecommendationOutcome),
    /// Picture for one product (keyed by its URL)
    ThumbnailLoaded(Ticket, String, Result<Vec<u8>, ApiError>),
    /// Expand or collapse the recommendations panel
    ToggleRecommendations,
    /// Open a product page in the browser
    OpenLink(String),
}

impl VisageCheck {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::load().unwrap_or_else(|err| {
            log::warn!("⚠️  {}; using defaults", err);
            Config::default()
        });

        let client = ApiClient::new(&config).unwrap_or_else(|err| {
            log::warn!("⚠️  Could not configure HTTP client ({}); using defaults", err);
            ApiClient::with_http(reqwest::Client::new(), &config)
        });

        log::info!(
            "🔬 VisageCheck ready (predict: {}, recommendations: {})",
            config.predict_url,
            config.recommendations_url
        );

        (
            VisageCheck {
                session: Session::new(),
                client,
                config,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                self.session.begin_pick();
                Task::perform(pick_image_file(), Message::ImagePicked)
            }
            Message::ImagePicked(Some(path)) => self.load_image(path),
            Message::ImagePicked(None) => {
                self.session.pick_cancelled();
                Task::none()
            }
            Message::FileDropped(path) => {
                if self.session.phase() == Phase::Cropping {
                    log::info!("Ignoring dropped file while cropping: {}", path.display());
                    return Task::none();
                }
                self.load_image(path)
            }
            Message::ImageLoaded(ticket, result) => {
                if let Err(err) = self.session.finish_load(ticket, result) {
                    log::warn!("⚠️  Image rejected: {}", err);
                }
                Task::none()
            }
            Message::StartCrop => {
                if let Some(image) = self.session.image() {
                    let displayed = DisplaySize::fit_within(image.dimensions(), ui::panels::PREVIEW_BOX);
                    if let Err(err) = self.session.begin_crop(displayed) {
                        log::warn!("⚠️  Cannot crop: {}", err);
                    }
                }
                Task::none()
            }
            Message::CropChanged(region) => {
                if let Err(err) = self.session.update_crop(region) {
                    log::debug!("Crop update ignored: {}", err);
                }
                Task::none()
            }
            Message::ApplyCrop => {
                if let Some(region) = self.session.crop_session().map(|crop| crop.region) {
                    if let Err(err) = self.session.apply_crop(region) {
                        log::warn!("⚠️  Crop failed: {}", err);
                    }
                }
                Task::none()
            }
            Message::CancelCrop => {
                self.session.cancel_crop();
                Task::none()
            }
            Message::RemoveImage => {
                self.session.remove();
                Task::none()
            }
            Message::Analyze => self.analyze(),
            Message::AnalysisComplete(ticket, result) => match self.session.finish_analysis(ticket, result) {
                Some(label) => self.fetch_recommendations(ticket, label),
                None => Task::none(),
            },
            Message::RecommendationsLoaded(ticket, outcome) => {
                if self.session.finish_recommendations(ticket, outcome) {
                    return self.fetch_thumbnails(ticket);
                }
                Task::none()
            }
            Message::ThumbnailLoaded(ticket, url, Ok(bytes)) => {
                self.session.set_thumbnail(ticket, url, bytes);
                Task::none()
            }
            Message::ThumbnailLoaded(_, url, Err(err)) => {
                log::debug!("Product image {} unavailable: {}", url, err);
                Task::none()
            }
            Message::ToggleRecommendations => {
                self.session.toggle_recommendations();
                Task::none()
            }
            Message::OpenLink(link) => {
                if let Err(err) = ui::links::open_in_browser(&link) {
                    log::warn!("⚠️  Could not open {}: {}", link, err);
                }
                Task::none()
            }
        }
    }

    /// Decode a file in the background. Only the newest load is applied.
    fn load_image(&mut self, path: PathBuf) -> Task<Message> {
        let ticket = self.session.begin_load();
        Task::perform(SelectedImage::load(path), move |result| Message::ImageLoaded(ticket, result))
    }

    /// Upload the current image. Earlier uploads keep running; the session
    /// drops whichever responses arrive out of date.
    fn analyze(&mut self) -> Task<Message> {
        let (ticket, image) = match self.session.begin_analysis() {
            Ok(issued) => issued,
            Err(err) => {
                log::info!("Analyze rejected: {}", err);
                return Task::none();
            }
        };

        let client = self.client.clone();
        let floor = self.config.min_progress();

        Task::perform(
            async move { with_min_duration(client.analyze(Some(&image)), floor).await },
            move |result| Message::AnalysisComplete(ticket, result),
        )
    }

    fn fetch_recommendations(&self, ticket: Ticket, label: String) -> Task<Message> {
        let client = self.client.clone();
        Task::perform(
            async move { client.fetch_recommendations(&label).await },
            move |outcome| Message::RecommendationsLoaded(ticket, outcome),
        )
    }

    /// Download product pictures for the recommendations just applied
    fn fetch_thumbnails(&self, ticket: Ticket) -> Task<Message> {
        let RecommendationsView::Products(products) = self.session.recommendations() else {
            return Task::none();
        };

        let mut urls: Vec<String> = products.iter().map(|p| p.product_image.clone()).collect();
        urls.sort();
        urls.dedup();

        Task::batch(urls.into_iter().map(|url| {
            let client = self.client.clone();
            Task::perform(
                async move {
                    let result = client.fetch_image(&url).await;
                    (url, result)
                },
                move |(url, result)| Message::ThumbnailLoaded(ticket, url, result),
            )
        }))
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = Column::new()
            .push(text("Face Skin Analyzer").size(36))
            .push(
                text("A face condition detector. Kindly upload a partial photo of your face.")
                    .size(16),
            )
            .spacing(8)
            .align_x(Alignment::Center);

        let mut content = Column::new()
            .push(header)
            .push(ui::panels::uploader_panel(&self.session))
            .push(ui::panels::controls(&self.session))
            .spacing(20)
            .padding(40)
            .max_width(720)
            .align_x(Alignment::Center);

        if let Some(message) = self.session.message() {
            content = content.push(text(message).size(14));
        }

        if let Some(summary) = self.session.summary(&self.config.classes) {
            content = content.push(ui::panels::prediction_panel(summary));
        }

        content = content.push(ui::panels::recommendations_panel(&self.session));

        container(scrollable(content).width(Length::Fill))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Forward files dropped on the window
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Show the native file picker without blocking the UI
async fn pick_image_file() -> Option<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Select a Face Photo")
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file()
        .await
        .map(|file| file.path().to_path_buf())
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("VisageCheck", VisageCheck::update, VisageCheck::view)
        .subscription(VisageCheck::subscription)
        .theme(VisageCheck::theme)
        .centered()
        .run_with(VisageCheck::new)
}
