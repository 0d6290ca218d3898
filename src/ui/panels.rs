/// Widget builders for the main window
///
/// Everything here is a pure function of the session; user actions come
/// back as `Message`s.

use iced::widget::{button, canvas, container, image, row, stack, text, Column, Row};
use iced::{Alignment, ContentFit, Element, Length};

use super::chart::ProbabilityChart;
use super::crop_overlay::CropOverlay;
use crate::capture::DisplaySize;
use crate::state::data::Recommendation;
use crate::state::session::{Phase, RecommendationsView, ResultSummary, Session};
use crate::Message;

/// Largest area the preview is drawn in
pub const PREVIEW_BOX: DisplaySize = DisplaySize {
    width: 480.0,
    height: 360.0,
};

/// Side of a product thumbnail
const THUMBNAIL_SIZE: f32 = 64.0;

/// Drop zone / preview / crop editor
pub fn uploader_panel(session: &Session) -> Element<'_, Message> {
    let content: Element<'_, Message> = match (session.preview(), session.image()) {
        (Some(handle), Some(selected)) => {
            let displayed = match session.crop_session() {
                Some(crop) => crop.displayed,
                None => DisplaySize::fit_within(selected.dimensions(), PREVIEW_BOX),
            };
            let width = Length::Fixed(displayed.width);
            let height = Length::Fixed(displayed.height);

            let preview = image(handle.clone())
                .width(width)
                .height(height)
                .content_fit(ContentFit::Fill);

            match session.crop_session() {
                Some(crop) => stack![
                    preview,
                    canvas(CropOverlay {
                        region: crop.region,
                        displayed: crop.displayed,
                    })
                    .width(width)
                    .height(height),
                ]
                .into(),
                None => preview.into(),
            }
        }
        _ => button(
            Column::new()
                .push(text("Drop Image Here").size(20))
                .push(text("- or -").size(14))
                .push(text("Click to Upload").size(20))
                .spacing(6)
                .align_x(Alignment::Center),
        )
        .style(button::text)
        .padding(40)
        .on_press(Message::PickImage)
        .into(),
    };

    container(content)
        .padding(16)
        .width(Length::Fill)
        .center_x(Length::Fill)
        .style(container::bordered_box)
        .into()
}

/// Buttons under the preview. Choosing another image is hidden while cropping.
pub fn controls(session: &Session) -> Element<'_, Message> {
    let phase = session.phase();
    let has_image = session.image().is_some();

    let mut controls = Row::new().spacing(10);

    if phase == Phase::Cropping {
        controls = controls
            .push(button("Apply Crop").on_press(Message::ApplyCrop).padding(10))
            .push(button("Cancel").style(button::secondary).on_press(Message::CancelCrop).padding(10));
    } else {
        controls = controls.push(
            button("Choose Image")
                .style(button::secondary)
                .on_press_maybe((phase != Phase::Selecting).then_some(Message::PickImage))
                .padding(10),
        );
        if has_image {
            controls = controls.push(
                button("Crop")
                    .style(button::secondary)
                    .on_press(Message::StartCrop)
                    .padding(10),
            );
        }
        let label = if phase == Phase::Analyzing { "Analyzing..." } else { "Analyze" };
        controls = controls.push(button(label).on_press(Message::Analyze).padding(10));
    }

    if has_image {
        controls = controls.push(
            button("Remove")
                .style(button::danger)
                .on_press(Message::RemoveImage)
                .padding(10),
        );
    }

    controls.into()
}

/// Predicted label, confidence and runner-up classes
pub fn prediction_panel<'a>(summary: ResultSummary) -> Element<'a, Message> {
    let mut content = Column::new()
        .push(text("Prediction").size(18))
        .push(text(summary.label).size(28))
        .spacing(8);

    if let Some(confidence) = summary.confidence {
        content = content.push(text(format!("Confidence: {}", confidence)).size(16));
    }

    if !summary.breakdown.is_empty() {
        let chart = ProbabilityChart {
            bars: summary.breakdown,
        };
        let height = chart.height();
        content = content.push(canvas(chart).width(Length::Fill).height(Length::Fixed(height)));
    }

    container(content)
        .padding(20)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

/// Collapsible list of recommended products for the current label
pub fn recommendations_panel(session: &Session) -> Element<'_, Message> {
    let view = session.recommendations();
    let label = match (view, session.result()) {
        (RecommendationsView::Hidden, _) | (_, None) => return Column::new().into(),
        (_, Some(result)) => result.label.as_str(),
    };

    let header = button(
        row![
            text(format!("Recommended for {}", label)).size(18).width(Length::Fill),
            text(if session.recommendations_open() { "Hide" } else { "Show" }).size(14),
        ]
        .align_y(Alignment::Center),
    )
    .style(button::secondary)
    .width(Length::Fill)
    .padding(14)
    .on_press(Message::ToggleRecommendations);

    let mut panel = Column::new().push(header);

    if session.recommendations_open() {
        let body: Element<'_, Message> = match view {
            RecommendationsView::Loading => text("Loading recommendations...").into(),
            RecommendationsView::Empty => text("No recommended products for this condition yet.").into(),
            RecommendationsView::Failed(reason) => {
                text(format!("Could not load recommendations: {}", reason)).into()
            }
            RecommendationsView::Products(products) => Column::with_children(
                products.iter().map(|product| product_entry(session, product)),
            )
            .spacing(10)
            .into(),
            RecommendationsView::Hidden => Column::new().into(),
        };
        panel = panel.push(container(body).padding(16).width(Length::Fill));
    }

    container(panel)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

/// One product row: thumbnail (once downloaded) and a link button
fn product_entry<'a>(session: &'a Session, product: &'a Recommendation) -> Element<'a, Message> {
    let size = Length::Fixed(THUMBNAIL_SIZE);
    let thumbnail: Element<'a, Message> = match session.thumbnail(&product.product_image) {
        Some(handle) => image(handle.clone()).width(size).height(size).into(),
        None => container(text(""))
            .width(size)
            .height(size)
            .style(container::bordered_box)
            .into(),
    };

    let link = button(text(&product.product_name).size(16))
        .style(button::text)
        .on_press(Message::OpenLink(product.product_link.clone()));

    row![thumbnail, link]
        .spacing(16)
        .align_y(Alignment::Center)
        .into()
}
