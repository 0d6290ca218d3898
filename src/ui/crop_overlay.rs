use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::capture::{CropRegion, DisplaySize};
use crate::Message;

/// Darkened area outside the crop square
const SHADE: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.55,
};
/// Crop square outline
const OUTLINE: Color = Color {
    r: 0.23,
    g: 0.51,
    b: 0.96,
    a: 1.0,
};

/// Drawn on top of the preview while cropping.
/// Dragging spans a new square; the session clamps it to the preview.
pub struct CropOverlay {
    pub region: CropRegion,
    pub displayed: DisplaySize,
}

impl Program<Message> for CropOverlay {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let (w, h) = (bounds.width, bounds.height);
        let r = self.region;

        // Four bands around the square: above, below, left, right
        frame.fill_rectangle(Point::ORIGIN, Size::new(w, r.y), SHADE);
        frame.fill_rectangle(
            Point::new(0.0, r.y + r.height),
            Size::new(w, (h - r.y - r.height).max(0.0)),
            SHADE,
        );
        frame.fill_rectangle(Point::new(0.0, r.y), Size::new(r.x, r.height), SHADE);
        frame.fill_rectangle(
            Point::new(r.x + r.width, r.y),
            Size::new((w - r.x - r.width).max(0.0), r.height),
            SHADE,
        );

        let outline = Path::rectangle(Point::new(r.x, r.y), Size::new(r.width, r.height));
        frame.stroke(&outline, Stroke::default().with_color(OUTLINE).with_width(2.0));

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse button press inside the preview - start a new square
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.anchor = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - stop dragging
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.anchor.take().is_some() {
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse move - resize the square if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if let (Some(anchor), Some(pos)) = (state.anchor, cursor.position()) {
                    // relative to the preview; may fall outside while dragging
                    let current = (pos.x - bounds.x, pos.y - bounds.y);
                    let region = CropRegion::from_drag((anchor.x, anchor.y), current, self.displayed);
                    return (canvas::event::Status::Captured, Some(Message::CropChanged(region)));
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(&self, _state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    /// Where the current drag started, relative to the preview
    pub anchor: Option<Point>,
}
