/// Horizontal bar chart of the runner-up class probabilities
use iced::widget::canvas::{self, Frame, Text};
use iced::{Color, Pixels, Point, Rectangle, Size};

use crate::state::data::format_percent;
use crate::Message;

/// Height of one bar row in logical pixels
pub const ROW_HEIGHT: f32 = 26.0;
/// Width reserved for the label column
const LABEL_WIDTH: f32 = 140.0;

const BAR_COLOR: Color = Color {
    r: 0.38,
    g: 0.65,
    b: 0.98,
    a: 0.8,
};

/// Probability chart data: (label, probability in [0, 1])
#[derive(Debug, Clone)]
pub struct ProbabilityChart {
    pub bars: Vec<(String, f64)>,
}

impl ProbabilityChart {
    pub fn height(&self) -> f32 {
        self.bars.len() as f32 * ROW_HEIGHT
    }
}

impl canvas::Program<Message> for ProbabilityChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let bar_area = (bounds.width - LABEL_WIDTH).max(0.0);

        for (row, (label, probability)) in self.bars.iter().enumerate() {
            let y = row as f32 * ROW_HEIGHT;

            frame.fill_text(Text {
                content: format!("{}  {}", label, format_percent(*probability)),
                position: Point::new(0.0, y + 4.0),
                color: Color::WHITE,
                size: Pixels(14.0),
                ..Text::default()
            });

            let width = bar_area * probability.clamp(0.0, 1.0) as f32;
            if width > 0.0 {
                frame.fill_rectangle(
                    Point::new(LABEL_WIDTH, y + 6.0),
                    Size::new(width, ROW_HEIGHT - 12.0),
                    BAR_COLOR,
                );
            }
        }

        vec![frame.into_geometry()]
    }
}
