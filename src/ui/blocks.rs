//! Blocks watchface
//!
//! Black date band and gray weather band on top, separated by dotted rows,
//! with the hour and the minute side by side below them.

use embedded_graphics::{
    mono_font::iso_8859_1::FONT_10X20,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::Alignment,
};
use profont::PROFONT_24_POINT;

use super::{
    color_from_hex, ColorMode, FaceState, Label, Scale, WatchFace, BLACK, DARK_GRAY, LIGHT_GRAY,
    WHITE,
};

/// Distance between dots of a separator row
const DOT_PITCH: usize = 4;
const DOT_SIZE: u32 = 2;

pub struct BlocksFace {
    scale: Scale,
    date_band: Rectangle,
    weather_band: Rectangle,
    divider: Rectangle,
    /// Separator rows and their colour
    dot_rows: [(i32, ColorMode); 2],
    date_label: Label,
    weather_label: Label,
    hour_label: Label,
    minute_label: Label,
}

impl WatchFace for BlocksFace {
    fn new(bounds: Rectangle) -> Self {
        let scale = Scale::new(bounds);

        Self {
            scale,
            date_band: scale.rect(0, 0, 144, 50),
            weather_band: scale.rect(0, 50, 144, 50),
            divider: scale.rect(144 / 2 - 4, 146, 6, 6),
            dot_rows: [(scale.y(49), WHITE), (scale.y(100), DARK_GRAY)],
            date_label: Label::new(scale.rect(0, 10, 144, 28), &FONT_10X20, WHITE, Alignment::Center),
            weather_label: Label::new(scale.rect(0, 60, 144, 28), &FONT_10X20, BLACK, Alignment::Center),
            hour_label: Label::new(
                scale.rect(0, 100, 144 / 2 - 5, 55),
                &PROFONT_24_POINT,
                BLACK,
                Alignment::Right,
            ),
            minute_label: Label::new(
                scale.rect(144 / 2 + 10, 100, 144 / 2 - 5, 55),
                &PROFONT_24_POINT,
                BLACK,
                Alignment::Left,
            ),
        }
    }

    fn draw<D>(&self, state: &FaceState<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        // Clockface
        let face = if state.background_on {
            color_from_hex(state.background_color)
        } else {
            WHITE
        };
        self.scale
            .bounds()
            .into_styled(PrimitiveStyle::with_fill(face))
            .draw(target)?;

        self.date_band
            .into_styled(PrimitiveStyle::with_fill(BLACK))
            .draw(target)?;
        self.weather_band
            .into_styled(PrimitiveStyle::with_fill(LIGHT_GRAY))
            .draw(target)?;
        self.divider
            .into_styled(PrimitiveStyle::with_fill(BLACK))
            .draw(target)?;

        let bounds = self.scale.bounds();
        for (y, color) in self.dot_rows {
            let style = PrimitiveStyle::with_fill(color);
            for x in (0..bounds.size.width as i32).step_by(DOT_PITCH) {
                Rectangle::new(
                    Point::new(bounds.top_left.x + x, y),
                    Size::new(DOT_SIZE, DOT_SIZE),
                )
                .into_styled(style)
                .draw(target)?;
            }
        }

        self.date_label.draw(state.date, target)?;
        self.weather_label.draw(state.weather, target)?;
        self.hour_label.draw(state.hour, target)?;
        self.minute_label.draw(state.minute, target)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Framebuffer;
    use super::*;

    fn screen() -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(240, 240))
    }

    fn state(background_on: bool) -> FaceState<'static> {
        FaceState {
            hour: "10",
            minute: "42",
            date: "Mon 04",
            weather: "",
            background_on,
            background_color: 0x00AA55,
        }
    }

    #[test]
    fn draws_bands_dots_and_divider() {
        let face = BlocksFace::new(screen());
        let mut fb = Framebuffer::new(240, 240);
        face.draw(&state(false), &mut fb).unwrap();

        // Date band
        assert_eq!(fb.pixel(1, 1), BLACK);
        // Weather band, empty weather text
        assert_eq!(fb.pixel(1, 80), LIGHT_GRAY);
        // Dotted separators
        assert_eq!(fb.pixel(0, 70), WHITE);
        assert_eq!(fb.pixel(2, 70), BLACK);
        assert_eq!(fb.pixel(4, 142), DARK_GRAY);
        // Divider between hour and minute
        assert_eq!(fb.pixel(117, 211), BLACK);
        // Plain white clockface
        assert_eq!(fb.pixel(1, 235), WHITE);
    }

    #[test]
    fn custom_background_fills_the_clockface() {
        let face = BlocksFace::new(screen());
        let mut fb = Framebuffer::new(240, 240);
        face.draw(&state(true), &mut fb).unwrap();

        assert_eq!(fb.pixel(1, 235), color_from_hex(0x00AA55));
        assert_eq!(fb.pixel(1, 1), BLACK);
    }

    #[test]
    fn time_and_date_land_in_their_frames() {
        let face = BlocksFace::new(screen());
        let mut fb = Framebuffer::new(240, 240);
        face.draw(&state(false), &mut fb).unwrap();

        assert!(fb.count(face.date_label.frame(), WHITE) > 0);
        assert!(fb.count(face.hour_label.frame(), BLACK) > 0);
        assert!(fb.count(face.minute_label.frame(), BLACK) > 0);
    }
}
