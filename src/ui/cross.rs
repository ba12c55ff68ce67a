//! Cross watchface

use embedded_graphics::{
    mono_font::iso_8859_1::FONT_10X20,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::Alignment,
};
use profont::PROFONT_24_POINT;

use super::{color_from_hex, ColorMode, FaceState, Label, Scale, WatchFace, BLACK, DARK_GRAY, WHITE};

const STROKE_WIDTH: i32 = 2;

pub struct CrossFace {
    scale: Scale,
    strokes: [Line; 2],
    stroke_width: u32,
    /// Drawn in the background colour
    hour_label: Label,
    minute_label: Label,
    date_label: Label,
    weather_label: Label,
}

impl WatchFace for CrossFace {
    fn new(bounds: Rectangle) -> Self {
        let scale = Scale::new(bounds);
        let middle = 144 / 2 - 2;

        Self {
            scale,
            strokes: [
                Line::new(scale.point(18, 28), scale.point(125, 140)),
                Line::new(scale.point(125, 28), scale.point(18, 140)),
            ],
            stroke_width: scale.dx(STROKE_WIDTH).max(1) as u32,
            hour_label: Label::new(scale.rect(0, 5, 144, 60), &PROFONT_24_POINT, BLACK, Alignment::Center),
            minute_label: Label::new(scale.rect(0, 100, 144, 60), &PROFONT_24_POINT, BLACK, Alignment::Center),
            date_label: Label::new(scale.rect(18, middle, 144, 60), &FONT_10X20, DARK_GRAY, Alignment::Left),
            weather_label: Label::new(scale.rect(85, middle, 41, 28), &FONT_10X20, DARK_GRAY, Alignment::Right),
        }
    }

    fn draw<D>(&self, state: &FaceState<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        self.scale
            .bounds()
            .into_styled(PrimitiveStyle::with_fill(WHITE))
            .draw(target)?;

        let stroke = PrimitiveStyle::with_stroke(BLACK, self.stroke_width);
        for line in self.strokes {
            line.into_styled(stroke).draw(target)?;
        }

        self.date_label.draw(state.date, target)?;
        self.weather_label.draw(state.weather, target)?;
        self.hour_label
            .draw_colored(state.hour, color_from_hex(state.background_color), target)?;
        self.minute_label.draw(state.minute, target)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Framebuffer;
    use super::*;
    use crate::ui::BLUE_MOON;

    fn state() -> FaceState<'static> {
        FaceState {
            hour: "09",
            minute: "05",
            date: "04 Mon",
            weather: "2024",
            background_on: false,
            background_color: 0x0055FF,
        }
    }

    #[test]
    fn strokes_cross_in_the_middle() {
        let face = CrossFace::new(Rectangle::new(Point::zero(), Size::new(240, 240)));
        let mut fb = Framebuffer::new(240, 240);
        face.draw(&state(), &mut fb).unwrap();

        assert_eq!(fb.pixel(119, 120), BLACK);
        assert_eq!(fb.pixel(2, 2), WHITE);
    }

    #[test]
    fn hour_uses_the_background_colour() {
        let face = CrossFace::new(Rectangle::new(Point::zero(), Size::new(240, 240)));
        let mut fb = Framebuffer::new(240, 240);
        face.draw(&state(), &mut fb).unwrap();

        assert!(fb.count(face.hour_label.frame(), BLUE_MOON) > 0);
        assert!(fb.count(face.minute_label.frame(), BLACK) > 0);
        assert!(fb.count(face.weather_label.frame(), DARK_GRAY) > 0);

        let custom = FaceState {
            background_on: true,
            background_color: 0xFF00AA,
            ..state()
        };
        face.draw(&custom, &mut fb).unwrap();
        assert!(fb.count(face.hour_label.frame(), color_from_hex(0xFF00AA)) > 0);
        assert_eq!(fb.count(face.hour_label.frame(), BLUE_MOON), 0);
    }
}
