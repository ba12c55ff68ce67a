//! UI definitions module
//!
//! Both skins were laid out for a 144x168 screen. [`Scale`] maps that layout
//! onto whatever bounds the face is created with.

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::{Rgb565, Rgb888},
    prelude::*,
    primitives::Rectangle,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use crate::settings::Skin;

mod blocks;
mod cross;

pub use blocks::BlocksFace;
pub use cross::CrossFace;

pub type ColorMode = Rgb565;

pub const WHITE: ColorMode = Rgb565::WHITE;
pub const BLACK: ColorMode = Rgb565::BLACK;
pub const LIGHT_GRAY: ColorMode = Rgb565::new(21, 42, 21);
pub const DARK_GRAY: ColorMode = Rgb565::new(10, 21, 10);
pub const BLUE_MOON: ColorMode = Rgb565::new(0, 21, 31);

/// Convert a 0xRRGGBB colour
pub fn color_from_hex(hex: u32) -> ColorMode {
    Rgb888::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8).into()
}

pub trait WatchFace {
    /// Create the face for a screen area
    fn new(bounds: Rectangle) -> Self;

    /// Draw the whole face with state
    fn draw<D>(&self, state: &FaceState<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>;
}

/// State for the watch face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceState<'a> {
    pub hour: &'a str,
    pub minute: &'a str,
    pub date: &'a str,
    pub weather: &'a str,
    pub background_on: bool,
    /// 0xRRGGBB
    pub background_color: u32,
}

/// The face of the configured skin
pub enum Face {
    Blocks(BlocksFace),
    Cross(CrossFace),
}

impl Face {
    pub fn new(skin: Skin, bounds: Rectangle) -> Self {
        match skin {
            Skin::Blocks => Face::Blocks(BlocksFace::new(bounds)),
            Skin::Cross => Face::Cross(CrossFace::new(bounds)),
        }
    }

    pub fn draw<D>(&self, state: &FaceState<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        match self {
            Face::Blocks(face) => face.draw(state, target),
            Face::Cross(face) => face.draw(state, target),
        }
    }
}

/// Maps the 144x168 reference layout onto the real bounds
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scale {
    bounds: Rectangle,
}

impl Scale {
    const REF_W: i32 = 144;
    const REF_H: i32 = 168;

    pub(crate) fn new(bounds: Rectangle) -> Self {
        Self { bounds }
    }

    pub(crate) fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub(crate) fn x(&self, x: i32) -> i32 {
        self.bounds.top_left.x + self.dx(x)
    }

    pub(crate) fn y(&self, y: i32) -> i32 {
        self.bounds.top_left.y + self.dy(y)
    }

    pub(crate) fn dx(&self, x: i32) -> i32 {
        x * self.bounds.size.width as i32 / Self::REF_W
    }

    pub(crate) fn dy(&self, y: i32) -> i32 {
        y * self.bounds.size.height as i32 / Self::REF_H
    }

    pub(crate) fn point(&self, x: i32, y: i32) -> Point {
        Point::new(self.x(x), self.y(y))
    }

    pub(crate) fn rect(&self, x: i32, y: i32, w: i32, h: i32) -> Rectangle {
        Rectangle::new(
            self.point(x, y),
            Size::new(self.dx(w).max(1) as u32, self.dy(h).max(1) as u32),
        )
    }
}

/// A text box with a fixed frame, font and alignment
#[derive(Debug, Clone, Copy)]
pub struct Label {
    frame: Rectangle,
    font: &'static MonoFont<'static>,
    color: ColorMode,
    alignment: Alignment,
}

impl Label {
    /// Create new label
    pub fn new(
        frame: Rectangle,
        font: &'static MonoFont<'static>,
        color: ColorMode,
        alignment: Alignment,
    ) -> Self {
        Self {
            frame,
            font,
            color,
            alignment,
        }
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    /// Draw `text` inside the frame, clipped to it
    pub fn draw<D>(&self, text: &str, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        self.draw_colored(text, self.color, target)
    }

    pub fn draw_colored<D>(&self, text: &str, color: ColorMode, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        if text.is_empty() {
            return Ok(());
        }

        let x = match self.alignment {
            Alignment::Left => self.frame.top_left.x,
            Alignment::Center => self.frame.center().x,
            Alignment::Right => self.frame.top_left.x + self.frame.size.width as i32 - 1,
        };
        let character_style = MonoTextStyle::new(self.font, color);
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Top)
            .build();

        Text::with_text_style(
            text,
            Point::new(x, self.frame.top_left.y),
            character_style,
            text_style,
        )
        .draw(&mut target.clipped(&self.frame))?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use core::convert::Infallible;

    use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

    /// In-memory RGB565 screen
    pub struct Framebuffer {
        size: Size,
        pixels: Vec<Rgb565>,
    }

    impl Framebuffer {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                size: Size::new(width, height),
                pixels: vec![Rgb565::new(1, 2, 3); (width * height) as usize],
            }
        }

        pub fn pixel(&self, x: i32, y: i32) -> Rgb565 {
            self.pixels[(y as u32 * self.size.width + x as u32) as usize]
        }

        /// Pixels of `color` inside the given area
        pub fn count(&self, area: embedded_graphics::primitives::Rectangle, color: Rgb565) -> usize {
            area.points()
                .filter(|p| self.bounding_box().contains(*p))
                .filter(|p| self.pixel(p.x, p.y) == color)
                .count()
        }
    }

    impl OriginDimensions for Framebuffer {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for Framebuffer {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if self.bounding_box().contains(point) {
                    let index = (point.y as u32 * self.size.width + point.x as u32) as usize;
                    self.pixels[index] = color;
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    use super::testing::Framebuffer;
    use super::*;

    #[test]
    fn host_palette_matches_hex_colors() {
        assert_eq!(color_from_hex(0xAAAAAA), LIGHT_GRAY);
        assert_eq!(color_from_hex(0x555555), DARK_GRAY);
        assert_eq!(color_from_hex(0x0055FF), BLUE_MOON);
        assert_eq!(color_from_hex(0xFFFFFF), WHITE);
    }

    #[test]
    fn scale_maps_reference_layout_to_screen() {
        let scale = Scale::new(Rectangle::new(Point::zero(), Size::new(240, 240)));
        assert_eq!(scale.x(144), 240);
        assert_eq!(scale.y(168), 240);
        assert_eq!(scale.point(72, 84), Point::new(120, 120));

        let native = Scale::new(Rectangle::new(Point::new(10, 0), Size::new(144, 168)));
        assert_eq!(native.rect(0, 50, 144, 50), Rectangle::new(Point::new(10, 50), Size::new(144, 50)));
    }

    #[test]
    fn label_clips_to_its_frame() {
        let mut screen = Framebuffer::new(64, 32);
        let frame = Rectangle::new(Point::new(0, 0), Size::new(12, 10));
        let label = Label::new(frame, &FONT_6X10, BLACK, Alignment::Left);

        label.draw("HHHHHHHH", &mut screen).unwrap();

        assert!(screen.count(frame, BLACK) > 0);
        let outside = Rectangle::new(Point::new(12, 0), Size::new(52, 32));
        assert_eq!(screen.count(outside, BLACK), 0);
    }
}
