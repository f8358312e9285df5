// crates/gdp-atlas-server/src/summary.rs
// ============================================================================
// Module: GDP Atlas Summary Renderer
// Description: PNG summary artifact drawn from post-refresh aggregates.
// Purpose: Render cache totals and the top GDP ranking to a served image.
// Dependencies: gdp-atlas-core, embedded-graphics, image, time
// ============================================================================

//! ## Overview
//! The reporter draws a fixed 600x400 white canvas with the cache total, the
//! last refresh time, and the top five countries by estimated GDP, then
//! encodes it as PNG at the configured path. Fonts are the bitmap faces
//! bundled with `embedded-graphics`, so rendering needs no font files on
//! disk. The canvas implements `DrawTarget` directly over the `image` buffer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use embedded_graphics::Drawable;
use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::OriginDimensions;
use embedded_graphics::geometry::Point;
use embedded_graphics::geometry::Size;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_7X13;
use embedded_graphics::mono_font::ascii::FONT_9X18_BOLD;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::pixelcolor::RgbColor;
use embedded_graphics::pixelcolor::WebColors;
use embedded_graphics::text::Text;
use gdp_atlas_core::Country;
use gdp_atlas_core::ReportError;
use gdp_atlas_core::SummaryReporter;
use image::Rgb;
use image::RgbImage;
use time::OffsetDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Summary image width in pixels.
const SUMMARY_WIDTH: u32 = 600;
/// Summary image height in pixels.
const SUMMARY_HEIGHT: u32 = 400;
/// Left margin for headings in pixels.
const MARGIN_X: i32 = 20;
/// Extra indent for ranking lines in pixels.
const ENTRY_X: i32 = 30;
/// Vertical step between ranking lines in pixels.
const ENTRY_STEP_Y: i32 = 28;

// ============================================================================
// SECTION: Canvas
// ============================================================================

/// Draw target over an RGB image buffer.
struct Canvas {
    /// Backing pixel buffer.
    image: RgbImage,
}

impl Canvas {
    /// Creates a white canvas of the given dimensions.
    fn white(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
        }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = std::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let Ok(x) = u32::try_from(point.x) else {
                continue;
            };
            let Ok(y) = u32::try_from(point.y) else {
                continue;
            };
            if x < self.image.width() && y < self.image.height() {
                self.image.put_pixel(x, y, Rgb([color.r(), color.g(), color.b()]));
            }
        }
        Ok(())
    }
}

/// Draws one text run, mapping the infallible draw into report errors.
fn draw_text(
    canvas: &mut Canvas,
    text: &str,
    position: Point,
    style: MonoTextStyle<'_, Rgb888>,
) -> Result<(), ReportError> {
    Text::new(text, position, style)
        .draw(canvas)
        .map_err(|_| ReportError::Render("text draw failed".to_owned()))?;
    Ok(())
}

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Formats a USD amount with thousands separators and two decimals.
fn format_usd(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let mut parts = formatted.splitn(2, '.');
    let integer = parts.next().unwrap_or("0");
    let fraction = parts.next().unwrap_or("00");
    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }
    format!("${grouped}.{fraction}")
}

/// Formats the last refresh time for the summary heading.
fn format_refresh_time(timestamp: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    timestamp
        .format(&format)
        .unwrap_or_else(|_| "unknown".to_owned())
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// PNG implementation of the summary reporter seam.
pub struct PngSummaryReporter {
    /// Path the rendered image is written to.
    image_path: PathBuf,
}

impl PngSummaryReporter {
    /// Creates a reporter writing to the given path.
    #[must_use]
    pub const fn new(image_path: PathBuf) -> Self {
        Self { image_path }
    }
}

impl SummaryReporter for PngSummaryReporter {
    fn render(
        &self,
        total_countries: u64,
        top_by_gdp: &[Country],
        last_refreshed_at: Option<OffsetDateTime>,
    ) -> Result<(), ReportError> {
        let mut canvas = Canvas::white(SUMMARY_WIDTH, SUMMARY_HEIGHT);
        let title_style = MonoTextStyle::new(&FONT_9X18_BOLD, Rgb888::BLACK);
        let label_style = MonoTextStyle::new(&FONT_7X13, Rgb888::CSS_DIM_GRAY);
        let entry_style = MonoTextStyle::new(&FONT_7X13, Rgb888::BLACK);

        draw_text(&mut canvas, "Country Data Summary", Point::new(MARGIN_X, 36), title_style)?;
        let last_refresh =
            last_refreshed_at.map_or_else(|| "N/A".to_owned(), format_refresh_time);
        draw_text(
            &mut canvas,
            &format!("Last Refresh: {last_refresh}"),
            Point::new(MARGIN_X, 72),
            label_style,
        )?;
        draw_text(
            &mut canvas,
            &format!("Total Cached Countries: {total_countries}"),
            Point::new(MARGIN_X, 96),
            label_style,
        )?;
        draw_text(
            &mut canvas,
            "Top 5 Countries by Estimated GDP:",
            Point::new(MARGIN_X, 140),
            entry_style,
        )?;
        let mut y = 170;
        for (index, country) in top_by_gdp.iter().enumerate() {
            let gdp = country
                .estimated_gdp
                .map_or_else(|| "N/A".to_owned(), format_usd);
            let line = format!("{}. {} ({gdp})", index + 1, country.name);
            draw_text(&mut canvas, &line, Point::new(ENTRY_X, y), entry_style)?;
            y += ENTRY_STEP_Y;
        }

        if let Some(parent) = self.image_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| ReportError::Io(err.to_string()))?;
        }
        canvas
            .image
            .save(&self.image_path)
            .map_err(|err| ReportError::Io(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
