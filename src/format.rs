//! Display helpers shared by every screen.
use chrono::{Datelike, NaiveDate};

use crate::config::DEFAULT_IMAGE_BASE;

pub const DATE_UNAVAILABLE: &str = "Fecha no disponible";
pub const DEFAULT_IMAGE_WIDTH: u32 = 500;

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Absolute poster URL for a TMDB image path.
///
/// `_width` is accepted for call-site compatibility but the URL always
/// points at the fixed `w500` rendition.
pub fn derive_image_url(path: Option<&str>, _width: u32) -> Option<String> {
    image_url_from(DEFAULT_IMAGE_BASE, path)
}

pub fn image_url_from(base: &str, path: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{}{path}", base.trim_end_matches('/')))
}

/// One decimal place, halves rounded away from zero.
pub fn format_rating(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{rounded:.1}")
}

/// Long-form Spanish date, e.g. `23 de septiembre de 1994`.
pub fn format_date(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(parse_date)
        .map(|d| {
            format!(
                "{} de {} de {}",
                d.day(),
                MONTHS_ES[d.month0() as usize],
                d.year()
            )
        })
        .unwrap_or_else(|| DATE_UNAVAILABLE.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // TMDB sends plain dates; tolerate a trailing time part.
    let date_part = value.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_has_one_decimal() {
        assert_eq!(format_rating(7.0), "7.0");
        assert_eq!(format_rating(8.25), "8.3");
        assert_eq!(format_rating(0.0), "0.0");
        assert_eq!(format_rating(9.99), "10.0");
    }

    #[test]
    fn date_sentinel_when_missing() {
        assert_eq!(format_date(None), DATE_UNAVAILABLE);
        assert_eq!(format_date(Some("")), DATE_UNAVAILABLE);
        assert_eq!(format_date(Some("not a date")), DATE_UNAVAILABLE);
    }

    #[test]
    fn date_long_form() {
        assert_eq!(format_date(Some("1994-09-23")), "23 de septiembre de 1994");
        assert_eq!(format_date(Some("2024-01-05T00:00:00Z")), "5 de enero de 2024");
    }

    #[test]
    fn image_url() {
        assert_eq!(derive_image_url(None, DEFAULT_IMAGE_WIDTH), None);
        assert_eq!(derive_image_url(Some(""), DEFAULT_IMAGE_WIDTH), None);
        assert_eq!(
            derive_image_url(Some("/abc.jpg"), DEFAULT_IMAGE_WIDTH).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            derive_image_url(Some("/abc.jpg"), 200),
            derive_image_url(Some("/abc.jpg"), 500)
        );
    }
}
