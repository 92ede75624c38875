//! Display projection of a forecast dataset.

use chrono::{Locale, NaiveDate};

use crate::types::ForecastDataset;

pub const DEFAULT_LOCALE: Locale = Locale::en_US;

/// Abbreviated weekday, abbreviated month, day of month. No year.
const DATE_PATTERN: &str = "%a, %b %-d";

/// One table row, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRow {
    pub date: String,
    pub max_temperature: String,
}

/// Resolve a POSIX-style locale name (`en_GB`), falling back to `en_US`.
pub fn parse_locale(name: &str) -> Locale {
    let name = name.split(['.', '@']).next().unwrap_or_default().replace('-', "_");
    match Locale::try_from(name.as_str()) {
        Ok(locale) => locale,
        Err(_) => {
            tracing::debug!("Unknown locale '{}', using {:?}", name, DEFAULT_LOCALE);
            DEFAULT_LOCALE
        }
    }
}

pub fn format_date(date: NaiveDate, locale: Locale) -> String {
    date.format_localized(DATE_PATTERN, locale).to_string()
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{:.1}", celsius)
}

pub fn forecast_rows(dataset: &ForecastDataset, locale: Locale) -> Vec<ForecastRow> {
    dataset
        .days
        .iter()
        .map(|day| ForecastRow {
            date: format_date(day.date, locale),
            max_temperature: format_temperature(day.temperature_max),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::types::{Coordinates, DailyRecord};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_en_us() {
        assert_eq!(format_date(day(2024, 3, 1), Locale::en_US), "Fri, Mar 1");
        assert_eq!(format_date(day(2024, 12, 25), Locale::en_US), "Wed, Dec 25");
    }

    #[test]
    fn test_format_is_pure() {
        let a = format_date(day(2024, 3, 2), DEFAULT_LOCALE);
        let b = format_date(day(2024, 3, 2), DEFAULT_LOCALE);
        assert_eq!(a, b);
        assert_eq!(a, "Sat, Mar 2");
    }

    #[test]
    fn test_format_localized_names() {
        let formatted = format_date(day(2024, 3, 1), Locale::fr_FR);
        assert!(!formatted.contains("Fri"));
        assert!(formatted.ends_with(" 1"));
    }

    #[test]
    fn test_parse_locale() {
        assert!(matches!(parse_locale("en_GB"), Locale::en_GB));
        assert!(matches!(parse_locale("en_GB.UTF-8"), Locale::en_GB));
        assert!(matches!(parse_locale("en-US"), Locale::en_US));
        assert!(matches!(parse_locale("xx_YY"), Locale::en_US));
    }

    #[test]
    fn test_temperature_one_decimal() {
        assert_eq!(format_temperature(10.2), "10.2");
        assert_eq!(format_temperature(11.0), "11.0");
        assert_eq!(format_temperature(-3.26), "-3.3");
    }

    #[test]
    fn test_leeds_rows() {
        let dataset = ForecastDataset {
            location: "Leeds".to_string(),
            coordinates: Coordinates::resolve(53.8008, -1.5491).unwrap(),
            days: vec![
                DailyRecord {
                    date: day(2024, 3, 1),
                    temperature_max: 10.2,
                },
                DailyRecord {
                    date: day(2024, 3, 2),
                    temperature_max: 11.7,
                },
            ],
        };

        let rows = forecast_rows(&dataset, Locale::en_US);
        assert_eq!(
            rows,
            vec![
                ForecastRow {
                    date: "Fri, Mar 1".to_string(),
                    max_temperature: "10.2".to_string(),
                },
                ForecastRow {
                    date: "Sat, Mar 2".to_string(),
                    max_temperature: "11.7".to_string(),
                },
            ]
        );
    }
}
