//! Locale-dependent display helpers used by the read projection.
//!
//! The reference loader hardcodes a French weekday table
//! (`day_names_fr`); this keeps the same table but behind a `Locale` knob
//! (spec config: `PLANNING_LOCALE`, default `fr`) instead of baking one
//! language into the core.

use chrono::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Fr,
    En,
}

impl Locale {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "en" => Locale::En,
            _ => Locale::Fr,
        }
    }

    pub fn weekday_name(&self, day: Weekday) -> &'static str {
        match (self, day) {
            (Locale::En, Weekday::Mon) => "Monday",
            (Locale::En, Weekday::Tue) => "Tuesday",
            (Locale::En, Weekday::Wed) => "Wednesday",
            (Locale::En, Weekday::Thu) => "Thursday",
            (Locale::En, Weekday::Fri) => "Friday",
            (Locale::En, Weekday::Sat) => "Saturday",
            (Locale::En, Weekday::Sun) => "Sunday",
            (Locale::Fr, Weekday::Mon) => "Lundi",
            (Locale::Fr, Weekday::Tue) => "Mardi",
            (Locale::Fr, Weekday::Wed) => "Mercredi",
            (Locale::Fr, Weekday::Thu) => "Jeudi",
            (Locale::Fr, Weekday::Fri) => "Vendredi",
            (Locale::Fr, Weekday::Sat) => "Samedi",
            (Locale::Fr, Weekday::Sun) => "Dimanche",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_french() {
        assert_eq!(Locale::parse("bogus"), Locale::Fr);
        assert_eq!(Locale::Fr.weekday_name(Weekday::Mon), "Lundi");
    }

    #[test]
    fn parses_english() {
        assert_eq!(Locale::parse("EN"), Locale::En);
        assert_eq!(Locale::En.weekday_name(Weekday::Sun), "Sunday");
    }
}
