//! GEDCOM date parsing, validation, and formatting.
//!
//! Converts between GEDCOM date strings and the structured [`Date`]
//! representation. The grammar covers the four calendar escapes,
//! approximation and range modifiers, BC years, and free-text phrases:
//!
//! ```text
//! 12 JAN 1900
//! ABT 1850
//! BET 1900 AND 1910
//! FROM 1690 TO 1700
//! @#DJULIAN@ 4 MAR 1699
//! (sometime after the war)
//! 44 B.C.
//! ```

use std::fmt;

/// Calendar systems recognized in date escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    #[default]
    Gregorian,
    Julian,
    Hebrew,
    FrenchRepublican,
}

/// Qualifier preceding a date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateModifier {
    #[default]
    None,
    Before,
    After,
    About,
    Calculated,
    Estimated,
    From,
    To,
    Between,
    Interpreted,
}

impl DateModifier {
    /// The GEDCOM keyword for this modifier, empty for `None`.
    pub fn keyword(&self) -> &'static str {
        match self {
            DateModifier::None => "",
            DateModifier::Before => "BEF",
            DateModifier::After => "AFT",
            DateModifier::About => "ABT",
            DateModifier::Calculated => "CAL",
            DateModifier::Estimated => "EST",
            DateModifier::From => "FROM",
            DateModifier::To => "TO",
            DateModifier::Between => "BET",
            DateModifier::Interpreted => "INT",
        }
    }
}

/// A parsed GEDCOM date.
///
/// Missing day and month are encoded as `0`. A free-text phrase keeps
/// its raw text in `phrase` with all numeric fields zero. A date with
/// `end_date` set is a range (`BET … AND …` or `FROM … TO …`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Date {
    pub calendar: Calendar,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_bc: bool,
    pub modifier: DateModifier,
    pub end_date: Option<Box<Date>>,
    pub is_phrase: bool,
    pub phrase: String,
}

/// Error type for date parsing and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub message: String,
}

impl DateParseError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateParseError {}

const GREGORIAN_MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const HEBREW_MONTHS: [&str; 13] = [
    "TSH", "CSH", "KSL", "TVT", "SHV", "ADR", "ADS", "NSN", "IYR", "SVN", "TMZ", "AAV", "ELL",
];

// Variable-length Hebrew months (CSH, KSL) are accepted at their longer
// form; the year-type arithmetic is out of scope.
const HEBREW_MONTH_DAYS: [u32; 13] = [30, 30, 30, 29, 30, 30, 29, 30, 29, 30, 29, 30, 29];

const FRENCH_MONTHS: [&str; 13] = [
    "VEND", "BRUM", "FRIM", "NIVO", "PLUV", "VENT", "GERM", "FLOR", "PRAI", "MESS", "THER",
    "FRUC", "COMP",
];

impl Date {
    /// Parses a trimmed GEDCOM date string.
    pub fn parse(input: &str) -> Result<Date, DateParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(DateParseError::new("empty date"));
        }

        if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
            return Ok(Date {
                is_phrase: true,
                phrase: s[1..s.len() - 1].to_string(),
                ..Date::default()
            });
        }

        let tokens: Vec<&str> = s.split_whitespace().collect();
        let keyword = tokens[0].to_ascii_uppercase();

        match keyword.as_str() {
            "BET" => {
                let and_pos = tokens
                    .iter()
                    .position(|t| t.eq_ignore_ascii_case("AND"))
                    .ok_or_else(|| DateParseError::new("BET date is missing AND"))?;
                let start = parse_single(&tokens[1..and_pos])?;
                let end = parse_single(&tokens[and_pos + 1..])?;
                Ok(Date {
                    modifier: DateModifier::Between,
                    end_date: Some(Box::new(end)),
                    ..start
                })
            }
            "FROM" => {
                let to_pos = tokens.iter().position(|t| t.eq_ignore_ascii_case("TO"));
                match to_pos {
                    Some(pos) if pos > 0 => {
                        let start = parse_single(&tokens[1..pos])?;
                        let end = parse_single(&tokens[pos + 1..])?;
                        Ok(Date {
                            modifier: DateModifier::From,
                            end_date: Some(Box::new(end)),
                            ..start
                        })
                    }
                    _ => {
                        let start = parse_single(&tokens[1..])?;
                        Ok(Date { modifier: DateModifier::From, ..start })
                    }
                }
            }
            "BEF" | "AFT" | "ABT" | "CAL" | "EST" | "TO" | "INT" => {
                let modifier = match keyword.as_str() {
                    "BEF" => DateModifier::Before,
                    "AFT" => DateModifier::After,
                    "ABT" => DateModifier::About,
                    "CAL" => DateModifier::Calculated,
                    "EST" => DateModifier::Estimated,
                    "TO" => DateModifier::To,
                    _ => DateModifier::Interpreted,
                };
                let mut rest = &tokens[1..];
                // INT carries an optional trailing phrase: INT 1900 (guess)
                if modifier == DateModifier::Interpreted {
                    if let Some(pos) = rest.iter().position(|t| t.starts_with('(')) {
                        rest = &rest[..pos];
                    }
                }
                let date = parse_single(rest)?;
                Ok(Date { modifier, ..date })
            }
            _ => parse_single(&tokens),
        }
    }

    /// True when this date spans a range.
    pub fn is_range(&self) -> bool {
        self.end_date.is_some()
    }

    /// Checks that the date is legal under its calendar: month in range,
    /// day within the month (leap years for Gregorian and Julian), and
    /// range start not after range end.
    pub fn validate(&self) -> Result<(), DateParseError> {
        if self.is_phrase {
            return Ok(());
        }
        self.validate_part()?;
        if let Some(end) = &self.end_date {
            end.validate_part()?;
            if self.sort_key() > end.sort_key() {
                return Err(DateParseError::new("range start is after range end"));
            }
        }
        Ok(())
    }

    fn validate_part(&self) -> Result<(), DateParseError> {
        if self.year == 0 {
            return Err(DateParseError::new("missing year"));
        }
        if self.month == 0 {
            if self.day != 0 {
                return Err(DateParseError::new("day without month"));
            }
            return Ok(());
        }
        if self.month > months_in(self.calendar) {
            return Err(DateParseError::new(format!("invalid month {}", self.month)));
        }
        if self.day == 0 {
            return Ok(());
        }
        let max_day = days_in_month(self.calendar, self.year, self.month);
        if self.day > max_day {
            return Err(DateParseError::new(format!(
                "invalid day {} for month {}",
                self.day, self.month
            )));
        }
        Ok(())
    }

    /// Chronological ordering key; BC years sort before all others.
    fn sort_key(&self) -> (i64, u32, u32) {
        let year = if self.is_bc { -(self.year as i64) } else { self.year as i64 };
        (year, self.month, self.day)
    }

    fn fmt_part(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.calendar {
            Calendar::Gregorian => {}
            Calendar::Julian => write!(f, "@#DJULIAN@ ")?,
            Calendar::Hebrew => write!(f, "@#DHEBREW@ ")?,
            Calendar::FrenchRepublican => write!(f, "@#DFRENCH R@ ")?,
        }
        if self.day != 0 {
            write!(f, "{} ", self.day)?;
        }
        if self.month != 0 {
            write!(f, "{} ", month_name(self.calendar, self.month))?;
        }
        write!(f, "{}", self.year)?;
        if self.is_bc {
            write!(f, " B.C.")?;
        }
        Ok(())
    }
}

impl fmt::Display for Date {
    /// Formats the date back to GEDCOM form. A non-phrase date that
    /// validates re-parses to an equal `Date`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_phrase {
            return write!(f, "({})", self.phrase);
        }
        match (&self.modifier, &self.end_date) {
            (DateModifier::Between, Some(end)) => {
                write!(f, "BET ")?;
                self.fmt_part(f)?;
                write!(f, " AND ")?;
                end.fmt_part(f)
            }
            (DateModifier::From, Some(end)) => {
                write!(f, "FROM ")?;
                self.fmt_part(f)?;
                write!(f, " TO ")?;
                end.fmt_part(f)
            }
            (modifier, _) => {
                let keyword = modifier.keyword();
                if !keyword.is_empty() {
                    write!(f, "{keyword} ")?;
                }
                self.fmt_part(f)
            }
        }
    }
}

/// Parses a single date value: optional calendar escape, then
/// `[day] [month] year [B.C.]`.
fn parse_single(tokens: &[&str]) -> Result<Date, DateParseError> {
    let (calendar, mut rest) = parse_calendar_escape(tokens)?;

    let mut is_bc = false;
    if let Some(last) = rest.last() {
        let upper = last.to_ascii_uppercase();
        if upper == "B.C." || upper == "BCE" {
            is_bc = true;
            rest = &rest[..rest.len() - 1];
        }
    }

    let (day, month, year) = match rest {
        [] => return Err(DateParseError::new("missing year")),
        [y] => (0, 0, parse_year(y)?),
        [m, y] => (0, month_number(calendar, m)?, parse_year(y)?),
        [d, m, y] => (parse_day(d)?, month_number(calendar, m)?, parse_year(y)?),
        _ => return Err(DateParseError::new("too many date parts")),
    };

    Ok(Date {
        calendar,
        year,
        month,
        day,
        is_bc,
        ..Date::default()
    })
}

fn parse_calendar_escape<'a, 'b>(
    tokens: &'a [&'b str],
) -> Result<(Calendar, &'a [&'b str]), DateParseError> {
    let Some(first) = tokens.first() else {
        return Ok((Calendar::Gregorian, tokens));
    };
    if !first.starts_with("@#") {
        return Ok((Calendar::Gregorian, tokens));
    }
    if first.eq_ignore_ascii_case("@#DGREGORIAN@") {
        return Ok((Calendar::Gregorian, &tokens[1..]));
    }
    if first.eq_ignore_ascii_case("@#DJULIAN@") {
        return Ok((Calendar::Julian, &tokens[1..]));
    }
    if first.eq_ignore_ascii_case("@#DHEBREW@") {
        return Ok((Calendar::Hebrew, &tokens[1..]));
    }
    // The French Republican escape contains a space, so it spans two
    // whitespace-separated tokens.
    if first.eq_ignore_ascii_case("@#DFRENCH")
        && tokens.get(1).is_some_and(|t| t.eq_ignore_ascii_case("R@"))
    {
        return Ok((Calendar::FrenchRepublican, &tokens[2..]));
    }
    Err(DateParseError::new(format!("unknown calendar escape {first:?}")))
}

fn parse_year(token: &str) -> Result<i32, DateParseError> {
    match token.parse::<i32>() {
        Ok(y) if y > 0 => Ok(y),
        _ => Err(DateParseError::new(format!("invalid year {token:?}"))),
    }
}

fn parse_day(token: &str) -> Result<u32, DateParseError> {
    match token.parse::<u32>() {
        Ok(d) if (1..=31).contains(&d) => Ok(d),
        _ => Err(DateParseError::new(format!("invalid day {token:?}"))),
    }
}

fn month_number(calendar: Calendar, token: &str) -> Result<u32, DateParseError> {
    let table: &[&str] = match calendar {
        Calendar::Gregorian | Calendar::Julian => &GREGORIAN_MONTHS,
        Calendar::Hebrew => &HEBREW_MONTHS,
        Calendar::FrenchRepublican => &FRENCH_MONTHS,
    };
    table
        .iter()
        .position(|m| token.eq_ignore_ascii_case(m))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| DateParseError::new(format!("unknown month {token:?}")))
}

fn month_name(calendar: Calendar, month: u32) -> &'static str {
    let table: &[&str] = match calendar {
        Calendar::Gregorian | Calendar::Julian => &GREGORIAN_MONTHS,
        Calendar::Hebrew => &HEBREW_MONTHS,
        Calendar::FrenchRepublican => &FRENCH_MONTHS,
    };
    table.get(month as usize - 1).copied().unwrap_or("")
}

fn months_in(calendar: Calendar) -> u32 {
    match calendar {
        Calendar::Gregorian | Calendar::Julian => 12,
        Calendar::Hebrew | Calendar::FrenchRepublican => 13,
    }
}

fn is_gregorian_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(calendar: Calendar, year: i32, month: u32) -> u32 {
    match calendar {
        Calendar::Gregorian | Calendar::Julian => match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 => {
                let leap = match calendar {
                    Calendar::Julian => year % 4 == 0,
                    _ => is_gregorian_leap_year(year),
                };
                if leap {
                    29
                } else {
                    28
                }
            }
            _ => 0,
        },
        Calendar::Hebrew => HEBREW_MONTH_DAYS[month as usize - 1],
        // Twelve 30-day months plus the complementary days.
        Calendar::FrenchRepublican => {
            if month <= 12 {
                30
            } else {
                6
            }
        }
    }
}
