//! Resolves a capture date from a file's embedded metadata.

use crate::models::{CaptureDate, DateResolution, DateValue, TagSet, UnknownReason};
use chrono::{NaiveDate, NaiveTime};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("metadata decode failed: {0}")]
    Decode(String),
}

/// Turns the bytes of an open file into a tag mapping.
pub trait TagDecoder {
    fn decode(&self, file: &mut BufReader<File>) -> Result<TagSet, DecodeError>;
}

/// EXIF decoder backed by `kamadak-exif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifDecoder;

impl TagDecoder for ExifDecoder {
    fn decode(&self, file: &mut BufReader<File>) -> Result<TagSet, DecodeError> {
        let mut reader = exif::Reader::new();
        reader.continue_on_error(true);
        let parsed = reader.read_from_container(file).or_else(|e| {
            e.distill_partial_result(|errors| {
                for err in errors {
                    debug!("ignoring damaged exif field: {}", err);
                }
            })
        });
        let exif = match parsed {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(TagSet::new()),
            Err(exif::Error::Io(e)) => return Err(DecodeError::Io(e)),
            Err(e) => return Err(DecodeError::Invalid(e.to_string())),
        };
        Ok(exif
            .fields()
            .map(|f| (tag_name(f), tag_value(f)))
            .collect())
    }
}

fn tag_name(field: &exif::Field) -> String {
    let ifd = if field.ifd_num == exif::In::THUMBNAIL {
        "Thumbnail"
    } else {
        match field.tag.context() {
            exif::Context::Tiff => "Image",
            exif::Context::Exif => "EXIF",
            exif::Context::Gps => "GPS",
            exif::Context::Interop => "Interoperability",
            #[allow(unreachable_patterns)]
            _ => "Unknown",
        }
    };
    format!("{} {}", ifd, field.tag)
}

fn tag_value(field: &exif::Field) -> DateValue {
    if let exif::Value::Ascii(ref parts) = field.value {
        if let Some(first) = parts.first() {
            if let Some(date) = structured_datetime(first) {
                return DateValue::Structured(date);
            }
            return DateValue::RawString(String::from_utf8_lossy(first).into_owned());
        }
    }
    DateValue::RawString(field.display_value().to_string())
}

/// Strict `YYYY:MM:DD HH:MM:SS` with in-range components and nothing after it.
fn structured_datetime(bytes: &[u8]) -> Option<CaptureDate> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if text.len() != 19 {
        return None;
    }
    let dt = exif::DateTime::from_ascii(text.as_bytes()).ok()?;
    let date = NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?;
    let time = NaiveTime::from_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())?;
    Some(CaptureDate::new(date, Some(time)))
}

pub struct DateExtractor<'a> {
    decoder: &'a dyn TagDecoder,
    date_tags: &'a [String],
}

impl<'a> DateExtractor<'a> {
    pub fn new(decoder: &'a dyn TagDecoder, date_tags: &'a [String]) -> Self {
        Self { decoder, date_tags }
    }

    pub fn extract(&self, path: &Path) -> Result<DateResolution, ExtractError> {
        let tags = match self.read_tags(path) {
            Ok(tags) => tags,
            Err(DecodeError::Io(e)) => {
                debug!("cannot read {:?}: {}", path, e);
                return Ok(DateResolution::Unknown(UnknownReason::Unreadable));
            }
            Err(DecodeError::Invalid(msg)) => return Err(ExtractError::Decode(msg)),
        };
        Ok(resolve_from_tags(&tags, self.date_tags))
    }

    fn read_tags(&self, path: &Path) -> Result<TagSet, DecodeError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        self.decoder.decode(&mut reader)
    }
}

/// Picks the first configured tag that is present and interprets it.
pub fn resolve_from_tags(tags: &TagSet, date_tags: &[String]) -> DateResolution {
    let Some(value) = date_tags.iter().find_map(|name| tags.get(name)) else {
        return DateResolution::Unknown(UnknownReason::NoDateTag);
    };
    match value {
        DateValue::Structured(date) => DateResolution::Resolved(*date),
        DateValue::RawString(raw) => match parse_lenient(&normalize_exif_datetime(raw)) {
            Some(date) => DateResolution::Resolved(date),
            None => DateResolution::Unknown(UnknownReason::Malformed { raw: raw.clone() }),
        },
    }
}

/// `2020:03:15 10:22:00` -> `2020-03-15 10:22:00`. Colons in the time survive.
pub fn normalize_exif_datetime(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.split_once(char::is_whitespace) {
        Some((date, time)) => format!("{} {}", date.replace(':', "-"), time.trim_start()),
        None => trimmed.replace(':', "-"),
    }
}

/// Accepts a date, optionally followed by a time and a UTC offset. The offset
/// is dropped, not applied.
pub fn parse_lenient(text: &str) -> Option<CaptureDate> {
    let text = text.trim();
    let (date_part, rest) = match text.split_once(char::is_whitespace) {
        Some((d, r)) => (d, Some(r.trim())),
        None => match text.split_once('T') {
            Some((d, r)) => (d, Some(r)),
            None => (text, None),
        },
    };

    let date = parse_date(date_part)?;
    let time = match rest {
        None | Some("") => None,
        Some(r) => Some(parse_time(r)?),
    };
    Some(CaptureDate::new(date, time))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.replace(['/', '.'], "-");
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let (clock, suffix) = match s.split_once(char::is_whitespace) {
        Some((c, z)) => (c, Some(z.trim())),
        None => (s, None),
    };
    if let Some(zone) = suffix {
        if !is_zone(zone) {
            return None;
        }
    }
    let clock = strip_zone(clock);
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(clock, fmt).ok())
}

fn strip_zone(clock: &str) -> &str {
    if let Some(c) = clock.strip_suffix(['Z', 'z']) {
        return c;
    }
    // Offsets start after at least `HH:MM`.
    match clock.get(5..).and_then(|tail| tail.find(['+', '-'])) {
        Some(idx) if is_zone(&clock[5 + idx..]) => &clock[..5 + idx],
        _ => clock,
    }
}

fn is_zone(s: &str) -> bool {
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("gmt")
    {
        return true;
    }
    let Some(body) = s.strip_prefix(['+', '-']) else {
        return false;
    };
    let digits: String = body.chars().filter(|c| *c != ':').collect();
    matches!(digits.len(), 2 | 4) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tags(entries: &[(&str, DateValue)]) -> TagSet {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn default_tags() -> Vec<String> {
        crate::config::DEFAULT_DATE_TAGS
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn normalizes_only_the_date_portion() {
        assert_eq!(
            normalize_exif_datetime("2020:03:15 10:22:00"),
            "2020-03-15 10:22:00"
        );
        assert_eq!(normalize_exif_datetime("2020:03:15\0"), "2020-03-15");
    }

    #[test]
    fn lenient_parser_accepts_common_shapes() {
        let d = parse_lenient("2020-03-15 10:22:00").unwrap();
        assert_eq!(d.date, ymd(2020, 3, 15));
        assert_eq!(d.time, NaiveTime::from_hms_opt(10, 22, 0));

        assert_eq!(parse_lenient("2020-03-15").unwrap().time, None);
        assert_eq!(parse_lenient("2020/03/15 10:22").unwrap().date, ymd(2020, 3, 15));
        assert_eq!(
            parse_lenient("2020-03-15T23:59:59.250+02:00").unwrap().date,
            ymd(2020, 3, 15)
        );
        assert!(parse_lenient("2020-03-15 10:22:00 +0100").is_some());
        assert!(parse_lenient("2020-03-15 10:22:00Z").is_some());
    }

    #[test]
    fn lenient_parser_rejects_garbage_and_out_of_range() {
        assert!(parse_lenient("not-a-date").is_none());
        assert!(parse_lenient("0000-00-00 00:00:00").is_none());
        assert!(parse_lenient("2020-13-01 00:00:00").is_none());
        assert!(parse_lenient("2020-03-15 24:00:00").is_none());
        assert!(parse_lenient("2020-03-15 noon").is_none());
        assert!(parse_lenient("").is_none());
    }

    #[test]
    fn image_datetime_wins_over_digitized() {
        let set = tags(&[
            (
                "EXIF DateTimeDigitized",
                DateValue::RawString("2019:01:01 00:00:00".into()),
            ),
            (
                "Image DateTime",
                DateValue::RawString("2020:03:15 10:22:00".into()),
            ),
        ]);
        match resolve_from_tags(&set, &default_tags()) {
            DateResolution::Resolved(d) => assert_eq!(d.day_dir(), "2020-03-15"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn falls_back_to_digitized() {
        let set = tags(&[(
            "EXIF DateTimeDigitized",
            DateValue::RawString("2019:07:04 08:00:00".into()),
        )]);
        match resolve_from_tags(&set, &default_tags()) {
            DateResolution::Resolved(d) => assert_eq!(d.day_dir(), "2019-07-04"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn structured_values_are_used_directly() {
        let date = CaptureDate::new(ymd(2001, 2, 3), None);
        let set = tags(&[("Image DateTime", DateValue::Structured(date))]);
        assert_eq!(
            resolve_from_tags(&set, &default_tags()),
            DateResolution::Resolved(date)
        );
    }

    #[test]
    fn missing_and_malformed_tags_are_unknown() {
        let set = tags(&[("Image Make", DateValue::RawString("Canon".into()))]);
        assert_eq!(
            resolve_from_tags(&set, &default_tags()),
            DateResolution::Unknown(UnknownReason::NoDateTag)
        );

        let set = tags(&[("Image DateTime", DateValue::RawString("not-a-date".into()))]);
        assert_eq!(
            resolve_from_tags(&set, &default_tags()),
            DateResolution::Unknown(UnknownReason::Malformed {
                raw: "not-a-date".into()
            })
        );
    }

    #[test]
    fn structured_detection_is_strict() {
        assert!(structured_datetime(b"2020:03:15 10:22:00").is_some());
        assert!(structured_datetime(b"0000:00:00 00:00:00").is_none());
        assert!(structured_datetime(b"    :  :     :  :  ").is_none());
        assert!(structured_datetime(b"2020:03:15 10:22:00garbage").is_none());
    }

    #[test]
    fn trailing_garbage_is_odd_date_data() {
        let field = exif::Field {
            tag: exif::Tag::DateTime,
            ifd_num: exif::In::PRIMARY,
            value: exif::Value::Ascii(vec![b"2020:03:15 10:22:00garbage".to_vec()]),
        };
        let value = tag_value(&field);
        assert_eq!(
            value,
            DateValue::RawString("2020:03:15 10:22:00garbage".into())
        );

        let set = tags(&[("Image DateTime", value)]);
        assert_eq!(
            resolve_from_tags(&set, &default_tags()),
            DateResolution::Unknown(UnknownReason::Malformed {
                raw: "2020:03:15 10:22:00garbage".into()
            })
        );
    }

    #[test]
    fn missing_file_is_unreadable() {
        let temp = tempfile::tempdir().unwrap();
        let tags = default_tags();
        let extractor = DateExtractor::new(&ExifDecoder, &tags);
        let res = extractor.extract(&temp.path().join("nope.jpg")).unwrap();
        assert_eq!(res, DateResolution::Unknown(UnknownReason::Unreadable));
    }
}
