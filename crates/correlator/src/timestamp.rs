//! 프론트엔드 타임스탬프 형식 -- 추출과 파싱이 공유하는 형식 목록
//!
//! 문맥 추출기는 [`find_in_line`]으로 원본 문자열만 잘라내고,
//! 상관 분석 시점에 [`parse_frontend_timestamp`]가 같은 형식 목록과
//! 같은 epoch 판별 규칙(값 > 1e10 이면 밀리초)으로 파싱합니다.
//!
//! # 형식 (우선순위 순)
//! 1. ISO-8601 (`2024-01-15T12:00:00.123Z`, 소수부/존 선택)
//! 2. 일반 날짜-시각 (`2024/01/15 12:00:00`)
//! 3. 괄호 `[MM-DD HH:MM:SS]`
//! 4. 괄호 `[HH:MM:SS(.fff)]`
//! 5. `Mon DD HH:MM:SS`
//! 6. Unix epoch (초 또는 밀리초)

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use regex::Regex;

use logtriage_core::config::parse_utc_offset;

/// epoch 값이 이보다 크면 밀리초로 해석합니다.
pub const EPOCH_MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// 타임스탬프 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// ISO-8601 (소수부, 존 선택)
    Iso8601,
    /// `YYYY/MM/DD HH:MM:SS`
    PlainDateTime,
    /// `[MM-DD HH:MM:SS]`
    BracketedMonthDay,
    /// `[HH:MM:SS]`, `[HH:MM:SS.fff]`
    BracketedTime,
    /// `Mon DD HH:MM:SS`
    MonthNameDay,
    /// Unix epoch 초/밀리초
    Epoch,
}

/// 라인 검색용 정규식 (캡처 그룹 1 = 원본 타임스탬프)
static FORMATS: LazyLock<Vec<(TimestampFormat, Regex)>> = LazyLock::new(|| {
    [
        (
            TimestampFormat::Iso8601,
            r"(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)",
        ),
        (
            TimestampFormat::PlainDateTime,
            r"(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2})",
        ),
        (
            TimestampFormat::BracketedMonthDay,
            r"\[(\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]",
        ),
        (
            TimestampFormat::BracketedTime,
            r"\[(\d{2}:\d{2}:\d{2}(?:\.\d{3})?)\]",
        ),
        (
            TimestampFormat::MonthNameDay,
            r"\b([A-Za-z]{3} \d{1,2} \d{2}:\d{2}:\d{2})",
        ),
        (TimestampFormat::Epoch, r"\b(\d{10,13})\b"),
    ]
    .into_iter()
    .map(|(format, pattern)| {
        (
            format,
            Regex::new(pattern).expect("timestamp pattern must compile"),
        )
    })
    .collect()
});

/// 라인에서 첫 번째로 매칭되는 형식의 원본 타임스탬프를 찾습니다.
pub fn find_in_line(line: &str) -> Option<(TimestampFormat, &str)> {
    FORMATS.iter().find_map(|(format, regex)| {
        regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| (*format, m.as_str()))
    })
}

/// 파싱된 프론트엔드 타임스탬프
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendTimestamp {
    /// 존이 명시되었거나 epoch인 절대 시각
    Absolute(DateTime<Utc>),
    /// 존이 없는 로컬 시각 (클라이언트 오프셋으로 해석)
    Local(NaiveDateTime),
}

impl FrontendTimestamp {
    /// 클라이언트 오프셋을 적용하여 UTC 시각으로 변환합니다.
    ///
    /// 절대 시각은 오프셋의 영향을 받지 않습니다.
    pub fn to_utc(self, client_offset: FixedOffset) -> Option<DateTime<Utc>> {
        match self {
            Self::Absolute(at) => Some(at),
            Self::Local(naive) => client_offset
                .from_local_datetime(&naive)
                .single()
                .map(|local| local.with_timezone(&Utc)),
        }
    }
}

/// 추출된 원본 타임스탬프를 파싱합니다.
///
/// 날짜가 빠진 형식(`MM-DD`, 시각만, `Mon DD`)은 `reference_date`로 보완합니다.
/// 어떤 형식에도 맞지 않으면 `None`을 반환합니다.
pub fn parse_frontend_timestamp(raw: &str, reference_date: NaiveDate) -> Option<FrontendTimestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    parse_iso(raw)
        .or_else(|| parse_plain(raw))
        .or_else(|| parse_month_day(raw, reference_date))
        .or_else(|| parse_time_only(raw, reference_date))
        .or_else(|| parse_month_name_day(raw, reference_date))
        .or_else(|| parse_epoch(raw))
}

fn parse_iso(raw: &str) -> Option<FrontendTimestamp> {
    if raw.len() < 19 || !raw.is_char_boundary(19) {
        return None;
    }
    let (head, rest) = raw.split_at(19);
    let naive_head = head.replacen('T', " ", 1);
    let base = NaiveDateTime::parse_from_str(&naive_head, "%Y-%m-%d %H:%M:%S").ok()?;

    // 소수부
    let (fraction, zone) = match rest.strip_prefix('.') {
        Some(frac_and_zone) => {
            let digits = frac_and_zone
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(frac_and_zone.len());
            frac_and_zone.split_at(digits)
        }
        None => ("", rest),
    };
    let naive = if fraction.is_empty() {
        base
    } else {
        let nanos = fraction_to_nanos(fraction)?;
        base.with_nanosecond(nanos)?
    };

    if zone.is_empty() {
        return Some(FrontendTimestamp::Local(naive));
    }
    let offset = parse_utc_offset(zone).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|at| FrontendTimestamp::Absolute(at.with_timezone(&Utc)))
}

fn parse_plain(raw: &str) -> Option<FrontendTimestamp> {
    NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S")
        .ok()
        .map(FrontendTimestamp::Local)
}

fn parse_month_day(raw: &str, reference_date: NaiveDate) -> Option<FrontendTimestamp> {
    let year = reference_date.year();
    NaiveDateTime::parse_from_str(&format!("{year}-{raw}"), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(FrontendTimestamp::Local)
}

fn parse_time_only(raw: &str, reference_date: NaiveDate) -> Option<FrontendTimestamp> {
    let time = if raw.contains('.') {
        NaiveTime::parse_from_str(raw, "%H:%M:%S%.f").ok()?
    } else {
        NaiveTime::parse_from_str(raw, "%H:%M:%S").ok()?
    };
    Some(FrontendTimestamp::Local(reference_date.and_time(time)))
}

fn parse_month_name_day(raw: &str, reference_date: NaiveDate) -> Option<FrontendTimestamp> {
    let year = reference_date.year();
    NaiveDateTime::parse_from_str(&format!("{year} {raw}"), "%Y %b %d %H:%M:%S")
        .ok()
        .map(FrontendTimestamp::Local)
}

fn parse_epoch(raw: &str) -> Option<FrontendTimestamp> {
    if !(10..=13).contains(&raw.len()) || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = raw.parse().ok()?;
    let at = if value > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)?
    } else {
        DateTime::from_timestamp(value, 0)?
    };
    Some(FrontendTimestamp::Absolute(at))
}

fn fraction_to_nanos(fraction: &str) -> Option<u32> {
    // 나노초 정밀도(9자리)까지만 사용
    let truncated: String = fraction.chars().take(9).collect();
    let scale = 10u32.checked_pow(9 - truncated.len() as u32)?;
    truncated.parse::<u32>().ok()?.checked_mul(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn minus_four() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    #[test]
    fn find_iso_with_zone() {
        let line = "2024-01-15T12:00:00.123Z [ERROR] boom";
        assert_eq!(
            find_in_line(line),
            Some((TimestampFormat::Iso8601, "2024-01-15T12:00:00.123Z"))
        );
    }

    #[test]
    fn find_bracketed_forms_without_brackets() {
        assert_eq!(
            find_in_line("[01-15 12:00:00] [E] boom"),
            Some((TimestampFormat::BracketedMonthDay, "01-15 12:00:00"))
        );
        assert_eq!(
            find_in_line("[12:00:00.250] [E] boom"),
            Some((TimestampFormat::BracketedTime, "12:00:00.250"))
        );
    }

    #[test]
    fn find_month_name_and_epoch() {
        assert_eq!(
            find_in_line("Jan 15 12:00:00 app[12]: crash"),
            Some((TimestampFormat::MonthNameDay, "Jan 15 12:00:00"))
        );
        assert_eq!(
            find_in_line("ts=1705320000123 failed to load"),
            Some((TimestampFormat::Epoch, "1705320000123"))
        );
    }

    #[test]
    fn find_returns_none_without_timestamp() {
        assert_eq!(find_in_line("[ERROR] no time here"), None);
        // 14자리 이상 숫자는 epoch 아님
        assert_eq!(find_in_line("order 12345678901234 failed"), None);
    }

    #[test]
    fn iso_without_zone_is_local() {
        let parsed = parse_frontend_timestamp("2024-01-15 12:00:00", reference()).unwrap();
        assert!(matches!(parsed, FrontendTimestamp::Local(_)));
        assert_eq!(
            parsed.to_utc(minus_four()),
            Some(utc(2024, 1, 15, 16, 0, 0))
        );
    }

    #[test]
    fn iso_with_zone_is_absolute_and_not_shifted() {
        let parsed = parse_frontend_timestamp("2024-01-15T12:00:00Z", reference()).unwrap();
        assert_eq!(
            parsed.to_utc(minus_four()),
            Some(utc(2024, 1, 15, 12, 0, 0))
        );

        let parsed = parse_frontend_timestamp("2024-01-15T21:00:00+0900", reference()).unwrap();
        assert_eq!(
            parsed.to_utc(minus_four()),
            Some(utc(2024, 1, 15, 12, 0, 0))
        );
    }

    #[test]
    fn iso_fraction_is_kept() {
        let parsed = parse_frontend_timestamp("2024-01-15T12:00:00.250Z", reference()).unwrap();
        let at = parsed.to_utc(minus_four()).unwrap();
        assert_eq!(at.nanosecond(), 250_000_000);
    }

    #[test]
    fn partial_formats_use_reference_date() {
        let parsed = parse_frontend_timestamp("01-20 08:30:00", reference()).unwrap();
        assert_eq!(
            parsed.to_utc(minus_four()),
            Some(utc(2024, 1, 20, 12, 30, 0))
        );

        let parsed = parse_frontend_timestamp("08:30:00.500", reference()).unwrap();
        let at = parsed.to_utc(minus_four()).unwrap();
        assert_eq!((at.day(), at.hour(), at.minute()), (15, 12, 30));

        let parsed = parse_frontend_timestamp("Feb 3 08:30:00", reference()).unwrap();
        assert_eq!(
            parsed.to_utc(minus_four()),
            Some(utc(2024, 2, 3, 12, 30, 0))
        );
    }

    #[test]
    fn epoch_seconds_and_millis_are_distinguished() {
        let seconds = parse_frontend_timestamp("1705320000", reference()).unwrap();
        let millis = parse_frontend_timestamp("1705320000000", reference()).unwrap();
        assert_eq!(seconds, millis);
        assert_eq!(
            seconds.to_utc(minus_four()),
            Some(utc(2024, 1, 15, 12, 0, 0))
        );
    }

    #[test]
    fn garbage_does_not_parse() {
        assert_eq!(parse_frontend_timestamp("", reference()), None);
        assert_eq!(parse_frontend_timestamp("Foo 15 12:00:00", reference()), None);
        assert_eq!(parse_frontend_timestamp("2024-13-45 99:00:00", reference()), None);
        assert_eq!(parse_frontend_timestamp("soon", reference()), None);
    }
}
