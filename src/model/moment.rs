//! Moment.js 风格的时间戳格式化
//!
//! 支持常用格式记号；`[...]` 内为字面文本；其余字符原样输出

use chrono::{DateTime, Datelike, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};

use crate::model::host::TimestampFormatter;

const INVALID_DATE: &str = "Invalid date";

/// 按长度降序排列，保证最长匹配优先
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "DDDD", "dddd", "MMM", "DDD", "ddd", "SSS", "YY", "MM", "DD", "Do", "dd",
    "HH", "hh", "kk", "mm", "ss", "SS", "ZZ", "WW", "Q", "M", "D", "d", "E", "H", "h", "k", "m",
    "s", "S", "A", "a", "Z", "X", "x", "W",
];

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

#[derive(Debug, Clone, Copy)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

#[derive(Debug, Clone, Copy)]
pub struct MomentFormatter {
    zone: Zone,
}

impl Default for MomentFormatter {
    fn default() -> Self {
        Self::local()
    }
}

impl MomentFormatter {
    /// 使用系统本地时区
    pub fn local() -> Self {
        Self { zone: Zone::Local }
    }

    pub fn utc() -> Self {
        Self::fixed(Utc.fix())
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            zone: Zone::Fixed(offset),
        }
    }
}

impl TimestampFormatter for MomentFormatter {
    fn format(&self, instant_ms: i64, pattern: &str) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp_millis(instant_ms) else {
            return INVALID_DATE.to_string();
        };
        match self.zone {
            Zone::Local => format_moment(&utc.with_timezone(&Local), pattern),
            Zone::Fixed(offset) => format_moment(&utc.with_timezone(&offset), pattern),
        }
    }
}

/// 按 Moment.js 记号格式化
pub fn format_moment<Tz: TimeZone>(dt: &DateTime<Tz>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            push_token(&mut out, dt, token);
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn push_token<Tz: TimeZone>(out: &mut String, dt: &DateTime<Tz>, token: &str) {
    let month0 = dt.month0() as usize;
    let weekday = dt.weekday().num_days_from_sunday() as usize;
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };

    let piece = match token {
        "YYYY" => format!("{:04}", dt.year()),
        "YY" => format!("{:02}", dt.year().rem_euclid(100)),
        "Q" => (month0 / 3 + 1).to_string(),
        "M" => dt.month().to_string(),
        "MM" => format!("{:02}", dt.month()),
        "MMM" => MONTHS[month0][..3].to_string(),
        "MMMM" => MONTHS[month0].to_string(),
        "D" => dt.day().to_string(),
        "DD" => format!("{:02}", dt.day()),
        "Do" => ordinal(dt.day()),
        "DDD" => dt.ordinal().to_string(),
        "DDDD" => format!("{:03}", dt.ordinal()),
        "d" => weekday.to_string(),
        "dd" => WEEKDAYS[weekday][..2].to_string(),
        "ddd" => WEEKDAYS[weekday][..3].to_string(),
        "dddd" => WEEKDAYS[weekday].to_string(),
        "E" => dt.weekday().number_from_monday().to_string(),
        "H" => dt.hour().to_string(),
        "HH" => format!("{:02}", dt.hour()),
        "h" => hour12.to_string(),
        "hh" => format!("{:02}", hour12),
        "k" => (if dt.hour() == 0 { 24 } else { dt.hour() }).to_string(),
        "kk" => format!("{:02}", if dt.hour() == 0 { 24 } else { dt.hour() }),
        "m" => dt.minute().to_string(),
        "mm" => format!("{:02}", dt.minute()),
        "s" => dt.second().to_string(),
        "ss" => format!("{:02}", dt.second()),
        "S" => (dt.timestamp_subsec_millis() / 100).to_string(),
        "SS" => format!("{:02}", dt.timestamp_subsec_millis() / 10),
        "SSS" => format!("{:03}", dt.timestamp_subsec_millis()),
        "A" => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if dt.hour() < 12 { "am" } else { "pm" }).to_string(),
        "Z" => offset_string(dt, true),
        "ZZ" => offset_string(dt, false),
        "X" => dt.timestamp().to_string(),
        "x" => dt.timestamp_millis().to_string(),
        "W" => dt.iso_week().week().to_string(),
        "WW" => format!("{:02}", dt.iso_week().week()),
        other => other.to_string(),
    };
    out.push_str(&piece);
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn offset_string<Tz: TimeZone>(dt: &DateTime<Tz>, with_colon: bool) -> String {
    let seconds = dt.offset().fix().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    if with_colon {
        format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
    } else {
        format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
    }
}
