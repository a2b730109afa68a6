//! Constraint evaluation for form-associated controls.
//!
//! [`ValidityEngine::evaluate`] is a pure function of a descriptor, the
//! canonical value, the custom validity message and (when a native control
//! is bound) that control's own validity. It yields the flags to hand to the
//! element internals and the message to show.
//!
//! # Message precedence
//!
//! When several constraints fail, the message of the first one in this order
//! wins: customError, valueMissing, rangeUnderflow, rangeOverflow,
//! stepMismatch, badInput, patternMismatch, tooLong, tooShort.
//!
//! # Comparable projections
//!
//! Range checks compare values after projecting them onto a number:
//!
//! | kind | projection |
//! |---|---|
//! | `date` | milliseconds since the epoch at midnight UTC |
//! | `time` | milliseconds on a fixed reference day |
//! | `datetime-local` | milliseconds since the epoch, read as UTC |
//! | `month` | the first day of the month |
//! | `week` | `YYYY-Www` as the decimal `YYYY.ww` |
//! | others | the number itself |

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use serde::Serialize;
use umbra_core::logging::targets;
use umbra_core::{FormValue, ValidityFlag, ValidityFlags};

use crate::config::MessageCatalog;
use crate::descriptor::{ControlKind, FormControlDescriptor};

/// Tolerance for step alignment checks.
const STEP_EPSILON: f64 = 1e-7;

/// Step used when `step` is absent or not a positive number.
const DEFAULT_STEP: f64 = 1.0;

/// The result of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityReport {
    /// Merged flags.
    pub flags: ValidityFlags,
    /// Message for the first failing constraint, empty when valid.
    pub message: String,
    /// Whether the kind takes part in constraint checks at all. Hidden,
    /// button and unrecognized kinds only carry custom errors.
    pub evaluated: bool,
}

impl ValidityReport {
    /// Whether no constraint failed.
    pub fn is_valid(&self) -> bool {
        self.flags.valid()
    }
}

/// Everything one evaluation looks at.
#[derive(Debug, Clone, Copy)]
pub struct ValidityInput<'a> {
    pub descriptor: &'a FormControlDescriptor,
    /// The canonical value.
    pub value: Option<&'a FormValue>,
    /// Message set through `setCustomValidity`; empty for none.
    pub custom_message: &'a str,
    /// Validity of the bound native control and its message.
    pub native: Option<&'a (ValidityFlags, String)>,
}

/// Details needed to word the message of each failing constraint.
#[derive(Debug, Default)]
struct Findings {
    flags: ValidityFlags,
    underflow_bound: String,
    overflow_bound: String,
    nearest: Option<(String, Option<String>)>,
    /// (limit, length)
    too_long: Option<(usize, usize)>,
    /// (limit, length)
    too_short: Option<(usize, usize)>,
}

/// Evaluates constraints and words their messages.
#[derive(Debug, Clone, Copy)]
pub struct ValidityEngine<'a> {
    messages: &'a MessageCatalog,
}

impl<'a> ValidityEngine<'a> {
    /// Create an engine using `messages`.
    pub fn new(messages: &'a MessageCatalog) -> Self {
        Self { messages }
    }

    /// Evaluate `input`.
    pub fn evaluate(&self, input: &ValidityInput<'_>) -> ValidityReport {
        let descriptor = input.descriptor;
        let kind = descriptor
            .kind()
            .filter(|kind| !kind.is_button() && *kind != ControlKind::Hidden);

        let mut findings = Findings::default();
        if let Some(kind) = kind {
            self.check_constraints(kind, descriptor, input.value, &mut findings);
        }
        findings.flags.custom_error = !input.custom_message.is_empty();

        let computed = findings.flags;
        let mut flags = computed;
        let mut message = String::new();
        if computed.any() {
            message = self.message_for(kind, &findings, input.custom_message);
        }
        if let Some((native_flags, native_message)) = input.native {
            flags = flags.union(*native_flags);
            if !computed.any() && native_flags.any() {
                message = native_message.clone();
            }
        }

        tracing::trace!(
            target: targets::VALIDITY,
            kind = ?descriptor.kind(),
            valid = flags.valid(),
            %message,
            "evaluated validity"
        );
        ValidityReport {
            flags,
            message,
            evaluated: kind.is_some(),
        }
    }

    fn check_constraints(
        &self,
        kind: ControlKind,
        descriptor: &FormControlDescriptor,
        value: Option<&FormValue>,
        findings: &mut Findings,
    ) {
        let empty = value.is_none_or(FormValue::is_empty);
        if descriptor.required && empty {
            findings.flags.value_missing = true;
        }
        if empty {
            return;
        }
        let Some(text) = value.and_then(FormValue::as_text) else {
            return;
        };

        if kind.is_numeric_family() {
            check_range(kind, descriptor, text, findings);
        }
        if kind.is_text_like() {
            check_text(descriptor, text, findings);
        }
    }

    fn message_for(&self, kind: Option<ControlKind>, findings: &Findings, custom: &str) -> String {
        let messages = self.messages;
        let date_family = kind.is_some_and(ControlKind::is_date_family);
        let Some(flag) = findings.flags.first() else {
            return String::new();
        };
        match flag {
            ValidityFlag::CustomError => custom.to_string(),
            ValidityFlag::ValueMissing => match kind {
                Some(ControlKind::Checkbox) => messages.value_missing_checkbox.clone(),
                Some(ControlKind::Radio) => messages.value_missing_radio.clone(),
                Some(ControlKind::Select) => messages.value_missing_select.clone(),
                Some(ControlKind::File) => messages.value_missing_file.clone(),
                _ => messages.value_missing.clone(),
            },
            ValidityFlag::RangeUnderflow => {
                let template = if date_family {
                    &messages.range_underflow_date
                } else {
                    &messages.range_underflow
                };
                MessageCatalog::format(template, &[("min", findings.underflow_bound.as_str())])
            }
            ValidityFlag::RangeOverflow => {
                let template = if date_family {
                    &messages.range_overflow_date
                } else {
                    &messages.range_overflow
                };
                MessageCatalog::format(template, &[("max", findings.overflow_bound.as_str())])
            }
            ValidityFlag::StepMismatch => match &findings.nearest {
                Some((low, Some(high))) => MessageCatalog::format(
                    &messages.step_mismatch,
                    &[("low", low.as_str()), ("high", high.as_str())],
                ),
                Some((low, None)) => {
                    MessageCatalog::format(&messages.step_mismatch_one, &[("low", low.as_str())])
                }
                None => String::new(),
            },
            ValidityFlag::BadInput => messages.bad_input.clone(),
            ValidityFlag::PatternMismatch => messages.pattern_mismatch.clone(),
            ValidityFlag::TooLong => {
                let (limit, len) = findings.too_long.unwrap_or_default();
                MessageCatalog::format(
                    &messages.too_long,
                    &[("limit", limit.to_string().as_str()), ("len", len.to_string().as_str())],
                )
            }
            ValidityFlag::TooShort => {
                let (limit, len) = findings.too_short.unwrap_or_default();
                MessageCatalog::format(
                    &messages.too_short,
                    &[("limit", limit.to_string().as_str()), ("len", len.to_string().as_str())],
                )
            }
            ValidityFlag::TypeMismatch => String::new(),
        }
    }
}

fn check_range(kind: ControlKind, descriptor: &FormControlDescriptor, text: &str, findings: &mut Findings) {
    let Some(value) = project(kind, text) else {
        if kind == ControlKind::Number {
            findings.flags.bad_input = true;
        }
        return;
    };

    let min = descriptor.min().and_then(|raw| Some((raw, project(kind, raw)?)));
    let max = descriptor.max().and_then(|raw| Some((raw, project(kind, raw)?)));
    if let Some((raw, bound)) = min
        && value < bound
    {
        findings.flags.range_underflow = true;
        findings.underflow_bound = raw.to_string();
    }
    if let Some((raw, bound)) = max
        && value > bound
    {
        findings.flags.range_overflow = true;
        findings.overflow_bound = raw.to_string();
    }

    if kind == ControlKind::Number {
        check_step(descriptor, value, max.map(|(_, bound)| bound), findings);
    }
}

fn check_step(descriptor: &FormControlDescriptor, value: f64, max: Option<f64>, findings: &mut Findings) {
    let step_attr = descriptor.step().map(str::trim);
    if step_attr.is_some_and(|step| step.eq_ignore_ascii_case("any")) {
        return;
    }
    let step = step_attr
        .and_then(|step| step.parse::<f64>().ok())
        .filter(|step| step.is_finite() && *step > 0.0)
        .unwrap_or(DEFAULT_STEP);
    let min_attr = descriptor.min().map(str::trim);
    let reference = min_attr
        .and_then(|min| min.parse::<f64>().ok())
        .filter(|min| min.is_finite())
        .unwrap_or(0.0);

    let ratio = (value - reference) / step;
    if (ratio - ratio.round()).abs() <= STEP_EPSILON {
        return;
    }
    findings.flags.step_mismatch = true;

    let decimals = decimal_places(step_attr.unwrap_or("1")).max(min_attr.map_or(0, decimal_places));
    let lower = reference + ratio.floor() * step;
    let upper = lower + step;
    let low = format!("{lower:.decimals$}");
    let high = match max {
        Some(max) if upper > max + STEP_EPSILON => None,
        _ => Some(format!("{upper:.decimals$}")),
    };
    findings.nearest = Some((low, high));
}

fn check_text(descriptor: &FormControlDescriptor, text: &str, findings: &mut Findings) {
    if let Some(pattern) = descriptor.pattern() {
        match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => {
                if !regex.is_match(text) {
                    findings.flags.pattern_mismatch = true;
                }
            }
            Err(err) => {
                tracing::debug!(target: targets::VALIDITY, %pattern, %err, "ignoring invalid pattern");
            }
        }
    }

    let len = text.encode_utf16().count();
    if let Some(limit) = descriptor.max_length()
        && len > limit
    {
        findings.flags.too_long = true;
        findings.too_long = Some((limit, len));
    }
    if let Some(limit) = descriptor.min_length()
        && len < limit
    {
        findings.flags.too_short = true;
        findings.too_short = Some((limit, len));
    }
}

/// Digits after the decimal point of a numeric attribute string.
fn decimal_places(raw: &str) -> usize {
    raw.split_once('.')
        .map(|(_, fraction)| fraction.chars().take_while(char::is_ascii_digit).count())
        .unwrap_or(0)
}

/// Project an attribute or value string of `kind` onto a comparable number.
pub fn project(kind: ControlKind, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match kind {
        ControlKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(date_millis),
        ControlKind::Month => {
            let (year, month) = raw.split_once('-')?;
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1).and_then(date_millis)
        }
        ControlKind::Week => parse_week(raw),
        ControlKind::Time => {
            let time = parse_time(raw)?;
            let reference = NaiveDate::from_ymd_opt(1970, 1, 1)?;
            Some(reference.and_time(time).and_utc().timestamp_millis() as f64)
        }
        ControlKind::DatetimeLocal => {
            let normalized = raw.replacen(' ', "T", 1);
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
                .map(|datetime| datetime.and_utc().timestamp_millis() as f64)
        }
        _ => raw.parse::<f64>().ok().filter(|value| value.is_finite()),
    }
}

fn date_millis(date: NaiveDate) -> Option<f64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64)
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// `YYYY-Www` as `YYYY.ww`; the week must exist in that ISO year.
fn parse_week(raw: &str) -> Option<f64> {
    let (year, week) = raw.split_once('-')?;
    let week = week.strip_prefix('W').or_else(|| week.strip_prefix('w'))?;
    if week.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
    Some(f64::from(year) + f64::from(week) / 100.0)
}
