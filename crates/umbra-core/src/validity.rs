//! Constraint validation flags.
//!
//! [`ValidityFlags`] has the shape of the DOM `ValidityState` interface and is
//! shared by native controls and element internals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One constraint-violation indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidityFlag {
    /// A custom message was set with `setCustomValidity`.
    CustomError,
    /// A required control has no value.
    ValueMissing,
    /// The value is below `min`.
    RangeUnderflow,
    /// The value is above `max`.
    RangeOverflow,
    /// The value does not fit the `step` grid.
    StepMismatch,
    /// The value cannot be converted (non-numeric number input).
    BadInput,
    /// The value does not match `pattern`.
    PatternMismatch,
    /// The value is longer than `maxLength`.
    TooLong,
    /// The value is shorter than `minLength`.
    TooShort,
    /// The value does not have the syntax the type requires (email, url).
    TypeMismatch,
}

impl ValidityFlag {
    /// All flags in message precedence order.
    pub const PRECEDENCE: [ValidityFlag; 10] = [
        ValidityFlag::CustomError,
        ValidityFlag::ValueMissing,
        ValidityFlag::RangeUnderflow,
        ValidityFlag::RangeOverflow,
        ValidityFlag::StepMismatch,
        ValidityFlag::BadInput,
        ValidityFlag::PatternMismatch,
        ValidityFlag::TooLong,
        ValidityFlag::TooShort,
        ValidityFlag::TypeMismatch,
    ];

    /// The DOM property name of the flag.
    pub fn as_str(self) -> &'static str {
        match self {
            ValidityFlag::CustomError => "customError",
            ValidityFlag::ValueMissing => "valueMissing",
            ValidityFlag::RangeUnderflow => "rangeUnderflow",
            ValidityFlag::RangeOverflow => "rangeOverflow",
            ValidityFlag::StepMismatch => "stepMismatch",
            ValidityFlag::BadInput => "badInput",
            ValidityFlag::PatternMismatch => "patternMismatch",
            ValidityFlag::TooLong => "tooLong",
            ValidityFlag::TooShort => "tooShort",
            ValidityFlag::TypeMismatch => "typeMismatch",
        }
    }
}

impl fmt::Display for ValidityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `ValidityState`-shaped set of flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityFlags {
    pub value_missing: bool,
    pub type_mismatch: bool,
    pub pattern_mismatch: bool,
    pub too_long: bool,
    pub too_short: bool,
    pub range_underflow: bool,
    pub range_overflow: bool,
    pub step_mismatch: bool,
    pub bad_input: bool,
    pub custom_error: bool,
}

impl ValidityFlags {
    /// Flags with every bit clear.
    pub const VALID: ValidityFlags = ValidityFlags {
        value_missing: false,
        type_mismatch: false,
        pattern_mismatch: false,
        too_long: false,
        too_short: false,
        range_underflow: false,
        range_overflow: false,
        step_mismatch: false,
        bad_input: false,
        custom_error: false,
    };

    /// Flags with exactly one bit set.
    pub fn only(flag: ValidityFlag) -> Self {
        let mut flags = Self::VALID;
        flags.set(flag, true);
        flags
    }

    /// Read one flag.
    pub fn get(&self, flag: ValidityFlag) -> bool {
        match flag {
            ValidityFlag::CustomError => self.custom_error,
            ValidityFlag::ValueMissing => self.value_missing,
            ValidityFlag::RangeUnderflow => self.range_underflow,
            ValidityFlag::RangeOverflow => self.range_overflow,
            ValidityFlag::StepMismatch => self.step_mismatch,
            ValidityFlag::BadInput => self.bad_input,
            ValidityFlag::PatternMismatch => self.pattern_mismatch,
            ValidityFlag::TooLong => self.too_long,
            ValidityFlag::TooShort => self.too_short,
            ValidityFlag::TypeMismatch => self.type_mismatch,
        }
    }

    /// Write one flag.
    pub fn set(&mut self, flag: ValidityFlag, value: bool) {
        let slot = match flag {
            ValidityFlag::CustomError => &mut self.custom_error,
            ValidityFlag::ValueMissing => &mut self.value_missing,
            ValidityFlag::RangeUnderflow => &mut self.range_underflow,
            ValidityFlag::RangeOverflow => &mut self.range_overflow,
            ValidityFlag::StepMismatch => &mut self.step_mismatch,
            ValidityFlag::BadInput => &mut self.bad_input,
            ValidityFlag::PatternMismatch => &mut self.pattern_mismatch,
            ValidityFlag::TooLong => &mut self.too_long,
            ValidityFlag::TooShort => &mut self.too_short,
            ValidityFlag::TypeMismatch => &mut self.type_mismatch,
        };
        *slot = value;
    }

    /// Whether no constraint is violated.
    pub fn valid(&self) -> bool {
        !self.any()
    }

    /// Whether at least one constraint is violated.
    pub fn any(&self) -> bool {
        ValidityFlag::PRECEDENCE.iter().any(|flag| self.get(*flag))
    }

    /// The first set flag in precedence order.
    pub fn first(&self) -> Option<ValidityFlag> {
        ValidityFlag::PRECEDENCE
            .iter()
            .copied()
            .find(|flag| self.get(*flag))
    }

    /// Flags set in either operand.
    pub fn union(self, other: ValidityFlags) -> Self {
        let mut merged = self;
        for flag in other.iter() {
            merged.set(flag, true);
        }
        merged
    }

    /// Iterate over the set flags in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = ValidityFlag> + '_ {
        ValidityFlag::PRECEDENCE
            .iter()
            .copied()
            .filter(|flag| self.get(*flag))
    }
}
