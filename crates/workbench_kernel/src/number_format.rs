//! Number formatting.
//!
//! A number format is a brace-format string with exactly one anonymous
//! field, e.g. `"${:,.2f}"` or `"{:d} bottles"`. The spec inside the field
//! follows the usual `[[fill]align][sign][z][#][0][width][grouping][.precision][type]`
//! mini-language.
//!
//! Differences from a general-purpose formatter:
//!
//! - Floats may be formatted with integer types: `{:d}` truncates `0.7` to `0`.
//! - Integral floats render as integers: `3.0` with `{:,}` is `"3"`, never `"3.0"`.
//!   The client cannot tell floats from ints, so the server must not either.
//! - Field names, indexes and conversions (`{0}`, `{x}`, `{!r}`) are rejected.
//! - Every problem is reported by [`NumberFormatter::new`]; [`NumberFormatter::format`]
//!   cannot fail.

use std::fmt;
use thiserror::Error;
use workbench_protocol::defaults::DEFAULT_NUMBER_FORMAT;

/// Spec type letters that operate on integers.
const INT_TYPE_SPECIFIERS: &[char] = &['b', 'c', 'd', 'o', 'x', 'X', 'n'];

/// Largest width or precision accepted. `g` may add four decimals to the
/// precision and the result must stay within `std::fmt`'s `u16` limit.
const MAX_FIELD_DIGITS: usize = i16::MAX as usize;

/// Reasons a number format is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Format must be str")]
    NotAString,
    #[error("Can only format one number")]
    MultipleFields,
    #[error("Format must look like \"{{:...}}\"")]
    MissingField,
    #[error("Field names or numbers are not allowed")]
    FieldName,
    #[error("Field converters are not allowed")]
    Conversion,
    /// Brace syntax error in the outer string
    #[error("{0}")]
    Syntax(String),
    /// The spec is not a valid number spec
    #[error("{0}")]
    Spec(String),
}

/// A number to format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i128),
    Float(f64),
}

macro_rules! number_value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for NumberValue {
            fn from(value: $t) -> Self {
                NumberValue::Int(value as i128)
            }
        })*
    };
}

number_value_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for NumberValue {
    fn from(value: f64) -> Self {
        NumberValue::Float(value)
    }
}

impl From<f32> for NumberValue {
    fn from(value: f32) -> Self {
        NumberValue::Float(value as f64)
    }
}

impl From<half::f16> for NumberValue {
    fn from(value: half::f16) -> Self {
        NumberValue::Float(value.to_f64())
    }
}

impl NumberValue {
    /// Truncate toward zero. Out-of-range floats saturate; NaN becomes 0.
    fn truncated(self) -> i128 {
        match self {
            NumberValue::Int(i) => i,
            NumberValue::Float(f) => f as i128,
        }
    }

    /// Integral floats that fit become ints.
    fn normalized(self) -> NumberValue {
        match self {
            NumberValue::Float(f)
                if f.is_finite() && f.fract() == 0.0 && f.abs() < i128::MAX as f64 =>
            {
                NumberValue::Int(f as i128)
            }
            other => other,
        }
    }
}

// ============================================================================
// Outer string: literal text and fields
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: String,
    conversion: Option<char>,
    spec: String,
}

/// Literal text followed by an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    literal: String,
    field: Option<Field>,
}

/// Split a brace-format string into chunks.
///
/// `{{` and `}}` are escapes that end the current chunk, so `"{{{:d}"`
/// yields two chunks: `"{"` and a field.
fn parse_chunks(input: &str) -> Result<Vec<Chunk>, FormatError> {
    let chars: Vec<char> = input.chars().collect();
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let literal_start = pos;
        let mut brace = None;
        while pos < chars.len() {
            let c = chars[pos];
            pos += 1;
            if c == '{' || c == '}' {
                brace = Some(c);
                break;
            }
        }

        let at_end = pos >= chars.len();
        let mut literal_end = pos;

        if brace == Some('}') && (at_end || chars[pos] != '}') {
            return Err(FormatError::Syntax(
                "Single '}' encountered in format string".to_string(),
            ));
        }
        if brace == Some('{') && at_end {
            return Err(FormatError::Syntax(
                "Single '{' encountered in format string".to_string(),
            ));
        }

        let mut field_follows = brace.is_some();
        if let Some(b) = brace {
            if chars[pos] == b {
                // Escaped brace: keep one copy in the literal, no field.
                pos += 1;
                field_follows = false;
            } else {
                literal_end -= 1;
            }
        }

        let literal: String = chars[literal_start..literal_end].iter().collect();
        if !field_follows {
            chunks.push(Chunk {
                literal,
                field: None,
            });
            continue;
        }

        let field_start = pos;
        let mut depth = 1;
        while pos < chars.len() {
            match chars[pos] {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            pos += 1;
            if depth == 0 {
                break;
            }
        }
        if depth > 0 {
            return Err(FormatError::Syntax(
                "expected '}' before end of string".to_string(),
            ));
        }

        let field = parse_field(&chars[field_start..pos - 1])?;
        chunks.push(Chunk {
            literal,
            field: Some(field),
        });
    }

    Ok(chunks)
}

fn parse_field(chars: &[char]) -> Result<Field, FormatError> {
    let Some(stop) = chars.iter().position(|c| *c == ':' || *c == '!') else {
        return Ok(Field {
            name: chars.iter().collect(),
            conversion: None,
            spec: String::new(),
        });
    };

    let name: String = chars[..stop].iter().collect();
    let mut pos = stop + 1;
    let mut conversion = None;
    if chars[stop] == '!' {
        let Some(c) = chars.get(pos) else {
            return Err(FormatError::Syntax(
                "end of string while looking for conversion specifier".to_string(),
            ));
        };
        conversion = Some(*c);
        pos += 1;
        if pos < chars.len() {
            if chars[pos] != ':' {
                return Err(FormatError::Syntax(
                    "expected ':' after conversion specifier".to_string(),
                ));
            }
            pos += 1;
        }
    }

    Ok(Field {
        name,
        conversion,
        spec: chars[pos.min(chars.len())..].iter().collect(),
    })
}

// ============================================================================
// Spec mini-language
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
    Space,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormatSpec {
    fill: char,
    align: Align,
    sign: Sign,
    sign_given: bool,
    no_neg_zero: bool,
    alternate: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

fn align_from(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

fn read_integer(chars: &[char], pos: &mut usize) -> Result<Option<usize>, FormatError> {
    let start = *pos;
    let mut value: usize = 0;
    while let Some(d) = chars.get(*pos).and_then(|c| c.to_digit(10)) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(d as usize))
            .filter(|v| *v <= MAX_FIELD_DIGITS)
            .ok_or_else(|| {
                FormatError::Spec("Too many decimal digits in format string".to_string())
            })?;
        *pos += 1;
    }
    Ok((*pos > start).then_some(value))
}

impl FormatSpec {
    fn parse(raw: &str) -> Result<Self, FormatError> {
        let chars: Vec<char> = raw.chars().collect();
        let mut spec = FormatSpec {
            fill: ' ',
            align: Align::Right,
            sign: Sign::Minus,
            sign_given: false,
            no_neg_zero: false,
            alternate: false,
            width: 0,
            grouping: None,
            precision: None,
            kind: None,
        };
        let mut pos = 0;
        let mut fill_given = false;
        let mut align_given = false;

        if let Some(align) = chars.get(1).copied().and_then(align_from) {
            spec.fill = chars[0];
            spec.align = align;
            fill_given = true;
            align_given = true;
            pos = 2;
        } else if let Some(align) = chars.first().copied().and_then(align_from) {
            spec.align = align;
            align_given = true;
            pos = 1;
        }

        if let Some(c @ ('+' | '-' | ' ')) = chars.get(pos).copied() {
            spec.sign = match c {
                '+' => Sign::Plus,
                ' ' => Sign::Space,
                _ => Sign::Minus,
            };
            spec.sign_given = true;
            pos += 1;
        }

        if chars.get(pos) == Some(&'z') {
            spec.no_neg_zero = true;
            pos += 1;
        }
        if chars.get(pos) == Some(&'#') {
            spec.alternate = true;
            pos += 1;
        }
        if !fill_given && chars.get(pos) == Some(&'0') {
            spec.fill = '0';
            if !align_given {
                spec.align = Align::AfterSign;
            }
            pos += 1;
        }

        spec.width = read_integer(&chars, &mut pos)?.unwrap_or(0);

        if chars.get(pos) == Some(&',') {
            spec.grouping = Some(',');
            pos += 1;
        }
        if chars.get(pos) == Some(&'_') {
            if spec.grouping.is_some() {
                return Err(FormatError::Spec("Cannot specify both ',' and '_'.".to_string()));
            }
            spec.grouping = Some('_');
            pos += 1;
        }
        if chars.get(pos) == Some(&',') {
            return Err(FormatError::Spec("Cannot specify both ',' and '_'.".to_string()));
        }

        if chars.get(pos) == Some(&'.') {
            pos += 1;
            spec.precision = Some(read_integer(&chars, &mut pos)?.ok_or_else(|| {
                FormatError::Spec("Format specifier missing precision".to_string())
            })?);
        }

        match chars.len() - pos {
            0 => {}
            1 => spec.kind = Some(chars[pos]),
            _ => {
                return Err(FormatError::Spec(format!(
                    "Invalid format specifier '{}' for object of type 'int'",
                    raw
                )))
            }
        }

        if let Some(sep) = spec.grouping {
            match spec.kind {
                None | Some('d' | 'e' | 'f' | 'g' | 'E' | 'G' | '%' | 'F') => {}
                Some('b' | 'o' | 'x' | 'X') if sep == '_' => {}
                Some(kind) => {
                    return Err(FormatError::Spec(format!(
                        "Cannot specify '{}' with '{}'.",
                        sep, kind
                    )))
                }
            }
        }

        Ok(spec)
    }

    fn is_int_kind(&self) -> bool {
        matches!(self.kind, None | Some('b' | 'c' | 'd' | 'o' | 'x' | 'X' | 'n'))
    }

    /// Checks that only apply when an integer meets an integer type.
    fn check_int(&self) -> Result<(), FormatError> {
        if self.precision.is_some() {
            return Err(FormatError::Spec(
                "Precision not allowed in integer format specifier".to_string(),
            ));
        }
        if self.no_neg_zero {
            return Err(FormatError::Spec(
                "Negative zero coercion (z) not allowed in integer format specifier".to_string(),
            ));
        }
        if self.kind == Some('c') {
            if self.sign_given {
                return Err(FormatError::Spec(
                    "Sign not allowed with integer format specifier 'c'".to_string(),
                ));
            }
            if self.alternate {
                return Err(FormatError::Spec(
                    "Alternate form (#) not allowed with integer format specifier 'c'"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_float(&self) -> Result<(), FormatError> {
        match self.kind {
            None | Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | 'n' | '%') => Ok(()),
            Some(kind) => Err(unknown_code(kind, "float")),
        }
    }

    fn format_int(&self, value: i128) -> Result<String, FormatError> {
        if let Some(kind) = self.kind.filter(|_| !self.is_int_kind()) {
            return match kind {
                'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%' => self.format_float(value as f64),
                other => Err(unknown_code(other, "int")),
            };
        }
        self.check_int()?;

        let negative = value < 0;
        let magnitude = value.unsigned_abs();
        let (prefix, digits) = match self.kind {
            None | Some('d' | 'n') => ("", magnitude.to_string()),
            Some('b') => ("0b", format!("{:b}", magnitude)),
            Some('o') => ("0o", format!("{:o}", magnitude)),
            Some('x') => ("0x", format!("{:x}", magnitude)),
            Some('X') => ("0X", format!("{:X}", magnitude)),
            Some('c') => {
                let c = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Ok(self.pad(Rendered::plain(c.to_string())));
            }
            Some(kind) => return Err(unknown_code(kind, "int")),
        };

        Ok(self.pad(Rendered {
            negative,
            prefix: if self.alternate { prefix } else { "" },
            digits,
            rest: String::new(),
            groupable: true,
        }))
    }

    fn format_float(&self, value: f64) -> Result<String, FormatError> {
        self.check_float()?;
        let upper = matches!(self.kind, Some('E' | 'F' | 'G'));
        let mut negative = value.is_sign_negative() && !value.is_nan();
        let magnitude = value.abs();

        let mut body = if !magnitude.is_finite() {
            if magnitude.is_nan() { "nan" } else { "inf" }.to_string()
        } else {
            match self.kind {
                // A bare type never carries a precision: integers reject it.
                None => repr_float(magnitude),
                Some('f' | 'F') => fixed_float(magnitude, self.precision.unwrap_or(6), self.alternate),
                Some('e' | 'E') => {
                    scientific_float(magnitude, self.precision.unwrap_or(6), self.alternate)
                }
                Some('g' | 'G' | 'n') => {
                    general_float(magnitude, self.precision.unwrap_or(6), self.alternate)
                }
                Some('%') => {
                    fixed_float(magnitude * 100.0, self.precision.unwrap_or(6), self.alternate)
                }
                Some(kind) => return Err(unknown_code(kind, "float")),
            }
        };
        if upper {
            body = body.to_uppercase();
        }
        if self.no_neg_zero && negative && body.chars().all(|c| matches!(c, '0' | '.')) {
            negative = false;
        }

        let split = body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(body.len());
        let mut rest = body[split..].to_string();
        if self.kind == Some('%') {
            rest.push('%');
        }

        Ok(self.pad(Rendered {
            negative,
            prefix: "",
            digits: body[..split].to_string(),
            rest,
            groupable: magnitude.is_finite(),
        }))
    }

    fn pad(&self, rendered: Rendered) -> String {
        let sign = match (rendered.negative, self.sign) {
            (true, _) => "-",
            (false, Sign::Plus) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Minus) => "",
        };
        let lead = sign.len() + rendered.prefix.len();
        let rest_len = rendered.rest.chars().count();

        let digits = match self.grouping {
            Some(sep) if rendered.groupable => {
                let group = if matches!(self.kind, Some('b' | 'o' | 'x' | 'X')) { 4 } else { 3 };
                let min_width = if self.fill == '0' && self.align == Align::AfterSign {
                    self.width.saturating_sub(lead + rest_len)
                } else {
                    0
                };
                group_digits(&rendered.digits, sep, group, min_width)
            }
            _ => rendered.digits,
        };

        let len = lead + digits.chars().count() + rest_len;
        let padding = self.width.saturating_sub(len);
        let fill = |n: usize| std::iter::repeat(self.fill).take(n).collect::<String>();
        let prefix = rendered.prefix;
        let rest = rendered.rest;

        match self.align {
            Align::Left => format!("{sign}{prefix}{digits}{rest}{}", fill(padding)),
            Align::Right => format!("{}{sign}{prefix}{digits}{rest}", fill(padding)),
            Align::Center => {
                let left = padding / 2;
                format!(
                    "{}{sign}{prefix}{digits}{rest}{}",
                    fill(left),
                    fill(padding - left)
                )
            }
            Align::AfterSign => format!("{sign}{prefix}{}{digits}{rest}", fill(padding)),
        }
    }
}

fn unknown_code(kind: char, type_name: &str) -> FormatError {
    FormatError::Spec(format!(
        "Unknown format code '{}' for object of type '{}'",
        kind, type_name
    ))
}

struct Rendered {
    negative: bool,
    prefix: &'static str,
    /// Leading digit run (the part grouping applies to)
    digits: String,
    /// Decimal point, fraction, exponent, percent sign
    rest: String,
    groupable: bool,
}

impl Rendered {
    fn plain(text: String) -> Self {
        Self {
            negative: false,
            prefix: "",
            digits: text,
            rest: String::new(),
            groupable: false,
        }
    }
}

/// Insert `sep` every `group` digits from the right, zero-padding up to
/// `min_width`. The output never starts with a separator.
fn group_digits(digits: &str, sep: char, group: usize, min_width: usize) -> String {
    let source: Vec<char> = digits.chars().rev().collect();
    let mut out: Vec<char> = Vec::with_capacity(source.len() + source.len() / group + 1);
    let mut next = 0;
    let mut in_group = 0;
    let mut owe_digit = false;

    loop {
        if next < source.len() {
            out.push(source[next]);
            next += 1;
        } else if owe_digit || out.len() < min_width {
            out.push('0');
        } else {
            break;
        }
        owe_digit = false;
        in_group += 1;

        if in_group == group && (next < source.len() || out.len() < min_width) {
            out.push(sep);
            in_group = 0;
            owe_digit = true;
        }
    }

    out.into_iter().rev().collect()
}

// ============================================================================
// Float layouts
// ============================================================================

/// Split Rust's `{:e}` output into (digits without point, decimal exponent).
fn decompose(sci: &str) -> (String, i32) {
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci, "0"));
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits, exponent.parse().unwrap_or(0))
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("e{}{:02}", sign, exponent.unsigned_abs())
}

fn fixed_float(value: f64, precision: usize, alternate: bool) -> String {
    let mut out = format!("{:.*}", precision, value);
    if alternate && precision == 0 {
        out.push('.');
    }
    out
}

fn scientific_float(value: f64, precision: usize, alternate: bool) -> String {
    let (digits, exponent) = decompose(&format!("{:.*e}", precision, value));
    let mut out = digits[..1].to_string();
    if precision > 0 || alternate {
        out.push('.');
    }
    out.push_str(&digits[1..]);
    out.push_str(&exponent_suffix(exponent));
    out
}

/// `g` layout: fixed when the rounded exponent is in `[-4, precision)`.
fn general_float(value: f64, precision: usize, alternate: bool) -> String {
    let precision = precision.max(1);
    let (digits, exponent) = decompose(&format!("{:.*e}", precision - 1, value));

    if exponent < -4 || exponent >= precision as i32 {
        let mut mantissa = digits[..1].to_string();
        if digits.len() > 1 || alternate {
            mantissa.push('.');
            mantissa.push_str(&digits[1..]);
        }
        if !alternate {
            mantissa = strip_fraction_zeros(mantissa);
        }
        mantissa + &exponent_suffix(exponent)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let mut fixed = format!("{:.*}", decimals, value);
        if alternate && decimals == 0 {
            fixed.push('.');
        }
        if !alternate {
            fixed = strip_fraction_zeros(fixed);
        }
        fixed
    }
}

fn strip_fraction_zeros(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Shortest round-trip rendering; exponent form below 1e-4 and from 1e16.
fn repr_float(value: f64) -> String {
    let (digits, exponent) = decompose(&format!("{:e}", value));
    if exponent < -4 || exponent >= 16 {
        let mut out = digits[..1].to_string();
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        return out + &exponent_suffix(exponent);
    }

    let point = exponent + 1;
    if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}.0", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    }
}

// ============================================================================
// NumberFormatter
// ============================================================================

/// Validated number format.
///
/// ```
/// use workbench_kernel::NumberFormatter;
///
/// let formatter = NumberFormatter::new("${:,.2f}").unwrap();
/// assert_eq!(formatter.format(1234.56), "$1,234.56");
/// ```
#[derive(Clone)]
pub struct NumberFormatter {
    source: String,
    prefix: String,
    suffix: String,
    spec: FormatSpec,
    need_int: bool,
}

impl NumberFormatter {
    pub fn new(format: &str) -> Result<Self, FormatError> {
        let chunks = parse_chunks(format)?;

        if chunks.len() > 2 || (chunks.len() == 2 && chunks[1].field.is_some()) {
            return Err(FormatError::MultipleFields);
        }
        let Some(field) = chunks.first().and_then(|c| c.field.as_ref()) else {
            return Err(FormatError::MissingField);
        };
        if !field.name.is_empty() {
            return Err(FormatError::FieldName);
        }
        if field.conversion.is_some() {
            return Err(FormatError::Conversion);
        }

        let spec = FormatSpec::parse(&field.spec)?;
        let need_int = field
            .spec
            .chars()
            .last()
            .map_or(false, |c| INT_TYPE_SPECIFIERS.contains(&c));

        // Integer formatting accepts a superset of what float formatting
        // accepts, so a spec that formats 1 is valid for every number.
        spec.format_int(1)?;

        Ok(Self {
            source: format.to_string(),
            prefix: chunks[0].literal.clone(),
            suffix: chunks.get(1).map(|c| c.literal.clone()).unwrap_or_default(),
            spec,
            need_int,
        })
    }

    /// The format string this formatter was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn requires_integer(&self) -> bool {
        self.need_int
    }

    pub fn format(&self, value: impl Into<NumberValue>) -> String {
        let value = value.into();
        let value = if self.need_int {
            NumberValue::Int(value.truncated())
        } else {
            value.normalized()
        };

        let body = match value {
            NumberValue::Int(i) => self.spec.format_int(i),
            NumberValue::Float(f) => self.spec.format_float(f),
        };
        // Construction already formatted a number with this spec.
        let body = body.unwrap_or_else(|_| match value {
            NumberValue::Int(i) => i.to_string(),
            NumberValue::Float(f) => f.to_string(),
        });

        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

impl Default for NumberFormatter {
    /// The `{:,}` format: thousands separators, shortest float digits.
    fn default() -> Self {
        Self {
            source: DEFAULT_NUMBER_FORMAT.to_string(),
            prefix: String::new(),
            suffix: String::new(),
            spec: FormatSpec {
                fill: ' ',
                align: Align::Right,
                sign: Sign::Minus,
                sign_given: false,
                no_neg_zero: false,
                alternate: false,
                width: 0,
                grouping: Some(','),
                precision: None,
                kind: None,
            },
            need_int: false,
        }
    }
}

impl fmt::Debug for NumberFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NumberFormatter").field(&self.source).finish()
    }
}

impl PartialEq for NumberFormatter {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for NumberFormatter {}

impl std::hash::Hash for NumberFormatter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}
