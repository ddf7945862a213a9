//! Typed parameter resolution.
//!
//! Every declared handler parameter has a [`ParameterDescriptor`]: a logical
//! name, the [`SourceKind`] its raw value is read from and the [`TargetType`]
//! it is converted to. Conversion is done by a [`Strategy`], a plain function
//! looked up by the exact (source, target) pair. Pairs without a strategy are
//! rejected when the route is built.
//!
//! | Source \ Target | String | Integer | Boolean | Date | Bytes |
//! |---|---|---|---|---|---|
//! | route  | required | required | required | required | - |
//! | query  | `""` if absent | `-1` if absent | required | required | - |
//! | form   | `""` if absent | required | required | required | - |
//! | cookie | `""` if absent | - | - | - | - |
//! | file   | file name | - | - | - | content |
//! | body   | UTF-8 body | - | - | - | raw body |
//!
//! Values are never trimmed or coerced: `" 5"` is not an integer and `"True"`
//! is not a boolean. Dates are ISO-8601 calendar dates (`2020-10-20`).
//!
//! # Example
//!
//! ```
//! use waymark_endpoints::param::{resolve, ParamValue, SourceKind, TargetType};
//! use waymark_endpoints::request::RequestData;
//!
//! let request = RequestData::new().with_query("page", "3");
//!
//! let page = resolve(SourceKind::Query, TargetType::Integer, "page", &request).unwrap();
//! assert_eq!(page, ParamValue::Integer(3));
//!
//! let missing = resolve(SourceKind::Query, TargetType::Integer, "size", &request).unwrap();
//! assert_eq!(missing, ParamValue::Integer(-1));
//! ```

use core::fmt;

use bytes::Bytes;
use chrono::NaiveDate;

use crate::error::EndpointError;
use crate::request::Request;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─────────────────────────────────────────────────────────────────────────────
// Descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A `{name}` segment of the route path.
    Route,
    /// The query string.
    Query,
    /// A url-encoded or multipart form field.
    Form,
    /// A request cookie.
    Cookie,
    /// A multipart file upload.
    File,
    /// The raw request body. The parameter name is informational.
    Body,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Route => "route path",
            Self::Query => "query string",
            Self::Form => "form field",
            Self::Cookie => "cookie",
            Self::File => "uploaded file",
            Self::Body => "request body",
        })
    }
}

/// The type a raw value is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Text.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// ISO-8601 calendar date.
    Date,
    /// Raw bytes.
    Bytes,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Bytes => "Bytes",
        })
    }
}

/// A resolved parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// See [`TargetType::String`].
    String(String),
    /// See [`TargetType::Integer`].
    Integer(i64),
    /// See [`TargetType::Boolean`].
    Boolean(bool),
    /// See [`TargetType::Date`].
    Date(NaiveDate),
    /// See [`TargetType::Bytes`].
    Bytes(Bytes),
}

impl ParamValue {
    /// The target type this value belongs to.
    #[must_use]
    pub fn target(&self) -> TargetType {
        match self {
            Self::String(_) => TargetType::String,
            Self::Integer(_) => TargetType::Integer,
            Self::Boolean(_) => TargetType::Boolean,
            Self::Date(_) => TargetType::Date,
            Self::Bytes(_) => TargetType::Bytes,
        }
    }
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    source: SourceKind,
    target: TargetType,
}

impl ParameterDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, source: SourceKind, target: TargetType) -> Self {
        Self {
            name: name.into(),
            source,
            target,
        }
    }

    /// Creates a descriptor whose target is derived from the Rust type `T`.
    pub fn of<T: FromParam>(name: impl Into<String>, source: SourceKind) -> Self {
        Self::new(name, source, T::TARGET)
    }

    /// Logical parameter name, as looked up in the request.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the raw value is read from.
    #[must_use]
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// The type the value is converted to.
    #[must_use]
    pub fn target(&self) -> TargetType {
        self.target
    }

    /// Returns the conversion strategy for this descriptor.
    ///
    /// # Errors
    ///
    /// [`EndpointError::MissingStrategy`] if the (source, target) pair is
    /// not supported.
    pub fn strategy(&self) -> Result<Strategy, EndpointError> {
        strategy(self.source, self.target).ok_or_else(|| EndpointError::MissingStrategy {
            name: self.name.clone(),
            kind: self.source,
            target: self.target,
        })
    }

    /// Resolves this parameter against a request.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub fn resolve(&self, request: &dyn Request) -> Result<ParamValue, EndpointError> {
        (self.strategy()?)(request, &self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

/// Converts the raw value named `name` into a typed value.
pub type Strategy = fn(&dyn Request, &str) -> Result<ParamValue, EndpointError>;

const STRATEGIES: &[(SourceKind, TargetType, Strategy)] = &[
    (SourceKind::Route, TargetType::String, route_string),
    (SourceKind::Route, TargetType::Integer, route_integer),
    (SourceKind::Route, TargetType::Boolean, route_boolean),
    (SourceKind::Route, TargetType::Date, route_date),
    (SourceKind::Query, TargetType::String, query_string),
    (SourceKind::Query, TargetType::Integer, query_integer),
    (SourceKind::Query, TargetType::Boolean, query_boolean),
    (SourceKind::Query, TargetType::Date, query_date),
    (SourceKind::Form, TargetType::String, form_string),
    (SourceKind::Form, TargetType::Integer, form_integer),
    (SourceKind::Form, TargetType::Boolean, form_boolean),
    (SourceKind::Form, TargetType::Date, form_date),
    (SourceKind::Cookie, TargetType::String, cookie_string),
    (SourceKind::File, TargetType::String, file_name),
    (SourceKind::File, TargetType::Bytes, file_content),
    (SourceKind::Body, TargetType::String, body_string),
    (SourceKind::Body, TargetType::Bytes, body_bytes),
];

/// Looks up the strategy registered for an exact (source, target) pair.
#[must_use]
pub fn strategy(source: SourceKind, target: TargetType) -> Option<Strategy> {
    STRATEGIES
        .iter()
        .find(|(s, t, _)| *s == source && *t == target)
        .map(|(_, _, strategy)| *strategy)
}

/// Every supported (source, target) pair.
pub fn supported_pairs() -> impl Iterator<Item = (SourceKind, TargetType)> {
    STRATEGIES.iter().map(|(source, target, _)| (*source, *target))
}

/// Resolves a single parameter.
///
/// # Errors
///
/// - [`EndpointError::MissingStrategy`] if the pair is not supported
/// - [`EndpointError::ParameterConversion`] if the value is absent without a
///   default, or does not parse
pub fn resolve(
    source: SourceKind,
    target: TargetType,
    name: &str,
    request: &dyn Request,
) -> Result<ParamValue, EndpointError> {
    ParameterDescriptor::new(name, source, target).resolve(request)
}

/// Resolves every declared parameter, in order.
///
/// # Errors
///
/// The first failing parameter's error.
pub fn resolve_all(
    parameters: &[ParameterDescriptor],
    request: &dyn Request,
) -> Result<Arguments, EndpointError> {
    parameters
        .iter()
        .map(|param| Ok((param.name.clone(), param.resolve(request)?)))
        .collect::<Result<Vec<_>, EndpointError>>()
        .map(Arguments::new)
}

fn required<'a>(raw: Option<&'a str>, name: &str, target: TargetType) -> Result<&'a str, EndpointError> {
    raw.ok_or_else(|| EndpointError::conversion(name, target))
}

fn parse_integer(raw: &str, name: &str) -> Result<ParamValue, EndpointError> {
    raw.parse::<i64>()
        .map(ParamValue::Integer)
        .map_err(|_| EndpointError::conversion(name, TargetType::Integer))
}

fn parse_boolean(raw: &str, name: &str) -> Result<ParamValue, EndpointError> {
    match raw {
        "true" => Ok(ParamValue::Boolean(true)),
        "false" => Ok(ParamValue::Boolean(false)),
        _ => Err(EndpointError::conversion(name, TargetType::Boolean)),
    }
}

fn parse_date(raw: &str, name: &str) -> Result<ParamValue, EndpointError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(ParamValue::Date)
        .map_err(|_| EndpointError::conversion(name, TargetType::Date))
}

fn route_string(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    let raw = required(request.path_param(name), name, TargetType::String)?;
    Ok(ParamValue::String(raw.to_owned()))
}

fn route_integer(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_integer(required(request.path_param(name), name, TargetType::Integer)?, name)
}

fn route_boolean(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_boolean(required(request.path_param(name), name, TargetType::Boolean)?, name)
}

fn route_date(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_date(required(request.path_param(name), name, TargetType::Date)?, name)
}

fn query_string(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    Ok(ParamValue::String(
        request.query_param(name).unwrap_or_default().to_owned(),
    ))
}

fn query_integer(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    match request.query_param(name) {
        Some(raw) => parse_integer(raw, name),
        None => Ok(ParamValue::Integer(-1)),
    }
}

fn query_boolean(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_boolean(required(request.query_param(name), name, TargetType::Boolean)?, name)
}

fn query_date(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_date(required(request.query_param(name), name, TargetType::Date)?, name)
}

fn form_string(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    Ok(ParamValue::String(
        request.form_param(name).unwrap_or_default().to_owned(),
    ))
}

fn form_integer(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_integer(required(request.form_param(name), name, TargetType::Integer)?, name)
}

fn form_boolean(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_boolean(required(request.form_param(name), name, TargetType::Boolean)?, name)
}

fn form_date(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    parse_date(required(request.form_param(name), name, TargetType::Date)?, name)
}

fn cookie_string(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    Ok(ParamValue::String(
        request.cookie(name).unwrap_or_default().to_owned(),
    ))
}

fn file_name(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    request
        .uploaded_file(name)
        .map(|file| ParamValue::String(file.filename().to_owned()))
        .ok_or_else(|| EndpointError::conversion(name, TargetType::String))
}

fn file_content(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    request
        .uploaded_file(name)
        .map(|file| ParamValue::Bytes(file.content().clone()))
        .ok_or_else(|| EndpointError::conversion(name, TargetType::Bytes))
}

fn body_string(request: &dyn Request, name: &str) -> Result<ParamValue, EndpointError> {
    core::str::from_utf8(request.body())
        .map(|body| ParamValue::String(body.to_owned()))
        .map_err(|_| EndpointError::conversion(name, TargetType::String))
}

fn body_bytes(request: &dyn Request, _name: &str) -> Result<ParamValue, EndpointError> {
    Ok(ParamValue::Bytes(Bytes::copy_from_slice(request.body())))
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Rust types a handler parameter can be declared as.
///
/// The associated [`TARGET`](Self::TARGET) is what `#[endpoints]` records in
/// the parameter descriptor, so the conversion is chosen by the declared type.
pub trait FromParam: Sized {
    /// Target type resolved for parameters of this type.
    const TARGET: TargetType;

    /// Extracts `Self` from a resolved value, or `None` if it does not fit.
    fn from_param(value: ParamValue) -> Option<Self>;
}

impl FromParam for String {
    const TARGET: TargetType = TargetType::String;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl FromParam for i64 {
    const TARGET: TargetType = TargetType::Integer;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Integer(value) => Some(value),
            _ => None,
        }
    }
}

impl FromParam for i32 {
    const TARGET: TargetType = TargetType::Integer;

    fn from_param(value: ParamValue) -> Option<Self> {
        i64::from_param(value).and_then(|value| i32::try_from(value).ok())
    }
}

impl FromParam for bool {
    const TARGET: TargetType = TargetType::Boolean;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Boolean(value) => Some(value),
            _ => None,
        }
    }
}

impl FromParam for NaiveDate {
    const TARGET: TargetType = TargetType::Date;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Date(value) => Some(value),
            _ => None,
        }
    }
}

impl FromParam for Bytes {
    const TARGET: TargetType = TargetType::Bytes;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bytes(value) => Some(value),
            _ => None,
        }
    }
}

impl FromParam for Vec<u8> {
    const TARGET: TargetType = TargetType::Bytes;

    fn from_param(value: ParamValue) -> Option<Self> {
        Bytes::from_param(value).map(Vec::from)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved arguments for one call, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<(String, Option<ParamValue>)>,
}

impl Arguments {
    /// Wraps named values in declaration order.
    #[must_use]
    pub fn new(values: Vec<(String, ParamValue)>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|(name, value)| (name, Some(value)))
                .collect(),
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Moves the argument at `index` out as a `T`.
    ///
    /// # Errors
    ///
    /// [`EndpointError::ParameterConversion`] if the index is out of range,
    /// was already taken, or holds a value that does not fit `T`.
    pub fn take<T: FromParam>(&mut self, index: usize) -> Result<T, EndpointError> {
        let Some((name, slot)) = self.values.get_mut(index) else {
            return Err(EndpointError::conversion(format!("#{index}"), T::TARGET));
        };
        slot.take()
            .and_then(T::from_param)
            .ok_or_else(|| EndpointError::conversion(name.clone(), T::TARGET))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestData, UploadedFile};

    fn date(y: i32, m: u32, d: u32) -> ParamValue {
        ParamValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Route
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn route_values_parse_to_target() {
        let request = RequestData::new()
            .with_path_param("name", "Kalle")
            .with_path_param("id", "42")
            .with_path_param("on", "true")
            .with_path_param("day", "2020-10-20");

        let route = |target: TargetType, name: &'static str| {
            resolve(SourceKind::Route, target, name, &request).unwrap()
        };
        assert_eq!(route(TargetType::String, "name"), ParamValue::String("Kalle".into()));
        assert_eq!(route(TargetType::Integer, "id"), ParamValue::Integer(42));
        assert_eq!(route(TargetType::Boolean, "on"), ParamValue::Boolean(true));
        assert_eq!(route(TargetType::Date, "day"), date(2020, 10, 20));
    }

    #[test]
    fn route_value_is_required() {
        let err = resolve(SourceKind::Route, TargetType::String, "name", &RequestData::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not parse 'name' to 'String'");
    }

    #[test]
    fn unparsable_date_fails_with_name_and_type() {
        let request = RequestData::new().with_path_param("routeParam", "julgran");
        let err = resolve(SourceKind::Route, TargetType::Date, "routeParam", &request).unwrap_err();
        assert_eq!(err.to_string(), "Could not parse 'routeParam' to 'Date'");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query / form / cookie defaults
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn missing_query_values_use_defaults() {
        let request = RequestData::new();
        assert_eq!(
            resolve(SourceKind::Query, TargetType::String, "q", &request).unwrap(),
            ParamValue::String(String::new())
        );
        assert_eq!(
            resolve(SourceKind::Query, TargetType::Integer, "n", &request).unwrap(),
            ParamValue::Integer(-1)
        );
        assert!(resolve(SourceKind::Query, TargetType::Boolean, "b", &request).is_err());
        assert!(resolve(SourceKind::Query, TargetType::Date, "d", &request).is_err());
    }

    #[test]
    fn malformed_query_integer_is_an_error() {
        let request = RequestData::new().with_query("n", "five");
        assert!(matches!(
            resolve(SourceKind::Query, TargetType::Integer, "n", &request),
            Err(EndpointError::ParameterConversion { .. })
        ));
    }

    #[test]
    fn no_trimming_or_coercion() {
        let request = RequestData::new()
            .with_query("n", " 5")
            .with_form("flag", "True");
        assert!(resolve(SourceKind::Query, TargetType::Integer, "n", &request).is_err());
        assert!(resolve(SourceKind::Form, TargetType::Boolean, "flag", &request).is_err());
    }

    #[test]
    fn form_and_cookie_strings_default_to_empty() {
        let request = RequestData::new().with_form("flag", "false");
        assert_eq!(
            resolve(SourceKind::Form, TargetType::Boolean, "flag", &request).unwrap(),
            ParamValue::Boolean(false)
        );
        assert_eq!(
            resolve(SourceKind::Form, TargetType::String, "absent", &request).unwrap(),
            ParamValue::String(String::new())
        );
        assert_eq!(
            resolve(SourceKind::Cookie, TargetType::String, "session", &request).unwrap(),
            ParamValue::String(String::new())
        );
        assert!(resolve(SourceKind::Form, TargetType::Integer, "absent", &request).is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Files and body
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn file_string_is_filename_and_bytes_is_content() {
        let content = "This is an uploaded file";
        let request = RequestData::new().with_file("theFile", UploadedFile::new("notes.txt", content));

        assert_eq!(
            resolve(SourceKind::File, TargetType::String, "theFile", &request).unwrap(),
            ParamValue::String("notes.txt".into())
        );
        assert_eq!(
            resolve(SourceKind::File, TargetType::Bytes, "theFile", &request).unwrap(),
            ParamValue::Bytes(Bytes::from_static(content.as_bytes()))
        );
    }

    #[test]
    fn missing_file_fails() {
        let request = RequestData::new();
        assert!(resolve(SourceKind::File, TargetType::Bytes, "theFile", &request).is_err());
        assert!(resolve(SourceKind::File, TargetType::String, "theFile", &request).is_err());
    }

    #[test]
    fn body_must_be_utf8_for_strings() {
        let request = RequestData::new().with_body(vec![0xff, 0xfe]);
        assert!(resolve(SourceKind::Body, TargetType::String, "body", &request).is_err());
        assert_eq!(
            resolve(SourceKind::Body, TargetType::Bytes, "body", &request).unwrap(),
            ParamValue::Bytes(Bytes::from_static(&[0xff, 0xfe]))
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Strategy table
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn unsupported_pairs_have_no_strategy() {
        assert!(strategy(SourceKind::Cookie, TargetType::Integer).is_none());
        assert!(strategy(SourceKind::Route, TargetType::Bytes).is_none());

        let err = resolve(SourceKind::Cookie, TargetType::Date, "when", &RequestData::new())
            .unwrap_err();
        assert!(matches!(err, EndpointError::MissingStrategy { .. }));
    }

    #[test]
    fn strategy_table_has_no_duplicate_pairs() {
        let pairs: Vec<_> = supported_pairs().collect();
        for (i, pair) in pairs.iter().enumerate() {
            assert!(!pairs[i + 1..].contains(pair), "duplicate strategy for {pair:?}");
        }
        assert_eq!(pairs.len(), 17);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Arguments
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn resolve_all_keeps_declaration_order() {
        let request = RequestData::new()
            .with_path_param("routeParam", "2020-10-20")
            .with_query("queryParam", "5")
            .with_form("formParam", "false");
        let params = [
            ParameterDescriptor::of::<NaiveDate>("routeParam", SourceKind::Route),
            ParameterDescriptor::of::<i64>("queryParam", SourceKind::Query),
            ParameterDescriptor::of::<bool>("formParam", SourceKind::Form),
        ];

        let mut args = resolve_all(&params, &request).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(
            args.take::<NaiveDate>(0).unwrap(),
            NaiveDate::from_ymd_opt(2020, 10, 20).unwrap()
        );
        assert_eq!(args.take::<i64>(1).unwrap(), 5);
        assert!(!args.take::<bool>(2).unwrap());
    }

    #[test]
    fn take_rejects_mismatch_and_reuse() {
        let mut args = Arguments::new(vec![("n".into(), ParamValue::Integer(1))]);
        assert!(args.take::<String>(0).is_err());

        let mut args = Arguments::new(vec![("n".into(), ParamValue::Integer(1))]);
        assert_eq!(args.take::<i32>(0).unwrap(), 1);
        assert!(args.take::<i32>(0).is_err());
        assert!(args.take::<i32>(5).is_err());
    }

    #[test]
    fn i32_rejects_out_of_range() {
        assert_eq!(i32::from_param(ParamValue::Integer(i64::MAX)), None);
    }
}
