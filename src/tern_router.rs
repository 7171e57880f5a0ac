//! Contains the url map and the per-request matcher.

use crate::http::method::Method;
use crate::tern_error::{BuildError, InvalidPatternError, TernResult};
use crate::util::{unwrap_ok, unwrap_some};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Placeholder segments look like `<name>` or `<converter:name>`.
static PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| unwrap_ok(Regex::new(r"^<(?:(string|int|path):)?([A-Za-z_][A-Za-z0-9_]*)>$")));

/// A path parameter captured by a converter, or supplied to reverse construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamValue {
  /// Captured by the `string` (default) and `path` converters.
  Str(String),
  /// Captured by the `int` converter.
  Int(u64),
}

impl ParamValue {
  /// The string value, if this is one.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      ParamValue::Str(value) => Some(value.as_str()),
      ParamValue::Int(_) => None,
    }
  }

  /// The integer value, if this is one.
  pub fn as_int(&self) -> Option<u64> {
    match self {
      ParamValue::Int(value) => Some(*value),
      ParamValue::Str(_) => None,
    }
  }
}

impl Display for ParamValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ParamValue::Str(value) => f.write_str(value),
      ParamValue::Int(value) => Display::fmt(value, f),
    }
  }
}

impl From<&str> for ParamValue {
  fn from(value: &str) -> Self {
    ParamValue::Str(value.to_string())
  }
}

impl From<String> for ParamValue {
  fn from(value: String) -> Self {
    ParamValue::Str(value)
  }
}

impl From<u64> for ParamValue {
  fn from(value: u64) -> Self {
    ParamValue::Int(value)
  }
}

/// The typed path parameters of a match, keyed by placeholder name.
#[derive(Clone, Debug, Default)]
pub struct PathParams {
  values: HashMap<String, ParamValue>,
}

impl PathParams {
  /// An empty parameter set.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets a parameter, returning the previous value of the same name.
  pub fn insert(&mut self, name: impl ToString, value: impl Into<ParamValue>) -> Option<ParamValue> {
    self.values.insert(name.to_string(), value.into())
  }

  /// Gets a parameter or None.
  pub fn get(&self, name: impl AsRef<str>) -> Option<&ParamValue> {
    self.values.get(name.as_ref())
  }

  /// Gets a string parameter or None.
  pub fn get_str(&self, name: impl AsRef<str>) -> Option<&str> {
    self.get(name).and_then(ParamValue::as_str)
  }

  /// Gets an integer parameter or None.
  pub fn get_int(&self, name: impl AsRef<str>) -> Option<u64> {
    self.get(name).and_then(ParamValue::as_int)
  }

  /// Number of parameters.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// True if there are no parameters.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Iterates over name value pairs. Order is unspecified.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Converter {
  Str,
  Int,
  Path,
}

#[derive(Debug, Clone)]
enum PatternPart {
  Literal(String),
  Param(String, Converter),
}

fn parse_pattern(pattern: &str) -> TernResult<Vec<PatternPart>> {
  let Some(stripped) = pattern.strip_prefix('/') else {
    return InvalidPatternError::NoLeadingSlash(pattern.to_string()).into();
  };

  let segments: Vec<&str> = stripped.split('/').collect();
  let last = segments.len().saturating_sub(1);
  let mut names: HashSet<String> = HashSet::new();
  let mut parts = Vec::new();

  for (index, segment) in segments.iter().enumerate() {
    if let Some(captures) = PLACEHOLDER.captures(segment) {
      let converter = match captures.get(1).map(|m| m.as_str()) {
        None | Some("string") => Converter::Str,
        Some("int") => Converter::Int,
        Some("path") => Converter::Path,
        Some(_) => crate::util::unreachable(),
      };

      let name = unwrap_some(captures.get(2)).as_str().to_string();
      if !names.insert(name.clone()) {
        return InvalidPatternError::DuplicateParamName(pattern.to_string(), name).into();
      }

      if converter == Converter::Path && index != last {
        return InvalidPatternError::SegmentsAfterPathConverter(pattern.to_string()).into();
      }

      parts.push(PatternPart::Param(name, converter));
      continue;
    }

    if segment.contains('<') || segment.contains('>') {
      return InvalidPatternError::BadPlaceholder(pattern.to_string(), segment.to_string()).into();
    }

    parts.push(PatternPart::Literal(segment.to_string()));
  }

  Ok(parts)
}

/// One registered route rule: pattern, optional method set, endpoint name and
/// the branch/strict-slash flags. Immutable once registered.
#[derive(Debug)]
pub struct Rule {
  pattern: String,
  parts: Vec<PatternPart>,
  methods: Option<Vec<Method>>,
  endpoint: String,
  branch: bool,
  strict_slashes: bool,
}

enum RuleMatch {
  Full { params: PathParams, consumed: Vec<String>, tail: Vec<String> },
  Redirect,
  None,
}

impl Rule {
  /// Parses a pattern into a rule. `methods` of None accepts any method,
  /// `endpoint` is the name reverse construction refers to.
  pub fn new(
    pattern: impl ToString,
    methods: Option<Vec<Method>>,
    endpoint: impl ToString,
    branch: bool,
    strict_slashes: bool,
  ) -> TernResult<Rule> {
    let pattern = pattern.to_string();
    Ok(Rule {
      parts: parse_pattern(pattern.as_str())?,
      pattern,
      methods,
      endpoint: endpoint.to_string(),
      branch,
      strict_slashes,
    })
  }

  /// The pattern this rule was registered with.
  pub fn pattern(&self) -> &str {
    self.pattern.as_str()
  }

  /// The endpoint name handlers and `url_for` refer to.
  pub fn endpoint(&self) -> &str {
    self.endpoint.as_str()
  }

  /// The methods this rule accepts, None accepts any.
  pub fn methods(&self) -> Option<&[Method]> {
    self.methods.as_deref()
  }

  /// True for rules that match a prefix and delegate the tail.
  pub fn is_branch(&self) -> bool {
    self.branch
  }

  fn allows(&self, method: &Method) -> bool {
    match &self.methods {
      None => true,
      Some(methods) => methods.contains(method),
    }
  }

  /// The parts without a trailing slash marker, used for branch prefix matching.
  fn prefix_parts(&self) -> &[PatternPart] {
    match self.parts.split_last() {
      Some((PatternPart::Literal(lit), rest)) if lit.is_empty() => rest,
      _ => self.parts.as_slice(),
    }
  }

  /// For slash-terminated patterns (other than the root), the parts the
  /// slashless form of the path must match.
  fn slashless_parts(&self) -> Option<&[PatternPart]> {
    match self.parts.split_last() {
      Some((PatternPart::Literal(lit), rest)) if lit.is_empty() && !rest.is_empty() => Some(rest),
      _ => None,
    }
  }

  fn match_segments(parts: &[PatternPart], segments: &[&str], params: &mut PathParams) -> bool {
    let mut index = 0usize;
    for part in parts {
      match part {
        PatternPart::Literal(lit) => match segments.get(index) {
          Some(segment) if *segment == lit.as_str() => index += 1,
          _ => return false,
        },
        PatternPart::Param(name, Converter::Str) => match segments.get(index) {
          Some(segment) if !segment.is_empty() => {
            params.insert(name, *segment);
            index += 1;
          }
          _ => return false,
        },
        PatternPart::Param(name, Converter::Int) => match segments.get(index) {
          Some(segment) if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => {
            let Ok(value) = segment.parse::<u64>() else {
              return false;
            };
            params.insert(name, value);
            index += 1;
          }
          _ => return false,
        },
        PatternPart::Param(name, Converter::Path) => {
          let rest = unwrap_some(segments.get(index..)).join("/");
          if rest.is_empty() {
            return false;
          }

          params.insert(name, rest);
          index = segments.len();
        }
      }
    }

    index == segments.len()
  }

  /// Prefix variant of match_segments, yields the number of consumed segments.
  fn match_prefix(parts: &[PatternPart], segments: &[&str], params: &mut PathParams) -> Option<usize> {
    let mut index = 0usize;
    for part in parts {
      match part {
        PatternPart::Literal(lit) => match segments.get(index) {
          Some(segment) if *segment == lit.as_str() => index += 1,
          _ => return None,
        },
        PatternPart::Param(name, Converter::Str) => match segments.get(index) {
          Some(segment) if !segment.is_empty() => {
            params.insert(name, *segment);
            index += 1;
          }
          _ => return None,
        },
        PatternPart::Param(name, Converter::Int) => match segments.get(index) {
          Some(segment) if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => {
            let Ok(value) = segment.parse::<u64>() else {
              return None;
            };
            params.insert(name, value);
            index += 1;
          }
          _ => return None,
        },
        PatternPart::Param(name, Converter::Path) => {
          let rest = unwrap_some(segments.get(index..)).join("/");
          if rest.is_empty() {
            return None;
          }

          params.insert(name, rest);
          index = segments.len();
        }
      }
    }

    Some(index)
  }

  fn match_rule(&self, segments: &[&str]) -> RuleMatch {
    let mut params = PathParams::new();
    if Self::match_segments(&self.parts, segments, &mut params) {
      return RuleMatch::Full {
        params,
        consumed: segments.iter().map(|s| s.to_string()).collect(),
        tail: Vec::new(),
      };
    }

    // A slash-terminated rule binds the slashless path too: strict rules ask
    // the client to come back with the slash, loose rules serve it directly.
    if let Some(shorter) = self.slashless_parts() {
      let mut params = PathParams::new();
      if Self::match_segments(shorter, segments, &mut params) {
        if self.strict_slashes {
          return RuleMatch::Redirect;
        }

        return RuleMatch::Full {
          params,
          consumed: segments.iter().map(|s| s.to_string()).collect(),
          tail: Vec::new(),
        };
      }
    }

    if self.branch {
      let mut params = PathParams::new();
      if let Some(taken) = Self::match_prefix(self.prefix_parts(), segments, &mut params) {
        let tail: Vec<String> =
          unwrap_some(segments.get(taken..)).iter().map(|s| s.to_string()).collect();
        if !tail.is_empty() {
          let consumed: Vec<String> =
            unwrap_some(segments.get(..taken)).iter().map(|s| s.to_string()).collect();
          return RuleMatch::Full { params, consumed, tail };
        }
      }
    }

    RuleMatch::None
  }
}

/// Ordered collection of route rules.
///
/// Rules are tried in registration order and the map never reorders them:
/// registering the more specific rule first is part of the contract.
#[derive(Debug, Default)]
pub struct UrlMap {
  rules: Vec<Rule>,
}

impl UrlMap {
  /// An empty map.
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a rule. Endpoint names must be unique so reverse construction
  /// stays unambiguous.
  pub fn add(&mut self, rule: Rule) -> TernResult<()> {
    if self.rules.iter().any(|existing| existing.endpoint == rule.endpoint) {
      return InvalidPatternError::DuplicateEndpoint(rule.endpoint).into();
    }

    self.rules.push(rule);
    Ok(())
  }

  /// The registered rules, in registration order.
  pub fn rules(&self) -> &[Rule] {
    self.rules.as_slice()
  }
}

/// How a bound matcher resolved a concrete method and path.
#[derive(Debug)]
pub enum MatchOutcome {
  /// A rule matched path and method.
  Hit {
    /// Endpoint name of the winning rule.
    endpoint: String,
    /// Captured, typed path parameters.
    params: PathParams,
    /// Path segments the rule consumed.
    consumed: Vec<String>,
    /// Unconsumed segments a branch rule leaves for sub-resource traversal.
    tail: Vec<String>,
  },
  /// The path binds a slash-terminated strict rule, the client should
  /// re-request with the trailing slash. Carries the new path.
  Redirect(String),
  /// Some rule matched the path but not the method. Allowed methods, sorted.
  NotAllowed(Vec<Method>),
  /// No rule matched the path.
  NotFound,
}

/// A url map bound to one request's authority and scheme. Performs matching
/// and reverse construction. Cheap to clone, survives the handler's lifetime.
#[derive(Debug, Clone)]
pub struct Matcher {
  map: Arc<UrlMap>,
  host: String,
  port: u16,
  secure: bool,
}

impl Matcher {
  /// Binds a map to the authority and scheme of one request.
  pub fn bind(map: Arc<UrlMap>, host: impl ToString, port: u16, secure: bool) -> Matcher {
    Matcher { map, host: host.to_string(), port, secure }
  }

  /// Resolves a method and path against the rules.
  pub fn resolve(&self, method: &Method, path: &str) -> MatchOutcome {
    let Some(stripped) = path.strip_prefix('/') else {
      return MatchOutcome::NotFound;
    };

    let segments: Vec<&str> = stripped.split('/').collect();
    let mut allowed: Vec<Method> = Vec::new();

    for rule in &self.map.rules {
      match rule.match_rule(&segments) {
        RuleMatch::Full { params, consumed, tail } => {
          if rule.allows(method) {
            return MatchOutcome::Hit { endpoint: rule.endpoint.clone(), params, consumed, tail };
          }

          if let Some(methods) = &rule.methods {
            for method in methods {
              if !allowed.contains(method) {
                allowed.push(method.clone());
              }
            }
          }
        }
        // The redirect decision preempts everything registered later,
        // including a 405 from an earlier path match.
        RuleMatch::Redirect => return MatchOutcome::Redirect(format!("{path}/")),
        RuleMatch::None => {}
      }
    }

    if allowed.is_empty() {
      MatchOutcome::NotFound
    } else {
      allowed.sort();
      MatchOutcome::NotAllowed(allowed)
    }
  }

  /// Reverse URL construction for the named endpoint.
  ///
  /// Surplus parameters become a percent-encoded query string. Relative by
  /// default, absolute with `force_external` (default ports elided).
  pub fn build(
    &self,
    endpoint: &str,
    params: &PathParams,
    force_external: bool,
  ) -> TernResult<String> {
    let Some(rule) = self.map.rules.iter().find(|rule| rule.endpoint == endpoint) else {
      return BuildError::UnknownEndpoint(endpoint.to_string()).into();
    };

    let mut used: HashSet<&str> = HashSet::new();
    let mut out = String::new();
    for part in &rule.parts {
      out.push('/');
      match part {
        PatternPart::Literal(lit) => out.push_str(lit),
        PatternPart::Param(name, converter) => {
          let Some(value) = params.get(name) else {
            return BuildError::MissingParam(rule.pattern.clone(), name.clone()).into();
          };

          used.insert(name.as_str());
          match (converter, value) {
            (Converter::Int, ParamValue::Int(value)) => out.push_str(&value.to_string()),
            (Converter::Int, ParamValue::Str(_)) => {
              return BuildError::ParamTypeMismatch(rule.pattern.clone(), name.clone()).into();
            }
            (Converter::Str, ParamValue::Str(value)) => {
              out.push_str(urlencoding::encode(value).as_ref());
            }
            (Converter::Str, ParamValue::Int(value)) => out.push_str(&value.to_string()),
            (Converter::Path, ParamValue::Str(value)) => {
              let encoded: Vec<String> =
                value.split('/').map(|seg| urlencoding::encode(seg).into_owned()).collect();
              out.push_str(&encoded.join("/"));
            }
            (Converter::Path, ParamValue::Int(value)) => out.push_str(&value.to_string()),
          }
        }
      }
    }

    let mut extra: Vec<(&str, &ParamValue)> =
      params.iter().filter(|(name, _)| !used.contains(name)).collect();
    if !extra.is_empty() {
      extra.sort_by(|a, b| a.0.cmp(b.0));
      out.push('?');
      for (index, (name, value)) in extra.iter().enumerate() {
        if index > 0 {
          out.push('&');
        }
        out.push_str(urlencoding::encode(name).as_ref());
        out.push('=');
        out.push_str(urlencoding::encode(&value.to_string()).as_ref());
      }
    }

    if !force_external {
      return Ok(out);
    }

    let scheme = if self.secure { "https" } else { "http" };
    let default_port = if self.secure { 443 } else { 80 };
    if self.port == default_port {
      Ok(format!("{}://{}{}", scheme, self.host, out))
    } else {
      Ok(format!("{}://{}:{}{}", scheme, self.host, self.port, out))
    }
  }
}
