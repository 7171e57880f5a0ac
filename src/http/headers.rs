//! Provides functionality for handling HTTP headers.

use std::fmt::Display;

/// Represents a collection of headers as part of a request or response.
///
/// Headers can be added with `add(HeaderName::ContentType, "text/html")`.
/// Anywhere where you would specify the header name as an enum variant you can
/// use the string name of the header instead, since both implement `HeaderLike`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Headers(Vec<Header>);

/// Represents an individual header.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Header {
  /// The name of the header.
  pub name: HeaderName,
  /// The value of the header.
  pub value: String,
}

impl Headers {
  /// Create an empty collection of headers.
  pub fn new() -> Self {
    Self::default()
  }

  /// Get the number of headers in the collection.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns `true` if the collection is empty.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Create and add a new header with the given name and value.
  pub fn add(&mut self, name: impl HeaderLike, value: impl AsRef<str>) {
    self.0.push(Header::new(name.to_header(), value));
  }

  /// Get a reference to the value of the first header with the given name.
  pub fn get(&self, name: impl HeaderLike) -> Option<&str> {
    let header = name.to_header();
    self.0.iter().find(|h| h.name == header).map(|h| h.value.as_str())
  }

  /// Removes all previous instances of the header and sets the header to the single value.
  /// Its guaranteed that the header is only present exactly once after this call returns.
  pub fn set(&mut self, name: impl HeaderLike, value: impl AsRef<str>) {
    let header = name.to_header();
    self.remove(header.clone());
    self.add(header, value);
  }

  /// Get a list of all the values of the headers with the given name.
  /// If no headers with the given name exist, an empty list is returned.
  pub fn get_all(&self, name: impl HeaderLike) -> Vec<&str> {
    let header = name.to_header();
    self.0.iter().filter(|h| h.name == header).map(|h| h.value.as_str()).collect()
  }

  /// Remove all headers with the given name.
  pub fn remove(&mut self, name: impl HeaderLike) {
    let header = name.to_header();
    self.0.retain(|h| h.name != header);
  }

  /// Return an iterator over the headers in the collection.
  pub fn iter(&self) -> impl Iterator<Item = &Header> {
    self.0.iter()
  }
}

impl Header {
  /// Create a new header with the given name and value.
  pub fn new(name: impl HeaderLike, value: impl AsRef<str>) -> Self {
    Self { name: name.to_header(), value: value.as_ref().to_string() }
  }
}

/// Represents a type which can be interpreted as a header name.
///
/// This includes `HeaderName` and strings.
pub trait HeaderLike {
  /// Consume the value and return the corresponding header name.
  fn to_header(self) -> HeaderName;
}

impl HeaderLike for HeaderName {
  fn to_header(self) -> HeaderName {
    self
  }
}

impl HeaderLike for &HeaderName {
  fn to_header(self) -> HeaderName {
    self.clone()
  }
}

impl<T> HeaderLike for T
where
  T: AsRef<str>,
{
  fn to_header(self) -> HeaderName {
    HeaderName::from_name(self.as_ref())
  }
}

/// Represents a header name.
/// Names the engine and its collaborators emit get a variant, everything else rides in `Custom`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum HeaderName {
  /// The `Allow` header, lists the methods a resource supports.
  Allow,
  /// The `Connection` header.
  Connection,
  /// The `Content-Length` header.
  ContentLength,
  /// The `Content-Type` header.
  ContentType,
  /// The `Host` header.
  Host,
  /// The `Location` header, the target of a redirection.
  Location,
  /// Any other header.
  Custom(String),
}

impl HeaderName {
  /// Maps the string name of a header onto its variant. Matching is case-insensitive.
  pub fn from_name(name: &str) -> Self {
    match name.to_ascii_lowercase().as_str() {
      "allow" => Self::Allow,
      "connection" => Self::Connection,
      "content-length" => Self::ContentLength,
      "content-type" => Self::ContentType,
      "host" => Self::Host,
      "location" => Self::Location,
      _ => Self::Custom(name.to_string()),
    }
  }

  /// The canonical wire name of the header.
  pub fn as_str(&self) -> &str {
    match self {
      HeaderName::Allow => "Allow",
      HeaderName::Connection => "Connection",
      HeaderName::ContentLength => "Content-Length",
      HeaderName::ContentType => "Content-Type",
      HeaderName::Host => "Host",
      HeaderName::Location => "Location",
      HeaderName::Custom(name) => name.as_str(),
    }
  }
}

impl Display for HeaderName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
