//! Response type descriptors.
//!
//! A [`TypeDescriptor`] names the shape a method declares as its result, e.g.
//! `User`, `List<User>` or `ResponseEntity<List<User>>`. The entity envelope
//! (`ResponseEntity<T>`) asks the dispatcher for status and headers alongside
//! the body.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the one-argument entity envelope type.
pub const ENTITY_ENVELOPE: &str = "ResponseEntity";

/// Name plus generic arguments of a declared return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeDescriptor {
    name: String,
    args: Vec<TypeDescriptor>,
}

/// Error raised when a type expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeParseError {
    #[error("Missing type name in '{0}'")]
    MissingName(String),
    #[error("Unbalanced generic arguments in '{0}'")]
    Unbalanced(String),
    #[error("Unexpected trailing input in '{0}'")]
    TrailingInput(String),
}

impl TypeDescriptor {
    /// A non-generic type.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A generic type with the given arguments.
    pub fn generic(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// `ResponseEntity<inner>`.
    pub fn entity(inner: TypeDescriptor) -> Self {
        Self::generic(ENTITY_ENVELOPE, vec![inner])
    }

    /// The unit type, used when a method declares no result.
    pub fn unit() -> Self {
        Self::named("()")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        &self.args
    }

    /// Whether this is the one-argument entity envelope.
    pub fn is_entity(&self) -> bool {
        self.name == ENTITY_ENVELOPE && self.args.len() == 1
    }

    /// The inner type of an entity envelope, or `self` for any other type.
    pub fn unwrap_entity(&self) -> &TypeDescriptor {
        if self.is_entity() {
            &self.args[0]
        } else {
            self
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, TypeParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '<' | '>' | ',') {
                break;
            }
            self.pos += c.len_utf8();
        }
        let name = self.src[start..self.pos].trim();
        if name.is_empty() {
            return Err(TypeParseError::MissingName(self.src.to_string()));
        }

        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(TypeParseError::Unbalanced(self.src.to_string())),
                }
            }
        }
        self.skip_whitespace();

        Ok(TypeDescriptor::generic(name, args))
    }
}

impl FromStr for TypeDescriptor {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { src: s, pos: 0 };
        let descriptor = parser.parse_type()?;
        if parser.pos != s.len() {
            return Err(TypeParseError::TrailingInput(s.to_string()));
        }
        Ok(descriptor)
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDescriptor> for String {
    fn from(descriptor: TypeDescriptor) -> Self {
        descriptor.to_string()
    }
}
