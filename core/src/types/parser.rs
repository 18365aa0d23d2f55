use crate::errors::{error_codes, ContainerError, ContainerResult};
use crate::types::descriptor::{Primitive, TypeDescriptor, WildcardBound};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\[\s*\]|[<>,?]|[A-Za-z_$][A-Za-z0-9_$.]*)").expect("valid token pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Open,
    Close,
    Comma,
    Question,
    ArraySuffix,
}

/// **TYPE PARSER**
///
/// Parses textual descriptors such as `Map<String, ? extends Number>`, `int[]` or
/// `Repository<T>`. Identifiers registered with [`TypeParser::with_variable`] parse as
/// type variables; every other identifier is a class name.
#[derive(Debug, Clone, Default)]
pub struct TypeParser {
    variables: HashMap<String, Vec<TypeDescriptor>>,
}

impl TypeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser for a generic declaration's own type parameters.
    pub fn for_parameters(parameters: &[String]) -> Self {
        let mut parser = Self::new();
        for name in parameters {
            parser.variables.insert(name.clone(), Vec::new());
        }
        parser
    }

    pub fn with_variable(mut self, name: impl Into<String>, bounds: Vec<TypeDescriptor>) -> Self {
        self.variables.insert(name.into(), bounds);
        self
    }

    pub fn parse(&self, text: &str) -> ContainerResult<TypeDescriptor> {
        let tokens = tokenize(text)?;
        let mut cursor = Cursor {
            text,
            tokens: &tokens,
            pos: 0,
        };
        let ty = self.parse_type(&mut cursor)?;
        if cursor.pos != tokens.len() {
            return Err(invalid(text, "unexpected trailing input"));
        }
        Ok(ty)
    }

    fn parse_type(&self, cursor: &mut Cursor<'_>) -> ContainerResult<TypeDescriptor> {
        let name = match cursor.next() {
            Some(Token::Ident(name)) => name.clone(),
            _ => return Err(invalid(cursor.text, "expected a type name")),
        };

        let mut ty = if let Some(primitive) = Primitive::from_keyword(&name) {
            TypeDescriptor::Primitive(primitive)
        } else if let Some(bounds) = self.variables.get(&name) {
            TypeDescriptor::variable(name, bounds.clone())
        } else if cursor.peek() == Some(&Token::Open) {
            cursor.pos += 1;
            let mut args = vec![self.parse_argument(cursor)?];
            loop {
                match cursor.next() {
                    Some(Token::Comma) => args.push(self.parse_argument(cursor)?),
                    Some(Token::Close) => break,
                    _ => return Err(invalid(cursor.text, "unterminated type argument list")),
                }
            }
            TypeDescriptor::parameterized(name, args)
        } else {
            TypeDescriptor::class(name)
        };

        while cursor.peek() == Some(&Token::ArraySuffix) {
            cursor.pos += 1;
            ty = TypeDescriptor::array(ty);
        }
        Ok(ty)
    }

    fn parse_argument(&self, cursor: &mut Cursor<'_>) -> ContainerResult<TypeDescriptor> {
        if cursor.peek() != Some(&Token::Question) {
            let arg = self.parse_type(cursor)?;
            if arg.is_primitive() {
                return Err(invalid(cursor.text, "primitive type argument"));
            }
            return Ok(arg);
        }
        cursor.pos += 1;

        let bound = match cursor.peek() {
            Some(Token::Ident(keyword)) if keyword == "extends" => {
                cursor.pos += 1;
                WildcardBound::Extends(Box::new(self.parse_type(cursor)?))
            }
            Some(Token::Ident(keyword)) if keyword == "super" => {
                cursor.pos += 1;
                WildcardBound::Super(Box::new(self.parse_type(cursor)?))
            }
            _ => WildcardBound::Unbounded,
        };
        Ok(TypeDescriptor::Wildcard(bound))
    }
}

struct Cursor<'a> {
    text: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

fn tokenize(text: &str) -> ContainerResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while !rest.trim_start().is_empty() {
        let captures = TOKEN
            .captures(rest)
            .ok_or_else(|| invalid(text, &format!("unexpected input at '{}'", rest.trim_start())))?;
        let whole = captures.get(0).map(|m| m.end()).unwrap_or(rest.len());
        let lexeme = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

        tokens.push(match lexeme {
            "<" => Token::Open,
            ">" => Token::Close,
            "," => Token::Comma,
            "?" => Token::Question,
            l if l.starts_with('[') => Token::ArraySuffix,
            ident => Token::Ident(ident.to_string()),
        });
        rest = &rest[whole..];
    }

    if tokens.is_empty() {
        return Err(invalid(text, "empty type"));
    }
    Ok(tokens)
}

fn invalid(text: &str, reason: &str) -> ContainerError {
    ContainerError::definition(
        error_codes::INVALID_TYPE,
        format!("Invalid type '{}': {}", text, reason),
    )
}
