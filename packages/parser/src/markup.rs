//! Generic markup tree: elements, attributes, comments and text, in source order.
//! The document decoder works on this tree rather than on raw tokens.

use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Spanned, Token};

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// Unescaped value
    pub value: String,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Comment(String),
    Text(String),
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text content, trimmed
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            if let Node::Text(t) = child {
                text.push_str(t);
            }
        }
        text.trim().to_string()
    }
}

/// Parse markup text into its single root element
pub fn parse_markup(source: &str) -> ParseResult<Element> {
    let tokens = tokenize(source)?;
    let mut parser = MarkupParser {
        tokens,
        pos: 0,
        source_len: source.len(),
    };
    parser.parse_root()
}

struct MarkupParser<'src> {
    tokens: Vec<Spanned<'src>>,
    pos: usize,
    source_len: usize,
}

impl<'src> MarkupParser<'src> {
    fn parse_root(&mut self) -> ParseResult<Element> {
        let mut root = None;

        while let Some((token, span)) = self.peek() {
            let start = span.start;
            match token {
                Token::OpenTag(_) if root.is_none() => {
                    root = Some(self.parse_element()?);
                }
                Token::OpenTag(_) => {
                    return Err(ParseError::invalid_syntax(start, "Only one root element is allowed"));
                }
                Token::Text(text) if text.trim().is_empty() => self.advance(),
                Token::Comment(_) | Token::ProcessingInstruction | Token::Doctype => self.advance(),
                _ => {
                    let found = token.to_string();
                    return Err(ParseError::unexpected_token(start, "root element", found));
                }
            }
        }

        root.ok_or_else(|| ParseError::unexpected_eof(self.source_len))
    }

    fn parse_element(&mut self) -> ParseResult<Element> {
        let (name, pos) = match self.next() {
            Some((Token::OpenTag(name), span)) => (name.to_string(), span.start),
            Some((token, span)) => {
                return Err(ParseError::unexpected_token(span.start, "element", token.to_string()));
            }
            None => return Err(ParseError::unexpected_eof(self.source_len)),
        };

        let mut element = Element {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            pos,
        };

        loop {
            match self.next() {
                Some((Token::Name(attr), span)) => {
                    let attr_pos = span.start;
                    self.expect_equals()?;
                    let value = self.expect_value()?;
                    if element.attribute(attr).is_some() {
                        return Err(ParseError::DuplicateAttribute {
                            pos: attr_pos,
                            name: attr.to_string(),
                        });
                    }
                    element.attributes.push(Attribute {
                        name: attr.to_string(),
                        value,
                        pos: attr_pos,
                    });
                }
                Some((Token::SelfClose, _)) => return Ok(element),
                Some((Token::TagEnd, _)) => break,
                Some((token, span)) => {
                    return Err(ParseError::unexpected_token(span.start, "attribute or '>'", token.to_string()));
                }
                None => return Err(ParseError::unexpected_eof(self.source_len)),
            }
        }

        self.parse_content(&mut element)?;
        Ok(element)
    }

    fn parse_content(&mut self, element: &mut Element) -> ParseResult<()> {
        loop {
            let Some((token, span)) = self.peek() else {
                return Err(ParseError::unexpected_eof(self.source_len));
            };
            let start = span.start;

            match token {
                Token::OpenTag(_) => {
                    let child = self.parse_element()?;
                    element.children.push(Node::Element(child));
                }
                Token::CloseTag(name) => {
                    if *name != element.name {
                        return Err(ParseError::unexpected_token(
                            start,
                            format!("</{}>", element.name),
                            format!("</{}>", name),
                        ));
                    }
                    self.advance();
                    match self.next() {
                        Some((Token::TagEnd, _)) => return Ok(()),
                        Some((token, span)) => {
                            return Err(ParseError::unexpected_token(span.start, "'>'", token.to_string()));
                        }
                        None => return Err(ParseError::unexpected_eof(self.source_len)),
                    }
                }
                Token::Comment(body) => {
                    element.children.push(Node::Comment(body.to_string()));
                    self.advance();
                }
                Token::Text(text) => {
                    let text = unescape(text, start)?;
                    element.children.push(Node::Text(text));
                    self.advance();
                }
                Token::CData(text) => {
                    element.children.push(Node::Text(text.to_string()));
                    self.advance();
                }
                Token::ProcessingInstruction => self.advance(),
                _ => {
                    let found = token.to_string();
                    return Err(ParseError::unexpected_token(start, "element content", found));
                }
            }
        }
    }

    fn expect_equals(&mut self) -> ParseResult<()> {
        match self.next() {
            Some((Token::Equals, _)) => Ok(()),
            Some((token, span)) => Err(ParseError::unexpected_token(span.start, "'='", token.to_string())),
            None => Err(ParseError::unexpected_eof(self.source_len)),
        }
    }

    fn expect_value(&mut self) -> ParseResult<String> {
        match self.next() {
            Some((Token::Value(raw), span)) => unescape(raw, span.start + 1),
            Some((token, span)) => Err(ParseError::unexpected_token(span.start, "quoted value", token.to_string())),
            None => Err(ParseError::unexpected_eof(self.source_len)),
        }
    }

    fn peek(&self) -> Option<&Spanned<'src>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned<'src>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// Resolve character and entity references
pub fn unescape(raw: &str, pos: usize) -> ParseResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| ParseError::invalid_syntax(pos, "Unterminated entity reference"))?;
        let entity = &after[..semi];
        let resolved = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    ParseError::invalid_syntax(pos, format!("Unknown entity '&{};'", entity))
                })?
            }
        };
        out.push(resolved);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Escape text for use inside a double-quoted attribute value
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape element text content
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
