//! Markup lexer built on logos.
//!
//! Markup needs two lexing modes: between tags everything up to the next `<`
//! is text, while inside a tag whitespace separates names and quoted values.
//! `ContentToken` lexes the first mode and morphs into `TagToken` whenever a
//! tag opens, morphing back once the tag closes.

use crate::error::{ParseError, ParseResult};
use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

/// Tokens between tags
#[derive(Logos, Debug, Clone, PartialEq)]
enum ContentToken<'src> {
    #[token("<!--", comment_body)]
    Comment(&'src str),

    #[token("<![CDATA[", cdata_body)]
    CData(&'src str),

    #[token("<?", processing_instruction)]
    ProcessingInstruction,

    #[token("<!DOCTYPE", doctype)]
    Doctype,

    #[regex(r"</[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| &lex.slice()[2..])]
    CloseTag(&'src str),

    #[regex(r"<[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| &lex.slice()[1..])]
    OpenTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum TagToken<'src> {
    #[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Value(&'src str),

    #[token(">")]
    TagEnd,

    #[token("/>")]
    SelfClose,
}

fn find_terminator<'src>(lex: &mut Lexer<'src, ContentToken<'src>>, terminator: &str) -> Option<&'src str> {
    let remainder = lex.remainder();
    let end = remainder.find(terminator)?;
    lex.bump(end + terminator.len());
    Some(&remainder[..end])
}

fn comment_body<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> Option<&'src str> {
    find_terminator(lex, "-->")
}

fn cdata_body<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> Option<&'src str> {
    find_terminator(lex, "]]>")
}

fn processing_instruction<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> bool {
    find_terminator(lex, "?>").is_some()
}

fn doctype<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> bool {
    find_terminator(lex, ">").is_some()
}

/// Unified token stream handed to the markup parser
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    Comment(&'src str),
    CData(&'src str),
    Text(&'src str),
    ProcessingInstruction,
    Doctype,
    OpenTag(&'src str),
    CloseTag(&'src str),
    Name(&'src str),
    Equals,
    Value(&'src str),
    TagEnd,
    SelfClose,
}

impl<'src> From<ContentToken<'src>> for Token<'src> {
    fn from(token: ContentToken<'src>) -> Self {
        match token {
            ContentToken::Comment(s) => Token::Comment(s),
            ContentToken::CData(s) => Token::CData(s),
            ContentToken::ProcessingInstruction => Token::ProcessingInstruction,
            ContentToken::Doctype => Token::Doctype,
            ContentToken::CloseTag(s) => Token::CloseTag(s),
            ContentToken::OpenTag(s) => Token::OpenTag(s),
            ContentToken::Text(s) => Token::Text(s),
        }
    }
}

impl<'src> From<TagToken<'src>> for Token<'src> {
    fn from(token: TagToken<'src>) -> Self {
        match token {
            TagToken::Name(s) => Token::Name(s),
            TagToken::Equals => Token::Equals,
            TagToken::Value(s) => Token::Value(s),
            TagToken::TagEnd => Token::TagEnd,
            TagToken::SelfClose => Token::SelfClose,
        }
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Comment(_) => write!(f, "comment"),
            Token::CData(_) => write!(f, "CDATA section"),
            Token::Text(_) => write!(f, "text"),
            Token::ProcessingInstruction => write!(f, "processing instruction"),
            Token::Doctype => write!(f, "DOCTYPE"),
            Token::OpenTag(name) => write!(f, "<{}", name),
            Token::CloseTag(name) => write!(f, "</{}", name),
            Token::Name(name) => write!(f, "name '{}'", name),
            Token::Equals => write!(f, "="),
            Token::Value(value) => write!(f, "value \"{}\"", value),
            Token::TagEnd => write!(f, ">"),
            Token::SelfClose => write!(f, "/>"),
        }
    }
}

pub type Spanned<'src> = (Token<'src>, Range<usize>);

/// Tokenize a source string
pub fn tokenize(source: &str) -> ParseResult<Vec<Spanned<'_>>> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(source);

    while let Some(result) = content.next() {
        let span = content.span();
        let token = result.map_err(|_| ParseError::lexer_error(span.start))?;
        let opens_tag = matches!(token, ContentToken::OpenTag(_) | ContentToken::CloseTag(_));
        tokens.push((token.into(), span));

        if opens_tag {
            let mut tag = content.morph::<TagToken>();
            loop {
                match tag.next() {
                    Some(Ok(token)) => {
                        let closes = matches!(token, TagToken::TagEnd | TagToken::SelfClose);
                        tokens.push((token.into(), tag.span()));
                        if closes {
                            break;
                        }
                    }
                    Some(Err(())) => return Err(ParseError::lexer_error(tag.span().start)),
                    None => return Err(ParseError::unexpected_eof(source.len())),
                }
            }
            content = tag.morph();
        }
    }

    Ok(tokens)
}
