//! Recursive descent parsing of preprocessed patterns, and postfix emission
//! for the tree builder.
//!
//! Grammar over the preprocessed text:
//!
//! ```text
//! expression := term ('|' term)*
//! term       := factor (('·')? factor)*      concatenation may be implicit
//! factor     := base ('*' | '+' | '?')*
//! base       := literal | '§' char | '(' expression ')' | '{' expression '}'
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use crate::preprocess::preprocess;
use crate::symbol::{self, Symbol, ESCAPE_MARKER};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Literal(char),
    Epsilon,
    Concat(Box<Ast>, Box<Ast>),
    Alternation(Box<Ast>, Box<Ast>),
    Star(Box<Ast>),
    Plus(Box<Ast>),
    Question(Box<Ast>),
    Group(Box<Ast>),
}

/// Parses a preprocessed pattern. The empty pattern is the empty string.
pub fn parse(input: &str) -> Result<Ast> {
    if input.is_empty() {
        return Ok(Ast::Epsilon);
    }
    let mut parser = Parser::new(input);
    let ast = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(ast),
        Some(c) => Err(Error::syntax(
            format!("unexpected '{c}' after the expression"),
            parser.offset(),
        )),
    }
}

/// Preprocess, parse, and emit postfix in one call.
pub fn postfix_tokens(pattern: &str) -> Result<Vec<Symbol>> {
    let ast = parse(&preprocess(pattern)?)?;
    Ok(to_postfix(&ast))
}

/// Emits the postfix symbol sequence for `ast`. The quantifiers lower to the
/// core operator set here: `x+` becomes `x x * ·` and `x?` becomes `x ε |`.
/// Groups are transparent.
pub fn to_postfix(ast: &Ast) -> Vec<Symbol> {
    let mut out = Vec::new();
    emit(ast, &mut out);
    out
}

fn emit(ast: &Ast, out: &mut Vec<Symbol>) {
    match ast {
        Ast::Literal(c) => out.push(Symbol::operand(*c)),
        Ast::Epsilon => out.push(Symbol::epsilon()),
        Ast::Concat(left, right) => {
            emit(left, out);
            emit(right, out);
            out.push(Symbol::operator(symbol::CONCAT));
        }
        Ast::Alternation(left, right) => {
            emit(left, out);
            emit(right, out);
            out.push(Symbol::operator(symbol::UNION));
        }
        Ast::Star(inner) => {
            emit(inner, out);
            out.push(Symbol::operator(symbol::STAR));
        }
        Ast::Plus(inner) => {
            emit(inner, out);
            emit(inner, out);
            out.push(Symbol::operator(symbol::STAR));
            out.push(Symbol::operator(symbol::CONCAT));
        }
        Ast::Question(inner) => {
            emit(inner, out);
            out.push(Symbol::epsilon());
            out.push(Symbol::operator(symbol::UNION));
        }
        Ast::Group(inner) => emit(inner, out),
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.len, |&(i, _)| i)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn parse_expression(&mut self) -> Result<Ast> {
        let mut node = self.parse_term()?;
        while self.peek() == Some(symbol::UNION) {
            self.advance();
            let right = self.parse_term()?;
            node = Ast::Alternation(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Ast> {
        let mut node = self.parse_factor()?;
        loop {
            let right = match self.peek() {
                Some(symbol::CONCAT) => {
                    self.advance();
                    self.parse_factor()?
                }
                Some(c) if is_factor_start(c) => self.parse_factor()?,
                _ => break,
            };
            node = Ast::Concat(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<Ast> {
        let mut node = self.parse_base()?;
        loop {
            match self.peek() {
                Some(symbol::STAR) => node = Ast::Star(Box::new(node)),
                Some('+') => node = Ast::Plus(Box::new(node)),
                Some('?') => node = Ast::Question(Box::new(node)),
                _ => break,
            }
            self.advance();
        }
        Ok(node)
    }

    fn parse_base(&mut self) -> Result<Ast> {
        let offset = self.offset();
        match self.peek() {
            None => Err(Error::syntax("unexpected end of input", offset)),
            Some(ESCAPE_MARKER) => {
                self.advance();
                let literal = self
                    .advance()
                    .ok_or_else(|| Error::syntax("dangling escape marker", offset))?;
                Ok(Ast::Literal(literal))
            }
            Some('(') => self.parse_group('(', ')'),
            Some('{') => self.parse_group('{', '}'),
            Some(c) if is_operator_char(c) => Err(Error::syntax(
                format!("operator '{c}' lacks an operand"),
                offset,
            )),
            Some(c @ (')' | '}')) => Err(Error::syntax(format!("unexpected '{c}'"), offset)),
            Some(c) => {
                self.advance();
                Ok(Ast::Literal(c))
            }
        }
    }

    fn parse_group(&mut self, open: char, close: char) -> Result<Ast> {
        let offset = self.offset();
        self.advance();
        let inner = self.parse_expression()?;
        match self.advance() {
            Some(c) if c == close => Ok(Ast::Group(Box::new(inner))),
            _ => Err(Error::syntax(format!("unmatched '{open}'"), offset)),
        }
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, symbol::CONCAT | symbol::UNION | symbol::STAR | '+' | '?')
}

fn is_factor_start(c: char) -> bool {
    !is_operator_char(c) && c != ')' && c != '}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(c: char) -> Box<Ast> {
        Box::new(Ast::Literal(c))
    }

    fn postfix_string(pattern: &str) -> String {
        let tokens = postfix_tokens(pattern).unwrap();
        tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn parses_alternation() {
        let ast = parse("a|b").unwrap();
        assert_eq!(ast, Ast::Alternation(literal('a'), literal('b')));
    }

    #[test]
    fn implicit_and_explicit_concatenation_agree() {
        assert_eq!(parse("ab").unwrap(), parse("a·b").unwrap());
        assert_eq!(
            parse("ab").unwrap(),
            Ast::Concat(literal('a'), literal('b'))
        );
    }

    #[test]
    fn quantifiers_bind_tighter_than_concatenation() {
        let ast = parse("ab*").unwrap();
        assert_eq!(
            ast,
            Ast::Concat(literal('a'), Box::new(Ast::Star(literal('b'))))
        );
    }

    #[test]
    fn groups_and_braces_nest() {
        let ast = parse("(a|b)c").unwrap();
        let grouped = Ast::Group(Box::new(Ast::Alternation(literal('a'), literal('b'))));
        assert_eq!(ast, Ast::Concat(Box::new(grouped), literal('c')));
        assert_eq!(parse("{a|b}c").unwrap(), ast);
    }

    #[test]
    fn escaped_literals_are_operands() {
        let ast = parse("§+").unwrap();
        assert_eq!(ast, Ast::Literal('+'));
        // through the full front end
        assert_eq!(postfix_string(r"a\+"), "a + ·");
    }

    #[test]
    fn empty_pattern_is_epsilon() {
        assert_eq!(parse("").unwrap(), Ast::Epsilon);
        assert_eq!(postfix_string(""), "ε");
    }

    #[test]
    fn postfix_forms() {
        assert_eq!(postfix_string("a|b"), "a b |");
        assert_eq!(postfix_string("ab"), "a b ·");
        assert_eq!(postfix_string("a*"), "a *");
        assert_eq!(postfix_string("a+"), "a a * ·");
        assert_eq!(postfix_string("a?"), "a ε |");
        assert_eq!(postfix_string("(a|b)*abb"), "a b | * a · b · b ·");
        assert_eq!(postfix_string("[0-1]+"), "0 1 | 0 1 | * ·");
    }

    #[test]
    fn plus_duplicates_escaped_operands_too() {
        let tokens = postfix_tokens(r"\*+").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], Symbol::operand('*'));
        assert_eq!(tokens[1], Symbol::operand('*'));
        assert_eq!(tokens[2], Symbol::operator(symbol::STAR));
        assert_eq!(tokens[3], Symbol::operator(symbol::CONCAT));
    }

    #[test]
    fn reports_syntax_errors() {
        assert!(parse("(a").is_err());
        assert!(parse("a)").is_err());
        assert!(parse("{a").is_err());
        assert!(parse("()").is_err());
        assert!(parse("|a").is_err());
        assert!(parse("a|").is_err());
        assert!(parse("*").is_err());
        assert!(parse("a··b").is_err());
    }

    #[test]
    fn syntax_errors_carry_offsets() {
        let Err(Error::Syntax { offset, .. }) = parse("ab)") else {
            panic!("expected a syntax error");
        };
        assert_eq!(offset, 2);
    }
}
