//! Formula parser for R-style formulas
//!
//! This parser implements R-style formula syntax with support for:
//! - Response variables: y ~ x1 + x2
//! - Survival responses: Surv(time, status) ~ x1
//! - Intercept control: y ~ 0 + x1, y ~ x1 - 1, y ~ 1
//! - Forced categorical coding: C(x)
//! - Interactions: x1:x2, x1:x2:x3
//! - Crossing: a*b -> a + b + a:b
//! - Term removal: a*b - a:b

use crate::formula::error::{FormulaError, FormulaResult};
use crate::formula::{Formula, Response, Term};
use indexmap::IndexMap;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Plus,
    Minus,
}

/// Formula parser
pub struct FormulaParser<'a> {
    chars: Peekable<Chars<'a>>,
    original: String,
    position: usize,
}

impl<'a> FormulaParser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            original: input.to_string(),
            position: 0,
        }
    }

    /// Parse a formula
    pub fn parse(formula: &str) -> FormulaResult<Formula> {
        let mut parser = FormulaParser::new(formula);
        parser.parse_formula()
    }

    fn parse_formula(&mut self) -> FormulaResult<Formula> {
        self.skip_whitespace();

        if self.chars.peek().is_none() {
            return Err(FormulaError::syntax(self.position, "Empty formula"));
        }

        let response = self.parse_response()?;
        self.parse_tilde()?;
        let (has_intercept, terms) = self.parse_rhs()?;

        self.skip_whitespace();
        if self.chars.peek().is_some() {
            let remaining: String = self.chars.clone().collect();
            return Err(FormulaError::syntax_with_context(
                self.position,
                "Trailing characters after formula",
                format!("Unexpected: '{}'", remaining),
            ));
        }

        Ok(Formula {
            response,
            terms,
            has_intercept,
            baselines: IndexMap::new(),
            original: self.original.trim().to_string(),
        })
    }

    /// Parse response (left side of ~)
    fn parse_response(&mut self) -> FormulaResult<Option<Response>> {
        self.skip_whitespace();

        if self.peek_char() == Some('~') {
            return Ok(None);
        }

        let ident = self.parse_identifier()?;
        self.skip_whitespace();

        let response = if ident == "Surv" && self.peek_char() == Some('(') {
            self.advance();
            self.skip_whitespace();
            let time = self.parse_identifier()?;
            self.skip_whitespace();
            self.expect(',')?;
            self.skip_whitespace();
            let event = self.parse_identifier()?;
            self.skip_whitespace();
            self.expect(')')?;
            self.skip_whitespace();
            Response::Survival { time, event }
        } else {
            Response::Variable(ident)
        };

        if self.peek_char() == Some('~') {
            Ok(Some(response))
        } else {
            Err(FormulaError::syntax_with_context(
                self.position,
                "Expected '~' after response variable",
                format!("Found '{}' instead", self.peek_char().unwrap_or(' ')),
            ))
        }
    }

    /// Parse right-hand side of formula
    fn parse_rhs(&mut self) -> FormulaResult<(bool, Vec<Term>)> {
        self.skip_whitespace();

        // Handle empty RHS (just intercept)
        if self.chars.peek().is_none() {
            return Ok((true, Vec::new()));
        }

        let mut has_intercept = true;
        let mut terms: Vec<Term> = Vec::new();
        let mut removed: Vec<Term> = Vec::new();

        let mut sign = Sign::Plus;
        match self.peek_char() {
            Some('-') => {
                self.advance();
                sign = Sign::Minus;
            }
            Some('+') => {
                return Err(FormulaError::syntax(
                    self.position,
                    "Expected term before '+'",
                ));
            }
            _ => {}
        }

        loop {
            self.skip_whitespace();

            match self.peek_char() {
                None => {
                    return Err(FormulaError::syntax(
                        self.position,
                        "Unexpected end of input, expected term",
                    ));
                }
                Some(c) if c.is_ascii_digit() => {
                    let start = self.position;
                    let literal = self.parse_numeric_literal();
                    has_intercept = match (literal.as_str(), sign) {
                        ("1", Sign::Plus) | ("0", Sign::Minus) => true,
                        ("0", Sign::Plus) | ("1", Sign::Minus) => false,
                        _ => {
                            return Err(FormulaError::syntax(
                                start,
                                format!("Only 0 or 1 may appear as a literal, found '{}'", literal),
                            ));
                        }
                    };
                }
                Some(_) => {
                    let expanded = self.parse_product()?;
                    match sign {
                        Sign::Plus => {
                            for term in expanded {
                                if !terms.iter().any(|t| t.same_as(&term)) {
                                    terms.push(term);
                                }
                            }
                        }
                        Sign::Minus => removed.extend(expanded),
                    }
                }
            }

            self.skip_whitespace();

            sign = match self.peek_char() {
                Some('+') => Sign::Plus,
                Some('-') => Sign::Minus,
                _ => break,
            };
            self.advance();

            self.skip_whitespace();
            if self.chars.peek().is_none() {
                return Err(FormulaError::syntax(
                    self.position,
                    "Expected term after operator",
                ));
            }
        }

        terms.retain(|t| !removed.iter().any(|r| r.same_as(t)));
        Ok((has_intercept, terms))
    }

    /// Parse `a*b*...`, expanded to every main effect and interaction
    fn parse_product(&mut self) -> FormulaResult<Vec<Term>> {
        let mut operands = vec![self.parse_term()?];

        loop {
            self.skip_whitespace();
            if self.peek_char() != Some('*') {
                break;
            }
            self.advance();
            self.skip_whitespace();
            operands.push(self.parse_term()?);
        }

        if operands.len() == 1 {
            return Ok(operands);
        }

        // every non-empty subset, by size then position
        let n = operands.len();
        let mut subsets: Vec<Vec<usize>> = (1u32..(1 << n))
            .map(|mask| (0..n).filter(|i| mask & (1 << i) != 0).collect())
            .collect();
        subsets.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut expanded = Vec::with_capacity(subsets.len());
        for subset in subsets {
            let mut factors: Vec<Term> = Vec::new();
            for &i in &subset {
                for factor in operands[i].factors() {
                    if !factors.contains(factor) {
                        factors.push(factor.clone());
                    }
                }
            }
            let term = if factors.len() == 1 {
                factors.remove(0)
            } else {
                Term::interaction(factors)
            };
            if !expanded.iter().any(|t: &Term| t.same_as(&term)) {
                expanded.push(term);
            }
        }

        Ok(expanded)
    }

    /// Parse a term (can be a product of factors separated by ':')
    fn parse_term(&mut self) -> FormulaResult<Term> {
        let first_factor = self.parse_factor()?;

        self.skip_whitespace();
        if self.peek_char() != Some(':') {
            return Ok(first_factor);
        }

        let mut factors = vec![first_factor];
        while self.peek_char() == Some(':') {
            self.advance();
            self.skip_whitespace();
            let factor = self.parse_factor()?;
            if factors.contains(&factor) {
                return Err(FormulaError::syntax(
                    self.position,
                    format!("'{}' appears twice in one interaction", factor),
                ));
            }
            factors.push(factor);
            self.skip_whitespace();
        }

        Ok(Term::interaction(factors))
    }

    /// Parse a factor: a variable or `C(variable)`
    fn parse_factor(&mut self) -> FormulaResult<Term> {
        self.skip_whitespace();

        match self.peek_char() {
            Some(c) if c.is_alphabetic() => {
                let start = self.position;
                let ident = self.parse_identifier()?;
                self.skip_whitespace();

                if self.peek_char() != Some('(') {
                    return Ok(Term::variable(&ident));
                }
                if ident != "C" {
                    return Err(FormulaError::syntax_with_context(
                        start,
                        format!("Unsupported function '{}'", ident),
                        "only C(...) is recognised on the right-hand side",
                    ));
                }

                self.advance();
                self.skip_whitespace();
                let name = self.parse_identifier()?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(Term::categorical(&name))
            }
            Some(c) => Err(FormulaError::syntax(
                self.position,
                format!("Unexpected character '{}' in factor", c),
            )),
            None => Err(FormulaError::syntax(
                self.position,
                "Unexpected end of input, expected factor",
            )),
        }
    }

    fn parse_numeric_literal(&mut self) -> String {
        let mut literal = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                literal.push(c);
                self.advance();
            } else {
                break;
            }
        }
        literal
    }

    /// Parse an identifier
    fn parse_identifier(&mut self) -> FormulaResult<String> {
        let mut ident = String::new();
        let start_pos = self.position;

        // First character must be alphabetic
        match self.chars.next() {
            Some(c) if c.is_alphabetic() => {
                self.position += 1;
                ident.push(c);
            }
            Some(c) => {
                return Err(FormulaError::syntax(
                    start_pos,
                    format!("Identifier must start with a letter, found '{}'", c),
                ));
            }
            None => {
                return Err(FormulaError::syntax(
                    start_pos,
                    "Unexpected end of input, expected identifier",
                ));
            }
        }

        // Subsequent characters can be alphanumeric, underscore, or period
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Ok(ident)
    }

    /// Parse tilde operator
    fn parse_tilde(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        self.expect('~')
    }

    fn expect(&mut self, expected: char) -> FormulaResult<()> {
        match self.chars.next() {
            Some(c) if c == expected => {
                self.position += 1;
                Ok(())
            }
            Some(c) => Err(FormulaError::syntax(
                self.position,
                format!("Expected '{}', found '{}'", expected, c),
            )),
            None => Err(FormulaError::syntax(
                self.position,
                format!("Unexpected end of formula, expected '{}'", expected),
            )),
        }
    }

    fn advance(&mut self) {
        if self.chars.next().is_some() {
            self.position += 1;
        }
    }

    /// Skip whitespace
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Peek at next character
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }
}
