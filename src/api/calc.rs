//! The `P4calc` calculator protocol.
//!
//! An expression `<num> <op> <num>` is tokenized by small combinable parsers,
//! packed into a 16-byte header and sent to the peer, which writes the result
//! back into the same header.
use std::fmt;

use tracing::debug;

use super::config::{ExchangeConfig, ProtocolConfig};
use super::error::{DecodeError, ExchangeError, ParseError};
use super::packet::{Frame, FILLER};
use crate::link::exchange::ExchangeDriver;
use crate::link::FrameLink;

pub const CALC_HEADER_LEN: usize = 16;
pub const CALC_VERSION: u8 = 0x01;
/// Placeholder result the peer overwrites.
pub const UNSET_RESULT: i32 = 0xDEADBABE_u32 as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '&' => Some(Operator::And),
            '|' => Some(Operator::Or),
            '^' => Some(Operator::Xor),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Operator::Add => b'+',
            Operator::Sub => b'-',
            Operator::And => b'&',
            Operator::Or => b'|',
            Operator::Xor => b'^',
        }
    }

    /// What the peer is expected to compute, with wrapping 32-bit arithmetic.
    pub fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            Operator::Add => a.wrapping_add(b),
            Operator::Sub => a.wrapping_sub(b),
            Operator::And => a & b,
            Operator::Or => a | b,
            Operator::Xor => a ^ b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Num(i32),
    Op(Operator),
}

pub type ParseResult = Result<(usize, Vec<Token>), ParseError>;

fn skip_whitespace(s: &str, i: usize) -> usize {
    i + s[i..].len() - s[i..].trim_start().len()
}

/// Reads an unsigned decimal literal at `i`, with surrounding whitespace.
pub fn num_parser(s: &str, i: usize, mut tokens: Vec<Token>) -> ParseResult {
    let start = skip_whitespace(s, i);
    let digits = s[start..].len() - s[start..].trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return Err(ParseError::Number);
    }

    let literal = &s[start..start + digits];
    let value = literal
        .parse::<i32>()
        .map_err(|_| ParseError::Overflow { literal: literal.to_string() })?;
    tokens.push(Token::Num(value));
    Ok((skip_whitespace(s, start + digits), tokens))
}

/// Reads one of `+ - & | ^` at `i`, with surrounding whitespace.
pub fn op_parser(s: &str, i: usize, mut tokens: Vec<Token>) -> ParseResult {
    let start = skip_whitespace(s, i);
    let op = s[start..]
        .chars()
        .next()
        .and_then(Operator::from_char)
        .ok_or(ParseError::Operator)?;
    tokens.push(Token::Op(op));
    Ok((skip_whitespace(s, start + 1), tokens))
}

/// Runs `first`, then `second` from where `first` stopped.
pub fn make_seq<P1, P2>(first: P1, second: P2) -> impl Fn(&str, usize, Vec<Token>) -> ParseResult
where
    P1: Fn(&str, usize, Vec<Token>) -> ParseResult,
    P2: Fn(&str, usize, Vec<Token>) -> ParseResult,
{
    move |s: &str, i: usize, tokens: Vec<Token>| {
        let (i, tokens) = first(s, i, tokens)?;
        second(s, i, tokens)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    pub operand_a: i32,
    pub op: Operator,
    pub operand_b: i32,
}

/// Parses a whole line as a single binary expression.
pub fn parse_expression(line: &str) -> Result<Expression, ParseError> {
    let parser = make_seq(num_parser, make_seq(op_parser, num_parser));
    let (end, tokens) = parser(line, 0, Vec::new())?;
    if end != line.len() {
        return Err(ParseError::Trailing { rest: line[end..].to_string() });
    }

    match tokens.as_slice() {
        [Token::Num(operand_a), Token::Op(op), Token::Num(operand_b)] => Ok(Expression {
            operand_a: *operand_a,
            op: *op,
            operand_b: *operand_b,
        }),
        // the sequence above only ever yields num/op/num
        _ => Err(ParseError::Number),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalcHeader {
    pub version: u8,
    pub op: u8,
    pub operand_a: i32,
    pub operand_b: i32,
    pub result: i32,
}

impl CalcHeader {
    pub fn request(expression: &Expression) -> CalcHeader {
        CalcHeader {
            version: CALC_VERSION,
            op: expression.op.as_byte(),
            operand_a: expression.operand_a,
            operand_b: expression.operand_b,
            result: UNSET_RESULT,
        }
    }

    pub fn to_bytes(&self) -> [u8; CALC_HEADER_LEN] {
        let mut bytes = [0u8; CALC_HEADER_LEN];
        bytes[0] = b'P';
        bytes[1] = b'4';
        bytes[2] = self.version;
        bytes[3] = self.op;
        bytes[4..8].copy_from_slice(&self.operand_a.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.operand_b.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.result.to_be_bytes());
        bytes
    }

    pub fn parse(raw: &[u8]) -> Result<CalcHeader, DecodeError> {
        if raw.len() < CALC_HEADER_LEN {
            return Err(DecodeError::TooShort { len: raw.len(), min: CALC_HEADER_LEN });
        }
        if &raw[0..2] != b"P4" {
            return Err(DecodeError::BadTag {
                found: String::from_utf8_lossy(&raw[0..2]).into_owned(),
                expected: "P4".to_string(),
            });
        }

        let word = |at: usize| i32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        Ok(CalcHeader {
            version: raw[2],
            op: raw[3],
            operand_a: word(4),
            operand_b: word(8),
            result: word(12),
        })
    }
}

impl fmt::Display for CalcHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "###[ P4calc ]###")?;
        writeln!(f, "  version   = {:#04x}", self.version)?;
        writeln!(f, "  op        = {:?}", self.op as char)?;
        writeln!(f, "  operand_a = {}", self.operand_a)?;
        writeln!(f, "  operand_b = {}", self.operand_b)?;
        write!(f, "  result    = {:#x}", self.result as u32)
    }
}

/// Drives calculator exchanges over one link.
pub struct CalcClient<L> {
    config: ProtocolConfig,
    exchange: ExchangeConfig,
    driver: ExchangeDriver<L>,
}

impl<L: FrameLink> CalcClient<L> {
    pub fn new(config: ProtocolConfig, exchange: ExchangeConfig, driver: ExchangeDriver<L>) -> Self {
        CalcClient { config, exchange, driver }
    }

    pub fn driver(&self) -> &ExchangeDriver<L> {
        &self.driver
    }

    pub fn prepare(&self, line: &str) -> Result<(CalcHeader, Frame), ExchangeError> {
        let header = CalcHeader::request(&parse_expression(line)?);
        let mut payload = header.to_bytes().to_vec();
        payload.extend_from_slice(FILLER);
        let frame = Frame::new(
            self.config.source,
            self.config.destination,
            self.config.ethertype,
            payload,
        );
        Ok((header, frame))
    }

    pub fn exchange(&mut self, frame: &Frame) -> Result<i32, ExchangeError> {
        let reply = self.driver.send_and_await(frame, self.exchange.timeout)?;
        let header = CalcHeader::parse(&reply.payload)?;
        debug!(result = header.result, "calc reply");
        Ok(header.result)
    }

    pub fn evaluate(&mut self, line: &str) -> Result<i32, ExchangeError> {
        let (_, frame) = self.prepare(line)?;
        self.exchange(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let parser = make_seq(num_parser, make_seq(op_parser, num_parser));
        let (end, tokens) = parser("3 + 4", 0, Vec::new()).unwrap();
        assert_eq!(end, 5);
        assert_eq!(tokens, vec![Token::Num(3), Token::Op(Operator::Add), Token::Num(4)]);
    }

    #[test]
    fn test_whitespace_is_optional() {
        let expression = parse_expression("  12^7 ").unwrap();
        assert_eq!(
            expression,
            Expression {
                operand_a: 12,
                op: Operator::Xor,
                operand_b: 7
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_expression("+ 4"), Err(ParseError::Number));
        assert_eq!(parse_expression("3 * 4"), Err(ParseError::Operator));
        assert_eq!(parse_expression("3 -"), Err(ParseError::Number));
        assert_eq!(parse_expression(""), Err(ParseError::Number));
        assert!(matches!(parse_expression("3 + 4 5"), Err(ParseError::Trailing { .. })));
        assert!(matches!(
            parse_expression("3000000000 + 1"),
            Err(ParseError::Overflow { .. })
        ));
    }

    #[test]
    fn test_header_layout() {
        let header = CalcHeader::request(&parse_expression("258 - 1").unwrap());
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..4], b"P4\x01-");
        assert_eq!(&bytes[4..8], &[0, 0, 1, 2]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 1]);
        assert_eq!(&bytes[12..], &[0xde, 0xad, 0xba, 0xbe]);
        assert_eq!(CalcHeader::parse(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_parse_errors() {
        assert!(matches!(CalcHeader::parse(b"P4"), Err(DecodeError::TooShort { len: 2, min: 16 })));
        let mut bytes = CalcHeader::request(&parse_expression("1+1").unwrap()).to_bytes();
        bytes[1] = b'5';
        assert!(matches!(CalcHeader::parse(&bytes), Err(DecodeError::BadTag { .. })));
    }

    #[test]
    fn test_operator_semantics() {
        assert_eq!(Operator::Add.apply(3, 4), 7);
        assert_eq!(Operator::Sub.apply(3, 4), -1);
        assert_eq!(Operator::And.apply(6, 3), 2);
        assert_eq!(Operator::Or.apply(6, 3), 7);
        assert_eq!(Operator::Xor.apply(6, 3), 5);
        assert_eq!(Operator::Add.apply(i32::MAX, 1), i32::MIN);
    }
}
