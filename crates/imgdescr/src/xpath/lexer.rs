//! XPath tokenizer

use crate::lexer::Cursor;

/// XPath token
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Slash,
    DoubleSlash,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    At,
    Comma,
    Dot,
    DotDot,
    Star,
    Pipe,
    ColonColon,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Name(String),
    Literal(String),
    Number(f64),
}

/// Split an expression into tokens; `Err` carries the byte offset of the
/// offending character
pub fn tokenize(expr: &str) -> Result<Vec<Token>, usize> {
    let mut cursor = Cursor::new(expr.as_bytes());
    let mut tokens = Vec::new();

    loop {
        cursor.skip_whitespace();
        let Some(b) = cursor.current() else {
            break;
        };
        let start = cursor.pos();

        let token = match b {
            b'/' => {
                cursor.advance();
                if cursor.consume(b'/') {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            b'[' => single(&mut cursor, Token::LeftBracket),
            b']' => single(&mut cursor, Token::RightBracket),
            b'(' => single(&mut cursor, Token::LeftParen),
            b')' => single(&mut cursor, Token::RightParen),
            b'@' => single(&mut cursor, Token::At),
            b',' => single(&mut cursor, Token::Comma),
            b'*' => single(&mut cursor, Token::Star),
            b'|' => single(&mut cursor, Token::Pipe),
            b'=' => single(&mut cursor, Token::Eq),
            b'!' => {
                cursor.advance();
                if !cursor.consume(b'=') {
                    return Err(start);
                }
                Token::NotEq
            }
            b'<' => {
                cursor.advance();
                if cursor.consume(b'=') {
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            b'>' => {
                cursor.advance();
                if cursor.consume(b'=') {
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            b':' => {
                cursor.advance();
                if !cursor.consume(b':') {
                    return Err(start);
                }
                Token::ColonColon
            }
            b'"' | b'\'' => {
                cursor.advance();
                let raw = cursor.take_while(|c| c != b);
                if !cursor.consume(b) {
                    return Err(start);
                }
                Token::Literal(String::from_utf8_lossy(raw).into_owned())
            }
            b'.' if !cursor.peek(1).is_some_and(|c| c.is_ascii_digit()) => {
                cursor.advance();
                if cursor.consume(b'.') {
                    Token::DotDot
                } else {
                    Token::Dot
                }
            }
            b'0'..=b'9' | b'.' => {
                let raw = cursor.take_while(|c| c.is_ascii_digit() || c == b'.');
                let raw = String::from_utf8_lossy(raw).into_owned();
                Token::Number(raw.parse().map_err(|_| start)?)
            }
            c if is_name_start(c) => {
                cursor.advance();
                while cursor.current().is_some_and(is_name_char) {
                    // a single ':' is a prefix separator, '::' ends the name
                    if cursor.current() == Some(b':') && cursor.peek(1) == Some(b':') {
                        break;
                    }
                    cursor.advance();
                }
                Token::Name(String::from_utf8_lossy(cursor.slice_from(start)).into_owned())
            }
            _ => return Err(start),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn single(cursor: &mut Cursor<'_>, token: Token) -> Token {
    cursor.advance();
    token
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.' | b':')
}
