//! Tokenizer for the default expression grammar

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
}

/// Token with its character offset in the source text
pub(crate) type Spanned = (Token, usize);

pub(crate) fn tokenize(text: &str) -> Result<Vec<Spanned>, (String, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let start = i;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let is_float = i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit();
            if is_float {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let token = if is_float {
                literal
                    .parse()
                    .map(Token::Float)
                    .map_err(|_| (format!("Bad number '{}'", literal), start))?
            } else {
                literal
                    .parse()
                    .map(Token::Int)
                    .map_err(|_| (format!("Integer '{}' is out of range", literal), start))?
            };
            tokens.push((token, start));
            continue;
        }
        if c.is_alphabetic() || c == '_' || c == '$' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let token = match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => Token::Ident(word),
            };
            tokens.push((token, start));
            continue;
        }
        if c == '"' || c == '\'' {
            i += 1;
            let mut content = String::new();
            loop {
                match chars.get(i) {
                    None => return Err(("Unterminated string".to_string(), start)),
                    Some(&q) if q == c => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = match chars.get(i + 1) {
                            Some('n') => '\n',
                            Some('t') => '\t',
                            Some(&other) => other,
                            None => return Err(("Unterminated string".to_string(), start)),
                        };
                        content.push(escaped);
                        i += 2;
                    }
                    Some(&other) => {
                        content.push(other);
                        i += 1;
                    }
                }
            }
            tokens.push((Token::Str(content), start));
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, len) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Bang, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            _ => return Err((format!("Unexpected character '{}'", c), start)),
        };
        tokens.push((token, start));
        i += len;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        tokenize(text).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_numbers_and_names() {
        assert_eq!(
            kinds("a.b + 1.5 * 2"),
            vec![
                Token::Ident("a".into()),
                Token::Dot,
                Token::Ident("b".into()),
                Token::Plus,
                Token::Float(1.5),
                Token::Star,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn test_strings_and_operators() {
        assert_eq!(
            kinds(r#"'it\'s' != "x" && !done"#),
            vec![
                Token::Str("it's".into()),
                Token::NotEq,
                Token::Str("x".into()),
                Token::AndAnd,
                Token::Bang,
                Token::Ident("done".into()),
            ]
        );
    }

    #[test]
    fn test_error_offsets() {
        assert_eq!(tokenize("a # b").unwrap_err().1, 2);
        assert_eq!(tokenize("  \"open").unwrap_err().1, 2);
    }
}
