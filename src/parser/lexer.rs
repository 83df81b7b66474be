//! GCode Lexer
//!
//! Splits one line into words, comments and anything it could not make sense
//! of. No numbers are interpreted here.

/// A piece of one line of GCode
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    /// Letter and the text of its number, e.g. `X` and `-1.5`
    Word { letter: char, number: String },
    /// Comment text without its delimiters
    Comment(String),
    /// Text that is neither a word nor a comment
    Malformed(String),
}

/// Lex a line of GCode
pub fn lex_line(line: &str) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start_idx, ch)) = chars.next() {
        match ch {
            // Skip whitespace
            ' ' | '\t' | '\r' | '\n' => continue,

            // Semicolon comment: consume rest of line
            ';' => {
                lexemes.push(Lexeme::Comment(line[start_idx + 1..].to_string()));
                break;
            }

            // Parenthetical comment, running to the end of line when unclosed
            '(' => {
                let mut close_idx = line.len();

                for (idx, ch) in chars.by_ref() {
                    if ch == ')' {
                        close_idx = idx;
                        break;
                    }
                }

                lexemes.push(Lexeme::Comment(line[start_idx + 1..close_idx].to_string()));
            }

            // Letter starts a word; blanks between letter and number are allowed
            c if c.is_ascii_alphabetic() => {
                while let Some(&(_, ' ' | '\t')) = chars.peek() {
                    chars.next();
                }

                let mut number = String::new();
                while let Some(&(_, next_ch)) = chars.peek() {
                    if is_number_char(next_ch) {
                        number.push(next_ch);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let letter = c.to_ascii_uppercase();
                if number.is_empty() {
                    lexemes.push(Lexeme::Malformed(letter.to_string()));
                } else {
                    lexemes.push(Lexeme::Word { letter, number });
                }
            }

            // Number with no letter in front of it
            c if is_number_char(c) => {
                let mut text = c.to_string();
                while let Some(&(_, next_ch)) = chars.peek() {
                    if is_number_char(next_ch) {
                        text.push(next_ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                lexemes.push(Lexeme::Malformed(text));
            }

            other => lexemes.push(Lexeme::Malformed(other.to_string())),
        }
    }

    lexemes
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(letter: char, number: &str) -> Lexeme {
        Lexeme::Word {
            letter,
            number: number.to_string(),
        }
    }

    #[test]
    fn test_lex_simple_command() {
        let lexemes = lex_line("G1 X10 Y20");
        assert_eq!(lexemes, vec![word('G', "1"), word('X', "10"), word('Y', "20")]);
    }

    #[test]
    fn test_lex_with_semicolon_comment() {
        let lexemes = lex_line("G1 X10 ; move to X10");
        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[2], Lexeme::Comment(" move to X10".to_string()));
    }

    #[test]
    fn test_lex_paren_comment() {
        let lexemes = lex_line("G1 (rapid move) X10");
        assert_eq!(
            lexemes,
            vec![
                word('G', "1"),
                Lexeme::Comment("rapid move".to_string()),
                word('X', "10")
            ]
        );
    }

    #[test]
    fn test_lex_unclosed_paren_comment() {
        let lexemes = lex_line("M5 (never closed");
        assert_eq!(lexemes[1], Lexeme::Comment("never closed".to_string()));
    }

    #[test]
    fn test_lex_packed_and_spaced_words() {
        assert_eq!(
            lex_line("g1x10.5y-2.3"),
            vec![word('G', "1"), word('X', "10.5"), word('Y', "-2.3")]
        );
        assert_eq!(lex_line("X 10"), vec![word('X', "10")]);
    }

    #[test]
    fn test_lex_malformed_fragments() {
        assert_eq!(
            lex_line("G1 X"),
            vec![word('G', "1"), Lexeme::Malformed("X".to_string())]
        );
        assert_eq!(
            lex_line("12 G0"),
            vec![Lexeme::Malformed("12".to_string()), word('G', "0")]
        );
        assert_eq!(lex_line("*"), vec![Lexeme::Malformed("*".to_string())]);
    }

    #[test]
    fn test_lex_empty_line() {
        assert!(lex_line("   \t").is_empty());
    }
}
