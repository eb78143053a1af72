//! Infix text -> postfix token stream (shunting-yard)

use crate::error::CompileError;
use crate::graph::Operator;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Normalized literal: `,` already rewritten to `.`.
    Number(String),
    Op(Operator),
    LParen,
    RParen,
}

/// Output of [`to_postfix`]: parentheses are gone.
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixToken {
    Number(String),
    Op(Operator),
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut number = String::new();

    for ch in input.chars() {
        match ch {
            '0'..='9' | '.' => {
                number.push(ch);
                continue;
            }
            ',' => {
                number.push('.');
                continue;
            }
            _ => {}
        }

        flush_number(&mut number, &mut tokens)?;

        match ch {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            c if c.is_whitespace() => {}
            c => {
                let op = Operator::from_symbol(c).ok_or(CompileError::UnexpectedCharacter(c))?;
                tokens.push(Token::Op(op));
            }
        }
    }
    flush_number(&mut number, &mut tokens)?;

    Ok(tokens)
}

fn flush_number(number: &mut String, tokens: &mut Vec<Token>) -> Result<(), CompileError> {
    if number.is_empty() {
        return Ok(());
    }

    let separators = number.chars().filter(|c| *c == '.').count();
    let has_digits = number.chars().any(|c| c.is_ascii_digit());
    if separators > 1 || !has_digits {
        return Err(CompileError::InvalidNumberLiteral(std::mem::take(number)));
    }
    // Non-finite values have no JSON form and could never reach a worker.
    if !number.parse::<f64>().is_ok_and(f64::is_finite) {
        return Err(CompileError::InvalidNumberLiteral(std::mem::take(number)));
    }

    tokens.push(Token::Number(std::mem::take(number)));
    Ok(())
}

enum Stacked {
    LParen,
    Op(Operator),
}

pub fn to_postfix(input: &str) -> Result<Vec<PostfixToken>, CompileError> {
    let mut output = Vec::new();
    let mut operators: Vec<Stacked> = Vec::new();

    for token in tokenize(input)? {
        match token {
            Token::Number(n) => output.push(PostfixToken::Number(n)),
            Token::LParen => operators.push(Stacked::LParen),
            Token::RParen => loop {
                match operators.pop() {
                    Some(Stacked::LParen) => break,
                    Some(Stacked::Op(op)) => output.push(PostfixToken::Op(op)),
                    None => return Err(CompileError::UnbalancedParentheses),
                }
            },
            Token::Op(incoming) => {
                while let Some(Stacked::Op(top)) = operators.last() {
                    if top.precedence() < incoming.precedence() {
                        break;
                    }
                    output.push(PostfixToken::Op(*top));
                    operators.pop();
                }
                operators.push(Stacked::Op(incoming));
            }
        }
    }

    while let Some(stacked) = operators.pop() {
        match stacked {
            Stacked::Op(op) => output.push(PostfixToken::Op(op)),
            Stacked::LParen => return Err(CompileError::UnbalancedParentheses),
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tokens: &[PostfixToken]) -> String {
        tokens
            .iter()
            .map(|t| match t {
                PostfixToken::Number(n) => n.clone(),
                PostfixToken::Op(op) => op.symbol().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_precedence_and_left_associativity() {
        assert_eq!(render(&to_postfix("2+3*4").unwrap()), "2 3 4 * +");
        assert_eq!(render(&to_postfix("8-3-1").unwrap()), "8 3 - 1 -");
        assert_eq!(render(&to_postfix("8/4*2").unwrap()), "8 4 / 2 *");
        assert_eq!(render(&to_postfix("(2+3)*4").unwrap()), "2 3 + 4 *");
    }

    #[test]
    fn test_separators_are_normalized() {
        assert_eq!(render(&to_postfix("2,5 + 0.5").unwrap()), "2.5 0.5 +");
    }

    #[test]
    fn test_invalid_number_literals() {
        assert_eq!(
            to_postfix("1.2.3+1"),
            Err(CompileError::InvalidNumberLiteral("1.2.3".to_string()))
        );
        assert_eq!(
            to_postfix("2+.*3"),
            Err(CompileError::InvalidNumberLiteral(".".to_string()))
        );
        assert_eq!(
            to_postfix("1,2.5"),
            Err(CompileError::InvalidNumberLiteral("1.2.5".to_string()))
        );
    }

    #[test]
    fn test_out_of_range_literal() {
        let huge = format!("1{}", "0".repeat(400));
        assert_eq!(
            to_postfix(&format!("{huge}+1")),
            Err(CompileError::InvalidNumberLiteral(huge))
        );
        let large = format!("1{}", "0".repeat(300));
        assert!(to_postfix(&format!("{large}+1")).is_ok());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(to_postfix("2+(3*4"), Err(CompileError::UnbalancedParentheses));
        assert_eq!(to_postfix("2+3)*4"), Err(CompileError::UnbalancedParentheses));
        assert_eq!(to_postfix(")("), Err(CompileError::UnbalancedParentheses));
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(to_postfix("2^3"), Err(CompileError::UnexpectedCharacter('^')));
        assert_eq!(to_postfix("x+1"), Err(CompileError::UnexpectedCharacter('x')));
    }

    #[test]
    fn test_missing_operands_survive_postfix() {
        // Arity is checked while building the graph, not here.
        assert_eq!(render(&to_postfix("2++3").unwrap()), "2 + 3 +");
    }
}
