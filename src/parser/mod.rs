mod error;
pub mod formatter;
mod precedence;

use compact_str::CompactString;
pub use error::{ParserError, ParserErrorKind};
pub use precedence::Precedence;
use std::rc::Rc;

use crate::{
    ast::{
        Block, Expression, ExpressionKind, InfixOperator, MemberProperty, PrefixOperator, Program,
        RecordEntry, RecordKey, Statement, StatementKind,
    },
    lexer::{Lexer, Token, TokenKind},
    stack::ensure_sufficient_stack,
};

type PrefixRule<'src> = fn(&mut Parser<'src>) -> Option<Expression>;
type InfixRule<'src> = fn(&mut Parser<'src>, Expression) -> Option<Expression>;

/// A Pratt parser over a token stream.
///
/// Parsing never aborts. Problems are recorded and the parser carries on from
/// the next token, so a single pass reports every error it can find.
#[derive(Debug)]
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    peek: Token,
    errors: Vec<ParserError>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.lexer.get_source()
    }

    /// The recorded error messages in the order they were found.
    pub fn errors(&self) -> Vec<String> {
        self.errors.iter().map(|error| error.to_string()).collect()
    }

    pub fn diagnostics(&self) -> &[ParserError] {
        &self.errors
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.current_is(TokenKind::Eof) {
            if self.current_is(TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.advance();
        }
        tracing::debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Program { statements }
    }
}

// Token handling
impl<'src> Parser<'src> {
    fn advance(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    /// Advances onto the peek token if it has the given kind, otherwise records an error.
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.advance();
            Some(())
        } else {
            let error = ParserError::unexpected(kind, &self.peek);
            self.push_error(error);
            None
        }
    }

    fn push_error(&mut self, error: ParserError) {
        tracing::debug!(code = error.code(), "{error}");
        self.errors.push(error);
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.advance();
        }
    }
}

// Statements
impl<'src> Parser<'src> {
    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::KeywordReturn => self.parse_return_statement(),
            TokenKind::KeywordWhile => self.parse_while_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let value = if matches!(
            self.peek.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) {
            None
        } else {
            self.advance();
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.skip_semicolon();
        Some(Statement {
            kind: StatementKind::Return(value),
            token,
        })
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LeftParenthesis)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParenthesis)?;
        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block();
        self.skip_semicolon();
        Some(Statement {
            kind: StatementKind::While { condition, body },
            token,
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement {
            kind: StatementKind::Expression(expression),
            token,
        })
    }

    /// Parses statements up to the closing brace. Expects the current token to be `{`.
    fn parse_block(&mut self) -> Block {
        let token = self.current.clone();
        let mut statements = Vec::new();
        self.advance();
        while !self.current_is(TokenKind::RightBrace) && !self.current_is(TokenKind::Eof) {
            if self.current_is(TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.advance();
        }
        if self.current_is(TokenKind::Eof) {
            let error = ParserError::unexpected(TokenKind::RightBrace, &self.current);
            self.push_error(error);
        }
        Block { statements, token }
    }
}

// Expressions
impl<'src> Parser<'src> {
    fn prefix_rule(kind: TokenKind) -> Option<PrefixRule<'src>> {
        let rule: PrefixRule<'src> = match kind {
            TokenKind::Ident => Self::parse_identifier,
            TokenKind::IntegerLiteral => Self::parse_integer,
            TokenKind::StringLiteral => Self::parse_string,
            TokenKind::KeywordTrue | TokenKind::KeywordFalse => Self::parse_boolean,
            TokenKind::Minus | TokenKind::Bang | TokenKind::KeywordNot => Self::parse_prefix,
            TokenKind::LeftParenthesis => Self::parse_grouped,
            TokenKind::KeywordIf => Self::parse_if,
            TokenKind::KeywordF => Self::parse_function,
            TokenKind::LeftBracket => Self::parse_array,
            TokenKind::LeftBrace => Self::parse_record,
            _ => return None,
        };
        Some(rule)
    }

    fn infix_rule(kind: TokenKind) -> Option<InfixRule<'src>> {
        let rule: InfixRule<'src> = match kind {
            TokenKind::Equal => Self::parse_assign,
            TokenKind::LeftParenthesis => Self::parse_call,
            TokenKind::LeftBracket => Self::parse_index,
            TokenKind::Dot => Self::parse_member,
            kind if InfixOperator::from_token_kind(kind).is_some() => Self::parse_infix,
            _ => return None,
        };
        Some(rule)
    }

    pub fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        ensure_sufficient_stack(|| self.parse_expression_at(precedence))
    }

    fn parse_expression_at(&mut self, precedence: Precedence) -> Option<Expression> {
        let Some(prefix) = Self::prefix_rule(self.current.kind) else {
            let error = ParserError {
                kind: ParserErrorKind::NoPrefixRule(self.current.kind),
                token: self.current.clone(),
            };
            self.push_error(error);
            return None;
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < Precedence::of(self.peek.kind) {
            let Some(infix) = Self::infix_rule(self.peek.kind) else {
                return Some(left);
            };
            self.advance();
            left = infix(self, left)?;
        }
        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression {
            kind: ExpressionKind::Identifier(self.current.lexeme.clone()),
            token: self.current.clone(),
        })
    }

    fn parse_integer(&mut self) -> Option<Expression> {
        let Ok(value) = self.current.lexeme.parse::<i64>() else {
            let error = ParserError {
                kind: ParserErrorKind::InvalidInteger(self.current.lexeme.clone()),
                token: self.current.clone(),
            };
            self.push_error(error);
            return None;
        };
        Some(Expression {
            kind: ExpressionKind::Integer(value),
            token: self.current.clone(),
        })
    }

    fn parse_string(&mut self) -> Option<Expression> {
        Some(Expression {
            kind: ExpressionKind::String(self.current.lexeme.clone()),
            token: self.current.clone(),
        })
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression {
            kind: ExpressionKind::Boolean(self.current_is(TokenKind::KeywordTrue)),
            token: self.current.clone(),
        })
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let operator = PrefixOperator::from_token_kind(token.kind)?;
        self.advance();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expression {
            kind: ExpressionKind::Prefix {
                operator,
                operand: Box::new(operand),
            },
            token,
        })
    }

    fn parse_grouped(&mut self) -> Option<Expression> {
        self.advance();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParenthesis)?;
        Some(expression)
    }

    fn parse_if(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LeftParenthesis)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParenthesis)?;
        self.expect_peek(TokenKind::LeftBrace)?;
        let then_branch = self.parse_block();

        let else_branch = if self.peek_is(TokenKind::KeywordElse) {
            self.advance();
            if self.peek_is(TokenKind::KeywordIf) {
                // `else if` is sugar for an else block holding a single if expression.
                self.advance();
                let token = self.current.clone();
                let nested = self.parse_if()?;
                Some(Block {
                    statements: vec![Statement {
                        kind: StatementKind::Expression(nested),
                        token: token.clone(),
                    }],
                    token,
                })
            } else {
                self.expect_peek(TokenKind::LeftBrace)?;
                Some(self.parse_block())
            }
        } else {
            None
        };

        Some(Expression {
            kind: ExpressionKind::If {
                condition: Box::new(condition),
                then_branch,
                else_branch,
            },
            token,
        })
    }

    fn parse_function(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LeftParenthesis)?;
        let parameters = self.parse_parameters()?;

        let kind = if self.peek_is(TokenKind::Arrow) {
            self.advance();
            self.advance();
            let body = self.parse_expression(Precedence::Lowest)?;
            ExpressionKind::ArrowFunction {
                parameters,
                body: Rc::new(body),
            }
        } else {
            self.expect_peek(TokenKind::LeftBrace)?;
            let body = self.parse_block();
            ExpressionKind::Function {
                parameters,
                body: Rc::new(body),
            }
        };
        Some(Expression { kind, token })
    }

    fn parse_parameters(&mut self) -> Option<Rc<[CompactString]>> {
        let list = self.parse_expression_list(TokenKind::RightParenthesis)?;
        let mut parameters = Vec::with_capacity(list.len());
        for expression in list {
            match expression.kind {
                ExpressionKind::Identifier(name) => parameters.push(name),
                other => {
                    let error = ParserError {
                        kind: ParserErrorKind::InvalidParameter(other.to_string().into()),
                        token: expression.token,
                    };
                    self.push_error(error);
                    return None;
                }
            }
        }
        Some(parameters.into())
    }

    fn parse_array(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;
        Some(Expression {
            kind: ExpressionKind::Array(elements),
            token,
        })
    }

    fn parse_record(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let mut entries = Vec::new();
        if self.peek_is(TokenKind::RightBrace) {
            self.advance();
            return Some(Expression {
                kind: ExpressionKind::Record(entries),
                token,
            });
        }

        loop {
            self.advance();
            let key = match self.current.kind {
                TokenKind::Ident => RecordKey::Identifier(self.current.clone()),
                TokenKind::StringLiteral => RecordKey::String(self.current.lexeme.clone()),
                TokenKind::IntegerLiteral => RecordKey::Computed(self.parse_integer()?),
                TokenKind::LeftBracket => {
                    self.advance();
                    let key = self.parse_expression(Precedence::Lowest)?;
                    self.expect_peek(TokenKind::RightBracket)?;
                    RecordKey::Computed(key)
                }
                kind => {
                    let error = ParserError {
                        kind: ParserErrorKind::InvalidRecordKey(kind),
                        token: self.current.clone(),
                    };
                    self.push_error(error);
                    return None;
                }
            };

            let value = match key {
                RecordKey::Identifier(_) if !self.peek_is(TokenKind::Colon) => None,
                _ => {
                    self.expect_peek(TokenKind::Colon)?;
                    self.advance();
                    Some(self.parse_expression(Precedence::Lowest)?)
                }
            };
            entries.push(RecordEntry { key, value });

            if self.peek_is(TokenKind::Comma) {
                self.advance();
                if self.peek_is(TokenKind::RightBrace) {
                    self.advance();
                    break;
                }
                continue;
            }
            self.expect_peek(TokenKind::RightBrace)?;
            break;
        }

        Some(Expression {
            kind: ExpressionKind::Record(entries),
            token,
        })
    }

    /// Parses a comma separated list of expressions up to `end`. A trailing comma is allowed.
    /// Expects the current token to be the opening delimiter.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.advance();
            return Some(list);
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.advance();
            if self.peek_is(end) {
                break;
            }
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Some(list)
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let operator = InfixOperator::from_token_kind(token.kind)?;
        let precedence = Precedence::of(token.kind);
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expression {
            kind: ExpressionKind::Infix {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            token,
        })
    }

    fn parse_assign(&mut self, destination: Expression) -> Option<Expression> {
        let token = self.current.clone();
        self.advance();
        // Parsed below assignment precedence so that `a = b = c` groups to the right.
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expression {
            kind: ExpressionKind::Assign {
                destination: Box::new(destination),
                value: Box::new(value),
            },
            token,
        })
    }

    fn parse_call(&mut self, callee: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let arguments = self.parse_expression_list(TokenKind::RightParenthesis)?;
        Some(Expression {
            kind: ExpressionKind::Call {
                callee: Box::new(callee),
                arguments,
            },
            token,
        })
    }

    fn parse_index(&mut self, collection: Expression) -> Option<Expression> {
        let token = self.current.clone();
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;
        Some(Expression {
            kind: ExpressionKind::Index {
                collection: Box::new(collection),
                index: Box::new(index),
            },
            token,
        })
    }

    fn parse_member(&mut self, object: Expression) -> Option<Expression> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::Ident)?;
        let name = self.current.lexeme.clone();
        let property = if self.peek_is(TokenKind::LeftParenthesis) {
            self.advance();
            let arguments = self.parse_expression_list(TokenKind::RightParenthesis)?;
            MemberProperty::Method { name, arguments }
        } else {
            MemberProperty::Field(name)
        };
        Some(Expression {
            kind: ExpressionKind::Member {
                object: Box::new(object),
                property,
            },
            token,
        })
    }
}
