/*!
Recursive‑descent parser producing the statement list of a Rox program.

Each token is consumed once via `advance()`, so parsing is Θ(n) in the number of
tokens; call‑stack depth grows with syntactic nesting.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths (`consume`, etc.)| `debug`| Context before returning structured error.|

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → structDecl | letDecl | statement ;
structDecl     → "struct" IDENT "{" method* "}" ;
method         → "fn"? IDENT "(" parameters? ")" block ;
letDecl        → "let" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt | returnStmt
               | whileStmt | breakStmt | continueStmt | block ;
exprStmt       → expression ";" ;            // ";" optional after a named fn
forStmt        → "for" "(" letDecl expression? ";" expression? ")" statement ;
whileStmt      → "while" "(" expression ")" statement ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
printStmt      → "print" expression ";" ;
returnStmt     → "return" expression? ";" ;
breakStmt      → "break" ";" ;
continueStmt   → "continue" ";" ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | ternary ;
ternary        → logic_or ( "?" ternary ":" ternary )? ;
logic_or       → logic_and ( "||" logic_and )* ;
logic_and      → equality ( "&&" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" | "+" ) unary | function ;
function       → "fn" IDENT? "(" parameters? ")" block | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
parameters     → IDENT ( "," IDENT )* ;
arguments      → expression ( "," expression )* ;
primary        → NUMBER | STRING | "true" | "false" | "null" | "this"
               | IDENT | "(" expression ")" ;
```
*/

use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::expr::{
    BinaryOp, Expr, ExprId, FunctionDecl, Identifier, LiteralValue, LogicalOp, UnaryOp,
};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on call arguments and function parameters.
pub const MAX_ARGUMENTS: usize = 255;

/// Top‑level parser over an immutable slice of tokens ending in `EOF`.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program, stopping at the first syntax error.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        match self.parse_partial() {
            (statements, None) => Ok(statements),
            (_, Some(e)) => Err(e),
        }
    }

    /// Like [`Parser::parse`], but on a syntax error also hands back every
    /// statement completed before it.
    pub fn parse_partial(&mut self) -> (Vec<Stmt>, Option<LoxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    debug!("Parse stopped after {} statements", statements.len());
                    return (statements, Some(e));
                }
            }
        }

        info!("Parsed {} statements", statements.len());

        (statements, None)
    }

    /// Parse an entire program, skipping to the next statement boundary after
    /// each error.  Returns every statement that parsed and every error seen.
    pub fn parse_recovering(&mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        info!("Beginning recovering parse phase");

        let mut statements: Vec<Stmt> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    errors.push(e);
                    self.synchronize();
                }
            }
        }

        (statements, errors)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        if self.matches(TokenType::STRUCT) {
            self.struct_declaration()
        } else if self.matches(TokenType::LET) {
            self.let_declaration()
        } else {
            self.statement()
        }
    }

    fn struct_declaration(&mut self) -> Result<Stmt> {
        let name: Identifier = self.identifier("Expected struct name")?;

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before struct body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            // The `fn` keyword is optional in front of a method.
            self.matches(TokenType::FN);

            let method_name: Identifier = self.identifier("Expected method name")?;
            let decl = self.function_rest(Some(method_name.clone()), method_name.line)?;

            methods.push(Rc::new(decl));
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after struct body")?;

        debug!("Parsed struct '{}' with {} methods", name.name, methods.len());

        Ok(Stmt::Struct { name, methods })
    }

    fn let_declaration(&mut self) -> Result<Stmt> {
        let name: Identifier = self.identifier("Expected variable name")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Let { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) {
            let line: usize = self.previous().line;
            self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'")?;
            Ok(Stmt::Break { line })
        } else if self.matches(TokenType::CONTINUE) {
            let line: usize = self.previous().line;
            self.consume(TokenType::SEMICOLON, "Expected ';' after 'continue'")?;
            Ok(Stmt::Continue { line })
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        if !self.matches(TokenType::LET) {
            return Err(self.error("Expected 'let' initializer in for loop"));
        }

        let initializer: Box<Stmt> = Box::new(self.let_declaration()?);

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        let named_function = matches!(&expr, Expr::Function(decl) if decl.name.is_some());

        if named_function {
            self.matches(TokenType::SEMICOLON);
        } else {
            self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;
        }

        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.previous().line;
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;

        Ok(Stmt::Return { line, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.ternary()?;

        if self.matches(TokenType::EQUAL) {
            let equals: &Token<'_> = self.previous();
            let value: Box<Expr> = Box::new(self.assignment()?);

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value,
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value,
                }),

                _ => {
                    debug!("Rejecting assignment target at line {}", equals.line);

                    Err(LoxError::parse(
                        equals.line,
                        Some(equals.lexeme),
                        "Invalid assignment target",
                    ))
                }
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let condition: Expr = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let then_branch: Expr = self.ternary()?;
            self.consume(TokenType::COLON, "Expected ':' in ternary expression")?;
            let else_branch: Expr = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::Or,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator: LogicalOp::And,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Shared loop for the left‑associative binary levels.
    fn binary_level(
        &mut self,
        operators: &[(TokenType, BinaryOp)],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;

        'outer: loop {
            for (token_type, operator) in operators {
                if self.matches(token_type.clone()) {
                    let line: usize = self.previous().line;
                    let right: Expr = operand(self)?;

                    expr = Expr::Binary {
                        left: Box::new(expr),
                        operator: *operator,
                        line,
                        right: Box::new(right),
                    };

                    continue 'outer;
                }
            }

            return Ok(expr);
        }
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::BANG_EQUAL, BinaryOp::BangEqual),
                (TokenType::EQUAL_EQUAL, BinaryOp::EqualEqual),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::GREATER, BinaryOp::Greater),
                (TokenType::GREATER_EQUAL, BinaryOp::GreaterEqual),
                (TokenType::LESS, BinaryOp::Less),
                (TokenType::LESS_EQUAL, BinaryOp::LessEqual),
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::MINUS, BinaryOp::Minus),
                (TokenType::PLUS, BinaryOp::Plus),
            ],
            Self::factor,
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                (TokenType::STAR, BinaryOp::Star),
                (TokenType::SLASH, BinaryOp::Slash),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        let operator: Option<UnaryOp> = if self.matches(TokenType::BANG) {
            Some(UnaryOp::Bang)
        } else if self.matches(TokenType::MINUS) {
            Some(UnaryOp::Minus)
        } else if self.matches(TokenType::PLUS) {
            Some(UnaryOp::Plus)
        } else {
            None
        };

        match operator {
            Some(operator) => {
                let line: usize = self.previous().line;
                let right: Expr = self.unary()?;

                Ok(Expr::Unary {
                    operator,
                    line,
                    right: Box::new(right),
                })
            }
            None => self.function(),
        }
    }

    /// Function literal, named or anonymous.  Falls through to `call`.
    fn function(&mut self) -> Result<Expr> {
        if !self.matches(TokenType::FN) {
            return self.call();
        }

        let line: usize = self.previous().line;
        let name: Option<Identifier> = if self.check(TokenType::IDENTIFIER) {
            Some(self.identifier("Expected function name")?)
        } else {
            None
        };

        let decl: FunctionDecl = self.function_rest(name, line)?;

        Ok(Expr::Function(Rc::new(decl)))
    }

    /// `"(" parameters? ")" block`, shared by function literals and methods.
    fn function_rest(&mut self, name: Option<Identifier>, line: usize) -> Result<FunctionDecl> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name")?;

        let mut params: Vec<Identifier> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(self.error(format!(
                        "Can't have more than {} parameters",
                        MAX_ARGUMENTS
                    )));
                }

                params.push(self.identifier("Expected parameter name")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            line,
        })
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Identifier = self.identifier("Expected property name after '.'")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    return Err(self.error(format!(
                        "Can't have more than {} arguments",
                        MAX_ARGUMENTS
                    )));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: &Token<'_> =
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            line: paren.line,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: &Token<'_> = self.peek();

        let expr = match &token.token_type {
            TokenType::FALSE => Expr::Literal(LiteralValue::False),
            TokenType::TRUE => Expr::Literal(LiteralValue::True),
            TokenType::NULL => Expr::Literal(LiteralValue::Nil),
            TokenType::NUMBER(n) => Expr::Literal(LiteralValue::Number(*n)),
            TokenType::STRING(s) => Expr::Literal(LiteralValue::Str(s.clone())),
            TokenType::THIS => Expr::This {
                id: ExprId::fresh(),
                line: token.line,
            },
            TokenType::IDENTIFIER => Expr::Variable {
                id: ExprId::fresh(),
                name: Identifier {
                    name: token.lexeme.to_string(),
                    line: token.line,
                },
            },
            TokenType::LEFT_PAREN => {
                self.advance();
                let expr: Expr = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(self.error("Expected expression")),
        };

        self.advance();

        Ok(expr)
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Consume an identifier and detach it from the token buffer.
    fn identifier(&mut self, message: &str) -> Result<Identifier> {
        let token: &Token<'_> = self.consume(TokenType::IDENTIFIER, message)?;

        Ok(Identifier {
            name: token.lexeme.to_string(),
            line: token.line,
        })
    }

    /// Build a parse error located at the current token.
    fn error<S: Into<String>>(&self, message: S) -> LoxError {
        let token: &Token<'_> = self.peek();
        let lexeme: Option<&str> = if self.is_at_end() {
            None
        } else {
            Some(token.lexeme)
        };

        LoxError::parse(token.line, lexeme, message)
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!("consume failed at line {}: {}", self.peek().line, message);

        Err(self.error(message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::STRUCT
                | TokenType::FN
                | TokenType::LET
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
