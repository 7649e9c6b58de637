/*!
Recursive‑descent parser for mlscript.

Grammar (EBNF — condensed)
--------------------------

```text
program        → statement* EOF ;
statement      → printStmt | funDecl | classDecl | ifStmt | whileStmt
               | forStmt | returnStmt | throwStmt | tryStmt | withStmt
               | importStmt | "break" | "continue" | assignOrExpr ;
printStmt      → "print" "(" ( expression ( "," expression )* )? ")" ;
funDecl        → "fun" IDENT "(" params? ")" block ;
params         → param ( "," param )* ;
param          → IDENT ( "=" expression )? ;
classDecl      → "class" IDENT ( "inherits" postfix ( "," postfix )* )?
                 "{" funDecl* "}" ;
ifStmt         → "if" "(" expression ")" block
                 ( "elif" "(" expression ")" block )*
                 ( "else" block )? ;
whileStmt      → "while" "(" expression ")" block ;
forStmt        → "for" IDENT "in" expression block ;
returnStmt     → "return" expression? ;
throwStmt      → "throw" expression ;
tryStmt        → "try" block ( "catch" "(" IDENT ")" block )? ( "finally" block )? ;
withStmt       → "with" expression block ;
importStmt     → "import" STRING "as" IDENT ;
assignOrExpr   → expression ( "=" expression )? ;
block          → "{" statement* "}" ;

expression     → comparison ;
comparison     → additive ( ( "==" | "!=" | "<" | "<=" | ">" | ">="
                            | "in" | "not" "in" ) additive )* ;
additive       → multiplicative ( ( "+" | "-" ) multiplicative )* ;
multiplicative → unary ( ( "*" | "/" ) unary )* ;
unary          → ( "+" | "-" ) unary | postfix ;
postfix        → primary ( "(" arguments? ")" | "[" indices "]" | "." IDENT )* ;
arguments      → argument ( "," argument )* ;
argument       → ( IDENT "=" )? expression ;
indices        → sliceOrExpr ( "," sliceOrExpr )* ;
sliceOrExpr    → expression | expression? ":" expression? ( ":" expression? )? ;
primary        → INTEGER | FLOAT | STRING | "true" | "false" | IDENT
               | "super" ( "(" ")" )? | "(" tupleOrGroup ")"
               | "[" list "]" | "{" dict "}" | network ;
network        → "network" "{" ( IDENT ":" expression ","? )* "}" ;
```

The parser never recovers: the first error aborts the whole parse unit, so
callers either get the complete statement list or a [`MlError::Parse`].
*/

use std::rc::Rc;

use crate::ast::{
    BinaryOp, CatchClause, ClassDef, Expr, FunctionDef, Literal, NetworkDef, Param, Stmt, UnaryOp,
};
use crate::error::{MlError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    source_lines: Vec<&'a str>,
    current: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  `source` is the text the tokens were scanned
    /// from; it is only used to quote the offending line in diagnostics.
    pub fn new(tokens: &'a [Token<'a>], source: &'a str) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            source_lines: source.lines().collect(),
            current: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        info!("Parsed {} top-level statements", statements.len());

        Ok(statements)
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        match self.peek().token_type {
            TokenType::PRINT => self.print_statement(),
            TokenType::FUN => Ok(Stmt::Function(self.function_definition()?)),
            TokenType::CLASS => self.class_declaration(),
            TokenType::IF => self.if_statement(),
            TokenType::WHILE => self.while_statement(),
            TokenType::FOR => self.for_statement(),
            TokenType::RETURN => self.return_statement(),
            TokenType::THROW => {
                let line: usize = self.advance().line;
                let value: Expr = self.expression()?;

                Ok(Stmt::Throw { value, line })
            }
            TokenType::TRY => self.try_statement(),
            TokenType::WITH => {
                let line: usize = self.advance().line;
                let context: Expr = self.expression()?;
                let body: Vec<Stmt> = self.block()?;

                Ok(Stmt::With {
                    context,
                    body,
                    line,
                })
            }
            TokenType::IMPORT => self.import_statement(),
            TokenType::BREAK => Ok(Stmt::Break {
                line: self.advance().line,
            }),
            TokenType::CONTINUE => Ok(Stmt::Continue {
                line: self.advance().line,
            }),
            _ => self.assignment_or_expression(),
        }
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.consume(TokenType::PRINT)?.line;
        self.consume(TokenType::LEFT_PAREN)?;

        let mut values: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            values.push(self.expression()?);

            while self.matches(TokenType::COMMA) {
                values.push(self.expression()?);
            }
        }

        self.consume(TokenType::RIGHT_PAREN)?;

        Ok(Stmt::Print { values, line })
    }

    fn function_definition(&mut self) -> Result<Rc<FunctionDef>> {
        let line: usize = self.consume(TokenType::FUN)?.line;
        let name: String = self.identifier()?;

        debug!("Parsing function '{}'", name);

        self.consume(TokenType::LEFT_PAREN)?;

        let mut params: Vec<Param> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                let param_token: &Token<'_> = self.peek();
                let param_name: String = self.identifier()?;

                if params.iter().any(|p: &Param| p.name == param_name) {
                    return Err(MlError::parse(
                        param_token.line,
                        format!(
                            "Duplicate parameter '{}' in function '{}'",
                            param_name, name
                        ),
                    ));
                }

                let default: Option<Expr> = if self.matches(TokenType::EQUAL) {
                    Some(self.expression()?)
                } else {
                    None
                };

                if default.is_none() && params.iter().any(|p: &Param| p.default.is_some()) {
                    return Err(MlError::parse(
                        param_token.line,
                        format!(
                            "Non-default parameter '{}' follows default parameter in function '{}'",
                            param_name, name
                        ),
                    ));
                }

                params.push(Param {
                    name: param_name,
                    default,
                });

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN)?;
        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDef {
            name,
            params,
            body,
            line,
        }))
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let line: usize = self.consume(TokenType::CLASS)?.line;
        let name: String = self.identifier()?;

        let mut parents: Vec<Expr> = Vec::new();

        if self.matches(TokenType::INHERITS) {
            loop {
                parents.push(self.postfix()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::LEFT_BRACE)?;

        let mut methods: Vec<Rc<FunctionDef>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function_definition()?);
        }

        self.consume(TokenType::RIGHT_BRACE)?;

        debug!(
            "Parsed class '{}' with {} parents and {} methods",
            name,
            parents.len(),
            methods.len()
        );

        Ok(Stmt::Class(Rc::new(ClassDef {
            name,
            parents,
            methods,
            line,
        })))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let mut cases: Vec<(Expr, Vec<Stmt>)> = Vec::new();

        self.consume(TokenType::IF)?;
        cases.push(self.condition_and_block()?);

        while self.matches(TokenType::ELIF) {
            cases.push(self.condition_and_block()?);
        }

        let mut node: Option<Stmt> = if self.matches(TokenType::ELSE) {
            Some(Stmt::Block(self.block()?))
        } else {
            None
        };

        // Fold from the last case backwards so each `elif` becomes the else
        // branch of its predecessor.
        for (condition, then_branch) in cases.into_iter().rev() {
            node = Some(Stmt::If {
                condition,
                then_branch,
                else_branch: node.take().map(Box::new),
            });
        }

        node.ok_or_else(|| MlError::parse(self.peek().line, "Empty if statement"))
    }

    fn condition_and_block(&mut self) -> Result<(Expr, Vec<Stmt>)> {
        self.consume(TokenType::LEFT_PAREN)?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN)?;
        let body: Vec<Stmt> = self.block()?;

        Ok((condition, body))
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::WHILE)?;
        let (condition, body) = self.condition_and_block()?;

        Ok(Stmt::While { condition, body })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.consume(TokenType::FOR)?.line;
        let variable: String = self.identifier()?;
        self.consume(TokenType::IN)?;
        let iterable: Expr = self.expression()?;
        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::For {
            variable,
            iterable,
            body,
            line,
        })
    }

    /// `return` takes a value unless it is the last thing on its line or the
    /// last statement of a block.
    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: &Token<'_> = self.consume(TokenType::RETURN)?;
        let line: usize = keyword.line;

        let bare: bool = self.is_at_end()
            || self.check(TokenType::RIGHT_BRACE)
            || self.peek().line != line;

        let value: Option<Expr> = if bare {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { value, line })
    }

    fn try_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.consume(TokenType::TRY)?.line;
        let body: Vec<Stmt> = self.block()?;

        let catch: Option<CatchClause> = if self.matches(TokenType::CATCH) {
            self.consume(TokenType::LEFT_PAREN)?;
            let variable: String = self.identifier()?;
            self.consume(TokenType::RIGHT_PAREN)?;

            Some(CatchClause {
                variable,
                body: self.block()?,
            })
        } else {
            None
        };

        let finally: Option<Vec<Stmt>> = if self.matches(TokenType::FINALLY) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::Try {
            body,
            catch,
            finally,
            line,
        })
    }

    fn import_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.consume(TokenType::IMPORT)?.line;

        let module: String = match &self.peek().token_type {
            TokenType::STRING(s) => s.clone(),
            _ => return Err(self.error_expected(&TokenType::STRING(String::new()))),
        };
        self.advance();

        self.consume(TokenType::AS)?;
        let alias: String = self.identifier()?;

        Ok(Stmt::Import {
            module,
            alias,
            line,
        })
    }

    /// Assignment is statement-level only; the left side must reduce to a
    /// variable, an index access, or an attribute access.
    fn assignment_or_expression(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        if !self.check(TokenType::EQUAL) {
            return Ok(Stmt::Expression(expr));
        }

        let equals: &Token<'_> = self.advance();
        let value: Expr = self.expression()?;

        match expr {
            Expr::Variable { name, line } => Ok(Stmt::Assign { name, value, line }),

            Expr::Index {
                object,
                indices,
                line,
            } => Ok(Stmt::IndexAssign {
                object: *object,
                indices,
                value,
                line,
            }),

            Expr::Attribute { object, name, line } => Ok(Stmt::AttributeAssign {
                object: *object,
                name,
                value,
                line,
            }),

            _ => Err(MlError::parse(
                equals.line,
                format!(
                    "Invalid assignment target at line {}: {}",
                    equals.line,
                    self.source_line(equals.line)
                ),
            )),
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenType::LEFT_BRACE)?;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume(TokenType::RIGHT_BRACE)?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.additive()?;

        loop {
            let op: BinaryOp = match self.peek().token_type {
                TokenType::EQUAL_EQUAL => BinaryOp::Equal,
                TokenType::BANG_EQUAL => BinaryOp::NotEqual,
                TokenType::LESS => BinaryOp::Less,
                TokenType::LESS_EQUAL => BinaryOp::LessEqual,
                TokenType::GREATER => BinaryOp::Greater,
                TokenType::GREATER_EQUAL => BinaryOp::GreaterEqual,
                TokenType::IN => BinaryOp::In,
                TokenType::NOT => BinaryOp::NotIn,
                _ => break,
            };

            let line: usize = self.advance().line;

            if op == BinaryOp::NotIn {
                self.consume(TokenType::IN)?;
            }

            let right: Expr = self.additive()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.multiplicative()?;

        loop {
            let op: BinaryOp = match self.peek().token_type {
                TokenType::PLUS => BinaryOp::Add,
                TokenType::MINUS => BinaryOp::Sub,
                _ => break,
            };

            let line: usize = self.advance().line;
            let right: Expr = self.multiplicative()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        loop {
            let op: BinaryOp = match self.peek().token_type {
                TokenType::STAR => BinaryOp::Mul,
                TokenType::SLASH => BinaryOp::Div,
                _ => break,
            };

            let line: usize = self.advance().line;
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op: Option<UnaryOp> = match self.peek().token_type {
            TokenType::MINUS => Some(UnaryOp::Neg),
            TokenType::PLUS => Some(UnaryOp::Pos),
            _ => None,
        };

        if let Some(op) = op {
            let line: usize = self.advance().line;
            let operand: Expr = self.unary()?;

            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                line,
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.check(TokenType::LEFT_PAREN) {
                let line: usize = self.advance().line;
                expr = self.finish_call(expr, line)?;
            } else if self.check(TokenType::LEFT_BRACKET) {
                let line: usize = self.advance().line;
                let indices: Vec<Expr> = self.indices()?;

                expr = Expr::Index {
                    object: Box::new(expr),
                    indices,
                    line,
                };
            } else if self.check(TokenType::DOT) {
                let line: usize = self.advance().line;
                let name: String = self.identifier()?;

                expr = Expr::Attribute {
                    object: Box::new(expr),
                    name,
                    line,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr, line: usize) -> Result<Expr> {
        let mut args: Vec<Expr> = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.check(TokenType::RIGHT_PAREN) {
            if self.check(TokenType::IDENTIFIER) && self.check_next(TokenType::EQUAL) {
                let name: String = self.identifier()?;
                self.advance(); // '='
                kwargs.push((name, self.expression()?));
            } else {
                let arg_line: usize = self.peek().line;
                let arg: Expr = self.expression()?;

                if !kwargs.is_empty() {
                    return Err(MlError::parse(
                        arg_line,
                        format!(
                            "Positional argument follows keyword argument at line {}: {}",
                            arg_line,
                            self.source_line(arg_line)
                        ),
                    ));
                }

                args.push(arg);
            }

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_PAREN)?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            kwargs,
            line,
        })
    }

    fn indices(&mut self) -> Result<Vec<Expr>> {
        let mut indices: Vec<Expr> = vec![self.slice_or_expression()?];

        while self.matches(TokenType::COMMA) {
            indices.push(self.slice_or_expression()?);
        }

        self.consume(TokenType::RIGHT_BRACKET)?;

        Ok(indices)
    }

    /// A single component with no colon is a plain index, not a slice.
    fn slice_or_expression(&mut self) -> Result<Expr> {
        let line: usize = self.peek().line;

        let start: Option<Expr> = if self.check(TokenType::COLON) {
            None
        } else {
            Some(self.expression()?)
        };

        if !self.check(TokenType::COLON) {
            // `start` is always present here: an empty component would have
            // stopped at the colon check above.
            return start.ok_or_else(|| self.error_expected(&TokenType::COLON));
        }

        self.consume(TokenType::COLON)?;

        let stop: Option<Expr> = if self.check_any(&[
            TokenType::COLON,
            TokenType::RIGHT_BRACKET,
            TokenType::COMMA,
        ]) {
            None
        } else {
            Some(self.expression()?)
        };

        let mut step: Option<Expr> = None;

        if self.matches(TokenType::COLON)
            && !self.check_any(&[TokenType::RIGHT_BRACKET, TokenType::COMMA])
        {
            step = Some(self.expression()?);
        }

        Ok(Expr::Slice {
            start: start.map(Box::new),
            stop: stop.map(Box::new),
            step: step.map(Box::new),
            line,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: &Token<'_> = self.peek();
        let line: usize = token.line;

        let literal: Option<Literal> = match &token.token_type {
            TokenType::INTEGER(n) => Some(Literal::Integer(*n)),
            TokenType::FLOAT(n) => Some(Literal::Float(*n)),
            TokenType::STRING(s) => Some(Literal::Str(s.clone())),
            TokenType::TRUE => Some(Literal::Bool(true)),
            TokenType::FALSE => Some(Literal::Bool(false)),
            _ => None,
        };

        if let Some(value) = literal {
            self.advance();
            return Ok(Expr::Literal { value, line });
        }

        match token.token_type {
            TokenType::IDENTIFIER => {
                self.advance();

                Ok(Expr::Variable {
                    name: token.lexeme.to_owned(),
                    line,
                })
            }

            TokenType::SUPER => {
                self.advance();

                if self.check(TokenType::LEFT_PAREN) && self.check_next(TokenType::RIGHT_PAREN) {
                    self.advance();
                    self.advance();
                }

                Ok(Expr::Super { line })
            }

            TokenType::LEFT_PAREN => self.tuple_or_group(),
            TokenType::LEFT_BRACKET => self.list_expression(),
            TokenType::LEFT_BRACE => self.dict_expression(),
            TokenType::NETWORK => self.network_expression(),

            _ => Err(MlError::parse(
                line,
                format!(
                    "Expected expression, but got {} at line {}: {}",
                    token.token_type,
                    line,
                    self.source_line(line)
                ),
            )),
        }
    }

    fn tuple_or_group(&mut self) -> Result<Expr> {
        let line: usize = self.consume(TokenType::LEFT_PAREN)?.line;

        if self.matches(TokenType::RIGHT_PAREN) {
            return Ok(Expr::Tuple {
                elements: Vec::new(),
                line,
            });
        }

        let first: Expr = self.expression()?;

        if self.matches(TokenType::RIGHT_PAREN) {
            return Ok(first);
        }

        let mut elements: Vec<Expr> = vec![first];

        while self.matches(TokenType::COMMA) {
            if self.check(TokenType::RIGHT_PAREN) {
                break;
            }

            elements.push(self.expression()?);
        }

        self.consume(TokenType::RIGHT_PAREN)?;

        Ok(Expr::Tuple { elements, line })
    }

    fn list_expression(&mut self) -> Result<Expr> {
        let line: usize = self.consume(TokenType::LEFT_BRACKET)?.line;
        let mut elements: Vec<Expr> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACKET) {
            elements.push(self.expression()?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACKET)?;

        Ok(Expr::List { elements, line })
    }

    fn dict_expression(&mut self) -> Result<Expr> {
        let line: usize = self.consume(TokenType::LEFT_BRACE)?.line;
        let mut pairs: Vec<(Expr, Expr)> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) {
            let key: Expr = self.expression()?;
            self.consume(TokenType::COLON)?;
            let value: Expr = self.expression()?;
            pairs.push((key, value));

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::RIGHT_BRACE)?;

        Ok(Expr::Dict { pairs, line })
    }

    fn network_expression(&mut self) -> Result<Expr> {
        let line: usize = self.consume(TokenType::NETWORK)?.line;
        self.consume(TokenType::LEFT_BRACE)?;

        let mut input: Option<Expr> = None;
        let mut layers: Option<Expr> = None;
        let mut optimizer: Option<Expr> = None;
        let mut loss: Option<Expr> = None;

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            let key_token: &Token<'_> = self.peek();
            let key: String = self.identifier()?;
            self.consume(TokenType::COLON)?;
            let value: Expr = self.expression()?;

            let slot: &mut Option<Expr> = match key.as_str() {
                "input" => &mut input,
                "layers" => &mut layers,
                "optimizer" => &mut optimizer,
                "loss" => &mut loss,
                _ => {
                    return Err(MlError::parse(
                        key_token.line,
                        format!(
                            "Unknown network attribute '{}' at line {}: {}",
                            key,
                            key_token.line,
                            self.source_line(key_token.line)
                        ),
                    ))
                }
            };

            if slot.replace(value).is_some() {
                return Err(MlError::parse(
                    key_token.line,
                    format!("Duplicate network attribute '{}'", key),
                ));
            }

            self.matches(TokenType::COMMA);
        }

        self.consume(TokenType::RIGHT_BRACE)?;

        let missing = |name: &str| {
            MlError::parse(
                line,
                format!("Network block is missing the '{}' attribute", name),
            )
        };

        Ok(Expr::Network(Box::new(NetworkDef {
            input: input.ok_or_else(|| missing("input"))?,
            layers: layers.ok_or_else(|| missing("layers"))?,
            optimizer: optimizer.ok_or_else(|| missing("optimizer"))?,
            loss: loss.ok_or_else(|| missing("loss"))?,
            line,
        })))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn identifier(&mut self) -> Result<String> {
        Ok(self.consume(TokenType::IDENTIFIER)?.lexeme.to_owned())
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    /// Advance only on an exact kind match, else report what was expected,
    /// what was found, and the offending source line.
    #[inline(always)]
    fn consume(&mut self, ttype: TokenType) -> Result<&'a Token<'a>> {
        if self.check(ttype.clone()) {
            return Ok(self.advance());
        }

        Err(self.error_expected(&ttype))
    }

    fn error_expected(&self, expected: &TokenType) -> MlError {
        let token: &Token<'_> = self.peek();

        debug!(
            "Parse error: expected {} but found {:?}",
            expected, token.token_type
        );

        MlError::parse(
            token.line,
            format!(
                "Expected {}, but got {} at line {}: {}",
                expected,
                token.token_type,
                token.line,
                self.source_line(token.line)
            ),
        )
    }

    fn source_line(&self, line: usize) -> &'a str {
        self.source_lines
            .get(line.saturating_sub(1))
            .map(|l: &&'a str| l.trim())
            .unwrap_or("")
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        self.peek().token_type == ttype
    }

    fn check_any(&self, types: &[TokenType]) -> bool {
        types.iter().any(|t: &TokenType| self.peek().token_type == *t)
    }

    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t: &Token<'_>| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        let token: &'a Token<'a> = self.peek();

        if !self.is_at_end() {
            self.current += 1;
        }

        token
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    /// Current token.  A token stream always ends with `EOF`; an empty slice
    /// is treated as if it held only that marker.
    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        static EOF: Token<'static> = Token {
            token_type: TokenType::EOF,
            lexeme: "",
            line: 1,
        };

        let tokens: &'a [Token<'a>] = self.tokens;

        tokens
            .get(self.current)
            .or_else(|| tokens.last())
            .unwrap_or(&EOF)
    }
}

/// Scan and parse `source` in one step.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>> {
    let tokens: Vec<Token<'_>> = crate::scanner::tokenize(source)?;
    let mut parser: Parser<'_> = Parser::new(&tokens, source);

    parser.parse()
}
