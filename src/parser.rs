use crate::ast::*;
use crate::geometry::PortType;
use crate::lexer::{LexError, Lexer, Token};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0:?}, expected {1}")]
    Unexpected(Token, &'static str),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> &Token {
        let tok = self.tokens.get(self.pos).unwrap_or(&Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance().clone() {
            Token::Ident(s) => Ok(s),
            tok => Err(ParseError::Unexpected(tok, "identifier")),
        }
    }

    fn expect_num(&mut self) -> Result<f64, ParseError> {
        match self.advance().clone() {
            Token::Num(n) => Ok(n),
            tok => Err(ParseError::Unexpected(tok, "number")),
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        let tok = self.advance().clone();
        if tok == expected {
            Ok(())
        } else {
            Err(ParseError::Unexpected(tok, what))
        }
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    pub fn parse(&mut self) -> Result<SceneDoc, ParseError> {
        let mut doc = SceneDoc::default();

        while *self.peek() != Token::Eof {
            if *self.peek() == Token::At {
                doc.hints.push(self.parse_hint()?);
            } else if self.check_ident("node") {
                self.advance();
                doc.nodes.push(self.parse_node()?);
            } else if self.check_ident("wire") {
                self.advance();
                doc.wires.push(self.parse_wire()?);
            } else {
                return Err(ParseError::Unexpected(
                    self.peek().clone(),
                    "node, wire, or @setting",
                ));
            }
        }

        Ok(doc)
    }

    fn parse_node(&mut self) -> Result<NodeDecl, ParseError> {
        let name = self.expect_ident()?;

        let label = match self.peek() {
            Token::Str(s) => {
                let s = s.clone();
                self.advance();
                Some(s)
            }
            _ => None,
        };

        let (x, y) = if self.check_ident("at") {
            self.advance();
            let x = self.expect_num()?;
            self.expect(Token::Comma, "','")?;
            let y = self.expect_num()?;
            (x, y)
        } else {
            (0.0, 0.0)
        };

        self.expect(Token::LBrace, "'{'")?;
        let mut ports = Vec::new();
        while *self.peek() != Token::RBrace {
            ports.push(self.parse_port()?);
        }
        self.advance();

        Ok(NodeDecl {
            name,
            label,
            x,
            y,
            ports,
        })
    }

    fn parse_port(&mut self) -> Result<PortDecl, ParseError> {
        let side = match self.advance().clone() {
            Token::Ident(s) => match PortType::from_str(&s) {
                Some(side) => side,
                None => return Err(ParseError::Unexpected(Token::Ident(s), "'in' or 'out'")),
            },
            tok => return Err(ParseError::Unexpected(tok, "'in', 'out' or '}'")),
        };
        let name = self.expect_ident()?;
        Ok(PortDecl { side, name })
    }

    fn parse_port_path(&mut self) -> Result<(String, String), ParseError> {
        let node = self.expect_ident()?;
        self.expect(Token::Dot, "'.'")?;
        let port = self.expect_ident()?;
        Ok((node, port))
    }

    fn parse_wire(&mut self) -> Result<WireDecl, ParseError> {
        let (from_node, from_port) = self.parse_port_path()?;
        self.expect(Token::Arrow, "'->'")?;
        let (to_node, to_port) = self.parse_port_path()?;
        Ok(WireDecl {
            from_node,
            from_port,
            to_node,
            to_port,
        })
    }

    fn parse_hint(&mut self) -> Result<Hint, ParseError> {
        self.expect(Token::At, "'@'")?;
        let mut key = self.expect_ident()?;

        while *self.peek() == Token::Dot {
            self.advance();
            key.push('.');
            key.push_str(&self.expect_ident()?);
        }

        self.expect(Token::Eq, "'='")?;

        let value = match self.advance().clone() {
            Token::Num(n) => HintValue::Num(n),
            Token::Str(s) => HintValue::Str(s),
            Token::Ident(s) => HintValue::Ident(s),
            tok => return Err(ParseError::Unexpected(tok, "setting value")),
        };

        Ok(Hint { key, value })
    }
}
