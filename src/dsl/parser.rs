//! Parser for the operating point description language.

use std::collections::HashMap;

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::converter::DeviceFamily;
use crate::error::{ConvlossError, Result};

/// Parser for description files.
pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire description.
    pub fn parse(&mut self) -> Result<DescriptionAst> {
        let mut ast = DescriptionAst::new();

        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                _ => {
                    return Err(ConvlossError::parse(
                        self.current.line,
                        format!("expected a directive, got '{}'", self.current.text),
                    ));
                }
            }

            // Every directive owns its whole line
            match self.current.kind {
                TokenKind::Newline => self.advance()?,
                TokenKind::Eof => {}
                _ => {
                    return Err(ConvlossError::parse(
                        self.current.line,
                        format!("unexpected trailing token '{}'", self.current.text),
                    ));
                }
            }
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(ConvlossError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn expect_number(&mut self) -> Result<f64> {
        let tok = self.expect(TokenKind::Number)?;
        parse_value(&tok.text)
            .ok_or_else(|| ConvlossError::parse(tok.line, format!("invalid number: {}", tok.text)))
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn parse_directive(&mut self, ast: &mut DescriptionAst) -> Result<()> {
        let directive = self.current.text.to_lowercase();
        let line = self.current.line;
        self.advance()?;

        match directive.as_str() {
            ".param" => {
                let name = self.expect(TokenKind::Identifier)?.text.to_lowercase();
                let value = self.expect_number()?;
                if ast.params.iter().any(|p| p.name == name) {
                    return Err(ConvlossError::parse(
                        line,
                        format!("parameter '{}' is set twice", name),
                    ));
                }
                ast.params.push(ParamDef { name, value, line });
            }
            ".current" => {
                if ast.current.is_some() {
                    return Err(ConvlossError::parse(line, "current model is set twice"));
                }
                let keyword = self.expect(TokenKind::Identifier)?.text;
                let mode = CurrentMode::from_keyword(&keyword).ok_or_else(|| {
                    ConvlossError::parse(line, format!("unknown current mode: {}", keyword))
                })?;
                let params = self.parse_assignments(line, false)?;
                ast.current = Some(CurrentDef { mode, params, line });
            }
            ".model" => {
                let model = self.parse_model_def(line)?;
                if ast.models.contains_key(&model.name) {
                    return Err(ConvlossError::DuplicateModel { name: model.name });
                }
                ast.models.insert(model.name.clone(), model);
            }
            ".curve" => {
                let curve = self.parse_curve_def(line)?;
                if ast.curves.contains_key(&curve.model) {
                    return Err(ConvlossError::parse(
                        line,
                        format!("curve for '{}' is defined twice", curve.model),
                    ));
                }
                ast.curves.insert(curve.model.clone(), curve);
            }
            ".use" => {
                let keyword = self.expect(TokenKind::Identifier)?.text;
                let family = DeviceFamily::from_keyword(&keyword).ok_or_else(|| {
                    ConvlossError::parse(line, format!("unknown device family: {}", keyword))
                })?;
                let model = self.expect(TokenKind::Identifier)?.text;
                ast.assignments.push(UseDef {
                    family,
                    model,
                    line,
                });
            }
            _ => {
                return Err(ConvlossError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    /// Parse `key=value` pairs, optionally wrapped in parentheses.
    fn parse_assignments(
        &mut self,
        line: usize,
        parenthesized: bool,
    ) -> Result<HashMap<String, f64>> {
        let mut params = HashMap::new();

        if parenthesized {
            self.expect(TokenKind::OpenParen)?;
        }

        loop {
            if parenthesized && self.current.kind == TokenKind::CloseParen {
                self.advance()?;
                break;
            }
            if self.at_line_end() {
                if parenthesized {
                    return Err(ConvlossError::parse(line, "missing ')'"));
                }
                break;
            }

            let key = self.expect(TokenKind::Identifier)?.text.to_lowercase();
            self.expect(TokenKind::Equals)?;
            let value = self.expect_number()?;
            if params.insert(key.clone(), value).is_some() {
                return Err(ConvlossError::parse(
                    line,
                    format!("parameter '{}' is given twice", key),
                ));
            }
        }

        Ok(params)
    }

    fn parse_model_def(&mut self, line: usize) -> Result<ModelDef> {
        let name = self.expect(TokenKind::Identifier)?.text;
        let type_str = self.expect(TokenKind::Identifier)?.text;

        let model_type = ModelType::from_keyword(&type_str).ok_or_else(|| {
            ConvlossError::parse(line, format!("unknown model type: {}", type_str))
        })?;

        let params = if self.current.kind == TokenKind::OpenParen {
            self.parse_assignments(line, true)?
        } else {
            HashMap::new()
        };

        Ok(ModelDef {
            name,
            model_type,
            params,
            line,
        })
    }

    fn parse_curve_def(&mut self, line: usize) -> Result<CurveDef> {
        let model = self.expect(TokenKind::Identifier)?.text;

        let mut values = Vec::new();
        while !self.at_line_end() {
            values.push(self.expect_number()?);
        }

        if values.len() % 2 != 0 {
            return Err(ConvlossError::parse(
                line,
                "curve needs current/energy pairs",
            ));
        }

        let points = values.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        Ok(CurveDef {
            model,
            points,
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(input: &str) -> Result<DescriptionAst> {
        super::super::parse(input)
    }

    #[test]
    fn test_parse_params() {
        let ast = parse(".param V1 100\n.param fp 21.6k\n").unwrap();
        assert_eq!(ast.params.len(), 2);
        assert_eq!(ast.params[0].name, "v1");
        assert_relative_eq!(ast.params[1].value, 21_600.0);
        assert_eq!(ast.params[1].line, 2);
    }

    #[test]
    fn test_parse_current() {
        let ast = parse(".current linear phase=-0.3").unwrap();
        let current = ast.current.unwrap();
        assert_eq!(current.mode, CurrentMode::Linear);
        assert_relative_eq!(current.params["phase"], -0.3);

        let ast = parse(".current pulse crest=2").unwrap();
        assert_eq!(ast.current.unwrap().mode, CurrentMode::NonLinear);
    }

    #[test]
    fn test_parse_model_and_curve() {
        let input = "\
.model FAST D (a=33.05 b=-48.68 c=19.13 knee=1.3 vth=0.8 qrr=300n)
.curve Q1 0 0 10 1.5 20 3.2
.use diode FAST
";
        let ast = parse(input).unwrap();
        let model = &ast.models["FAST"];
        assert_eq!(model.model_type, ModelType::Diode);
        assert_relative_eq!(model.params["qrr"], 300e-9);
        assert_eq!(ast.curves["Q1"].points, vec![(0.0, 0.0), (10.0, 1.5), (20.0, 3.2)]);
        assert_eq!(ast.assignments[0].family, DeviceFamily::Diode);
    }

    #[test]
    fn test_parse_with_comments() {
        let input = "# operating point\n\n.param ief 4.25 ; rms\n";
        let ast = parse(input).unwrap();
        assert_eq!(ast.params.len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("v1 100").is_err());
        assert!(parse(".frequency 60").is_err());
        assert!(parse(".param v1 100 200").is_err());
        assert!(parse(".curve Q1 0 0 10").is_err());
        assert!(parse(".model Q1 SW (a=1").is_err());
        assert!(matches!(
            parse(".model Q1 SW\n.model Q1 SW"),
            Err(ConvlossError::DuplicateModel { .. })
        ));
        assert!(parse(".param v1 1\n.param V1 2").is_err());
    }
}
