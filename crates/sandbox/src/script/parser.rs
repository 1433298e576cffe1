//! Source text to syntax tree.
//!
//! Parsing happens in two passes. A bracket pre-scan rejects sources nested
//! deeper than the configured limit before pest ever sees them, then the pest
//! parse tree is folded into [`Stmt`]s while tracking expression depth.

use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;

use super::ast::{BinaryOp, CompareOp, Expr, Stmt, UnaryOp};
use crate::fault::EvalFault;

#[derive(pest_derive::Parser)]
#[grammar = "script/grammar.pest"]
struct ScriptGrammar;

/// Deepest expression tree the interpreter will walk.
pub const MAX_EXPR_DEPTH: usize = 256;

type Built = (Expr, usize);

#[derive(Debug, Clone)]
pub struct ProgramParser {
    max_nesting: usize,
}

impl ProgramParser {
    pub fn new(max_nesting: usize) -> Self {
        Self { max_nesting }
    }

    pub fn parse(&self, source: &str) -> Result<Vec<Stmt>, EvalFault> {
        check_nesting(source, self.max_nesting)?;

        let mut pairs = ScriptGrammar::parse(Rule::program, source).map_err(|e| {
            let (line, column) = match e.line_col {
                LineColLocation::Pos(pos) => pos,
                LineColLocation::Span(start, _) => start,
            };
            EvalFault::syntax("invalid syntax", line, column)
        })?;

        let program = pairs
            .next()
            .ok_or_else(|| EvalFault::internal("parser produced no program"))?;

        let mut statements = Vec::new();
        for pair in program.into_inner() {
            if pair.as_rule() != Rule::EOI {
                statements.push(build_stmt(pair)?);
            }
        }
        Ok(statements)
    }
}

/// Reject bracket nesting beyond `max_depth`, ignoring strings and comments.
///
/// Line breaks are `\n`, `\r\n` or a bare `\r`, as in the grammar. An escaped
/// line break continues the string it appears in.
pub fn check_nesting(source: &str, max_depth: usize) -> Result<(), EvalFault> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut in_comment = false;
    let (mut line, mut column) = (1, 0);
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            // An escape consumes only the `\r` of a `\r\n` pair.
            if c == '\r' && !escaped && chars.peek() == Some(&'\n') {
                chars.next();
            }
            line += 1;
            column = 0;
            if escaped {
                escaped = false;
                continue;
            }
            in_comment = false;
            // Unterminated strings end at the line break; the parser reports them.
            quote = None;
            continue;
        }
        column += 1;

        if in_comment {
            continue;
        }
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '#' => in_comment = true,
            '\'' | '"' => quote = Some(c),
            '(' | '[' => {
                depth += 1;
                if depth > max_depth {
                    return Err(EvalFault::syntax("too many nested parentheses", line, column));
                }
            }
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Children of `pair` with keyword tokens dropped.
fn operands(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| {
        !matches!(
            p.as_rule(),
            Rule::kw_raise | Rule::kw_assert | Rule::kw_pass | Rule::kw_del
                | Rule::kw_or | Rule::kw_and | Rule::kw_not
        )
    })
}

fn next_pair<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    context: &str,
) -> Result<Pair<'i, Rule>, EvalFault> {
    pairs
        .next()
        .ok_or_else(|| EvalFault::internal(format!("malformed {}", context)))
}

fn build_stmt(pair: Pair<'_, Rule>) -> Result<Stmt, EvalFault> {
    let rule = pair.as_rule();
    let mut inner = operands(pair);
    let stmt = match rule {
        Rule::raise_stmt => Stmt::Raise(inner.next().map(build_top).transpose()?),
        Rule::assert_stmt => Stmt::Assert {
            test: build_top(next_pair(&mut inner, "assert")?)?,
            message: inner.next().map(build_top).transpose()?,
        },
        Rule::pass_stmt => Stmt::Pass,
        Rule::del_stmt => Stmt::Delete(inner.map(|p| p.as_str().to_string()).collect()),
        Rule::aug_assign => {
            let name = next_pair(&mut inner, "assignment")?.as_str().to_string();
            let op = match next_pair(&mut inner, "assignment")?.as_str() {
                "+=" => BinaryOp::Add,
                "-=" => BinaryOp::Sub,
                "*=" => BinaryOp::Mul,
                "/=" => BinaryOp::Div,
                "//=" => BinaryOp::FloorDiv,
                _ => BinaryOp::Mod,
            };
            let value = build_top(next_pair(&mut inner, "assignment")?)?;
            Stmt::AugAssign { name, op, value }
        }
        Rule::assign => Stmt::Assign {
            name: next_pair(&mut inner, "assignment")?.as_str().to_string(),
            value: build_top(next_pair(&mut inner, "assignment")?)?,
        },
        Rule::expr_stmt => Stmt::Expr(build_top(next_pair(&mut inner, "expression")?)?),
        other => return Err(EvalFault::internal(format!("unexpected statement {:?}", other))),
    };
    Ok(stmt)
}

fn build_top(pair: Pair<'_, Rule>) -> Result<Expr, EvalFault> {
    build_expr(pair).map(|(expr, _)| expr)
}

/// Wrap a node one level above its deepest child.
fn nest(expr: Expr, child_depth: usize) -> Result<Built, EvalFault> {
    let depth = child_depth + 1;
    if depth > MAX_EXPR_DEPTH {
        return Err(EvalFault::recursion(
            "maximum expression depth exceeded while parsing",
        ));
    }
    Ok((expr, depth))
}

/// Step through rules that only wrap a single operand.
///
/// A bracketed operand sits under the whole precedence chain, so walking the
/// chain in a loop keeps tree building at one or two frames per bracket.
fn unwrap_chain(mut pair: Pair<'_, Rule>) -> Pair<'_, Rule> {
    loop {
        let wrapper = matches!(
            pair.as_rule(),
            Rule::expr
                | Rule::or_expr
                | Rule::and_expr
                | Rule::not_expr
                | Rule::comparison
                | Rule::sum
                | Rule::term
                | Rule::factor
                | Rule::power
                | Rule::pow_operand
                | Rule::postfix
        );
        if !wrapper {
            return pair;
        }
        let mut inner = pair.clone().into_inner();
        match (inner.next(), inner.next()) {
            (Some(only), None) => pair = only,
            _ => return pair,
        }
    }
}

fn build_expr(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let pair = unwrap_chain(pair);
    match pair.as_rule() {
        Rule::or_expr | Rule::and_expr => build_boolean(pair),
        Rule::not_expr => build_not(pair),
        Rule::comparison => build_comparison(pair),
        Rule::sum | Rule::term => build_arithmetic(pair),
        Rule::factor | Rule::pow_operand => build_prefixed(pair),
        Rule::power => build_power(pair),
        Rule::postfix => build_postfix(pair),
        Rule::list => {
            let (items, depth) = build_sequence(pair)?;
            nest(Expr::List(items), depth)
        }
        _ => build_literal(pair),
    }
}

fn build_boolean(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let is_or = pair.as_rule() == Rule::or_expr;
    let mut inner = operands(pair);
    let mut acc = build_expr(next_pair(&mut inner, "boolean operation")?)?;
    for next in inner {
        let (right, right_depth) = build_expr(next)?;
        let (left, left_depth) = acc;
        let expr = if is_or {
            Expr::Or(Box::new(left), Box::new(right))
        } else {
            Expr::And(Box::new(left), Box::new(right))
        };
        acc = nest(expr, left_depth.max(right_depth))?;
    }
    Ok(acc)
}

fn build_not(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let mut nots = 0;
    let mut operand = None;
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::kw_not => nots += 1,
            _ => operand = Some(build_expr(child)?),
        }
    }
    let mut acc = operand.ok_or_else(|| EvalFault::internal("malformed not"))?;
    for _ in 0..nots {
        let (expr, depth) = acc;
        acc = nest(Expr::Not(Box::new(expr)), depth)?;
    }
    Ok(acc)
}

fn build_comparison(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let mut inner = pair.into_inner();
    let (left, mut depth) = build_expr(next_pair(&mut inner, "comparison")?)?;
    let mut links = Vec::new();
    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            _ => CompareOp::In,
        };
        let (right, right_depth) = build_expr(next_pair(&mut inner, "comparison")?)?;
        depth = depth.max(right_depth);
        links.push((op, right));
    }
    if links.is_empty() {
        return Ok((left, depth));
    }
    nest(
        Expr::Compare {
            left: Box::new(left),
            links,
        },
        depth,
    )
}

fn build_arithmetic(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let mut inner = pair.into_inner();
    let mut acc = build_expr(next_pair(&mut inner, "arithmetic")?)?;
    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "//" => BinaryOp::FloorDiv,
            _ => BinaryOp::Mod,
        };
        let (right, right_depth) = build_expr(next_pair(&mut inner, "arithmetic")?)?;
        let (left, left_depth) = acc;
        acc = nest(
            Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            left_depth.max(right_depth),
        )?;
    }
    Ok(acc)
}

fn build_power(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let mut operands = Vec::new();
    for child in pair.into_inner() {
        if child.as_rule() != Rule::pow_op {
            operands.push(build_expr(child)?);
        }
    }
    // `**` binds right to left.
    let mut acc = operands
        .pop()
        .ok_or_else(|| EvalFault::internal("malformed power"))?;
    while let Some((left, left_depth)) = operands.pop() {
        let (right, right_depth) = acc;
        acc = nest(
            Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(left),
                right: Box::new(right),
            },
            left_depth.max(right_depth),
        )?;
    }
    Ok(acc)
}

fn build_postfix(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let mut inner = pair.into_inner();
    let mut acc = build_expr(next_pair(&mut inner, "primary")?)?;
    for suffix in inner {
        let (target, target_depth) = acc;
        acc = match suffix.as_rule() {
            Rule::call => {
                let (args, depth) = build_sequence(suffix)?;
                nest(
                    Expr::Call {
                        callee: Box::new(target),
                        args,
                    },
                    target_depth.max(depth),
                )?
            }
            _ => {
                let (index, index_depth) =
                    build_expr(next_pair(&mut suffix.into_inner(), "subscript")?)?;
                nest(
                    Expr::Index {
                        target: Box::new(target),
                        index: Box::new(index),
                    },
                    target_depth.max(index_depth),
                )?
            }
        };
    }
    Ok(acc)
}

fn build_literal(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let expr = match pair.as_rule() {
        Rule::integer => Expr::Int(pair.as_str().parse::<i64>().map_err(|_| {
            EvalFault::overflow(format!("integer literal {} is too large", pair.as_str()))
        })?),
        Rule::float => Expr::Float(
            pair.as_str()
                .parse::<f64>()
                .map_err(|e| EvalFault::value_error(format!("invalid float literal: {}", e)))?,
        ),
        Rule::string => {
            let inner = next_pair(&mut pair.into_inner(), "string")?;
            Expr::Str(unescape(inner.as_str()))
        }
        Rule::kw_true => Expr::Bool(true),
        Rule::kw_false => Expr::Bool(false),
        Rule::kw_none => Expr::None,
        Rule::identifier => Expr::Name(pair.as_str().to_string()),
        other => {
            return Err(EvalFault::internal(format!(
                "unexpected expression {:?}",
                other
            )))
        }
    };
    Ok((expr, 1))
}

/// `unary_op* operand`, applied innermost first.
fn build_prefixed(pair: Pair<'_, Rule>) -> Result<Built, EvalFault> {
    let mut ops = Vec::new();
    let mut operand = None;
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::unary_op => ops.push(if child.as_str() == "-" {
                UnaryOp::Neg
            } else {
                UnaryOp::Pos
            }),
            _ => operand = Some(build_expr(child)?),
        }
    }
    let mut acc = operand.ok_or_else(|| EvalFault::internal("malformed unary operation"))?;
    for op in ops.into_iter().rev() {
        let (expr, depth) = acc;
        acc = nest(
            Expr::Unary {
                op,
                operand: Box::new(expr),
            },
            depth,
        )?;
    }
    Ok(acc)
}

/// Comma-separated expressions of a call or list literal.
fn build_sequence(pair: Pair<'_, Rule>) -> Result<(Vec<Expr>, usize), EvalFault> {
    let mut items = Vec::new();
    let mut depth = 0;
    for child in pair.into_inner() {
        let (item, item_depth) = build_expr(child)?;
        depth = depth.max(item_depth);
        items.push(item);
    }
    Ok((items, depth))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Line continuation inside a literal.
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Vec<Stmt>, EvalFault> {
        ProgramParser::new(64).parse(source)
    }

    fn parse_expr(source: &str) -> Expr {
        match parse(source).unwrap().pop() {
            Some(Stmt::Expr(expr)) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn int(i: i64) -> Box<Expr> {
        Box::new(Expr::Int(i))
    }

    #[test]
    fn test_assignment_and_precedence() {
        let statements = parse("x = 1 + 2 * 3").unwrap();
        assert_eq!(
            statements,
            vec![Stmt::Assign {
                name: "x".into(),
                value: Expr::Binary {
                    op: BinaryOp::Add,
                    left: int(1),
                    right: Box::new(Expr::Binary {
                        op: BinaryOp::Mul,
                        left: int(2),
                        right: int(3),
                    }),
                },
            }]
        );
    }

    #[test]
    fn test_power_is_right_associative_and_binds_tighter_than_negation() {
        assert_eq!(
            parse_expr("-2 ** 3 ** 2"),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: int(2),
                    right: Box::new(Expr::Binary {
                        op: BinaryOp::Pow,
                        left: int(3),
                        right: int(2),
                    }),
                }),
            }
        );
    }

    #[test]
    fn test_raise_with_call() {
        let statements = parse("raise ValueError('boom')").unwrap();
        assert_eq!(
            statements,
            vec![Stmt::Raise(Some(Expr::Call {
                callee: Box::new(Expr::Name("ValueError".into())),
                args: vec![Expr::Str("boom".into())],
            }))]
        );
    }

    #[test]
    fn test_separators_comments_and_blank_lines() {
        let source = "# setup\n\nx = 1; y = 2\n\ndel x, y  # cleanup\npass\n";
        let statements = parse(source).unwrap();
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[2], Stmt::Delete(vec!["x".into(), "y".into()]));
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_comparison_chain_and_keywords() {
        match parse_expr("not 1 < x <= 3 and 'a' in s") {
            Expr::And(left, _) => match *left {
                Expr::Not(inner) => match *inner {
                    Expr::Compare { links, .. } => {
                        let ops: Vec<_> = links.iter().map(|(op, _)| *op).collect();
                        assert_eq!(ops, vec![CompareOp::Lt, CompareOp::Le]);
                    }
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
        // Keyword prefixes remain usable as names.
        assert_eq!(parse_expr("notice"), Expr::Name("notice".into()));
        assert_eq!(parse_expr("index"), Expr::Name("index".into()));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse_expr(r#""tab\tquote\" \q""#),
            Expr::Str("tab\tquote\" \\q".into())
        );
    }

    #[test]
    fn test_syntax_errors_carry_location() {
        let err = parse("x = 1\ny = = 2").unwrap_err();
        assert_eq!(err.kind, "SyntaxError");
        assert!(err.message.starts_with("invalid syntax (line 2"), "{}", err.message);

        for source in ["import os", "def f(): pass", "x = ", "1 +", "'unterminated"] {
            assert_eq!(parse(source).unwrap_err().kind, "SyntaxError", "{}", source);
        }
    }

    #[test]
    fn test_nesting_limit() {
        let parser = ProgramParser::new(16);
        let deep = format!("{}1{}", "(".repeat(17), ")".repeat(17));
        let err = parser.parse(&deep).unwrap_err();
        assert_eq!(err.kind, "SyntaxError");
        assert!(err.message.contains("too many nested parentheses"));

        let ok = format!("{}1{}", "(".repeat(16), ")".repeat(16));
        assert_eq!(parser.parse(&ok).unwrap(), vec![Stmt::Expr(Expr::Int(1))]);

        // Brackets inside strings and comments do not count.
        let quoted = format!("x = '{}'  # {}", "(".repeat(100), "[".repeat(100));
        assert!(parser.parse(&quoted).is_ok());
    }

    #[test]
    fn test_carriage_return_ends_comment_for_nesting() {
        for line_end in ["\r", "\r\n", "\n"] {
            let source = format!("# note{}x = {}1{}", line_end, "(".repeat(65), ")".repeat(65));
            let err = check_nesting(&source, 64).unwrap_err();
            assert!(err.message.contains("too many nested parentheses"), "{:?}", line_end);
            assert!(err.message.contains("(line 2"), "{}", err.message);
        }
        let source = format!("#\r{}1{}", "(".repeat(64), ")".repeat(64));
        assert!(check_nesting(&source, 64).is_ok());
    }

    #[test]
    fn test_escaped_line_break_keeps_string_open() {
        // The quote after the continuation closes the string, so the
        // brackets that follow are code.
        let source = format!("x = 'a\\\r' + {}1{}", "(".repeat(65), ")".repeat(65));
        assert!(check_nesting(&source, 64).is_err());
        let source = format!("x = 'a\\\n' + {}1{}", "(".repeat(65), ")".repeat(65));
        assert!(check_nesting(&source, 64).is_err());
    }

    #[test]
    fn test_expression_depth_limit() {
        let long_chain = vec!["1"; MAX_EXPR_DEPTH + 2].join(" + ");
        let err = parse(&long_chain).unwrap_err();
        assert_eq!(err.kind, "RecursionError");

        let short_chain = vec!["1"; 100].join(" + ");
        assert!(parse(&short_chain).is_ok());
    }

    #[test]
    fn test_integer_literal_overflow() {
        let err = parse("x = 99999999999999999999").unwrap_err();
        assert_eq!(err.kind, "OverflowError");
    }
}
