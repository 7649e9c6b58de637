use crate::ast::{Expr, Literal, Param, Stmt, UnaryOp};

/// Renders syntax trees in a parenthesized prefix form, one top-level
/// statement per line.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal { value, .. } => match value {
                Literal::Bool(b) => b.to_string(),

                Literal::Str(s) => format!("\"{}\"", s),

                Literal::Integer(n) => n.to_string(),

                Literal::Float(n) => {
                    if n.fract() == 0.0 && n.is_finite() {
                        // 3.0 stays 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::List { elements, .. } => Self::form("list", elements.iter().map(Self::print)),

            Expr::Tuple { elements, .. } => Self::form("tuple", elements.iter().map(Self::print)),

            Expr::Dict { pairs, .. } => Self::form(
                "dict",
                pairs
                    .iter()
                    .map(|(k, v)| format!("({} {})", Self::print(k), Self::print(v))),
            ),

            Expr::Variable { name, .. } => name.clone(),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { op, operand, .. } => {
                let symbol: &str = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Pos => "+",
                };

                format!("({} {})", symbol, Self::print(operand))
            }

            Expr::Binary {
                left, op, right, ..
            } => format!("({} {} {})", op, Self::print(left), Self::print(right)),

            // ── postfix ─────────────────────────────────────────────────
            Expr::Attribute { object, name, .. } => {
                format!("(. {} {})", Self::print(object), name)
            }

            Expr::Index {
                object, indices, ..
            } => Self::form(
                "index",
                std::iter::once(Self::print(object)).chain(indices.iter().map(Self::print)),
            ),

            Expr::Slice {
                start, stop, step, ..
            } => {
                let part = |e: &Option<Box<Expr>>| match e {
                    Some(e) => Self::print(e),
                    None => "_".to_owned(),
                };

                format!("(slice {} {} {})", part(start), part(stop), part(step))
            }

            Expr::Call {
                callee,
                args,
                kwargs,
                ..
            } => Self::form(
                "call",
                std::iter::once(Self::print(callee))
                    .chain(args.iter().map(Self::print))
                    .chain(
                        kwargs
                            .iter()
                            .map(|(name, value)| format!("(= {} {})", name, Self::print(value))),
                    ),
            ),

            Expr::Super { .. } => "super".to_owned(),

            Expr::Network(def) => format!(
                "(network (input {}) (layers {}) (optimizer {}) (loss {}))",
                Self::print(&def.input),
                Self::print(&def.layers),
                Self::print(&def.optimizer),
                Self::print(&def.loss)
            ),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print(expr),

            Stmt::Print { values, .. } => Self::form("print", values.iter().map(Self::print)),

            Stmt::Assign { name, value, .. } => format!("(= {} {})", name, Self::print(value)),

            Stmt::AttributeAssign {
                object,
                name,
                value,
                ..
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name,
                Self::print(value)
            ),

            Stmt::IndexAssign {
                object,
                indices,
                value,
                ..
            } => format!(
                "(= {} {})",
                Self::form(
                    "index",
                    std::iter::once(Self::print(object)).chain(indices.iter().map(Self::print)),
                ),
                Self::print(value)
            ),

            Stmt::Block(body) => Self::block(body),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(other) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::block(then_branch),
                    Self::print_stmt(other)
                ),
                None => format!("(if {} {})", Self::print(condition), Self::block(then_branch)),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", Self::print(condition), Self::block(body))
            }

            Stmt::For {
                variable,
                iterable,
                body,
                ..
            } => format!(
                "(for {} {} {})",
                variable,
                Self::print(iterable),
                Self::block(body)
            ),

            Stmt::Function(def) => format!(
                "(fun {} ({}) {})",
                def.name,
                Self::params(&def.params),
                Self::block(&def.body)
            ),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".to_owned(),
            },

            Stmt::Break { .. } => "(break)".to_owned(),

            Stmt::Continue { .. } => "(continue)".to_owned(),

            Stmt::Class(def) => {
                let mut s = format!("(class {}", def.name);

                if !def.parents.is_empty() {
                    s.push(' ');
                    s.push_str(&Self::form("inherits", def.parents.iter().map(Self::print)));
                }

                for method in &def.methods {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(&Stmt::Function(method.clone())));
                }

                s.push(')');
                s
            }

            Stmt::Throw { value, .. } => format!("(throw {})", Self::print(value)),

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                let mut s = format!("(try {}", Self::block(body));

                if let Some(clause) = catch {
                    s.push_str(&format!(" (catch {} {})", clause.variable, Self::block(&clause.body)));
                }

                if let Some(finally) = finally {
                    s.push_str(&format!(" (finally {})", Self::block(finally)));
                }

                s.push(')');
                s
            }

            Stmt::With { context, body, .. } => {
                format!("(with {} {})", Self::print(context), Self::block(body))
            }

            Stmt::Import { module, alias, .. } => format!("(import \"{}\" {})", module, alias),
        }
    }

    fn block(body: &[Stmt]) -> String {
        Self::form("block", body.iter().map(Self::print_stmt))
    }

    fn params(params: &[Param]) -> String {
        params
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("(= {} {})", p.name, Self::print(default)),
                None => p.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn form(head: &str, parts: impl Iterator<Item = String>) -> String {
        let mut s = format!("({}", head);
        for part in parts {
            s.push(' ');
            s.push_str(&part);
        }
        s.push(')');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn render(source: &str) -> Vec<String> {
        parse_source(source)
            .unwrap()
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    #[test]
    fn precedence_is_visible_in_prefix_form() {
        assert_eq!(render("1 + 2 * -3"), ["(+ 1 (* 2 (- 3)))"]);
    }

    #[test]
    fn calls_show_keyword_arguments() {
        assert_eq!(render("f(1, b=2.0)"), ["(call f 1 (= b 2.0))"]);
    }

    #[test]
    fn functions_print_defaults() {
        assert_eq!(
            render("fun f(a, b=2) { return a + b }"),
            ["(fun f (a (= b 2)) (block (return (+ a b))))"]
        );
    }

    #[test]
    fn classes_print_parents_and_methods() {
        assert_eq!(
            render("class B inherits A { fun m(self) { return 1 } }"),
            ["(class B (inherits A) (fun m (self) (block (return 1))))"]
        );
    }
}
