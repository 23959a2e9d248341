use crate::expr::{BinaryOp, Expr, FunctionDecl, LiteralValue, LogicalOp, UnaryOp};
use crate::stmt::Stmt;

/// Renders statements and expressions in a parenthesised prefix form,
/// e.g. `(print (+ 1.0 (group (* 2.0 3.0))))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "null".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 → "3.0"
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary {
                operator, right, ..
            } => format!("({} {})", unary_symbol(*operator), Self::print(right)),

            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => format!(
                "({} {} {})",
                binary_symbol(*operator),
                Self::print(left),
                Self::print(right)
            ),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let symbol: &str = match operator {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };

                format!("({} {} {})", symbol, Self::print(left), Self::print(right))
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(? {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.name.clone(),

            Expr::This { .. } => "this".into(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.name, Self::print(value))
            }

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.name),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.name,
                Self::print(value)
            ),

            Expr::Function(decl) => Self::print_function(decl),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Let { name, initializer } => match initializer {
                Some(expr) => format!("(let {} {})", name.name, Self::print(expr)),
                None => format!("(let {})", name.name),
            },

            Stmt::Block(statements) => Self::list("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => format!(
                "(for {} {} {} {})",
                Self::print_stmt(initializer),
                condition.as_ref().map_or_else(|| "_".to_string(), Self::print),
                increment.as_ref().map_or_else(|| "_".to_string(), Self::print),
                Self::print_stmt(body)
            ),

            Stmt::Break { .. } => "(break)".into(),

            Stmt::Continue { .. } => "(continue)".into(),

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", Self::print(expr)),
                None => "(return)".into(),
            },

            Stmt::Struct { name, methods } => {
                let mut s = format!("(struct {}", name.name);
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::print_function(method));
                }
                s.push(')');
                s
            }
        }
    }

    fn print_function(decl: &FunctionDecl) -> String {
        let name: &str = decl.name.as_ref().map_or("anonymous", |n| n.name.as_str());
        let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();

        let mut s = format!("(fn {} ({})", name, params.join(" "));
        for stmt in &decl.body {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn list(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}

fn unary_symbol(operator: UnaryOp) -> &'static str {
    match operator {
        UnaryOp::Bang => "!",
        UnaryOp::Minus => "-",
        UnaryOp::Plus => "+",
    }
}

fn binary_symbol(operator: BinaryOp) -> &'static str {
    match operator {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Star => "*",
        BinaryOp::Slash => "/",
        BinaryOp::Greater => ">",
        BinaryOp::GreaterEqual => ">=",
        BinaryOp::Less => "<",
        BinaryOp::LessEqual => "<=",
        BinaryOp::EqualEqual => "==",
        BinaryOp::BangEqual => "!=",
    }
}
