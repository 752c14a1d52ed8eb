//! The sandbox interpreter — walks script AST nodes and produces Values.
//!
//! One [`Interpreter`] instance is scoped to exactly one document
//! evaluation. Its only source of external capability is the binding
//! environment handed to [`Interpreter::new`]; it has no access to ambient
//! process state, the filesystem, or the network, and it never turns text
//! into executable code.

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use mdsafe_types::ast::*;
use mdsafe_types::{Bindings, Components, Module, OutputElement, OutputNode, Value};

/// The tree-walking interpreter for the embedded-script subset.
pub struct Interpreter<'a> {
    /// External capability: import-source → exposed values.
    bindings: &'a Bindings,
    /// Variable scope, local to this session.
    env: Environment,
    /// Monotonic counter for synthesized expression-result bindings.
    expr_counter: u64,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter for one document evaluation.
    ///
    /// Registered components are defined in the root scope under their tag
    /// names, so tag expressions and user declarations can reference them
    /// the same way imported values are referenced.
    pub fn new(bindings: &'a Bindings, components: &Components) -> Self {
        let mut env = Environment::new();
        for (name, component) in components {
            env.define(name, Value::Component(component.clone()));
        }
        Self {
            bindings,
            env,
            expr_counter: 0,
        }
    }

    /// Look up a name in the session scope.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.env.get(name)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Program execution
    // ══════════════════════════════════════════════════════════════════════

    /// Execute a hoisted statement list against the session scope.
    ///
    /// Declarations become visible to every expression evaluated later in
    /// the same session. Export declarations are rejected — the hoister
    /// must rewrite them to plain declarations first.
    pub fn evaluate_program(&mut self, stmts: &[Stmt]) -> EvalResult<()> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Import(decl) => self.exec_import(decl),
            Stmt::Export(_) => Err(EvalError::UnsupportedConstruct(
                "export declaration reached the interpreter; exports must be hoisted to plain \
                 declarations before evaluation"
                    .to_string(),
            )),
            Stmt::Var(decl) => {
                let value = self.eval_expr(&decl.init)?;
                self.env.define(&decl.name.name, value);
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
        }
    }

    fn exec_import(&mut self, decl: &ImportDecl) -> EvalResult<()> {
        let source = &decl.source;
        let module = self.bindings.get(source).ok_or_else(|| {
            EvalError::UnboundIdentifier(format!(
                "module '{source}' is not provided by the binding environment"
            ))
        })?;

        for specifier in &decl.specifiers {
            match specifier {
                ImportSpecifier::Default(local) => {
                    let value = match module {
                        Module::Value(v) => v.clone(),
                        Module::Named(exports) => exports.get("default").cloned().ok_or_else(
                            || {
                                EvalError::UnboundIdentifier(format!(
                                    "module '{source}' has no default export"
                                ))
                            },
                        )?,
                    };
                    self.env.define(&local.name, value);
                }
                ImportSpecifier::Named { imported, local } => {
                    let value = match module {
                        Module::Named(exports) => {
                            exports.get(&imported.name).cloned().ok_or_else(|| {
                                EvalError::UnboundIdentifier(format!(
                                    "module '{source}' has no export '{}'",
                                    imported.name
                                ))
                            })?
                        }
                        Module::Value(_) => {
                            return Err(EvalError::UnboundIdentifier(format!(
                                "module '{source}' exposes a single value, not named exports"
                            )));
                        }
                    };
                    self.env.define(&local.name, value);
                }
                ImportSpecifier::Namespace(local) => {
                    let value = match module {
                        Module::Named(exports) => Value::Object(exports.clone()),
                        Module::Value(v) => {
                            let mut ns = std::collections::BTreeMap::new();
                            ns.insert("default".to_string(), v.clone());
                            Value::Object(ns)
                        }
                    };
                    self.env.define(&local.name, value);
                }
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate a single expression and return its value.
    ///
    /// The result is routed through a synthesized, uniquely named binding
    /// — the interpreter's own declaration mechanism — so repeated calls
    /// within one session can never collide with user-declared names.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.expr_counter += 1;
        let name = format!("__mdsafe_expr_value_{}", self.expr_counter);
        let decl = VarDecl {
            kind: DeclKind::Const,
            name: Ident::new(name.clone(), expr.span),
            init: expr.clone(),
            span: expr.span,
        };
        self.exec_stmt(&Stmt::Var(decl))?;
        self.env.get(&name).cloned().ok_or_else(|| {
            EvalError::RuntimeFault(format!("expression result binding '{name}' missing"))
        })
    }

    fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::NullLit => Ok(Value::Null),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),

            ExprKind::TemplateLit(parts) => self.eval_template(parts),
            ExprKind::ArrayLit(elems) => self.eval_array_literal(elems),
            ExprKind::ObjectLit(entries) => self.eval_object_literal(entries),

            ExprKind::Identifier(name) => self.eval_identifier(name),
            ExprKind::Member { object, property } => self.eval_member(object, property),
            ExprKind::Call { callee, args } => self.eval_call(callee, args),

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right),
            ExprKind::Logical { left, op, right } => self.eval_logical(left, *op, right),
            ExprKind::Conditional {
                cond,
                consequent,
                alternate,
            } => {
                let c = self.eval_expr(cond)?;
                if c.is_truthy() {
                    self.eval_expr(consequent)
                } else {
                    self.eval_expr(alternate)
                }
            }

            ExprKind::Jsx(element) => {
                let node = self.eval_jsx(element)?;
                Ok(Value::Node(Box::new(node)))
            }

            ExprKind::Unsupported(what) => {
                Err(EvalError::UnsupportedConstruct(what.clone()))
            }
        }
    }

    // ── Literals ──────────────────────────────────────────────────────────

    fn eval_template(&mut self, parts: &[StringPart]) -> EvalResult<Value> {
        let mut result = String::new();
        for part in parts {
            match part {
                StringPart::Literal(s) => result.push_str(s),
                StringPart::Expr(expr) => {
                    let val = self.eval_expr(expr)?;
                    result.push_str(&val.to_display_string());
                }
            }
        }
        Ok(Value::String(result))
    }

    fn eval_array_literal(&mut self, elems: &[Expr]) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(elems.len());
        for elem in elems {
            values.push(self.eval_expr(elem)?);
        }
        Ok(Value::List(values))
    }

    fn eval_object_literal(&mut self, entries: &[ObjectEntry]) -> EvalResult<Value> {
        let mut fields = std::collections::BTreeMap::new();
        for entry in entries {
            let value = self.eval_expr(&entry.value)?;
            fields.insert(entry.key.clone(), value);
        }
        Ok(Value::Object(fields))
    }

    // ── Identifiers, access, calls ────────────────────────────────────────

    fn eval_identifier(&self, name: &str) -> EvalResult<Value> {
        self.env.get(name).cloned().ok_or_else(|| {
            EvalError::UnboundIdentifier(format!("identifier '{name}' is not in scope"))
        })
    }

    fn eval_member(&mut self, object: &Expr, property: &MemberProp) -> EvalResult<Value> {
        let obj = self.eval_expr(object)?;
        match property {
            MemberProp::Name(ident) => Self::named_member(&obj, &ident.name),
            MemberProp::Computed(key_expr) => {
                let key = self.eval_expr(key_expr)?;
                // Numeric keys index lists and strings.
                if let Value::Number(idx) = key {
                    Self::index_value(&obj, idx)
                } else {
                    Self::named_member(&obj, &key.to_display_string())
                }
            }
        }
    }

    fn named_member(obj: &Value, key: &str) -> EvalResult<Value> {
        match obj {
            Value::Object(fields) => Ok(fields.get(key).cloned().unwrap_or(Value::Null)),
            Value::String(s) if key == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::List(items) if key == "length" => Ok(Value::Number(items.len() as f64)),
            Value::Null => Err(EvalError::RuntimeFault(format!(
                "cannot read property '{key}' of null"
            ))),
            _ => Err(EvalError::RuntimeFault(format!(
                "cannot read property '{key}' of {}",
                obj.type_name()
            ))),
        }
    }

    fn index_value(obj: &Value, idx: f64) -> EvalResult<Value> {
        if idx.fract() != 0.0 || idx < 0.0 {
            return Ok(Value::Null);
        }
        let i = idx as usize;
        match obj {
            Value::List(items) => Ok(items.get(i).cloned().unwrap_or(Value::Null)),
            Value::String(s) => Ok(s
                .chars()
                .nth(i)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null)),
            Value::Null => Err(EvalError::RuntimeFault(format!(
                "cannot read index {i} of null"
            ))),
            _ => Err(EvalError::RuntimeFault(format!(
                "cannot read index {i} of {}",
                obj.type_name()
            ))),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        let target = self.eval_expr(callee)?;
        let mut arg_vals = Vec::with_capacity(args.len());
        for arg in args {
            arg_vals.push(self.eval_expr(arg)?);
        }
        match target {
            Value::Function(f) => f.call(arg_vals).map_err(EvalError::RuntimeFault),
            other => Err(EvalError::RuntimeFault(format!(
                "cannot call a {} value",
                other.type_name()
            ))),
        }
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let val = self.eval_expr(operand)?;
        match op {
            UnaryOp::Neg => {
                if let Value::Number(n) = val {
                    Ok(Value::Number(-n))
                } else {
                    Err(EvalError::RuntimeFault(format!(
                        "cannot negate {}",
                        val.type_name()
                    )))
                }
            }
            UnaryOp::Not => Ok(Value::Bool(!val.is_truthy())),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        let lv = self.eval_expr(left)?;
        let rv = self.eval_expr(right)?;

        match op {
            BinOp::Add => Self::eval_add(&lv, &rv),
            BinOp::Sub => Self::eval_arith(&lv, &rv, |a, b| a - b, "-"),
            BinOp::Mul => Self::eval_arith(&lv, &rv, |a, b| a * b, "*"),
            BinOp::Div => {
                if let (Value::Number(a), Value::Number(b)) = (&lv, &rv) {
                    if *b == 0.0 {
                        return Err(EvalError::RuntimeFault("division by zero".into()));
                    }
                    Ok(Value::Number(a / b))
                } else {
                    Err(EvalError::RuntimeFault(format!(
                        "cannot divide {} by {}",
                        lv.type_name(),
                        rv.type_name()
                    )))
                }
            }
            BinOp::Mod => {
                if let (Value::Number(a), Value::Number(b)) = (&lv, &rv) {
                    if *b == 0.0 {
                        return Err(EvalError::RuntimeFault("modulo by zero".into()));
                    }
                    Ok(Value::Number(a % b))
                } else {
                    Err(EvalError::RuntimeFault(format!(
                        "cannot modulo {} by {}",
                        lv.type_name(),
                        rv.type_name()
                    )))
                }
            }
            // Both equality forms compare structurally; the sandbox has no
            // coercing equality.
            BinOp::Eq | BinOp::StrictEq => Ok(Value::Bool(lv == rv)),
            BinOp::NotEq | BinOp::StrictNotEq => Ok(Value::Bool(lv != rv)),
            BinOp::Less => Self::eval_compare(&lv, &rv, |o| o.is_lt(), "<"),
            BinOp::Greater => Self::eval_compare(&lv, &rv, |o| o.is_gt(), ">"),
            BinOp::LessEq => Self::eval_compare(&lv, &rv, |o| o.is_le(), "<="),
            BinOp::GreaterEq => Self::eval_compare(&lv, &rv, |o| o.is_ge(), ">="),
        }
    }

    fn eval_add(lv: &Value, rv: &Value) -> EvalResult<Value> {
        match (lv, rv) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            // String concatenation coerces the other operand to its
            // display form.
            (Value::String(a), b) => Ok(Value::String(format!("{a}{}", b.to_display_string()))),
            (a, Value::String(b)) => Ok(Value::String(format!("{}{b}", a.to_display_string()))),
            _ => Err(EvalError::RuntimeFault(format!(
                "cannot add {} and {}",
                lv.type_name(),
                rv.type_name()
            ))),
        }
    }

    fn eval_arith(
        lv: &Value,
        rv: &Value,
        op: fn(f64, f64) -> f64,
        symbol: &str,
    ) -> EvalResult<Value> {
        if let (Value::Number(a), Value::Number(b)) = (lv, rv) {
            Ok(Value::Number(op(*a, *b)))
        } else {
            Err(EvalError::RuntimeFault(format!(
                "cannot apply '{symbol}' to {} and {}",
                lv.type_name(),
                rv.type_name()
            )))
        }
    }

    fn eval_compare(
        lv: &Value,
        rv: &Value,
        test: fn(std::cmp::Ordering) -> bool,
        symbol: &str,
    ) -> EvalResult<Value> {
        let ordering = match (lv, rv) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => {
                return Err(EvalError::RuntimeFault(format!(
                    "cannot apply '{symbol}' to {} and {}",
                    lv.type_name(),
                    rv.type_name()
                )));
            }
        };
        // NaN comparisons are false, never faults.
        Ok(Value::Bool(ordering.map(test).unwrap_or(false)))
    }

    fn eval_logical(&mut self, left: &Expr, op: LogicalOp, right: &Expr) -> EvalResult<Value> {
        let lv = self.eval_expr(left)?;
        match op {
            LogicalOp::And => {
                if lv.is_truthy() {
                    self.eval_expr(right)
                } else {
                    Ok(lv)
                }
            }
            LogicalOp::Or => {
                if lv.is_truthy() {
                    Ok(lv)
                } else {
                    self.eval_expr(right)
                }
            }
            LogicalOp::Nullish => {
                if lv == Value::Null {
                    self.eval_expr(right)
                } else {
                    Ok(lv)
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Tag expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate a JSX-like tag expression to an output node.
    ///
    /// Capitalized tag names resolve through the session scope (components
    /// registered at construction, imports, user declarations); lowercase
    /// names become plain output elements.
    fn eval_jsx(&mut self, element: &JsxElement) -> EvalResult<OutputNode> {
        let Some(name) = &element.name else {
            // Fragment: children only.
            return Ok(OutputNode::Fragment(self.eval_jsx_children(element)?));
        };

        let is_component = name.name.chars().next().is_some_and(|c| c.is_uppercase());
        let attrs = self.eval_jsx_attrs(element)?;
        let children = self.eval_jsx_children(element)?;

        if is_component {
            let target = self.eval_identifier(&name.name)?;
            match target {
                Value::Component(component) => {
                    // Back-reference for the component: the tag as a
                    // source element.
                    let node = Element {
                        name: name.name.clone(),
                        attrs: attrs.clone(),
                        children: Vec::new(),
                        span: element.span,
                    };
                    Ok(component.render(&attrs, children, &node))
                }
                other => Err(EvalError::RuntimeFault(format!(
                    "'{}' is bound to a {}, which is not renderable as a component",
                    name.name,
                    other.type_name()
                ))),
            }
        } else {
            let mut out = OutputElement::new(&name.name, element.span);
            out.attrs = attrs;
            out.children = children;
            Ok(OutputNode::Element(out))
        }
    }

    fn eval_jsx_attrs(&mut self, element: &JsxElement) -> EvalResult<Vec<Attr>> {
        let mut attrs = Vec::with_capacity(element.attrs.len());
        for attr in &element.attrs {
            let value = match &attr.value {
                JsxAttrValue::Bool(b) => AttrValue::Bool(*b),
                JsxAttrValue::String(s) => AttrValue::String(s.clone()),
                JsxAttrValue::Expr(expr) => {
                    let v = self.eval_expr(expr)?;
                    Self::value_to_attr(v)
                }
            };
            attrs.push(Attr::new(attr.name.name.clone(), value));
        }
        Ok(attrs)
    }

    fn value_to_attr(value: Value) -> AttrValue {
        match value {
            Value::Bool(b) => AttrValue::Bool(b),
            Value::String(s) => AttrValue::String(s),
            Value::List(items) => {
                AttrValue::List(items.iter().map(Value::to_display_string).collect())
            }
            other => AttrValue::String(other.to_display_string()),
        }
    }

    fn eval_jsx_children(&mut self, element: &JsxElement) -> EvalResult<Vec<OutputNode>> {
        let mut out = Vec::new();
        for child in &element.children {
            match child {
                JsxChild::Text(text) => out.push(OutputNode::Text(text.clone())),
                JsxChild::Expr(expr) => {
                    let value = self.eval_expr(expr)?;
                    match value {
                        // Null and booleans render nothing, so
                        // `{flag && <Tag/>}` drops cleanly.
                        Value::Null | Value::Bool(_) => {}
                        Value::Node(node) => out.push(*node),
                        other => out.push(OutputNode::Value(other)),
                    }
                }
                JsxChild::Element(nested) => out.push(self.eval_jsx(nested)?),
            }
        }
        Ok(out)
    }
}
