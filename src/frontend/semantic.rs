//! Semantic analyzer: scope resolution and type checking.
//!
//! The analyzer walks the AST once, maintaining a stack of lexical scopes,
//! and accumulates diagnostics instead of stopping at the first problem.
//! Expressions that cannot be typed resolve to [`Type::Unknown`], which is
//! compatible with everything, so a single bad subexpression is reported
//! once rather than echoed by every enclosing node.

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::types::Type;
use crate::utils::Diagnostic;

/// Tunable analysis behavior. Pipelines differ only in their config.
#[derive(Debug, Clone, Default)]
pub struct SemanticConfig {
    /// When set, comparison operators also require their operands to be
    /// mutually compatible instead of accepting any pair of types.
    pub strict_comparisons: bool,
}

/// A declared name
#[derive(Debug, Clone)]
struct Symbol {
    ty: Type,
    mutable: bool,
    decl_line: u32,
}

/// The semantic analyzer
pub struct SemanticAnalyzer {
    config: SemanticConfig,
    /// Innermost scope last
    scopes: Vec<HashMap<String, Symbol>>,
    diagnostics: Vec<Diagnostic>,
    /// Expected return type while inside a function body
    return_ty: Option<Type>,
}

impl SemanticAnalyzer {
    pub fn new(config: SemanticConfig) -> Self {
        let mut analyzer = Self {
            config,
            scopes: vec![HashMap::new()],
            diagnostics: Vec::new(),
            return_ty: None,
        };
        analyzer.install_builtins();
        analyzer
    }

    fn install_builtins(&mut self) {
        let builtins = [
            (
                "print",
                Type::Function(vec![Type::String], Box::new(Type::Void)),
            ),
            ("readLine", Type::Function(vec![], Box::new(Type::String))),
        ];
        for (name, ty) in builtins {
            self.scopes[0].insert(
                name.to_string(),
                Symbol {
                    ty,
                    mutable: false,
                    decl_line: 0,
                },
            );
        }
    }

    /// Analyze a program and return every semantic diagnostic found.
    pub fn analyze(mut self, program: &Program) -> Vec<Diagnostic> {
        for stmt in &program.stmts {
            self.check_stmt(stmt);
        }
        log::debug!("semantic analysis found {} diagnostics", self.diagnostics.len());
        self.diagnostics
    }

    // ==================== Scope Handling ====================

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Declare a name in the innermost scope. Redeclaration in the same
    /// scope is reported and the original symbol is kept.
    fn declare(&mut self, name: &str, ty: Type, mutable: bool, line: u32) {
        if let Some(existing) = self.scopes.last().and_then(|scope| scope.get(name)) {
            let message = format!(
                "redeclaration of '{}' (first declared on line {})",
                name, existing.decl_line
            );
            self.diagnostics.push(Diagnostic::semantic(line, message));
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Symbol {
                    ty,
                    mutable,
                    decl_line: line,
                },
            );
        }
    }

    fn report(&mut self, line: u32, message: String) {
        self.diagnostics.push(Diagnostic::semantic(line, message));
    }

    // ==================== Statements ====================

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var(decl) => self.check_var_decl(decl),
            Stmt::Assign { name, value, line } => self.check_assign(name, value, *line),
            Stmt::If {
                cond,
                then_block,
                else_block,
                line,
            } => {
                self.check_condition(cond, "if", *line);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::While { cond, body, line } => {
                self.check_condition(cond, "while", *line);
                self.check_block(body);
            }
            Stmt::ForIn {
                binding,
                iterable,
                body,
                line,
            } => self.check_for_in(binding, iterable, body, *line),
            Stmt::Func(decl) => self.check_func_decl(decl),
            Stmt::Class(decl) => self.check_class_decl(decl),
            Stmt::Return { value, line } => self.check_return(value.as_ref(), *line),
            Stmt::Expr(expr) => {
                self.check_expr(expr);
            }
        }
    }

    fn check_block(&mut self, stmts: &[Stmt]) {
        self.push_scope();
        for stmt in stmts {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn check_var_decl(&mut self, decl: &VarDecl) {
        let init_ty = decl.init.as_ref().map(|init| self.check_expr(init));

        let ty = match (&decl.declared_ty, init_ty) {
            (Some(declared), Some(init_ty)) => {
                if !declared.is_compatible_with(&init_ty) {
                    self.report(
                        decl.line,
                        format!(
                            "cannot initialize '{}' of type '{}' with a value of type '{}'",
                            decl.name, declared, init_ty
                        ),
                    );
                }
                declared.clone()
            }
            (Some(declared), None) => declared.clone(),
            (None, Some(init_ty)) => init_ty,
            (None, None) => {
                self.report(
                    decl.line,
                    format!(
                        "declaration of '{}' needs a type annotation or an initial value",
                        decl.name
                    ),
                );
                Type::Unknown
            }
        };

        self.declare(&decl.name, ty, decl.mutable, decl.line);
    }

    fn check_assign(&mut self, name: &str, value: &Expr, line: u32) {
        let value_ty = self.check_expr(value);

        let Some(symbol) = self.lookup(name) else {
            self.report(line, format!("use of unresolved identifier '{}'", name));
            return;
        };
        let target_ty = symbol.ty.clone();
        let mutable = symbol.mutable;

        // Mutability and type compatibility are reported independently
        if !mutable {
            self.report(line, format!("cannot assign to '{}', it is a 'let' constant", name));
        }
        if !target_ty.is_compatible_with(&value_ty) {
            self.report(
                line,
                format!(
                    "cannot assign a value of type '{}' to '{}' of type '{}'",
                    value_ty, name, target_ty
                ),
            );
        }
    }

    fn check_condition(&mut self, cond: &Expr, construct: &str, line: u32) {
        let ty = self.check_expr(cond);
        if ty != Type::Bool && !ty.is_unknown() {
            self.report(
                line,
                format!("condition of '{}' must be 'Bool', found '{}'", construct, ty),
            );
        }
    }

    fn check_for_in(&mut self, binding: &str, iterable: &Expr, body: &[Stmt], line: u32) {
        let iter_ty = self.check_expr(iterable);
        let elem_ty = match iter_ty {
            Type::Array(elem) => *elem,
            // Dictionaries iterate over their keys
            Type::Dictionary(key, _) => *key,
            Type::Unknown => Type::Unknown,
            other => {
                self.report(
                    line,
                    format!("cannot iterate over a value of type '{}'", other),
                );
                Type::Unknown
            }
        };

        self.push_scope();
        self.declare(binding, elem_ty, false, line);
        for stmt in body {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn check_func_decl(&mut self, decl: &FuncDecl) {
        let ret_ty = decl.ret_ty.clone().unwrap_or(Type::Void);
        let param_tys = decl.params.iter().map(|p| p.ty.clone()).collect();
        // Declared before the body is checked so the function can recurse
        self.declare(
            &decl.name,
            Type::Function(param_tys, Box::new(ret_ty.clone())),
            false,
            decl.line,
        );

        self.push_scope();
        for param in &decl.params {
            if let Some(default) = &param.default {
                let default_ty = self.check_expr(default);
                if !param.ty.is_compatible_with(&default_ty) {
                    self.report(
                        param.line,
                        format!(
                            "default value of type '{}' does not match parameter '{}' of type '{}'",
                            default_ty, param.name, param.ty
                        ),
                    );
                }
            }
            self.declare(&param.name, param.ty.clone(), false, param.line);
        }

        let saved = self.return_ty.replace(ret_ty);
        for stmt in &decl.body {
            self.check_stmt(stmt);
        }
        self.return_ty = saved;
        self.pop_scope();
    }

    fn check_class_decl(&mut self, decl: &ClassDecl) {
        self.declare(&decl.name, Type::Class(decl.name.clone()), false, decl.line);

        // Properties form the scope the methods are checked in
        self.push_scope();
        for property in &decl.properties {
            self.check_var_decl(property);
        }
        for method in &decl.methods {
            self.check_func_decl(method);
        }
        self.pop_scope();
    }

    fn check_return(&mut self, value: Option<&Expr>, line: u32) {
        let actual = match value {
            Some(expr) => self.check_expr(expr),
            None => Type::Void,
        };

        let Some(expected) = self.return_ty.clone() else {
            self.report(line, "'return' outside of a function".to_string());
            return;
        };
        if !expected.is_compatible_with(&actual) {
            self.report(
                line,
                format!(
                    "cannot return a value of type '{}' from a function returning '{}'",
                    actual, expected
                ),
            );
        }
    }

    // ==================== Expressions ====================

    fn check_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal { value, .. } => match value {
                LitValue::Int(_) => Type::Int,
                LitValue::Float(_) => Type::Double,
                LitValue::Str(_) => Type::String,
                LitValue::Bool(_) => Type::Bool,
            },

            Expr::Ident { name, line } => match self.lookup(name) {
                Some(symbol) => symbol.ty.clone(),
                None => {
                    self.report(*line, format!("use of unresolved identifier '{}'", name));
                    Type::Unknown
                }
            },

            Expr::Binary {
                op,
                left,
                right,
                line,
            } => self.check_binary(*op, left, right, *line),

            Expr::Unary { op, operand, line } => {
                let ty = self.check_expr(operand);
                match op {
                    UnOp::Not => {
                        if ty != Type::Bool && !ty.is_unknown() {
                            self.report(*line, format!("operand of '!' must be 'Bool', found '{}'", ty));
                        }
                        Type::Bool
                    }
                    UnOp::Neg => {
                        if !ty.is_numeric() && !ty.is_unknown() {
                            self.report(*line, format!("cannot negate a value of type '{}'", ty));
                        }
                        ty
                    }
                }
            }

            // Calls are resolved by name only; the result is best-effort
            Expr::Call { name, args, line } => {
                for arg in args {
                    self.check_expr(arg);
                }
                if self.lookup(name).is_none() {
                    self.report(*line, format!("call to unresolved function '{}'", name));
                }
                Type::Unknown
            }

            Expr::Member { object, args, .. } => {
                self.check_expr(object);
                if let Some(args) = args {
                    for arg in args {
                        self.check_expr(arg);
                    }
                }
                Type::Unknown
            }

            Expr::Tuple { elements, .. } => {
                let tys = elements.iter().map(|e| self.check_expr(e)).collect();
                Type::Tuple(tys)
            }

            Expr::Array { elements, line } => {
                let elem = self.check_uniform(elements, "array", *line);
                Type::array(elem)
            }

            Expr::Dict { pairs, line } => {
                let keys: Vec<&Expr> = pairs.iter().map(|(k, _)| k).collect();
                let values: Vec<&Expr> = pairs.iter().map(|(_, v)| v).collect();
                let key_ty = self.check_uniform_refs(&keys, "dictionary key", *line);
                let value_ty = self.check_uniform_refs(&values, "dictionary value", *line);
                Type::dictionary(key_ty, value_ty)
            }

            // Lambda parameters carry no annotations, so they type as Unknown
            Expr::Lambda { params, body, .. } => {
                self.push_scope();
                for param in params {
                    self.declare(param, Type::Unknown, false, expr.line());
                }
                let body_ty = self.check_expr(body);
                self.pop_scope();
                Type::Function(vec![Type::Unknown; params.len()], Box::new(body_ty))
            }
        }
    }

    fn check_binary(&mut self, op: BinOp, left: &Expr, right: &Expr, line: u32) -> Type {
        let lt = self.check_expr(left);
        let rt = self.check_expr(right);

        if op == BinOp::Range {
            for ty in [&lt, &rt] {
                if *ty != Type::Int && !ty.is_unknown() {
                    self.report(line, format!("range bounds must be 'Int', found '{}'", ty));
                }
            }
            // A closed range behaves as an integer sequence
            return Type::array(Type::Int);
        }

        if op.is_arithmetic() {
            if lt.is_unknown() || rt.is_unknown() {
                return Type::Unknown;
            }
            if op == BinOp::Add && lt == Type::String && rt == Type::String {
                return Type::String;
            }
            if lt.is_numeric() && rt.is_numeric() {
                return if lt == Type::Double || rt == Type::Double {
                    Type::Double
                } else {
                    Type::Int
                };
            }
            self.report(
                line,
                format!("invalid operands to '{}': '{}' and '{}'", op.symbol(), lt, rt),
            );
            return Type::Unknown;
        }

        if op.is_comparison() {
            if self.config.strict_comparisons
                && !lt.is_unknown()
                && !rt.is_unknown()
                && !lt.is_compatible_with(&rt)
            {
                self.report(
                    line,
                    format!(
                        "comparison '{}' between incompatible types '{}' and '{}'",
                        op.symbol(),
                        lt,
                        rt
                    ),
                );
            }
            return Type::Bool;
        }

        // Logical operators
        for ty in [&lt, &rt] {
            if *ty != Type::Bool && !ty.is_unknown() {
                self.report(
                    line,
                    format!("operand of '{}' must be 'Bool', found '{}'", op.symbol(), ty),
                );
            }
        }
        Type::Bool
    }

    /// Check a homogeneous collection: every element must be compatible with
    /// the first. Numeric elements widen to Double when mixed.
    fn check_uniform(&mut self, elements: &[Expr], what: &str, line: u32) -> Type {
        let refs: Vec<&Expr> = elements.iter().collect();
        self.check_uniform_refs(&refs, what, line)
    }

    fn check_uniform_refs(&mut self, elements: &[&Expr], what: &str, line: u32) -> Type {
        let mut elem_ty = Type::Unknown;
        for element in elements {
            let ty = self.check_expr(element);
            if elem_ty.is_unknown() {
                elem_ty = ty;
                continue;
            }
            if ty.is_unknown() {
                continue;
            }
            if !elem_ty.is_compatible_with(&ty) {
                self.report(
                    line,
                    format!(
                        "{} literal mixes element types '{}' and '{}'",
                        what, elem_ty, ty
                    ),
                );
                return Type::Unknown;
            }
            if elem_ty == Type::Int && ty == Type::Double {
                elem_ty = Type::Double;
            }
        }
        elem_ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> Vec<Diagnostic> {
        analyze_with(source, SemanticConfig::default())
    }

    fn analyze_with(source: &str, config: SemanticConfig) -> Vec<Diagnostic> {
        let (tokens, lex_diags) = Lexer::new(source).tokenize();
        assert!(lex_diags.is_empty(), "unexpected lexical diagnostics");
        let (program, parse_diags) = Parser::new(tokens).parse();
        assert!(parse_diags.is_empty(), "unexpected syntactic diagnostics");
        SemanticAnalyzer::new(config).analyze(&program)
    }

    #[test]
    fn test_valid_program() {
        let source = r#"
            var total: Int = 0;
            let label: String = "sum: ";
            func double(n: Int) -> Int {
                return n * 2;
            }
            for i in 1...10 {
                total = total + double(1);
            }
            if total > 0 && true {
                print(label);
            }
        "#;
        assert_eq!(analyze(source), vec![]);
    }

    #[test]
    fn test_unresolved_identifier() {
        let diags = analyze("var x = y + 1;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unresolved identifier 'y'"));
    }

    #[test]
    fn test_unknown_suppresses_cascading_diagnostics() {
        // y is unresolved once; the arithmetic and condition around it
        // must not add more diagnostics.
        let diags = analyze("if y + 1 > 0 { print(\"hi\"); }");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_assignment_to_let_constant() {
        let diags = analyze("let x: Int = 1;\nx = 2;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'let' constant"));
        assert_eq!(diags[0].line, 2);
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let diags = analyze("var x: Int = 1;\nx = \"text\";");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("cannot assign"));
    }

    #[test]
    fn test_let_and_type_mismatch_reported_independently() {
        let diags = analyze("let x: Int = 1;\nx = \"text\";");
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_initializer_type_mismatch() {
        let diags = analyze("var x: Bool = 42;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("cannot initialize 'x'"));
    }

    #[test]
    fn test_numeric_widening_accepted() {
        assert_eq!(analyze("var x: Double = 1;\nvar y = 1 + 2.5;\nvar z: Double = y;"), vec![]);
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(analyze("var s = \"a\" + \"b\";\nvar t: String = s;"), vec![]);
    }

    #[test]
    fn test_string_plus_int_rejected() {
        let diags = analyze("var s = \"a\" + 1;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("invalid operands to '+'"));
    }

    #[test]
    fn test_mixed_addition_degrades_to_unknown() {
        // One diagnostic for the bad '+'; z is Unknown afterwards, so the
        // Bool initialization raises nothing further.
        let diags = analyze("var z = 1 + \"a\";\nvar w: Bool = z;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 1);
    }

    #[test]
    fn test_condition_must_be_bool() {
        let diags = analyze("if 1 { print(\"x\"); }\nwhile \"s\" { print(\"y\"); }");
        assert_eq!(diags.len(), 2);
        assert!(diags[0].message.contains("'if'"));
        assert!(diags[1].message.contains("'while'"));
    }

    #[test]
    fn test_logical_operands_must_be_bool() {
        let diags = analyze("var b = 1 && true;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'&&'"));
    }

    #[test]
    fn test_comparisons_permissive_by_default() {
        assert_eq!(analyze("var b = 1 == \"one\";\nvar c: Bool = b;"), vec![]);
    }

    #[test]
    fn test_strict_comparisons() {
        let config = SemanticConfig {
            strict_comparisons: true,
        };
        let diags = analyze_with("var b = 1 == \"one\";", config);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("incompatible types"));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let diags = analyze("var x = 1;\nvar x = 2;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("first declared on line 1"));
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_allowed() {
        assert_eq!(analyze("var x = 1;\nif true {\n  var x = 2;\n  x = 3;\n}"), vec![]);
    }

    #[test]
    fn test_block_locals_are_not_visible_after_the_block() {
        let source = "if true {\n  var inner = 1;\n}\nvar t = inner;";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unresolved identifier 'inner'"));
        assert_eq!(diags[0].line, 4);
    }

    #[test]
    fn test_declaration_without_type_or_initializer() {
        let diags = analyze("var x;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("needs a type annotation"));
    }

    #[test]
    fn test_for_in_binds_element_type() {
        let diags = analyze("for s in [\"a\", \"b\"] {\n  var t: String = s;\n}");
        assert_eq!(diags, vec![]);
    }

    #[test]
    fn test_for_in_over_non_iterable() {
        let diags = analyze("for i in 42 { print(\"x\"); }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("cannot iterate"));
    }

    #[test]
    fn test_range_bounds_must_be_int() {
        let diags = analyze("for i in 1...\"z\" { print(\"x\"); }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("range bounds"));
    }

    #[test]
    fn test_mixed_array_literal() {
        let diags = analyze("var a = [1, \"two\"];");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("array literal mixes"));
    }

    #[test]
    fn test_numeric_array_widens() {
        assert_eq!(analyze("var a: [Double] = [1, 2.5];"), vec![]);
    }

    #[test]
    fn test_dict_key_uniformity() {
        let diags = analyze("var d = [\"a\": 1, 2: 3];");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("dictionary key"));
    }

    #[test]
    fn test_return_outside_function() {
        let diags = analyze("return 1;");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("outside of a function"));
    }

    #[test]
    fn test_return_type_mismatch() {
        let diags = analyze("func f() -> Int {\n  return \"no\";\n}");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("cannot return"));
    }

    #[test]
    fn test_function_can_recurse() {
        assert_eq!(
            analyze("func fact(n: Int) -> Int {\n  return n * fact(1);\n}"),
            vec![]
        );
    }

    #[test]
    fn test_call_unresolved_function() {
        let diags = analyze("missing(1);");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unresolved function 'missing'"));
    }

    #[test]
    fn test_builtins_are_available() {
        assert_eq!(analyze("print(readLine());"), vec![]);
    }

    #[test]
    fn test_param_default_type_checked() {
        let diags = analyze("func f(a: Int = \"x\") { return; }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("default value"));
    }

    #[test]
    fn test_class_members_analyzed() {
        let source = r#"
            class Point {
                var x: Int = 0;
                var y: Int = "no";
                func shifted() -> Int {
                    return x + 1;
                }
            }
        "#;
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("cannot initialize 'y'"));
    }

    #[test]
    fn test_lambda_params_are_in_scope() {
        assert_eq!(analyze("var f = (a, b) -> a + b;"), vec![]);
    }

    #[test]
    fn test_member_access_is_best_effort() {
        assert_eq!(
            analyze("var p = 1;\nvar q = p.magnitude;\np.describe(q);"),
            vec![]
        );
    }
}
