//! Builders for the synthetic nodes the transform pass injects.
//!
//! Every node built here carries a dummy span, which is how later passes
//! tell injected code apart from the user's program.

use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
    BinExpr, BinaryOp, CallExpr, Callee, CondExpr, Expr, ExprOrSpread, ExprStmt, Ident,
    IdentName, KeyValueProp, Lit, MemberExpr, MemberProp, Number, ObjectLit, Prop, PropName,
    PropOrSpread, Stmt, Str, UnaryExpr, UnaryOp,
};

use crate::UNDEFINED_SENTINEL;

pub mod source_gen;

/// Tracker entry point recording a line hit and a variable snapshot
pub const TRACK_LINE: &str = "trackLine";

/// Tracker entry point reporting a freshly declared variable
pub const TRACK_VAR: &str = "trackVar";

pub fn make_identifier(name: &str) -> Ident {
    Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty())
}

pub fn make_string_literal(value: &str) -> Expr {
    Expr::Lit(Lit::Str(Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }))
}

pub fn make_numeric_literal(value: f64) -> Expr {
    Expr::Lit(Lit::Num(Number {
        span: DUMMY_SP,
        value,
        raw: None,
    }))
}

pub fn make_call_expression(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(callee)),
        args: args
            .into_iter()
            .map(|expr| ExprOrSpread {
                spread: None,
                expr: Box::new(expr),
            })
            .collect(),
        type_args: None,
    })
}

/// `object.method(args...)`
pub fn make_member_call(object: &str, method: &str, args: Vec<Expr>) -> Expr {
    let callee = Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(Expr::Ident(make_identifier(object))),
        prop: MemberProp::Ident(IdentName::new(method.into(), DUMMY_SP)),
    });
    make_call_expression(callee, args)
}

pub fn make_expression_statement(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(expr),
    })
}

/// `typeof name !== "undefined" ? name : "undefined"`
///
/// Reads `name` without faulting when it is declared but unreachable at the
/// call site. A binding still in its temporal dead zone faults regardless.
pub fn make_hoisting_guard(name: &str) -> Expr {
    let test = Expr::Bin(BinExpr {
        span: DUMMY_SP,
        op: BinaryOp::NotEqEq,
        left: Box::new(Expr::Unary(UnaryExpr {
            span: DUMMY_SP,
            op: UnaryOp::TypeOf,
            arg: Box::new(Expr::Ident(make_identifier(name))),
        })),
        right: Box::new(make_string_literal(UNDEFINED_SENTINEL)),
    });

    Expr::Cond(CondExpr {
        span: DUMMY_SP,
        test: Box::new(test),
        cons: Box::new(Expr::Ident(make_identifier(name))),
        alt: Box::new(make_string_literal(UNDEFINED_SENTINEL)),
    })
}

/// Object literal with one guarded property per name, in iteration order
pub fn make_snapshot_object<'a>(names: impl IntoIterator<Item = &'a str>) -> Expr {
    let props = names
        .into_iter()
        .map(|name| {
            PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                key: PropName::Ident(IdentName::new(name.into(), DUMMY_SP)),
                value: Box::new(make_hoisting_guard(name)),
            })))
        })
        .collect();

    Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props,
    })
}

/// `tracker.method(args...);`
pub fn make_tracker_call(tracker: &str, method: &str, args: Vec<Expr>) -> Stmt {
    make_expression_statement(make_member_call(tracker, method, args))
}

/// `tracker.trackLine(line, { name: <guard>, ... });`
pub fn make_track_line<'a>(
    tracker: &str,
    line: u32,
    names: impl IntoIterator<Item = &'a str>,
) -> Stmt {
    make_tracker_call(
        tracker,
        TRACK_LINE,
        vec![
            make_numeric_literal(f64::from(line)),
            make_snapshot_object(names),
        ],
    )
}

/// `tracker.trackVar("name", name, line);`
pub fn make_track_var(tracker: &str, name: &str, line: u32) -> Stmt {
    make_tracker_call(
        tracker,
        TRACK_VAR,
        vec![
            make_string_literal(name),
            Expr::Ident(make_identifier(name)),
            make_numeric_literal(f64::from(line)),
        ],
    )
}
