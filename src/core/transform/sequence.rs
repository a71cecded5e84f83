//! Linearise transactional blocks into ordered asynchronous steps
use crate::common::sourcemap::HasSmid;
use crate::core::analyse::scope::Scope;
use crate::core::expr::*;
use crate::core::names;
use crate::core::transform::rewrite::Rewriter;

/// Turn `transaction do ... end` into an awaited call of the host's
/// transaction operation with an async function whose statements each
/// await their effect before the next begins.
///
/// A receiver on the head call is kept; an implicit head call is sent
/// to the host. Anything other than a block is returned unchanged.
pub fn linearize(rewriter: &Rewriter, block: &RcExpr, scope: &Scope, method: &str) -> RcExpr {
    let (s, call, params, body) = match &*block.inner {
        Expr::Block(s, call, params, body) => (*s, call, params, body),
        _ => return block.clone(),
    };

    let (call_smid, receiver, name, args) = match &*call.inner {
        Expr::Send(cs, receiver, name, args, _) => (*cs, receiver, name, args),
        _ => return block.clone(),
    };

    let inner = scope.enter_block(params, body.as_ref());
    let steps: Vec<RcExpr> = body
        .iter()
        .flat_map(|b| b.statements())
        .map(|stmt| awaited(rewriter.rewrite(&stmt, &inner, method)))
        .collect();
    let func = core::async_fn(
        s,
        rewriter.params(params, &inner, method),
        RcExpr::sequence(s, steps).unwrap_or_else(|| core::seq(s, vec![])),
    );

    let receiver = match receiver {
        Some(r) => rewriter.rewrite(r, scope, method),
        None => core::self_(call_smid),
    };
    let mut args: Vec<RcExpr> = args
        .iter()
        .map(|a| rewriter.rewrite(a, scope, method))
        .collect();
    args.push(func);

    core::await_(
        s,
        core::send_shaped(call_smid, Some(receiver), name, args, CallShape::Parens),
    )
}

/// Await the effect of a single statement. Assignments and setter
/// calls stay synchronous and await only the value assigned.
fn awaited(stmt: RcExpr) -> RcExpr {
    match &*stmt.inner {
        Expr::Await(_, _) => stmt.clone(),
        Expr::LocalAsgn(s, name, value) => core::lasgn(*s, name, await_value(value)),
        Expr::FieldAsgn(s, name, value) => core::fasgn(*s, name, await_value(value)),
        Expr::OpAsgn(s, target, op, value) => {
            core::op_asgn(*s, target.clone(), op, await_value(value))
        }
        Expr::Send(s, receiver, name, args, shape) if names::is_setter(name) && args.len() == 1 => {
            RcExpr::from(Expr::Send(
                *s,
                receiver.clone(),
                name.clone(),
                vec![await_value(&args[0])],
                *shape,
            ))
        }
        Expr::SafeSend(s, receiver, name, args, shape)
            if names::is_setter(name) && args.len() == 1 =>
        {
            RcExpr::from(Expr::SafeSend(
                *s,
                receiver.clone(),
                name.clone(),
                vec![await_value(&args[0])],
                *shape,
            ))
        }
        _ => core::await_(stmt.smid(), stmt.clone()),
    }
}

fn await_value(value: &RcExpr) -> RcExpr {
    match &*value.inner {
        Expr::Await(_, _) => value.clone(),
        _ => core::await_(value.smid(), value.clone()),
    }
}
