//! Execution engine.
//!
//! A uniform stepper over the compiled graph: execute the current node's
//! operation, then follow `next`, or `branch_next` when a branch node
//! produced `false`. All language-level control flow was wired by the
//! compiler, so the engine knows nothing about `if` or `for`.
//!
//! Calls do not recurse on the host stack. Each call pushes an
//! activation (own frame, own cursor) and the run loop always steps the
//! innermost one; when it finishes, its first result is
//! stored in the caller's call slot and the caller resumes after the call
//! node. Source-level recursion depth is bounded by the [`CallStack`], not
//! by the host stack.

use gowalk_cfg::{CompiledFunction, Program};
use gowalk_ir::{AssignOp, Node, NodeArena, NodeId, NodeKind, Op, Slot, Span};
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::cancel::CancellationToken;
use crate::diagnostics::{CallFrame, CallStack};
use crate::errors::{
    cancelled, non_bool_condition, not_executable, step_budget_exceeded, undefined_function,
    wrong_arg_count, EvalError, EvalResult,
};
use crate::eval_mode::EvalMode;
use crate::frame::Frame;
use crate::operators::{evaluate_binary, evaluate_inc_dec};
use crate::Value;

type Args = SmallVec<[Value; 4]>;

/// Runs functions of a compiled [`Program`].
///
/// Holds only shared references and policy, so one interpreter can serve
/// any number of concurrent calls; every call gets its own frames.
pub struct Interpreter<'p> {
    program: &'p Program,
    mode: EvalMode,
    cancel: CancellationToken,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            mode: EvalMode::default(),
            cancel: CancellationToken::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Poll `token` between node steps.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn mode(&self) -> &EvalMode {
        &self.mode
    }

    /// Call `name` with `args`; returns every result value in order.
    #[tracing::instrument(level = "debug", skip(self, args), fields(args = args.len()))]
    pub fn call(&self, name: &str, args: &[Value]) -> EvalResult<Vec<Value>> {
        let function = self
            .program
            .function(name)
            .ok_or_else(|| undefined_function(name))?;
        Machine::new(self).run(function, args.iter().cloned().collect())
    }

    /// Run independent calls in parallel.
    ///
    /// Results come back in input order. Each call owns its frames; only
    /// the compiled graph is shared.
    pub fn call_many(&self, calls: &[(&str, Vec<Value>)]) -> Vec<EvalResult<Vec<Value>>> {
        calls
            .par_iter()
            .map(|(name, args)| self.call(name, args))
            .collect()
    }
}

/// One active call.
struct Activation<'a> {
    function: &'a CompiledFunction,
    frame: Frame,
    /// Next node to execute; `None` once the function is done.
    current: Option<NodeId>,
    /// Call node in the caller waiting for this activation's result.
    call_site: Option<NodeId>,
}

/// What the engine does after one node.
enum Step<'a> {
    /// Continue at the node, or finish the function on `None`.
    Goto(Option<NodeId>),
    /// Enter a callee; the current node is the call site.
    Call(&'a CompiledFunction, Args),
}

/// State of one top-level call.
struct Machine<'a> {
    program: &'a Program,
    arena: &'a NodeArena,
    cancel: &'a CancellationToken,
    step_budget: Option<u64>,
    steps: u64,
    activations: Vec<Activation<'a>>,
    call_stack: CallStack,
}

impl<'a> Machine<'a> {
    fn new(interpreter: &'a Interpreter<'_>) -> Self {
        let program = interpreter.program;
        Self {
            program,
            arena: program.arena(),
            cancel: &interpreter.cancel,
            step_budget: interpreter.mode.step_budget(),
            steps: 0,
            activations: Vec::new(),
            call_stack: CallStack::new(interpreter.mode.max_call_depth()),
        }
    }

    fn run(mut self, function: &'a CompiledFunction, args: Args) -> EvalResult<Vec<Value>> {
        self.push_activation(function, args, None)
            .map_err(|err| self.annotate(err, None))?;

        loop {
            let current = match self.activations.last() {
                Some(top) => top.current,
                None => return Ok(Vec::new()),
            };
            let Some(id) = current else {
                match self.finish() {
                    Ok(Some(results)) => return Ok(results),
                    Ok(None) => continue,
                    Err(err) => return Err(self.annotate(err, None)),
                }
            };

            if let Err(err) = self.check_interrupts().and_then(|()| self.step(id)) {
                let span = self.arena[id].span;
                return Err(self.annotate(err, Some(span)));
            }
        }
    }

    /// Execute `id` in the innermost activation.
    fn step(&mut self, id: NodeId) -> EvalResult<()> {
        let program = self.program;
        let Some(top) = self.activations.last_mut() else {
            return Ok(());
        };
        match execute(program, &mut top.frame, id)? {
            Step::Goto(next) => {
                top.current = next;
                Ok(())
            }
            Step::Call(callee, args) => self.push_activation(callee, args, Some(id)),
        }
    }

    fn check_interrupts(&mut self) -> EvalResult<()> {
        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }
        self.steps += 1;
        match self.step_budget {
            Some(budget) if self.steps > budget => Err(step_budget_exceeded(budget)),
            _ => Ok(()),
        }
    }

    fn push_activation(
        &mut self,
        function: &'a CompiledFunction,
        args: Args,
        call_site: Option<NodeId>,
    ) -> EvalResult<()> {
        let program = self.program;
        let name = program.name_of(function);
        if args.len() != function.params.len() {
            return Err(wrong_arg_count(name, function.params.len(), args.len()));
        }
        let call_span = call_site.map(|site| self.arena[site].span);
        self.call_stack.push(CallFrame {
            name: function.name,
            call_span,
        })?;

        let mut frame = Frame::new(function.frame_size);
        for (&slot, value) in function.params.iter().zip(args) {
            frame.set(slot, value)?;
        }
        tracing::trace!(function = name, depth = self.call_stack.depth(), "enter");
        self.activations.push(Activation {
            function,
            frame,
            current: function.entry,
            call_site,
        });
        Ok(())
    }

    /// Retire the innermost activation.
    ///
    /// Returns the results once the outermost call is done; otherwise hands
    /// the first result to the waiting call node and resumes the caller.
    fn finish(&mut self) -> EvalResult<Option<Vec<Value>>> {
        let Some(done) = self.activations.pop() else {
            return Ok(Some(Vec::new()));
        };
        self.call_stack.pop();
        tracing::trace!(function = self.program.name_of(done.function), "leave");

        let results = (1..=done.function.results)
            .map(|slot| done.frame.get(Slot::new(slot)).cloned())
            .collect::<EvalResult<Vec<_>>>()?;
        let Some(site) = done.call_site else {
            return Ok(Some(results));
        };

        let arena = self.arena;
        let node = &arena[site];
        let value = results.into_iter().next().unwrap_or_default();
        let next = successor(node, Some(&value)).map_err(|err| err.with_span(node.span))?;
        let Some(caller) = self.activations.last_mut() else {
            return Ok(Some(vec![value]));
        };
        caller
            .frame
            .set(node.slot, value)
            .map_err(|err| err.with_span(node.span))?;
        caller.current = next;
        Ok(None)
    }

    /// Attach the failing span and the live backtrace.
    fn annotate(&self, err: EvalError, span: Option<Span>) -> EvalError {
        let err = match span {
            Some(span) => err.with_span(span),
            None => err,
        };
        err.with_backtrace(self.call_stack.capture(self.arena.interner()))
    }
}

/// Execute one node against `frame`.
fn execute<'a>(program: &'a Program, frame: &mut Frame, id: NodeId) -> EvalResult<Step<'a>> {
    let arena = program.arena();
    let node = &arena[id];
    tracing::trace!(node = id.raw(), kind = node.kind.label(), "step");
    let op = node.op.ok_or_else(|| not_executable(node.kind.label()))?;

    let value = match op {
        Op::Nop => None,
        Op::Value => Some(operand(arena, frame, id)?),
        Op::Binary(op) => {
            let left = operand(arena, frame, node.children[0])?;
            let right = operand(arena, frame, node.children[1])?;
            let result = evaluate_binary(&left, &right, op)?;
            frame.set(node.slot, result.clone())?;
            Some(result)
        }
        Op::IncDec(op) => {
            let target = arena[node.children[0]].slot;
            let updated = evaluate_inc_dec(frame.get(target)?, op)?;
            frame.set(target, updated)?;
            None
        }
        Op::Assign(op) => {
            assign(arena, frame, node, op)?;
            None
        }
        Op::Return => {
            let values = operands(arena, frame, &node.children)?;
            for (slot, value) in (1..).map(Slot::new).zip(values) {
                frame.set(slot, value)?;
            }
            return Ok(Step::Goto(None));
        }
        Op::Call => {
            let NodeKind::Ident(callee) = arena[node.children[0]].kind else {
                return Err(not_executable("call expression"));
            };
            let function = program
                .get(callee)
                .ok_or_else(|| undefined_function(arena.text(callee)))?;
            let args = operands(arena, frame, &node.children[1..])?;
            return Ok(Step::Call(function, args));
        }
    };
    successor(node, value.as_ref()).map(Step::Goto)
}

fn assign(arena: &NodeArena, frame: &mut Frame, node: &Node, op: AssignOp) -> EvalResult<()> {
    match op {
        AssignOp::Compound(op) => {
            let target = arena[node.children[0]].slot;
            let rhs = operand(arena, frame, node.children[1])?;
            let updated = evaluate_binary(frame.get(target)?, &rhs, op)?;
            frame.set(target, updated)
        }
        AssignOp::Assign | AssignOp::Define => {
            // Read every source before the first store so `a, b = b, a` swaps.
            let (targets, sources) = node.children.split_at(node.children.len() / 2);
            let values = operands(arena, frame, sources)?;
            for (&target, value) in targets.iter().zip(values) {
                frame.set(arena[target].slot, value)?;
            }
            Ok(())
        }
    }
}

/// Pick the successor of `node` after it produced `value`.
fn successor(node: &Node, value: Option<&Value>) -> EvalResult<Option<NodeId>> {
    if !node.is_branch() {
        return Ok(node.next);
    }
    match value.and_then(Value::as_bool) {
        Some(true) => Ok(node.next),
        Some(false) => Ok(node.branch_next),
        None => Err(non_bool_condition(value.map_or("void", Value::type_name))),
    }
}

/// Value of an operand: its constant, or its slot in `frame`.
fn operand(arena: &NodeArena, frame: &Frame, id: NodeId) -> EvalResult {
    let node = &arena[id];
    match &node.constant {
        Some(constant) if node.is_const() => Ok(Value::from(constant)),
        _ => frame.get(node.slot).cloned(),
    }
}

fn operands(arena: &NodeArena, frame: &Frame, ids: &[NodeId]) -> EvalResult<Args> {
    ids.iter().map(|&id| operand(arena, frame, id)).collect()
}

#[cfg(test)]
mod tests;
