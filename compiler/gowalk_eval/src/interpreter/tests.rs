use std::thread;
use std::time::Duration;

use gowalk_cfg::compile_file;
use gowalk_ir::{AssignOp, BinaryOp, IncDecOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

/// Builds functions into one arena.
struct Source {
    arena: NodeArena,
    decls: Vec<NodeId>,
}

impl Source {
    fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            decls: Vec::new(),
        }
    }

    fn id(&mut self, name: &str) -> NodeId {
        self.arena.ident(name)
    }

    fn lit(&mut self, text: &str) -> NodeId {
        self.arena.literal(text)
    }

    fn bin(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.arena.binary(op, left, right)
    }

    /// `name op literal`
    fn bin_lit(&mut self, op: BinaryOp, name: &str, literal: &str) -> NodeId {
        let left = self.id(name);
        let right = self.lit(literal);
        self.bin(op, left, right)
    }

    fn call(&mut self, callee: &str, args: &[NodeId]) -> NodeId {
        self.arena.call(callee, args)
    }

    fn define(&mut self, name: &str, value: NodeId) -> NodeId {
        let target = self.id(name);
        self.arena.assign(AssignOp::Define, &[target], &[value])
    }

    fn set(&mut self, name: &str, value: NodeId) -> NodeId {
        let target = self.id(name);
        self.arena.assign(AssignOp::Assign, &[target], &[value])
    }

    fn inc(&mut self, name: &str) -> NodeId {
        let target = self.id(name);
        self.arena.inc_dec(IncDecOp::Inc, target)
    }

    fn ret(&mut self, values: &[NodeId]) -> NodeId {
        self.arena.return_stmt(values)
    }

    fn block(&mut self, stmts: &[NodeId]) -> NodeId {
        self.arena.block(stmts)
    }

    /// `for i := 0; cond; i++ { body }`
    fn count_loop(&mut self, cond: NodeId, body: &[NodeId]) -> NodeId {
        let zero = self.lit("0");
        let init = self.define("i", zero);
        let post = self.inc("i");
        let body = self.block(body);
        self.arena.for_stmt(init, cond, post, body)
    }

    fn func(&mut self, name: &str, params: &[&str], results: usize, body: &[NodeId]) -> NodeId {
        let fields: Vec<NodeId> = params.iter().map(|p| self.arena.field(&[*p], "int")).collect();
        let params = self.arena.field_list(&fields);
        let results = (results > 0).then(|| {
            let fields: Vec<NodeId> = (0..results).map(|_| self.arena.field(&[], "int")).collect();
            self.arena.field_list(&fields)
        });
        let body = self.block(body);
        let decl = self.arena.func_decl(name, params, results, body);
        self.decls.push(decl);
        decl
    }

    fn compile(mut self) -> Program {
        let file = self.arena.file(&self.decls);
        let (program, errors) = compile_file(self.arena, file);
        assert_eq!(errors, Vec::new());
        program
    }
}

/// `func fib(n int) int { if n < 2 { return n }; return fib(n-1) + fib(n-2) }`
fn add_fib(src: &mut Source) {
    let small = src.bin_lit(BinaryOp::Lt, "n", "2");
    let n = src.id("n");
    let early = src.ret(&[n]);
    let then = src.block(&[early]);
    let base = src.arena.if_stmt(small, then, None);
    let minus_one = src.bin_lit(BinaryOp::Sub, "n", "1");
    let left = src.call("fib", &[minus_one]);
    let minus_two = src.bin_lit(BinaryOp::Sub, "n", "2");
    let right = src.call("fib", &[minus_two]);
    let sum = src.bin(BinaryOp::Add, left, right);
    let ret = src.ret(&[sum]);
    src.func("fib", &["n"], 1, &[base, ret]);
}

/// `func spin() { for i := 0; true; i++ {} }`
fn add_spin(src: &mut Source) {
    let forever = src.id("true");
    let looped = src.count_loop(forever, &[]);
    src.func("spin", &[], 0, &[looped]);
}

#[test]
fn loop_body_runs_three_times() {
    // func count() int { n := 0; for i := 0; i < 3; i++ { n++ }; return n }
    let mut src = Source::new();
    let zero = src.lit("0");
    let init = src.define("n", zero);
    let cond = src.bin_lit(BinaryOp::Lt, "i", "3");
    let bump = src.inc("n");
    let looped = src.count_loop(cond, &[bump]);
    let n = src.id("n");
    let ret = src.ret(&[n]);
    src.func("count", &[], 1, &[init, looped, ret]);
    let program = src.compile();

    let results = Interpreter::new(&program).call("count", &[]).unwrap();
    assert_eq!(results, vec![Value::Int(3)]);
}

#[test]
fn if_else_inside_loop() {
    // for i := 0; i < n; i++ { if (i < 2) { s += i } else { s = s + 1 } }
    let mut src = Source::new();
    let zero = src.lit("0");
    let init = src.define("s", zero);
    let (i, n) = (src.id("i"), src.id("n"));
    let cond = src.bin(BinaryOp::Lt, i, n);
    let small = src.bin_lit(BinaryOp::Lt, "i", "2");
    let small = src.arena.paren(small);
    let s = src.id("s");
    let i = src.id("i");
    let add_i = src.arena.assign(AssignOp::Compound(BinaryOp::Add), &[s], &[i]);
    let then = src.block(&[add_i]);
    let plus_one = src.bin_lit(BinaryOp::Add, "s", "1");
    let bump = src.set("s", plus_one);
    let otherwise = src.block(&[bump]);
    let branch = src.arena.if_stmt(small, then, Some(otherwise));
    let looped = src.count_loop(cond, &[branch]);
    let s = src.id("s");
    let ret = src.ret(&[s]);
    src.func("sum", &["n"], 1, &[init, looped, ret]);
    let program = src.compile();

    let interpreter = Interpreter::new(&program);
    assert_eq!(interpreter.call("sum", &[Value::Int(5)]), Ok(vec![Value::Int(4)]));
    assert_eq!(interpreter.call("sum", &[Value::Int(0)]), Ok(vec![Value::Int(0)]));
}

#[test]
fn parenthesised_name_condition_continues_after_if() {
    // func f(b int) int { r := 0; c := b == 1; if (c) { r = 7 }; r = r + 1; return r }
    let mut src = Source::new();
    let zero = src.lit("0");
    let init = src.define("r", zero);
    let equal = src.bin_lit(BinaryOp::Eq, "b", "1");
    let flag = src.define("c", equal);
    let c = src.id("c");
    let cond = src.arena.paren(c);
    let seven = src.lit("7");
    let store = src.set("r", seven);
    let then = src.block(&[store]);
    let branch = src.arena.if_stmt(cond, then, None);
    let plus_one = src.bin_lit(BinaryOp::Add, "r", "1");
    let bump = src.set("r", plus_one);
    let r = src.id("r");
    let ret = src.ret(&[r]);
    src.func("f", &["b"], 1, &[init, flag, branch, bump, ret]);
    let program = src.compile();

    let interpreter = Interpreter::new(&program);
    assert_eq!(interpreter.call("f", &[Value::Int(1)]), Ok(vec![Value::Int(8)]));
    assert_eq!(interpreter.call("f", &[Value::Int(0)]), Ok(vec![Value::Int(1)]));
}

#[test]
fn parenthesised_constant_loop_condition() {
    // func g() int { n := 0; for i := 0; (true); i++ { n++; if n == 3 { return n } }; return 0 }
    let mut src = Source::new();
    let zero = src.lit("0");
    let init = src.define("n", zero);
    let forever = src.id("true");
    let cond = src.arena.paren(forever);
    let bump = src.inc("n");
    let done = src.bin_lit(BinaryOp::Eq, "n", "3");
    let n = src.id("n");
    let early = src.ret(&[n]);
    let then = src.block(&[early]);
    let stop = src.arena.if_stmt(done, then, None);
    let looped = src.count_loop(cond, &[bump, stop]);
    let zero = src.lit("0");
    let ret = src.ret(&[zero]);
    src.func("g", &[], 1, &[init, looped, ret]);
    let program = src.compile();

    let results = Interpreter::new(&program).call("g", &[]).unwrap();
    assert_eq!(results, vec![Value::Int(3)]);
}

#[test]
fn recursive_fib() {
    let mut src = Source::new();
    add_fib(&mut src);
    let program = src.compile();

    let interpreter = Interpreter::new(&program);
    assert_eq!(interpreter.call("fib", &[Value::Int(10)]), Ok(vec![Value::Int(55)]));
    assert_eq!(interpreter.call("fib", &[Value::Int(1)]), Ok(vec![Value::Int(1)]));
}

#[test]
fn call_result_drives_loop_condition() {
    // func small(n int) bool { return n < 3 }
    // func count() int { c := 0; for i := 0; small(i); i++ { c++ }; return c }
    let mut src = Source::new();
    let less = src.bin_lit(BinaryOp::Lt, "n", "3");
    let ret = src.ret(&[less]);
    src.func("small", &["n"], 1, &[ret]);

    let zero = src.lit("0");
    let init = src.define("c", zero);
    let i = src.id("i");
    let cond = src.call("small", &[i]);
    let bump = src.inc("c");
    let looped = src.count_loop(cond, &[bump]);
    let c = src.id("c");
    let ret = src.ret(&[c]);
    src.func("count", &[], 1, &[init, looped, ret]);
    let program = src.compile();

    let results = Interpreter::new(&program).call("count", &[]).unwrap();
    assert_eq!(results, vec![Value::Int(3)]);
}

#[test]
fn parallel_assignment_swaps() {
    // func swap(a int, b int) (int, int) { a, b = b, a; return a, b }
    let mut src = Source::new();
    let (a, b) = (src.id("a"), src.id("b"));
    let (b2, a2) = (src.id("b"), src.id("a"));
    let swap = src.arena.assign(AssignOp::Assign, &[a, b], &[b2, a2]);
    let (a3, b3) = (src.id("a"), src.id("b"));
    let ret = src.ret(&[a3, b3]);
    src.func("swap", &["a", "b"], 2, &[swap, ret]);
    let program = src.compile();

    let results = Interpreter::new(&program)
        .call("swap", &[Value::Int(1), Value::Int(2)])
        .unwrap();
    assert_eq!(results, vec![Value::Int(2), Value::Int(1)]);
}

#[test]
fn named_result_is_returned_by_bare_return() {
    // func answer() (r int) { r = 42; return }
    let mut src = Source::new();
    let value = src.lit("42");
    let store = src.set("r", value);
    let ret = src.ret(&[]);
    let params = src.arena.field_list(&[]);
    let field = src.arena.field(&["r"], "int");
    let results = src.arena.field_list(&[field]);
    let body = src.block(&[store, ret]);
    let decl = src.arena.func_decl("answer", params, Some(results), body);
    src.decls.push(decl);
    let program = src.compile();

    let results = Interpreter::new(&program).call("answer", &[]).unwrap();
    assert_eq!(results, vec![Value::Int(42)]);
}

#[test]
fn string_concatenation() {
    // func greet(name string) string { s := "hello, "; s += name; return s }
    let mut src = Source::new();
    let greeting = src.lit("\"hello, \"");
    let init = src.define("s", greeting);
    let s = src.id("s");
    let name = src.id("name");
    let append = src
        .arena
        .assign(AssignOp::Compound(BinaryOp::Add), &[s], &[name]);
    let s = src.id("s");
    let ret = src.ret(&[s]);
    src.func("greet", &["name"], 1, &[init, append, ret]);
    let program = src.compile();

    let results = Interpreter::new(&program)
        .call("greet", &[Value::from("gowalk")])
        .unwrap();
    assert_eq!(results, vec![Value::from("hello, gowalk")]);
}

#[test]
fn empty_function_returns_nothing() {
    let mut src = Source::new();
    src.func("noop", &[], 0, &[]);
    let program = src.compile();
    assert_eq!(Interpreter::new(&program).call("noop", &[]), Ok(Vec::new()));
}

#[test]
fn division_by_zero_carries_span_and_backtrace() {
    // func div(a int, b int) int { return a / b }
    // func main() int { return div(1, 0) }
    let mut src = Source::new();
    let (a, b) = (src.id("a"), src.id("b"));
    let quotient = src.bin(BinaryOp::Quo, a, b);
    src.arena[quotient].span = Span::new(40, 45);
    let ret = src.ret(&[quotient]);
    src.func("div", &["a", "b"], 1, &[ret]);

    let (one, zero) = (src.lit("1"), src.lit("0"));
    let call = src.call("div", &[one, zero]);
    src.arena[call].span = Span::new(70, 79);
    let ret = src.ret(&[call]);
    src.func("main", &[], 1, &[ret]);
    let program = src.compile();

    let err = Interpreter::new(&program).call("main", &[]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    assert_eq!(err.span, Some(Span::new(40, 45)));
    assert_eq!(err.backtrace.names().collect::<Vec<_>>(), vec!["div", "main"]);
    assert_eq!(err.backtrace.frames()[0].span, Some(Span::new(70, 79)));
    assert_eq!(err.backtrace.frames()[1].span, None);
}

#[test]
fn non_bool_condition_is_an_error() {
    // func f(n int) int { if n { return 1 }; return 0 }
    let mut src = Source::new();
    let n = src.id("n");
    let one = src.lit("1");
    let early = src.ret(&[one]);
    let then = src.block(&[early]);
    let branch = src.arena.if_stmt(n, then, None);
    let zero = src.lit("0");
    let ret = src.ret(&[zero]);
    src.func("f", &["n"], 1, &[branch, ret]);
    let program = src.compile();

    let err = Interpreter::new(&program)
        .call("f", &[Value::Int(1)])
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::NonBoolCondition { type_name: "int" });
}

#[test]
fn unbounded_recursion_hits_depth_limit() {
    // func down(n int) int { return down(n + 1) }
    let mut src = Source::new();
    let next = src.bin_lit(BinaryOp::Add, "n", "1");
    let call = src.call("down", &[next]);
    let ret = src.ret(&[call]);
    src.func("down", &["n"], 1, &[ret]);
    let program = src.compile();

    let bounded = Interpreter::new(&program).with_mode(EvalMode::Bounded {
        max_call_depth: 64,
        step_budget: None,
    });
    let err = bounded.call("down", &[Value::Int(0)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::CallDepthExceeded { depth: 64 });
    assert_eq!(err.backtrace.len(), 64);
    assert!(err.backtrace.names().all(|name| name == "down"));

    let err = Interpreter::new(&program)
        .call("down", &[Value::Int(0)])
        .unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::CallDepthExceeded {
            depth: crate::DEFAULT_MAX_CALL_DEPTH
        }
    );
}

#[test]
fn step_budget_stops_infinite_loop() {
    let mut src = Source::new();
    add_spin(&mut src);
    let program = src.compile();

    let bounded = Interpreter::new(&program).with_mode(EvalMode::Bounded {
        max_call_depth: 8,
        step_budget: Some(100),
    });
    let err = bounded.call("spin", &[]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::StepBudgetExceeded { budget: 100 });
    assert_eq!(err.backtrace.names().collect::<Vec<_>>(), vec!["spin"]);
}

#[test]
fn cancellation_before_start() {
    let mut src = Source::new();
    add_spin(&mut src);
    let program = src.compile();

    let token = CancellationToken::new();
    token.cancel();
    let err = Interpreter::new(&program)
        .with_cancellation(token)
        .call("spin", &[])
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::Cancelled);
}

#[test]
fn cancellation_from_another_thread() {
    let mut src = Source::new();
    add_spin(&mut src);
    let program = src.compile();

    let token = CancellationToken::new();
    let interpreter = Interpreter::new(&program).with_cancellation(token.clone());
    let result = thread::scope(|scope| {
        let running = scope.spawn(|| interpreter.call("spin", &[]));
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        running.join().unwrap()
    });
    assert_eq!(result.unwrap_err().kind, EvalErrorKind::Cancelled);
}

#[test]
fn calling_errors() {
    // func f() { nope() }
    let mut src = Source::new();
    add_fib(&mut src);
    let missing = src.call("nope", &[]);
    let stmt = src.arena.expr_stmt(missing);
    src.func("f", &[], 0, &[stmt]);
    let program = src.compile();
    let interpreter = Interpreter::new(&program);

    let err = interpreter.call("missing", &[]).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedFunction {
            name: "missing".to_string()
        }
    );

    let err = interpreter.call("fib", &[]).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::WrongArgCount {
            function: "fib".to_string(),
            expected: 1,
            got: 0
        }
    );

    let err = interpreter.call("f", &[]).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedFunction {
            name: "nope".to_string()
        }
    );
    assert_eq!(err.backtrace.names().collect::<Vec<_>>(), vec!["f"]);
}

#[test]
fn call_many_matches_sequential_calls() {
    let mut src = Source::new();
    add_fib(&mut src);
    let program = src.compile();
    let interpreter = Interpreter::new(&program);

    let calls: Vec<(&str, Vec<Value>)> = (0..16).map(|n| ("fib", vec![Value::Int(n)])).collect();
    let sequential: Vec<_> = calls
        .iter()
        .map(|(name, args)| interpreter.call(name, args))
        .collect();
    assert_eq!(interpreter.call_many(&calls), sequential);
}
