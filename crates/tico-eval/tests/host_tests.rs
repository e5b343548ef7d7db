//! Host integration tests.
//!
//! Host variables and native functions, builtin output redirection, host
//! object operator overloads, and pause/resume/stop of running programs.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tico_eval::{
    EvalError, HostObject, NativeFn, Overload, Program, RunConfig, RunControl, RunError,
    RunState, Semantics, Value,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn program(source: &str) -> Program {
    Program::from_source_code(source).unwrap_or_else(|e| panic!("parse error: {e}"))
}

fn vars(entries: Vec<(&str, Value)>) -> HashMap<String, Value> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn funcs(entries: Vec<(&str, NativeFn)>) -> HashMap<String, NativeFn> {
    entries
        .into_iter()
        .map(|(name, function)| (name.to_string(), function))
        .collect()
}

fn run_host(
    source: &str,
    variables: Vec<(&str, Value)>,
    functions: Vec<(&str, NativeFn)>,
) -> Result<Value, EvalError> {
    program(source)
        .run_blocking(vars(variables), funcs(functions))
        .map_err(|e| e.error)
}

/// Collects everything written to one output sink.
#[derive(Clone, Default)]
struct Capture(Rc<RefCell<String>>);

impl Capture {
    fn sink(&self) -> impl Fn(&str) + 'static {
        let buffer = self.0.clone();
        move |text| buffer.borrow_mut().push_str(text)
    }

    fn text(&self) -> String {
        self.0.borrow().clone()
    }
}

fn run_captured(source: &str) -> (Result<Value, RunError>, String, String) {
    let mut program = program(source);
    let (stdout, stderr) = (Capture::default(), Capture::default());
    program.set_stdout(stdout.sink());
    program.set_stderr(stderr.sink());
    let result = program.run_blocking(HashMap::new(), HashMap::new());
    (result, stdout.text(), stderr.text())
}

// ── Host types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn value(x: f64, y: f64) -> Value {
        Value::host(Vec2 { x, y })
    }

    fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({}, {})", self.x, self.y)
    }
}

impl HostObject for Vec2 {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &str {
        "Vec2"
    }

    fn binary_op(&self, op: Overload, lhs: &Value, rhs: &Value) -> Option<Result<Value, String>> {
        let left = lhs.downcast_host::<Vec2>();
        let right = rhs.downcast_host::<Vec2>();
        Some(Ok(match (op, left, right) {
            (Overload::Add, Some(a), Some(b)) => Vec2::value(a.x + b.x, a.y + b.y),
            (Overload::Add, _, _) => {
                let message = format!("cannot add {} and {}", lhs.type_name(), rhs.type_name());
                return Some(Err(message));
            }
            (Overload::Mult, Some(v), None) => {
                let k = rhs.as_number()?;
                Vec2::value(v.x * k, v.y * k)
            }
            (Overload::Mult, None, Some(v)) => {
                let k = lhs.as_number()?;
                Vec2::value(v.x * k, v.y * k)
            }
            (Overload::Equals, Some(a), Some(b)) => Value::Bool(a == b),
            (Overload::Greater, Some(a), Some(b)) => Value::Bool(a.length() > b.length()),
            (Overload::Lesser, Some(a), Some(b)) => Value::Bool(a.length() < b.length()),
            _ => return None,
        }))
    }
}

/// Records every hook it is asked about and answers `true`, unless it
/// declines.
#[derive(Debug)]
struct Recorder {
    label: &'static str,
    accept: bool,
    log: Rc<RefCell<Vec<String>>>,
}

impl fmt::Display for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

impl HostObject for Recorder {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn binary_op(&self, op: Overload, _: &Value, _: &Value) -> Option<Result<Value, String>> {
        self.log
            .borrow_mut()
            .push(format!("{}:{}", self.label, op.name()));
        self.accept.then(|| Ok(Value::Bool(true)))
    }
}

fn recorder(label: &'static str, accept: bool, log: &Rc<RefCell<Vec<String>>>) -> Value {
    Value::host(Recorder {
        label,
        accept,
        log: log.clone(),
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Host variables & functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn host_variables_are_globals() {
    let variables = vec![("width", 3.into()), ("height", 4.into())];
    let result = run_host("return width * height", variables, vec![]);
    assert_eq!(result, Ok(Value::Number(12.0)));
}

#[test]
fn scripts_can_overwrite_host_variables() {
    let result = run_host("limit = limit + 1 return limit", vec![("limit", 9.into())], vec![]);
    assert_eq!(result, Ok(Value::Number(10.0)));
}

#[test]
fn native_functions_receive_evaluated_arguments() {
    let add = NativeFn::new(|args| Ok(Value::Number(args.iter().filter_map(Value::as_number).sum())));
    let result = run_host("return sum(1, 2 * 3, 4)", vec![], vec![("sum", add)]);
    assert_eq!(result, Ok(Value::Number(11.0)));
}

#[test]
fn native_errors_name_the_function() {
    let fail = NativeFn::new(|_| Err("boom".to_string()));
    let result = run_host("x = 1 fail()", vec![], vec![("fail", fail)]);
    assert_eq!(
        result,
        Err(EvalError::Native {
            name: "fail".into(),
            message: "boom".into(),
        })
    );
}

#[test]
fn host_functions_replace_builtins() {
    let quiet = NativeFn::new(|_| Ok(Value::Number(42.0)));
    let mut program = program(r#"return writeLine("hidden")"#);
    let stdout = Capture::default();
    program.set_stdout(stdout.sink());
    let result = program.run_blocking(HashMap::new(), funcs(vec![("writeLine", quiet)]));
    assert_eq!(result, Ok(Value::Number(42.0)));
    assert_eq!(stdout.text(), "");
}

#[test]
fn scripts_may_not_redeclare_host_functions() {
    let noop = NativeFn::new(|_| Ok(Value::Undefined));
    let result = run_host("function ping() {}", vec![], vec![("ping", noop)]);
    assert_eq!(result, Err(EvalError::DuplicateFunction("ping".into())));
}

// ══════════════════════════════════════════════════════════════════════════════
// Builtins
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn write_joins_arguments() {
    let (result, stdout, _) = run_captured(r#"write("a", 1, true); writeLine(" b", null)"#);
    assert_eq!(result, Ok(Value::Undefined));
    assert_eq!(stdout, "a1true bnull\n");
}

#[test]
fn error_writers_use_stderr() {
    let (_, stdout, stderr) = run_captured(r#"writeError("bad "); writeErrorLine("news")"#);
    assert_eq!(stdout, "");
    assert_eq!(stderr, "bad news\n");
}

#[test]
fn color_escapes_go_to_stdout() {
    let source = r#"setForeground("red"); write("x"); setBackground("brightBlue"); resetColor()"#;
    let (_, stdout, _) = run_captured(source);
    assert_eq!(stdout, "\x1b[31mx\x1b[104m\x1b[0m");
}

#[test]
fn unknown_color_is_a_native_error() {
    let (result, _, _) = run_captured(r#"setForeground("mauve")"#);
    assert_eq!(
        result.map_err(|e| e.error),
        Err(EvalError::Native {
            name: "setForeground".into(),
            message: "unknown color [mauve]".into(),
        })
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Operator overloads
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn host_objects_overload_arithmetic() {
    let result = run_host(
        "return a + b",
        vec![("a", Vec2::value(1.0, 2.0)), ("b", Vec2::value(3.0, 4.0))],
        vec![],
    )
    .unwrap();
    assert_eq!(result.downcast_host::<Vec2>(), Some(&Vec2 { x: 4.0, y: 6.0 }));
}

#[test]
fn right_operand_overload_is_used_when_left_is_native() {
    let result = run_host("return 2 * a", vec![("a", Vec2::value(1.0, 2.0))], vec![]).unwrap();
    assert_eq!(result.downcast_host::<Vec2>(), Some(&Vec2 { x: 2.0, y: 4.0 }));
}

#[test]
fn host_values_from_native_functions() {
    let make = NativeFn::new(|args| {
        let x = args.first().and_then(Value::as_number).unwrap_or(0.0);
        let y = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
        Ok(Vec2::value(x, y))
    });
    let result = run_host("v = vec(1, 1) + vec(2, 3) return v", vec![], vec![("vec", make)]).unwrap();
    assert_eq!(result.downcast_host::<Vec2>(), Some(&Vec2 { x: 3.0, y: 4.0 }));
    assert_eq!(result.type_name(), "Vec2");
}

#[test]
fn comparison_overloads_and_their_negations() {
    let variables = || {
        vec![
            ("a", Vec2::value(3.0, 4.0)),
            ("b", Vec2::value(3.0, 4.0)),
            ("c", Vec2::value(0.0, 1.0)),
        ]
    };
    let cases = [
        ("a == b", true),
        ("a != b", false),
        ("a != c", true),
        ("a > c", true),
        ("a < c", false),
        ("a >= c", true),
        ("c >= a", false),
        ("a <= b", true),
        ("a <= c", false),
    ];
    for (source, expected) in cases {
        let result = run_host(&format!("return {source}"), variables(), vec![]);
        assert_eq!(result, Ok(Value::Bool(expected)), "{source}");
    }
}

#[test]
fn host_values_display_through_write() {
    let mut program = program("writeLine(a)");
    let stdout = Capture::default();
    program.set_stdout(stdout.sink());
    program
        .run_blocking(vars(vec![("a", Vec2::value(1.5, -2.0))]), HashMap::new())
        .unwrap();
    assert_eq!(stdout.text(), "Vec2(1.5, -2)\n");
}

#[test]
fn declined_overload_falls_back_to_native_rules() {
    let result = run_host(r#"return a + "!""#, vec![("a", Vec2::value(1.0, 2.0))], vec![]);
    assert_eq!(
        result,
        Err(EvalError::Native {
            name: "add".into(),
            message: "cannot add Vec2 and string".into(),
        })
    );

    // Vec2 declines `-`, so native arithmetic rejects the operands.
    let result = run_host("return a - 1", vec![("a", Vec2::value(1.0, 2.0))], vec![]);
    assert!(matches!(result, Err(EvalError::TypeMismatch(_))));
}

#[test]
fn hook_names_per_operator() {
    let cases = [
        ("p + 1", "add"),
        ("p - 1", "sub"),
        ("p * 1", "mult"),
        ("p ** 1", "pow"),
        ("p / 1", "div"),
        ("p // 1", "fdiv"),
        ("p % 1", "mod"),
        ("p %% 1", "mod"),
        ("p > 1", "greater"),
        ("p < 1", "lesser"),
        ("p == 1", "equals"),
        ("p && 1", "and"),
        ("p || 1", "or"),
    ];
    for (source, hook) in cases {
        let log = Rc::new(RefCell::new(Vec::new()));
        run_host(source, vec![("p", recorder("p", true, &log))], vec![]).unwrap();
        assert_eq!(*log.borrow(), vec![format!("p:{hook}")], "{source}");
    }
}

#[test]
fn left_operand_is_asked_first() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let variables = vec![("l", recorder("l", true, &log)), ("r", recorder("r", true, &log))];
    run_host("l + r", variables, vec![]).unwrap();
    assert_eq!(*log.borrow(), vec!["l:add".to_string()]);
}

#[test]
fn right_operand_is_asked_when_left_declines() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let variables = vec![("l", recorder("l", false, &log)), ("r", recorder("r", true, &log))];
    let result = run_host("l * r", variables, vec![]);
    assert_eq!(result, Ok(Value::Bool(true)));
    assert_eq!(*log.borrow(), vec!["l:mult".to_string(), "r:mult".to_string()]);
}

#[test]
fn logical_overloads_are_negated_by_default() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let result = run_host("p && 1", vec![("p", recorder("p", true, &log))], vec![]);
    assert_eq!(result, Ok(Value::Bool(false)));
    let result = run_host("p || 1", vec![("p", recorder("p", true, &log))], vec![]);
    assert_eq!(result, Ok(Value::Bool(false)));
}

#[test]
fn logical_overload_negation_can_be_disabled() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut program = program("p && 1");
    program.set_semantics(Semantics {
        negate_logical_overloads: false,
        ..Semantics::default()
    });
    let result = program.run_blocking(vars(vec![("p", recorder("p", true, &log))]), HashMap::new());
    assert_eq!(result, Ok(Value::Bool(true)));
}

// ══════════════════════════════════════════════════════════════════════════════
// Run control
// ══════════════════════════════════════════════════════════════════════════════

/// A native `tick()` that counts its calls.
fn ticker() -> (Rc<Cell<u32>>, HashMap<String, NativeFn>) {
    let ticks = Rc::new(Cell::new(0));
    let counter = ticks.clone();
    let tick = NativeFn::new(move |_| {
        counter.set(counter.get() + 1);
        Ok(Value::Undefined)
    });
    (ticks, funcs(vec![("tick", tick)]))
}

fn busy_program(source: &str) -> Program {
    let mut program = program(source);
    program.set_exec_batch_duration(Duration::ZERO);
    program
}

#[test]
fn run_control_crosses_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RunControl>();
}

#[tokio::test]
async fn stop_cancels_an_endless_loop() {
    let program = busy_program("while (true) { tick() }");
    let (ticks, functions) = ticker();
    let control = program.control();

    let (result, _) = tokio::join!(program.run(HashMap::new(), functions), async {
        while ticks.get() < 10 {
            tokio::task::yield_now().await;
        }
        control.stop();
    });

    assert_eq!(result.map_err(|e| e.error), Err(EvalError::Cancelled));
    assert_eq!(control.state(), RunState::Stopped);
}

#[tokio::test]
async fn pause_holds_the_run_until_resumed() {
    let program = busy_program("while (true) { tick() }");
    let (ticks, functions) = ticker();
    let control = program.control();
    program.pause();

    let (result, _) = tokio::join!(program.run(HashMap::new(), functions), async {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(ticks.get(), 0);
        assert_eq!(control.state(), RunState::Paused);

        control.resume();
        while ticks.get() < 3 {
            tokio::task::yield_now().await;
        }
        control.stop();
    });

    assert_eq!(result.map_err(|e| e.error), Err(EvalError::Cancelled));
    assert!(ticks.get() >= 3);
}

#[tokio::test]
async fn earlier_stop_does_not_cancel_a_new_run() {
    let program = busy_program("i = 0 while (i < 100) i = i + 1 return i");
    program.stop();
    let result = program.run(HashMap::new(), HashMap::new()).await;
    assert_eq!(result, Ok(Value::Number(100.0)));
}

#[test]
fn stop_from_another_thread() {
    let program = busy_program("while (true) {}");
    let control = program.control();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        control.stop();
    });

    let result = program.run_blocking(HashMap::new(), HashMap::new());
    stopper.join().unwrap();
    assert_eq!(result.map_err(|e| e.error), Err(EvalError::Cancelled));
}

#[test]
fn wait_duration_spaces_out_batches() {
    let mut program = busy_program("1");
    program.set_wait_duration(Duration::from_millis(5));
    let started = Instant::now();
    let result = program.run_blocking(HashMap::new(), HashMap::new());
    assert_eq!(result, Ok(Value::Number(1.0)));
    assert!(started.elapsed() >= Duration::from_millis(5));
}

#[test]
fn configure_applies_timings_and_semantics() {
    let config = RunConfig::from_json(
        r#"{ "batch_ms": 0, "wait_ms": 0, "semantics": { "strict_variables": true } }"#,
    )
    .unwrap();
    let mut program = program("return missing");
    program.configure(&config);
    assert!(program.semantics().strict_variables);
    assert_eq!(
        program
            .run_blocking(HashMap::new(), HashMap::new())
            .map_err(|e| e.error),
        Err(EvalError::UndefinedVariable("missing".into()))
    );
}
