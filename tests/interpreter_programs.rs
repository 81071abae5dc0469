use alc_playground::interpreter::{self, Node, Object, PrintSink, TokenKind};
use alc_playground::util::render::{object_to_json, render_message};
use alc_playground::{PlaygroundConfig, Session};
use parking_lot::Mutex;
use serde_json::json;

#[derive(Default)]
struct Transcript(Mutex<Vec<String>>);

impl PrintSink for Transcript {
    fn print(&self, values: &[Object]) {
        self.0.lock().push(render_message(values));
    }
}

fn run(source: &str) -> (interpreter::Result<Object>, Vec<String>) {
    let transcript = Transcript::default();
    let result = interpreter::parse_and_run(source, &transcript, interpreter::Limits::default())
        .map(|output| output.result);
    (result, transcript.0.into_inner())
}

#[test]
fn fibonacci_program() {
    let source = r#"
        ; naive fibonacci
        (def fib (fn [n]
            (if (< n 2)
                n
                (+ (fib (- n 1)) (fib (- n 2))))))
        (print "fib" 10 "=" (fib 10))
        (fib 15)
    "#;
    let (result, prints) = run(source);
    assert_eq!(result.unwrap(), Object::Integer(610));
    assert_eq!(prints, vec!["fib 10 = 55"]);
}

#[test]
fn list_processing_program() {
    let source = r#"
        (def sum (fn [items]
            (if (len items)
                (+ (head items) (sum (tail items)))
                0)))
        (def xs (list 1 2 3 4))
        (print xs (nth 2 xs) (sum xs))
    "#;
    let (result, prints) = run(source);
    assert_eq!(result.unwrap(), Object::Null);
    assert_eq!(prints, vec!["[1,2,3,4] 3 10"]);
}

#[test]
fn debug_renders_values_for_inspection() {
    let (_, prints) = run(r#"(debug "x" 1)"#);
    assert_eq!(prints.len(), 1);
    assert!(prints[0].contains("String(\"x\")"));
    assert!(prints[0].contains("Integer(1)"));
}

#[test]
fn comments_are_tokens_but_not_nodes() {
    let (tokens, ast) = interpreter::parse_source("; hello\n(print 1)").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Comment);
    let Node::Expression(forms) = ast else {
        panic!("root must be an expression");
    };
    assert_eq!(forms.len(), 1);
}

#[test]
fn syntax_errors_carry_positions() {
    let err = interpreter::parse_source("(print 1)\n  (print").unwrap_err();
    assert_eq!(err.to_string(), "syntax error at 2:3: unterminated expression opened here");
}

#[test]
fn json_view_of_values() {
    let value = Object::List(vec![Object::Integer(1), Object::String("two".into())]);
    let view = object_to_json(&value);
    assert_eq!(view["type"], json!("list"));
    assert_eq!(view["len"], json!(2));
    assert_eq!(view["items"][1]["value"], json!("two"));
    assert_eq!(view["summary"], json!("[1,two]"));
}

#[tokio::test]
async fn echo_result_through_a_session() {
    let config = PlaygroundConfig {
        echo_result: true,
        ..PlaygroundConfig::default()
    };
    let session = Session::new(config);
    session.initialize().await.unwrap();

    session
        .trigger_run("(def square (fn [x] (* x x))) (print (square 4)) (square 5)")
        .unwrap();
    assert_eq!(session.snapshot().message_texts(), vec!["16", "25"]);
}
