use crate::preamble::PREAMBLE;
use crate::scope::LowerCtx;
use crate::translate;
use crate::TranslateError;
use crate::TranslateOptions;

fn translated(src: &str) -> String {
  translate(src, TranslateOptions::default().with_preamble(false))
    .unwrap()
    .render()
}

fn check(src: &str, expected: &str) {
  assert_eq!(translated(src), expected, "\nsource: {src}");
}

#[test]
fn test_arrow_declarator_is_hoisted_under_declared_name() {
  check(
    "let name = age => {console.log(age)}",
    "@Js\ndef name(this, arguments, age):\n    console.log(age)\n\nname = name\n",
  );
}

#[test]
fn test_conditional_expression() {
  check(
    "true ? console.log('Hi') : log('No')",
    "console.log('Hi') if True else log('No')\n",
  );
}

#[test]
fn test_for_loop_becomes_while() {
  check(
    "for (let i = 0; i < 100; i++) { console.log(i) }",
    "i = 0\nwhile i < 100:\n    console.log(i)\n    i += 1\n",
  );
}

#[test]
fn test_for_loop_without_clauses() {
  check("for (;;) { tick(); }", "while True:\n    tick()\n");
}

#[test]
fn test_do_while_matches_while() {
  assert_eq!(translated("do {} while (true);"), "while True:\n    pass\n");
  assert_eq!(
    translated("do { step(); } while (more());"),
    translated("while (more()) { step(); }"),
  );
}

#[test]
fn test_variables_and_literals() {
  check("let x = 1;", "x = 1\n");
  check("var y;", "y = None\n");
  check("const a = b + c * 2", "a = b + c * 2\n");
  check("let a = 1, b = 'two';", "a = 1\nb = 'two'\n");
  check("x = [1, , 2]", "x = Js([1, , 2])\n");
  check(
    "y = {a: 1, 'b-c': 2, [k]: 3, d, ...rest}",
    "y = {'a': 1, 'b-c': 2, k: 3, 'd': d, **rest}\n",
  );
  check("z = null", "z = None\n");
  check("f = false", "f = False\n");
  check("n = 0.5", "n = 0.5\n");
  check("big = 10n", "big = 10\n");
  check(r#"s = "it's\n""#, "s = 'it\\'s\\n'\n");
  check("r = /ab+c/gi", "r = RegExp('ab+c', 'gi')\n");
}

#[test]
fn test_template_literals() {
  check("t = `a${b}c`", "t = f\"\"\"a{b}c\"\"\"\n");
  check("t = `{${a}}`", "t = f\"\"\"{{{a}}}\"\"\"\n");
}

#[test]
fn test_operators() {
  check("a && b || !c", "a and b or not c\n");
  check("a === b", "a == b\n");
  check("a !== b", "a != b\n");
  check("delete o.k", "del o.k\n");
  check("w = void 0", "w = (0, None)[1]\n");
  check("t = typeof foo", "t = type(globals().get('foo'))\n");
  check("x = (a + b) * c", "x = (a + b) * c\n");
  check("++i;", "i += 1\n");
  check("i--;", "i -= 1\n");
  check("a = 1, b = 2;", "a = 1; b = 2\n");
  check("x = a?.b", "x = a.b\n");
}

#[test]
fn test_reserved_identifiers_are_renamed() {
  check("throw new Error('bad')", "raise Exception('bad')\n");
  check("global.x = 1", "globals.x = 1\n");
  check("o.global = 1", "o.global = 1\n");
}

#[test]
fn test_if_chain() {
  check(
    "if (a) { b(); } else if (c) { d(); } else { e(); }",
    "if a:\n    b()\nelif c:\n    d()\nelse:\n    e()\n",
  );
  check("if (a) b();", "if a:\n    b()\n");
  check("if (a) {}", "if a:\n    pass\n");
}

#[test]
fn test_switch() {
  check(
    "switch (x) {\n  case 1:\n    a();\n    break;\n  default:\n    b();\n}",
    "match x:\n    case 1:\n        a()\n    case _:\n        b()\n",
  );
  check(
    "switch (k) { case A.B: x(); break; case c: y(); }",
    "match k:\n    case A.B:\n        x()\n    case _ if k == c:\n        y()\n",
  );
  check(
    "switch (f()) { case 1: a(); }",
    "match f():\n    case 1:\n        a()\n",
  );
}

#[test]
fn test_switch_guards_evaluate_the_subject_once() {
  check(
    "switch (f()) { case g(): a(); break; case 2: b(); }",
    "_temp_0 = f()\nmatch _temp_0:\n    case _ if _temp_0 == g():\n        a()\n    case 2:\n        b()\ndel _temp_0\n",
  );
}

#[test]
fn test_switch_default_arm_goes_last() {
  check(
    "switch (x) { default: b(); break; case 1: a(); }",
    "match x:\n    case 1:\n        a()\n    case _:\n        b()\n",
  );
  check(
    "switch (x) { case 1: a(); break; default: b(); break; case 2: c(); }",
    "match x:\n    case 1:\n        a()\n    case 2:\n        c()\n    case _:\n        b()\n",
  );
}

#[test]
fn test_break_leaving_switch_is_a_placeholder() {
  let out = translated("switch (k) { case 1: if (a) break; b(); }");
  assert!(
    out.contains("        if a:\n            pass  # FIXME unsupported break out of a switch case: break"),
    "{out}"
  );
  assert!(out.ends_with("        b()\n"), "{out}");
}

#[test]
fn test_try_catch_finally() {
  check(
    "try { a(); } catch (e) { b(e); } finally { c(); }",
    "try:\n    a()\nexcept Exception as e:\n    b(e)\nfinally:\n    c()\n",
  );
  check(
    "try { a(); } catch { b(); }",
    "try:\n    a()\nexcept Exception:\n    b()\n",
  );
  check(
    "try { a(); } catch ({ message }) { log(message); }",
    "try:\n    a()\nexcept Exception as _temp_0:\n    message = _temp_0.message\n    del _temp_0\n    log(message)\n",
  );
}

#[test]
fn test_catch_pattern_defaults_hoist_into_the_handler() {
  check(
    "try {} catch ({a = function () {}}) {}",
    "try:\n    pass\nexcept Exception as _temp_0:\n    @Js\n    def _anonymous_func_1(this, arguments):\n        pass\n\n    a = _temp_0.a if _temp_0.a is not None else _anonymous_func_1\n    del _temp_0\n",
  );
}

#[test]
fn test_object_destructuring() {
  check(
    "const {a, b: c, d = 1} = obj;",
    "_temp_0 = obj\na = _temp_0.a\nc = _temp_0.b\nd = _temp_0.d if _temp_0.d is not None else 1\ndel _temp_0\n",
  );
}

#[test]
fn test_object_rest_and_quoted_keys() {
  check(
    "const {['a-b']: x, ...others} = obj;",
    "_temp_0 = obj\nx = _temp_0['a-b']\nothers = {k: v for k, v in _temp_0.items() if k not in ['a-b']}\ndel _temp_0\n",
  );
}

#[test]
fn test_array_destructuring() {
  check(
    "let [x, , y, ...rest] = arr;",
    "_temp_0 = arr\nx = _temp_0[0]\ny = _temp_0[2]\nrest = _temp_0[3:]\ndel _temp_0\n",
  );
}

#[test]
fn test_nested_destructuring() {
  check(
    "const {a: [b, c]} = obj;",
    "_temp_0 = obj\n_temp_1 = _temp_0.a\nb = _temp_1[0]\nc = _temp_1[1]\ndel _temp_1\ndel _temp_0\n",
  );
}

#[test]
fn test_destructuring_assignment_statement() {
  check(
    "[a, b] = [b, a];",
    "_temp_0 = Js([b, a])\na = _temp_0[0]\nb = _temp_0[1]\ndel _temp_0\n",
  );
}

#[test]
fn test_destructuring_emits_one_copy_per_property() {
  let out = translated("const {a, b, c, d} = obj;");
  let copies = out.lines().filter(|l| l.contains(" = _temp_0.")).count();
  assert_eq!(copies, 4);
  let out = translated("const [a, b, c] = arr;");
  let copies = out.lines().filter(|l| l.contains(" = _temp_0[")).count();
  assert_eq!(copies, 3);
}

#[test]
fn test_call_arguments_are_hoisted() {
  let out = translated("setTimeout(function () { tick(); }, 10);");
  assert_eq!(
    out,
    "@Js\ndef _anonymous_func_0(this, arguments):\n    tick()\n\nsetTimeout(_anonymous_func_0, 10)\n"
  );
  let def_name = out
    .lines()
    .find_map(|l| l.strip_prefix("def "))
    .and_then(|l| l.split('(').next())
    .unwrap();
  assert!(out.contains(&format!("setTimeout({def_name}, 10)")));
}

#[test]
fn test_immediately_invoked_function() {
  check(
    "(function () { a(); })();",
    "@Js\ndef _anonymous_func_0(this, arguments):\n    a()\n\n_anonymous_func_0()\n",
  );
}

#[test]
fn test_anonymous_names_never_repeat() {
  let out = translated("f(() => 1, () => 2);\ng(function () {});");
  assert!(out.contains("f(_anonymous_func_0, _anonymous_func_1)"), "{out}");
  assert!(out.contains("g(_anonymous_func_2)"), "{out}");
}

#[test]
fn test_function_declarations() {
  check(
    "function add(a, b) { return a + b; }",
    "@Js\ndef add(this, arguments, a, b):\n    return a + b\n",
  );
  check(
    "async function f() { await g(); }",
    "@Js\nasync def f(this, arguments):\n    await g()\n",
  );
  check(
    "function* gen() { yield 1; }",
    "@Js\ndef gen(this, arguments):\n    yield 1\n",
  );
  check(
    "function f() { return this; }",
    "@Js\ndef f(this, arguments):\n    return this\n",
  );
}

#[test]
fn test_parameters() {
  check(
    "function f(a, b = 2, ...rest) {}",
    "@Js\ndef f(this, arguments, a, b=2, *rest):\n    pass\n",
  );
  check(
    "function g(a = 1, b) {}",
    "@Js\ndef g(this, arguments, a=1, b=None):\n    pass\n",
  );
  check(
    "function f({a, b}) { return a; }",
    "@Js\ndef f(this, arguments, _temp_0):\n    a = _temp_0.a\n    b = _temp_0.b\n    del _temp_0\n    return a\n",
  );
  check(
    "function g(a, [b, c] = []) {}",
    "@Js\ndef g(this, arguments, a, _temp_0=Js([])):\n    b = _temp_0[0]\n    c = _temp_0[1]\n    del _temp_0\n",
  );
}

#[test]
fn test_parameter_pattern_defaults_hoist_into_the_body() {
  check(
    "function f({a = () => 1}) { return a }",
    "@Js\ndef f(this, arguments, _temp_0):\n    @Js\n    def _anonymous_func_1(this, arguments):\n        return 1\n\n    a = _temp_0.a if _temp_0.a is not None else _anonymous_func_1\n    del _temp_0\n    return a\n",
  );
}

#[test]
fn test_nested_functions_hoist_inside_their_body() {
  check(
    "function outer() {\n  const inner = () => 1;\n  return inner;\n}",
    "@Js\ndef outer(this, arguments):\n    @Js\n    def inner(this, arguments):\n        return 1\n\n    inner = inner\n    return inner\n",
  );
}

#[test]
fn test_object_methods_are_hoisted() {
  check(
    "const o = { greet() { return 1; } };",
    "@Js\ndef _anonymous_func_greet0(this, arguments):\n    return 1\n\no = {'greet': _anonymous_func_greet0}\n",
  );
  check(
    "const o = { run: function () {} };",
    "@Js\ndef _anonymous_func_run0(this, arguments):\n    pass\n\no = {'run': _anonymous_func_run0}\n",
  );
}

#[test]
fn test_return_of_side_effects_is_split() {
  check(
    "function f() { return x = 5; }",
    "@Js\ndef f(this, arguments):\n    x = 5\n    return x\n",
  );
  check(
    "function f() { return a(), b; }",
    "@Js\ndef f(this, arguments):\n    a()\n    return b\n",
  );
  check(
    "function f() { return i++; }",
    "@Js\ndef f(this, arguments):\n    i += 1\n    return i\n",
  );
}

#[test]
fn test_class() {
  check(
    r#"class Dog extends Animal {
  constructor(name) {
    super(name);
    this.name = name;
  }
  static create() {
    return new Dog('rex');
  }
  speak() {
    return `${this.name} barks`;
  }
}"#,
    r#"class Dog(Animal):
    @Js
    def __init__(self, name):
        super().__init__(name)
        self.name = name
    @staticmethod
    @Js
    def create(self):
        return Dog('rex')
    @Js
    def speak(self):
        return f"""{self.name} barks"""
"#,
  );
}

#[test]
fn test_class_accessors_and_fields() {
  check(
    "class A {\n  count = 0;\n  label;\n  get v() { return this._v; }\n  set v(x) { this._v = x; }\n}",
    "class A(object):\n    count = 0\n    label = None\n    @property\n    @Js\n    def v(self):\n        return self._v\n    @v.setter\n    @Js\n    def v(self, x):\n        self._v = x\n",
  );
  check("class Empty {}", "class Empty(object):\n    pass\n");
}

#[test]
fn test_private_members_are_mangled() {
  check(
    "class C {\n  #n = 1;\n  value() { return this.#n; }\n}",
    "class C(object):\n    __n = 1\n    @Js\n    def value(self):\n        return self.__n\n",
  );
}

#[test]
fn test_this_inside_nested_functions() {
  check(
    "class A { m() { return () => this; } }",
    "class A(object):\n    @Js\n    def m(self):\n        @Js\n        def _anonymous_func_0(this, arguments):\n            return self\n\n        return _anonymous_func_0\n",
  );
  check(
    "class A { m() { return function () { return this; }; } }",
    "class A(object):\n    @Js\n    def m(self):\n        @Js\n        def _anonymous_func_0(this, arguments):\n            return this\n\n        return _anonymous_func_0\n",
  );
}

#[test]
fn test_class_expression() {
  check("const K = class {};", "class K(object):\n    pass\n\nK = K\n");
  check(
    "use(class {});",
    "class _anonymous_class_0(object):\n    pass\n\nuse(_anonymous_class_0)\n",
  );
}

#[test]
fn test_for_of_and_for_in() {
  check(
    "for (const x of xs) { use(x); }",
    "for x in xs:\n    use(x)\n",
  );
  check(
    "for (const k in obj) use(k);",
    "for k in obj:\n    use(k)\n",
  );
  check(
    "for (const [k, v] of entries) { use(k, v); }",
    "for _temp_0 in entries:\n    k = _temp_0[0]\n    v = _temp_0[1]\n    del _temp_0\n    use(k, v)\n",
  );
}

#[test]
fn test_loop_pattern_defaults_hoist_into_the_body() {
  check(
    "for (const {a = () => 1} of xs) {}",
    "for _temp_0 in xs:\n    @Js\n    def _anonymous_func_1(this, arguments):\n        return 1\n\n    a = _temp_0.a if _temp_0.a is not None else _anonymous_func_1\n    del _temp_0\n",
  );
}

#[test]
fn test_for_await() {
  check(
    "async function f() { for await (const x of xs) { use(x); } }",
    "@Js\nasync def f(this, arguments):\n    async for x in xs:\n        use(x)\n",
  );
}

#[test]
fn test_labels() {
  check("loop: while (x) { break loop; }", "while x:\n    break\n");
  check(
    "loop: for (;;) { continue loop; }",
    "while True:\n    continue\n",
  );
  let out = translated(
    "outer: for (const a of xs) {\n  for (const b of ys) {\n    if (b) continue outer;\n  }\n}",
  );
  assert!(
    out.contains("        if b:\n            pass  # FIXME unsupported labelled jump: continue outer"),
    "{out}"
  );
}

#[test]
fn test_skipped_statements() {
  check("'use strict';\n;\ndebugger;", "pass\n");
  check("{}", "");
}

#[test]
fn test_imports() {
  check(
    "import React from 'react';\nimport { a, b as c } from './lib/util.js';\nimport Theme, { dark } from '../styles/theme.mjs';",
    "from react import default as React\nfrom .lib.util import a\nfrom .lib.util import b as c\nfrom ..styles.theme import default as Theme\nfrom ..styles.theme import dark\n",
  );
  check("import {} from './setup';", "from . import setup\n");
  check("import {} from 'core/shim';", "import core.shim\n");
}

#[test]
fn test_exports() {
  check(
    "export const x = 1;\nexport { x as y };\nexport default x;\nexport * from './all';",
    "x = 1\ny = x\ndefault = x\nfrom .all import *\n",
  );
  check(
    "export { a as b } from './m';",
    "from .m import a as b\n",
  );
  check(
    "export default function () {}",
    "@Js\ndef default(this, arguments):\n    pass\n",
  );
  check(
    "export default function main() {}",
    "@Js\ndef main(this, arguments):\n    pass\ndefault = main\n",
  );
  check("export function f() {}", "@Js\ndef f(this, arguments):\n    pass\n");
}

#[test]
fn test_unsupported_statements_become_placeholders() {
  let translation = translate(
    "import * as ns from 'mod';\nfoo();",
    TranslateOptions::default().with_preamble(false),
  )
  .unwrap();
  let out = translation.render();
  assert!(
    out.starts_with("pass  # FIXME unsupported namespace import: import * as ns from 'mod';\n"),
    "{out}"
  );
  assert!(out.ends_with("\nfoo()\n"), "{out}");
  let placeholders = translation.placeholders();
  assert_eq!(placeholders.len(), 1);
  assert_eq!(placeholders[0].construct, "namespace import");
  assert_eq!((placeholders[0].line, placeholders[0].column), (1, 1));
}

#[test]
fn test_placeholders_drop_partial_hoists() {
  let out = translated("const o = { f: function () {}, get x() { return 1; } };\nnext();");
  assert!(!out.contains("def "), "{out}");
  assert!(
    out.starts_with("pass  # FIXME unsupported object accessor: "),
    "{out}"
  );
  assert!(out.ends_with("\nnext()\n"), "{out}");
}

#[test]
fn test_placeholders_report_positions() {
  let translation = translate(
    "a();\nif (x) {\n  y = import.meta;\n}",
    TranslateOptions::default().with_preamble(false),
  )
  .unwrap();
  let placeholders = translation.placeholders();
  assert_eq!(placeholders.len(), 1);
  assert_eq!(placeholders[0].construct, "import.meta");
  assert_eq!(placeholders[0].line, 3);
  assert!(translation
    .render()
    .contains("if x:\n    pass  # FIXME unsupported import.meta: import.meta"));
}

#[test]
fn test_other_unsupported_expressions() {
  let out = translated("const m = import('./m.js');
ok();");
  assert!(
    out.starts_with("pass  # FIXME unsupported dynamic import: import('./m.js')\n"),
    "{out}"
  );
  assert!(out.ends_with("\nok()\n"), "{out}");
  let out = translated("x = html`<b>${y}</b>`;");
  assert!(
    out.starts_with("pass  # FIXME unsupported tagged template: html`"),
    "{out}"
  );
  let out = translated("class A { static get v() { return 1; } }");
  assert!(
    out.starts_with("pass  # FIXME unsupported static accessor: "),
    "{out}"
  );
}

#[test]
fn test_syntax_errors_are_reported() {
  let err = translate("x = (;", TranslateOptions::default()).unwrap_err();
  match err {
    TranslateError::Syntax { line, .. } => assert_eq!(line, 1),
    other => panic!("expected a syntax error, got {other:?}"),
  };
  assert!(err_message("let x = (;").starts_with("syntax error at 1:"));
}

fn err_message(src: &str) -> String {
  translate(src, TranslateOptions::default())
    .unwrap_err()
    .to_string()
}

#[test]
fn test_await_inside_async_arrows() {
  check(
    "run(async () => { await ready(); });",
    "@Js\nasync def _anonymous_func_0(this, arguments):\n    await ready()\n\nrun(_anonymous_func_0)\n",
  );
}

#[test]
fn test_preamble() {
  let translation = translate("x = 1", TranslateOptions::default()).unwrap();
  assert_eq!(translation.preamble(), Some(PREAMBLE));
  let out = translation.render();
  assert!(out.starts_with("from js2py.base import *\n"));
  assert!(out.ends_with("decodeURIComponent\n\nx = 1\n"));
  assert_eq!(translation.to_string(), out);

  let empty = translate("", TranslateOptions::default()).unwrap();
  assert_eq!(empty.render(), format!("{PREAMBLE}\n"));
  assert!(empty.statements().is_empty());
}

#[test]
fn test_indentation_is_balanced() {
  let src = r#"
function f(a) {
  for (const [k, v] of a) {
    if (k) { continue; } else { x = import.meta; }
    switch (v) { case 1: g(() => { while (x) { break; } }); break; }
  }
  try { h(); } catch (e) { class Inner { m() { return this; } } }
}
"#;
  let top_level = parse_js::parse(src.as_bytes()).unwrap();
  let mut cx = LowerCtx::new(src);
  let fragments = cx.lower_top_level(&top_level).unwrap();
  assert_eq!(cx.indent_level(), 0);
  assert_eq!(cx.take_placeholders().len(), 1);
  assert!(fragments[0].starts_with("@Js\ndef f(this, arguments, a):\n"));
  for line in fragments.join("\n").lines() {
    let indent = line.len() - line.trim_start_matches(' ').len();
    assert_eq!(indent % 4, 0, "{line}");
  }
}
